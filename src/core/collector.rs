//! Time-boxed interaction collector.
//!
//! A collector watches the component events of one message for a fixed duration.
//! Only events whose action id is in the accepted set are considered; those coming
//! from users outside the allowed set are surfaced as [`Step::Rejected`] so the caller
//! can answer them. An empty allowed set accepts everyone. When the deadline passes the collector edits the original message
//! through its [`ExpiryNotice`] exactly once and stays timed out.
//!
//! The event stream is owned by the collector, so dropping the collector releases the
//! underlying subscription on every path.

use crate::errors::Result;
use futures::{Stream, StreamExt};
use std::{collections::HashSet, time::Duration};
use tokio::time::Instant;

/// What the collector needs to know about an incoming component event.
pub trait ComponentAction {
    /// Discord user ID of whoever clicked
    fn user_id(&self) -> u64;
    /// Custom ID of the clicked button or menu
    fn action_id(&self) -> &str;
}

/// Marks the collected message as expired.
pub trait ExpiryNotice {
    /// Edits the original message to its "time expired" state.
    fn mark_expired(&self) -> impl Future<Output = Result<()>> + Send;
}

/// Lifecycle of a collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectorState {
    /// Waiting for a matching event
    AwaitingInput,
    /// A matching event from an allowed user arrived
    Acted,
    /// The deadline passed (terminal)
    TimedOut,
}

/// Result of one wait on the collector.
#[derive(Debug)]
pub enum Step<E> {
    /// An allowed user triggered an accepted action
    Acted(E),
    /// Someone outside the allowed set clicked an accepted action
    Rejected(E),
    /// No event before the intermediate wake-up passed to [`Collector::next_until`]
    Idle,
    /// The collector's deadline passed
    TimedOut,
}

/// Collector bound to one message's event stream.
pub struct Collector<S, N> {
    events: S,
    notice: N,
    allowed_users: HashSet<u64>,
    actions: HashSet<String>,
    deadline: Instant,
    state: CollectorState,
}

impl<S, N, E> Collector<S, N>
where
    S: Stream<Item = E> + Unpin,
    N: ExpiryNotice,
    E: ComponentAction,
{
    /// Starts collecting for `duration` from now.
    pub fn new(
        events: S,
        notice: N,
        allowed_users: impl IntoIterator<Item = u64>,
        actions: impl IntoIterator<Item = impl Into<String>>,
        duration: Duration,
    ) -> Self {
        Self {
            events,
            notice,
            allowed_users: allowed_users.into_iter().collect(),
            actions: actions.into_iter().map(Into::into).collect(),
            deadline: Instant::now() + duration,
            state: CollectorState::AwaitingInput,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CollectorState {
        self.state
    }

    /// When the collector times out.
    #[must_use]
    pub const fn deadline(&self) -> Instant {
        self.deadline
    }

    /// Waits for the next relevant event or the deadline.
    pub async fn next(&mut self) -> Result<Step<E>> {
        self.next_until(self.deadline).await
    }

    /// Like [`Collector::next`], but also wakes up at `wake` with [`Step::Idle`]
    /// if that comes before the deadline. Used by games that advance on a timer.
    pub async fn next_until(&mut self, wake: Instant) -> Result<Step<E>> {
        if self.state == CollectorState::TimedOut {
            return Ok(Step::TimedOut);
        }

        let until = wake.min(self.deadline);
        loop {
            match tokio::time::timeout_at(until, self.events.next()).await {
                Ok(Some(event)) => {
                    if !self.actions.contains(event.action_id()) {
                        continue;
                    }
                    if !self.allowed_users.is_empty()
                        && !self.allowed_users.contains(&event.user_id())
                    {
                        return Ok(Step::Rejected(event));
                    }
                    self.state = CollectorState::Acted;
                    return Ok(Step::Acted(event));
                }
                Ok(None) => return self.expire().await,
                Err(_) if until < self.deadline => return Ok(Step::Idle),
                Err(_) => return self.expire().await,
            }
        }
    }

    async fn expire(&mut self) -> Result<Step<E>> {
        self.state = CollectorState::TimedOut;
        self.notice.mark_expired().await?;
        Ok(Step::TimedOut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    #[derive(Debug)]
    struct Click {
        user: u64,
        action: &'static str,
    }

    impl ComponentAction for Click {
        fn user_id(&self) -> u64 {
            self.user
        }

        fn action_id(&self) -> &str {
            self.action
        }
    }

    #[derive(Clone, Default)]
    struct CountingNotice(Arc<AtomicUsize>);

    impl ExpiryNotice for CountingNotice {
        async fn mark_expired(&self) -> Result<()> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_edits_message_exactly_once() -> Result<()> {
        let notice = CountingNotice::default();
        let mut collector = Collector::new(
            futures::stream::pending::<Click>(),
            notice.clone(),
            [1],
            ["accept"],
            Duration::from_secs(30),
        );

        assert!(matches!(collector.next().await?, Step::TimedOut));
        assert_eq!(collector.state(), CollectorState::TimedOut);
        assert!(matches!(collector.next().await?, Step::TimedOut));
        assert_eq!(notice.0.load(Ordering::SeqCst), 1);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_filters_users_and_actions() -> Result<()> {
        let notice = CountingNotice::default();
        let events = futures::stream::iter(vec![
            Click { user: 1, action: "unrelated" },
            Click { user: 2, action: "accept" },
            Click { user: 1, action: "accept" },
        ])
        .chain(futures::stream::pending());
        let mut collector =
            Collector::new(events, notice.clone(), [1], ["accept", "decline"], Duration::from_secs(30));

        assert!(matches!(collector.next().await?, Step::Rejected(Click { user: 2, .. })));
        assert!(matches!(collector.next().await?, Step::Acted(Click { user: 1, action: "accept" })));
        assert_eq!(collector.state(), CollectorState::Acted);
        assert_eq!(notice.0.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_allowed_set_accepts_anyone() -> Result<()> {
        let events = futures::stream::iter(vec![Click { user: 9, action: "claim" }])
            .chain(futures::stream::pending());
        let mut collector = Collector::new(
            events,
            CountingNotice::default(),
            std::iter::empty(),
            ["claim"],
            Duration::from_secs(60),
        );

        assert!(matches!(collector.next().await?, Step::Acted(Click { user: 9, .. })));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_until_wakes_before_deadline() -> Result<()> {
        let notice = CountingNotice::default();
        let mut collector = Collector::new(
            futures::stream::pending::<Click>(),
            notice.clone(),
            [1],
            ["stop"],
            Duration::from_secs(3),
        );

        let wake = Instant::now() + Duration::from_secs(1);
        assert!(matches!(collector.next_until(wake).await?, Step::Idle));
        assert_eq!(collector.state(), CollectorState::AwaitingInput);

        let late_wake = Instant::now() + Duration::from_secs(10);
        assert!(matches!(collector.next_until(late_wake).await?, Step::TimedOut));
        assert_eq!(notice.0.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
