//! Per-user, per-command cooldown windows.
//!
//! `now` is always passed in so callers and tests control the clock.

use crate::{
    entities::{Cooldown, cooldown},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Set, prelude::*};
use std::time::Duration;

/// Fails with [`Error::CooldownActive`] if `command` was used by `user_id` less than
/// `window` before `now`.
pub async fn check<C>(
    db: &C,
    user_id: &str,
    command: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let Some(entry) = Cooldown::find_by_id((user_id.to_string(), command.to_string()))
        .one(db)
        .await?
    else {
        return Ok(());
    };

    let elapsed = (now - entry.last_used_at).to_std().unwrap_or_default();
    if elapsed < window {
        return Err(Error::CooldownActive {
            command: command.to_string(),
            remaining: window - elapsed,
        });
    }
    Ok(())
}

/// Records `now` as the last use of `command` by `user_id`.
pub async fn record<C>(db: &C, user_id: &str, command: &str, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let exists = Cooldown::find_by_id((user_id.to_string(), command.to_string()))
        .one(db)
        .await?
        .is_some();

    let model = cooldown::ActiveModel {
        user_id: Set(user_id.to_string()),
        command: Set(command.to_string()),
        last_used_at: Set(now),
    };
    if exists {
        model.update(db).await?;
    } else {
        model.insert(db).await?;
    }
    Ok(())
}

/// Checks the window and, if it has elapsed, starts a new one.
pub async fn check_and_record<C>(
    db: &C,
    user_id: &str,
    command: &str,
    window: Duration,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    check(db, user_id, command, window, now).await?;
    record(db, user_id, command, now).await
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::setup_test_db;

    const WINDOW: Duration = Duration::from_secs(60);

    fn whole_second_now() -> DateTime<Utc> {
        DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap()
    }

    #[tokio::test]
    async fn test_second_use_within_window_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let start = whole_second_now();

        check_and_record(&db, "A", "claim", WINDOW, start).await?;

        let later = start + chrono::Duration::seconds(20);
        let err = check_and_record(&db, "A", "claim", WINDOW, later)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CooldownActive { ref command, remaining } if command == "claim" && remaining == Duration::from_secs(40)
        ));

        // The rejected call must not have moved the window.
        let entry = Cooldown::find_by_id(("A".to_string(), "claim".to_string()))
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(entry.last_used_at, start);
        Ok(())
    }

    #[tokio::test]
    async fn test_use_after_window_succeeds() -> Result<()> {
        let db = setup_test_db().await?;
        let start = whole_second_now();

        check_and_record(&db, "A", "claim", WINDOW, start).await?;
        let after = start + chrono::Duration::seconds(61);
        check_and_record(&db, "A", "claim", WINDOW, after).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_windows_are_per_command_and_user() -> Result<()> {
        let db = setup_test_db().await?;
        let now = whole_second_now();

        check_and_record(&db, "A", "claim", WINDOW, now).await?;
        check_and_record(&db, "A", "rob", WINDOW, now).await?;
        check_and_record(&db, "B", "claim", WINDOW, now).await?;
        Ok(())
    }
}
