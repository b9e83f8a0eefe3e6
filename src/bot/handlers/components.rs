//! Button and select-menu plumbing.
//!
//! Wires serenity's component events into [`Collector`] and provides the small
//! response helpers every interactive command needs.

use crate::{
    bot::Context,
    core::collector::{Collector, ComponentAction, ExpiryNotice, Step},
    errors::Result,
};
use futures::{StreamExt, stream::BoxStream};
use poise::serenity_prelude as serenity;
use std::{sync::Arc, time::Duration};

/// Custom ID of the "previous page" button
pub const PREVIOUS_PAGE: &str = "page_previous";
/// Custom ID of the "next page" button
pub const NEXT_PAGE: &str = "page_next";

impl ComponentAction for serenity::ComponentInteraction {
    fn user_id(&self) -> u64 {
        self.user.id.get()
    }

    fn action_id(&self) -> &str {
        &self.data.custom_id
    }
}

/// Edits a collected message to its expired state and strips its components.
pub struct MessageExpiry {
    http: Arc<serenity::Http>,
    channel_id: serenity::ChannelId,
    message_id: serenity::MessageId,
    text: String,
}

impl ExpiryNotice for MessageExpiry {
    async fn mark_expired(&self) -> Result<()> {
        self.channel_id
            .edit_message(
                &self.http,
                self.message_id,
                serenity::EditMessage::new()
                    .content(self.text.clone())
                    .components(Vec::new()),
            )
            .await?;
        Ok(())
    }
}

/// Collector over the component events of one Discord message.
pub type MessageCollector =
    Collector<BoxStream<'static, serenity::ComponentInteraction>, MessageExpiry>;

/// Starts collecting clicks on `message`.
///
/// `allowed` lists who may act (empty means anyone); `expired_text` replaces the
/// message content when the collector times out.
pub fn collect_on(
    ctx: &serenity::Context,
    message: &serenity::Message,
    allowed: impl IntoIterator<Item = u64>,
    actions: impl IntoIterator<Item = impl Into<String>>,
    duration: Duration,
    expired_text: impl Into<String>,
) -> MessageCollector {
    let events = serenity::ComponentInteractionCollector::new(ctx)
        .message_id(message.id)
        .timeout(duration)
        .stream()
        .boxed();
    let notice = MessageExpiry {
        http: Arc::clone(&ctx.http),
        channel_id: message.channel_id,
        message_id: message.id,
        text: expired_text.into(),
    };
    Collector::new(events, notice, allowed, actions, duration)
}

/// Starts collecting clicks on the message behind a poise reply.
pub async fn collect_reply(
    ctx: Context<'_>,
    reply: &poise::ReplyHandle<'_>,
    allowed: impl IntoIterator<Item = u64>,
    actions: impl IntoIterator<Item = impl Into<String>>,
    duration: Duration,
    expired_text: impl Into<String>,
) -> Result<MessageCollector> {
    let message = reply.message().await?;
    Ok(collect_on(
        ctx.serenity_context(),
        &message,
        allowed,
        actions,
        duration,
        expired_text,
    ))
}

/// Builds a button.
#[must_use]
pub fn button(
    custom_id: impl Into<String>,
    label: impl Into<String>,
    style: serenity::ButtonStyle,
) -> serenity::CreateButton {
    serenity::CreateButton::new(custom_id)
        .label(label)
        .style(style)
}

/// Replaces the clicked message's content, embeds and components.
pub async fn update_message(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    message: serenity::CreateInteractionResponseMessage,
) -> Result<()> {
    interaction
        .create_response(ctx, serenity::CreateInteractionResponse::UpdateMessage(message))
        .await?;
    Ok(())
}

/// Answers a click with a message only the clicker can see.
pub async fn reply_ephemeral(
    ctx: &serenity::Context,
    interaction: &serenity::ComponentInteraction,
    content: impl Into<String>,
) -> Result<()> {
    interaction
        .create_response(
            ctx,
            serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;
    Ok(())
}

/// Previous/next buttons for a zero-based `page` out of `pages`.
#[must_use]
pub fn pagination_row(page: u64, pages: u64) -> serenity::CreateActionRow {
    serenity::CreateActionRow::Buttons(vec![
        button(PREVIOUS_PAGE, "⬅️ Previous", serenity::ButtonStyle::Secondary).disabled(page == 0),
        button(NEXT_PAGE, "Next ➡️", serenity::ButtonStyle::Secondary)
            .disabled(page + 1 >= pages),
    ])
}

/// Number of pages needed for `total` items, at least one.
#[must_use]
pub const fn page_count(total: u64, per_page: u64) -> u64 {
    if total == 0 {
        1
    } else {
        total.div_ceil(per_page)
    }
}

/// Page reached by pressing `action` on `page`, clamped to `0..pages`.
#[must_use]
pub fn turn_page(action: &str, page: u64, pages: u64) -> u64 {
    match action {
        PREVIOUS_PAGE => page.saturating_sub(1),
        NEXT_PAGE => (page + 1).min(pages.saturating_sub(1)),
        _ => page,
    }
}

/// Waits for the next page turn by an allowed user.
///
/// Clicks from other users get an ephemeral refusal. Returns `None` once the
/// collector times out.
pub async fn next_page_turn(
    ctx: &serenity::Context,
    collector: &mut MessageCollector,
    page: u64,
    pages: u64,
) -> Result<Option<(serenity::ComponentInteraction, u64)>> {
    loop {
        match collector.next().await? {
            Step::Acted(press) => {
                let next = turn_page(&press.data.custom_id, page, pages);
                return Ok(Some((press, next)));
            }
            Step::Rejected(press) => {
                reply_ephemeral(ctx, &press, "Only whoever ran the command can turn pages.")
                    .await?;
            }
            Step::Idle => {}
            Step::TimedOut => return Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_math() {
        assert_eq!(page_count(0, 5), 1);
        assert_eq!(page_count(5, 5), 1);
        assert_eq!(page_count(6, 5), 2);

        assert_eq!(turn_page(NEXT_PAGE, 0, 2), 1);
        assert_eq!(turn_page(NEXT_PAGE, 1, 2), 1);
        assert_eq!(turn_page(PREVIOUS_PAGE, 0, 2), 0);
        assert_eq!(turn_page("other", 1, 2), 1);
    }
}
