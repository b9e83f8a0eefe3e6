//! Gateway event listener.
//!
//! Answers `taxa <n>` messages with the game-pass price that nets `n` Robux.

use crate::{
    bot::BotData,
    core::events::{self, PASS_NET_LIMIT, PassPrice},
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;

/// Entry point registered as the framework's `event_handler`.
pub async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    _data: &BotData,
) -> Result<()> {
    if let serenity::FullEvent::Message { new_message } = event {
        handle_message(ctx, new_message).await?;
    }
    Ok(())
}

/// Reply to a `taxa` request, if the message contains one.
#[must_use]
pub fn pass_price_reply(content: &str) -> Option<String> {
    let net = events::parse_pass_request(content)?;
    Some(match events::pass_price(net) {
        PassPrice::Gross { net, gross } => {
            format!("💸 To receive **{net}** Robux, set the pass price to **{gross}** Robux.")
        }
        PassPrice::OverLimit => format!(
            "⚠️ A single pass can net at most **{PASS_NET_LIMIT}** Robux (priced at **{}**). \
             Split larger amounts across several passes.",
            events::gross_price(PASS_NET_LIMIT)
        ),
    })
}

async fn handle_message(ctx: &serenity::Context, message: &serenity::Message) -> Result<()> {
    if message.author.bot {
        return Ok(());
    }
    let Some(reply) = pass_price_reply(&message.content) else {
        return Ok(());
    };
    tracing::debug!("Answering pass price request from {}", message.author.id);
    message.reply(ctx, reply).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_pass_price_reply() {
        assert!(pass_price_reply("taxa 100").unwrap().contains("**143**"));
        assert!(pass_price_reply("taxa 5000").unwrap().contains("**2858**"));
        let huge = pass_price_reply("taxa 99999999999999999999999").unwrap();
        assert_eq!(huge, pass_price_reply("taxa 5000").unwrap());
        assert!(pass_price_reply("hello there").is_none());
    }
}
