//! Staff event commands - riddles, phrase drops and reaction races.
//!
//! Riddles and drops watch the channel's messages for 60 seconds and pay the first
//! correct answer. The reaction race pays whoever clicks the button first.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{
                checks,
                components::{self, button, update_message},
            },
        },
        core::{collector::Step, events},
        errors::{Error, Result},
    };
    use futures::{StreamExt, stream::BoxStream};
    use poise::serenity_prelude as serenity;
    use std::time::Duration;
    use tokio::time::Instant;

    const REACTION_BUTTON: &str = "reaction_claim";

    /// Non-bot messages posted in the command's channel for `duration`.
    fn channel_messages(
        ctx: poise::Context<'_, BotData, Error>,
        duration: Duration,
    ) -> BoxStream<'static, serenity::Message> {
        serenity::MessageCollector::new(ctx.serenity_context())
            .channel_id(ctx.channel_id())
            .timeout(duration)
            .filter(|message| !message.author.bot)
            .stream()
            .boxed()
    }

    /// Next message before `deadline`, or `None` once it passes.
    async fn next_before(
        messages: &mut BoxStream<'static, serenity::Message>,
        deadline: Instant,
    ) -> Option<serenity::Message> {
        tokio::time::timeout_at(deadline, messages.next())
            .await
            .ok()
            .flatten()
    }

    fn is_booster(data: &BotData, message: &serenity::Message) -> bool {
        let roles: Vec<String> = message
            .member
            .as_ref()
            .map(|member| member.roles.iter().map(ToString::to_string).collect())
            .unwrap_or_default();
        data.settings.is_booster(roles.iter().map(String::as_str))
    }

    /// Starts a riddle: the first correct answer in this channel wins.
    #[poise::command(slash_command, check = "checks::is_staff")]
    pub async fn riddle(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "The question"] question: String,
        #[description = "The answer (case and accents are ignored)"] answer: String,
        #[description = "Points for the winner"] points: i64,
        #[description = "Hint shown with the question"] hint: Option<String>,
    ) -> Result<()> {
        events::validate_reward(points)?;
        if events::normalize_answer(&answer).is_empty() {
            return Err(Error::invalid_target(
                "The answer needs at least one letter or digit.",
            ));
        }

        let mut embed = serenity::CreateEmbed::default()
            .title("🧩 Riddle!")
            .description(question)
            .field("Prize", format!("{points} points (boosters get double)"), true)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Answer in this channel within {} seconds.",
                events::EVENT_TIMEOUT.as_secs()
            )))
            .color(0x008E_44AD);
        if let Some(hint) = hint {
            embed = embed.field("Hint", hint, true);
        }
        let mut messages = channel_messages(ctx, events::EVENT_TIMEOUT);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;

        let deadline = Instant::now() + events::EVENT_TIMEOUT;
        while let Some(message) = next_before(&mut messages, deadline).await {
            if !events::matches_answer(&message.content, &answer) {
                continue;
            }
            let data = ctx.data();
            let prize = events::boosted(points, is_booster(data, &message));
            let winner = message.author.id.to_string();
            let balance = events::award(&data.database, &winner, prize, true).await?;
            message
                .reply(
                    ctx,
                    format!(
                        "🎉 Correct! <@{winner}> wins **{prize}** points. Balance: **{balance}**"
                    ),
                )
                .await?;
            return Ok(());
        }

        ctx.say(format!("⌛ Nobody got it. The answer was **{answer}**."))
            .await?;
        Ok(())
    }

    /// Drops a phrase: the first member to type it exactly wins.
    #[poise::command(slash_command, rename = "drop", check = "checks::is_staff")]
    pub async fn drop_event(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Phrase to type"] phrase: String,
        #[description = "Points for the winner"] points: i64,
    ) -> Result<()> {
        events::validate_reward(points)?;
        let phrase = phrase.trim().to_string();
        if phrase.is_empty() {
            return Err(Error::invalid_target("The phrase can't be empty."));
        }

        let mut messages = channel_messages(ctx, events::EVENT_TIMEOUT);
        ctx.say(format!(
            "💸 **Drop!** The first to type `{phrase}` wins **{points}** points!"
        ))
        .await?;
        let posted = Instant::now();

        let deadline = posted + events::EVENT_TIMEOUT;
        while let Some(message) = next_before(&mut messages, deadline).await {
            if message.content.trim() != phrase {
                continue;
            }
            if events::looks_pasted(&phrase, posted.elapsed()) {
                tracing::info!("Ignored pasted drop answer from {}", message.author.id);
                continue;
            }
            let winner = message.author.id.to_string();
            let balance = events::award(&ctx.data().database, &winner, points, false).await?;
            message
                .reply(
                    ctx,
                    format!("🏆 <@{winner}> was the fastest and wins **{points}** points! Balance: **{balance}**"),
                )
                .await?;
            return Ok(());
        }

        ctx.say("⌛ Nobody typed the phrase in time.").await?;
        Ok(())
    }

    /// Starts a reaction race: the first click wins 10 points.
    #[poise::command(slash_command, check = "checks::is_staff")]
    pub async fn reaction(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .content(format!(
                        "⚡ **Reaction race!** First click wins **{}** points!",
                        events::REACTION_POINTS
                    ))
                    .components(vec![serenity::CreateActionRow::Buttons(vec![button(
                        REACTION_BUTTON,
                        "⚡ Click!",
                        serenity::ButtonStyle::Primary,
                    )])]),
            )
            .await?;
        let mut collector = components::collect_reply(
            ctx,
            &handle,
            std::iter::empty::<u64>(),
            [REACTION_BUTTON],
            events::REACTION_TIMEOUT,
            "⌛ Nobody clicked in time.",
        )
        .await?;

        loop {
            match collector.next().await? {
                Step::Acted(press) | Step::Rejected(press) => {
                    let winner = press.user.id.to_string();
                    let balance = events::award(
                        &ctx.data().database,
                        &winner,
                        events::REACTION_POINTS,
                        false,
                    )
                    .await?;
                    update_message(
                        ctx.serenity_context(),
                        &press,
                        serenity::CreateInteractionResponseMessage::new()
                            .content(format!(
                                "⚡ <@{winner}> clicked first and wins **{}** points! Balance: **{balance}**",
                                events::REACTION_POINTS
                            ))
                            .components(Vec::new()),
                    )
                    .await?;
                    return Ok(());
                }
                Step::Idle => {}
                Step::TimedOut => return Ok(()),
            }
        }
    }
}

// Re-export all commands
pub use inner::*;
