//! Economy Discord commands - balances, transfers, claims, robberies, rankings and history.
//!
//! Each command delegates the rules to `crate::core` and only formats the outcome.
//! Rejections (not enough points, cooldowns, invalid targets) are returned as errors
//! and answered by the framework's error hook.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{checks, components},
        },
        core::{claim as claim_logic, faction, history, ledger, robbery, shop},
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use rand::Rng;
    use std::{fmt::Write, time::Duration};

    /// Accounts shown per leaderboard page
    const LEADERBOARD_PAGE_SIZE: u64 = 10;
    /// Robberies shown per page
    const ROBBERIES_PAGE_SIZE: u64 = 5;
    /// How long page buttons stay active
    const PAGINATION_TIMEOUT: Duration = Duration::from_secs(60);

    fn timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
        format!("<t:{}:f>", at.timestamp())
    }

    /// Shows your balance or someone else's.
    #[poise::command(slash_command)]
    pub async fn points(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Whose balance to show (defaults to you)"] user: Option<serenity::User>,
    ) -> Result<()> {
        let target = user.as_ref().unwrap_or_else(|| ctx.author());
        let balance = ledger::balance_of(&ctx.data().database, &target.id.to_string()).await?;

        let embed = serenity::CreateEmbed::default()
            .title("💰 Points")
            .description(format!("<@{}> has **{balance}** points.", target.id))
            .color(0x00F1_C40F);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Sends points to another member.
    #[poise::command(slash_command)]
    pub async fn pix(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Who receives the points"] recipient: serenity::User,
        #[description = "How many points to send"] amount: i64,
    ) -> Result<()> {
        if recipient.bot {
            return Err(Error::invalid_target("You can't send points to bots."));
        }
        let sender_id = ctx.author().id.to_string();
        let receipt = ledger::transfer(
            &ctx.data().database,
            &sender_id,
            &recipient.id.to_string(),
            amount,
        )
        .await?;

        let embed = serenity::CreateEmbed::default()
            .title("💸 Transfer complete")
            .description(format!(
                "<@{sender_id}> sent **{amount}** points to <@{}>.",
                recipient.id
            ))
            .field("Your balance", receipt.sender_balance.to_string(), true)
            .field("Their balance", receipt.recipient_balance.to_string(), true)
            .color(0x002E_CC71);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Claims free points. Available every 5 hours; boosters get double.
    #[poise::command(slash_command)]
    pub async fn claim(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let user_id = ctx.author().id.to_string();
        let is_booster = checks::author_is_booster(ctx).await;
        let base_points = rand::thread_rng().gen_range(claim_logic::REWARD_RANGE);

        let result = claim_logic::claim(
            &ctx.data().database,
            &user_id,
            base_points,
            is_booster,
            chrono::Utc::now(),
        )
        .await?;

        let mut text = format!("🎁 You claimed **{}** points!", result.points);
        if result.doubled {
            text.push_str(" (doubled for boosting the server 💎)");
        }
        write!(&mut text, "\nYour balance is now **{}**.", result.balance)?;
        ctx.say(text).await?;
        Ok(())
    }

    /// Tries to steal points from another member.
    #[poise::command(slash_command)]
    pub async fn rob(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Who to rob"] target: serenity::User,
    ) -> Result<()> {
        let data = ctx.data();
        let robber_id = ctx.author().id.to_string();
        let target_id = target.id.to_string();
        let roll = robbery::RobberyRoll::random(&mut rand::thread_rng());

        let result = robbery::attempt(
            &data.database,
            &robber_id,
            robbery::Target {
                user_id: &target_id,
                is_bot: target.bot,
            },
            &data.settings.protected_user_ids,
            roll,
            chrono::Utc::now(),
        )
        .await?;

        let text = if result.success {
            format!(
                "🦹 You robbed <@{target_id}> and got away with **{}** points!\nYour balance: **{}**",
                result.moved, result.robber_balance
            )
        } else {
            format!(
                "🚓 You got caught robbing <@{target_id}> and paid them **{}** points.\nYour balance: **{}**",
                result.moved, result.robber_balance
            )
        };
        ctx.say(text).await?;
        Ok(())
    }

    async fn leaderboard_embed(
        data: &BotData,
        excluded: &[String],
        page: u64,
        pages: u64,
        caller_rank: Option<u64>,
    ) -> Result<serenity::CreateEmbed> {
        let accounts =
            ledger::ranking_page(&data.database, excluded, page, LEADERBOARD_PAGE_SIZE).await?;

        let mut description = String::new();
        for (offset, account) in (1..).zip(&accounts) {
            let position = page * LEADERBOARD_PAGE_SIZE + offset;
            let medal = match position {
                1 => "🥇",
                2 => "🥈",
                3 => "🥉",
                _ => "▫️",
            };
            writeln!(
                &mut description,
                "{medal} **{position}.** <@{}>: {} points",
                account.user_id, account.balance
            )?;
        }
        if description.is_empty() {
            description.push_str("Nobody has points yet.");
        }

        let rank = caller_rank.map_or_else(|| "unranked".to_string(), |r| format!("#{r}"));
        Ok(serenity::CreateEmbed::default()
            .title("🏆 Leaderboard")
            .description(description)
            .color(0x00F1_C40F)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Page {}/{pages} | Your rank: {rank}",
                page + 1
            ))))
    }

    /// Shows the richest members.
    #[poise::command(slash_command)]
    pub async fn leaderboard(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let excluded = data.leaderboard_excluded();
        let caller_rank =
            ledger::rank_of(&data.database, &ctx.author().id.to_string(), &excluded).await?;
        let total = ledger::ranked_count(&data.database, &excluded).await?;
        let pages = components::page_count(total, LEADERBOARD_PAGE_SIZE);

        let mut page = 0;
        let embed = leaderboard_embed(data, &excluded, page, pages, caller_rank).await?;
        let mut reply = poise::CreateReply::default().embed(embed);
        if pages > 1 {
            reply = reply.components(vec![components::pagination_row(page, pages)]);
        }
        let handle = ctx.send(reply).await?;
        if pages <= 1 {
            return Ok(());
        }

        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            [components::PREVIOUS_PAGE, components::NEXT_PAGE],
            PAGINATION_TIMEOUT,
            "⌛ Pagination expired.",
        )
        .await?;
        while let Some((press, next)) =
            components::next_page_turn(ctx.serenity_context(), &mut collector, page, pages).await?
        {
            page = next;
            let embed = leaderboard_embed(data, &excluded, page, pages, caller_rank).await?;
            components::update_message(
                ctx.serenity_context(),
                &press,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(vec![components::pagination_row(page, pages)]),
            )
            .await?;
        }
        Ok(())
    }

    /// Shows betting, robbery and riddle statistics.
    #[poise::command(slash_command)]
    pub async fn stats(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Whose stats to show (defaults to you)"] user: Option<serenity::User>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let target = user.as_ref().unwrap_or_else(|| ctx.author());
        let target_id = target.id.to_string();

        let balance = ledger::balance_of(db, &target_id).await?;
        let activity = history::activity_stats(db, &target_id).await?;
        let faction_name = faction::faction_of(db, &target_id)
            .await?
            .map_or_else(|| "None".to_string(), |f| f.name);

        let embed = serenity::CreateEmbed::default()
            .title(format!("📊 Stats for {}", target.name))
            .field("Points", balance.to_string(), true)
            .field("Faction", faction_name, true)
            .field("Riddles solved", activity.riddles_solved.to_string(), true)
            .field("Bets won", activity.bets_won.to_string(), true)
            .field("Bets lost", activity.bets_lost.to_string(), true)
            .field(
                "Points won betting",
                activity.points_won_betting.to_string(),
                true,
            )
            .field("Robberies", activity.robberies.to_string(), true)
            .field(
                "Failed robberies",
                activity.failed_robberies.to_string(),
                true,
            )
            .color(0x0034_98DB);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    async fn purchases_embed(
        data: &BotData,
        user_id: &str,
        page: u64,
    ) -> Result<(serenity::CreateEmbed, u64)> {
        let (records, total) =
            history::purchases_page(&data.database, user_id, page, shop::PAGE_SIZE).await?;
        let pages = components::page_count(total, shop::PAGE_SIZE);

        let mut description = String::new();
        for record in &records {
            writeln!(
                &mut description,
                "🛒 **{}** for {} points on {}",
                record.detail.as_deref().unwrap_or("Unknown item"),
                record.amount,
                timestamp(record.created_at)
            )?;
        }
        if description.is_empty() {
            description.push_str("No purchases yet.");
        }

        let embed = serenity::CreateEmbed::default()
            .title("🧾 Purchase history")
            .description(format!("<@{user_id}>\n\n{description}"))
            .color(0x009B_59B6)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Page {}/{pages}",
                page + 1
            )));
        Ok((embed, pages))
    }

    /// Shows the shop purchases of a member.
    #[poise::command(slash_command)]
    pub async fn purchases(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Whose purchases to show (defaults to you)"] user: Option<serenity::User>,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = user
            .as_ref()
            .unwrap_or_else(|| ctx.author())
            .id
            .to_string();

        let mut page = 0;
        let (embed, pages) = purchases_embed(data, &user_id, page).await?;
        let mut reply = poise::CreateReply::default().embed(embed);
        if pages > 1 {
            reply = reply.components(vec![components::pagination_row(page, pages)]);
        }
        let handle = ctx.send(reply).await?;
        if pages <= 1 {
            return Ok(());
        }

        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            [components::PREVIOUS_PAGE, components::NEXT_PAGE],
            PAGINATION_TIMEOUT,
            "⌛ Pagination expired.",
        )
        .await?;
        while let Some((press, next)) =
            components::next_page_turn(ctx.serenity_context(), &mut collector, page, pages).await?
        {
            page = next;
            let (embed, pages) = purchases_embed(data, &user_id, page).await?;
            components::update_message(
                ctx.serenity_context(),
                &press,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(vec![components::pagination_row(page, pages)]),
            )
            .await?;
        }
        Ok(())
    }

    async fn robberies_embed(
        data: &BotData,
        user_id: &str,
        page: u64,
    ) -> Result<(serenity::CreateEmbed, u64)> {
        let (records, total) =
            history::robberies_against_page(&data.database, user_id, page, ROBBERIES_PAGE_SIZE)
                .await?;
        let pages = components::page_count(total, ROBBERIES_PAGE_SIZE);

        let mut description = String::new();
        for record in &records {
            let line = if record.success {
                format!("🦹 <@{}> stole **{}** points", record.actor_id, record.amount)
            } else {
                format!(
                    "🚓 <@{}> failed and paid you **{}** points",
                    record.actor_id, record.amount
                )
            };
            writeln!(&mut description, "{line} ({})", timestamp(record.created_at))?;
        }
        if description.is_empty() {
            description.push_str("Nobody has tried to rob you yet.");
        }

        let embed = serenity::CreateEmbed::default()
            .title("🔓 Robberies against you")
            .description(description)
            .color(0x00E7_4C3C)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Page {}/{pages}",
                page + 1
            )));
        Ok((embed, pages))
    }

    /// Lists the robberies that targeted you, newest first.
    #[poise::command(slash_command)]
    pub async fn robberies(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();

        let mut page = 0;
        let (embed, pages) = robberies_embed(data, &user_id, page).await?;
        let mut reply = poise::CreateReply::default().embed(embed);
        if pages > 1 {
            reply = reply.components(vec![components::pagination_row(page, pages)]);
        }
        let handle = ctx.send(reply).await?;
        if pages <= 1 {
            return Ok(());
        }

        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            [components::PREVIOUS_PAGE, components::NEXT_PAGE],
            PAGINATION_TIMEOUT,
            "⌛ Pagination expired.",
        )
        .await?;
        while let Some((press, next)) =
            components::next_page_turn(ctx.serenity_context(), &mut collector, page, pages).await?
        {
            page = next;
            let (embed, pages) = robberies_embed(data, &user_id, page).await?;
            components::update_message(
                ctx.serenity_context(),
                &press,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(embed)
                    .components(vec![components::pagination_row(page, pages)]),
            )
            .await?;
        }
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
