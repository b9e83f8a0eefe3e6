//! Faction and territory Discord commands.
//!
//! `/faction` groups the membership subcommands. Joining goes through the leader,
//! who accepts or declines a request posted in the configured requests channel.
//! `/conquer` and `/territories` fight over the configured areas.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{
                autocomplete::{autocomplete_faction_name, autocomplete_territory},
                components::{self, button, reply_ephemeral, update_message},
            },
        },
        core::{
            collector::Step,
            faction::{self as faction_logic, Departure, FactionSummary},
            territory,
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use std::{collections::HashMap, fmt::Write, time::Duration};

    const ACCEPT: &str = "faction_accept";
    const DECLINE: &str = "faction_decline";
    const CONFIRM: &str = "faction_confirm";
    const CANCEL: &str = "faction_cancel";
    /// How long the ranking's page buttons stay active
    const PAGINATION_TIMEOUT: Duration = Duration::from_secs(60);

    /// Parses a stored Discord ID, mapping garbage to an ID nobody has.
    fn snowflake(id: &str) -> u64 {
        id.parse().unwrap_or_default()
    }

    /// Manages factions.
    #[poise::command(
        slash_command,
        subcommands(
            "faction_create",
            "faction_join",
            "faction_leave",
            "faction_kick",
            "faction_info",
            "faction_list"
        ),
        subcommand_required
    )]
    pub async fn faction(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Founds a new faction (costs 300 points).
    #[poise::command(slash_command, rename = "create")]
    pub async fn faction_create(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Faction name"] name: String,
        #[description = "What the faction is about"] description: String,
        #[description = "Image shown on the faction card"] image_url: Option<String>,
    ) -> Result<()> {
        let created = faction_logic::create(
            &ctx.data().database,
            &ctx.author().id.to_string(),
            &name,
            &description,
            image_url,
        )
        .await?;
        ctx.say(format!(
            "🏴 Faction **{}** founded for {} points! Invite members with `/faction join`.",
            created.name,
            faction_logic::CREATION_COST
        ))
        .await?;
        Ok(())
    }

    /// Asks a faction's leader to let you in.
    #[poise::command(slash_command, rename = "join")]
    pub async fn faction_join(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Faction to join"]
        #[autocomplete = "autocomplete_faction_name"]
        name: String,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let target = faction_logic::validate_join(&data.database, &user_id, &name).await?;

        let channel = data
            .settings
            .faction_requests_channel_id
            .as_deref()
            .map(snowflake)
            .filter(|id| *id != 0)
            .map_or_else(|| ctx.channel_id(), serenity::ChannelId::new);
        let buttons = serenity::CreateActionRow::Buttons(vec![
            button(ACCEPT, "✅ Accept", serenity::ButtonStyle::Success),
            button(DECLINE, "❌ Decline", serenity::ButtonStyle::Danger),
        ]);
        let request = channel
            .send_message(
                ctx,
                serenity::CreateMessage::new()
                    .content(format!(
                        "📨 <@{}>, <@{user_id}> wants to join **{}**.",
                        target.leader_id, target.name
                    ))
                    .components(vec![buttons]),
            )
            .await?;
        ctx.send(
            poise::CreateReply::default()
                .content(format!(
                    "Your request to join **{}** was sent to its leader.",
                    target.name
                ))
                .ephemeral(true),
        )
        .await?;

        let mut collector = components::collect_on(
            ctx.serenity_context(),
            &request,
            [snowflake(&target.leader_id)],
            [ACCEPT, DECLINE],
            faction_logic::DECISION_TIMEOUT,
            format!("⌛ The request from <@{user_id}> to join **{}** expired.", target.name),
        );
        loop {
            match collector.next().await? {
                Step::Acted(press) => {
                    let content = if press.data.custom_id == ACCEPT {
                        match faction_logic::add_member(&data.database, target.id, &user_id).await {
                            Ok(()) => format!("✅ <@{user_id}> joined **{}**!", target.name),
                            Err(e) if e.is_rejection() => format!("❌ {e}"),
                            Err(e) => return Err(e),
                        }
                    } else {
                        format!(
                            "🚫 The request from <@{user_id}> to join **{}** was declined.",
                            target.name
                        )
                    };
                    update_message(
                        ctx.serenity_context(),
                        &press,
                        serenity::CreateInteractionResponseMessage::new()
                            .content(content)
                            .components(Vec::new()),
                    )
                    .await?;
                    return Ok(());
                }
                Step::Rejected(press) => {
                    reply_ephemeral(
                        ctx.serenity_context(),
                        &press,
                        "Only the faction leader can answer this request.",
                    )
                    .await?;
                }
                Step::Idle => {}
                Step::TimedOut => return Ok(()),
            }
        }
    }

    /// Leaves your faction. Leaders disband it.
    #[poise::command(slash_command, rename = "leave")]
    pub async fn faction_leave(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        let led = match faction_logic::leave(&data.database, &user_id).await? {
            Departure::Left(left) => {
                ctx.say(format!("👋 You left **{}**.", left.name)).await?;
                return Ok(());
            }
            Departure::LeaderMustConfirm(led) => led,
        };

        let buttons = serenity::CreateActionRow::Buttons(vec![
            button(CONFIRM, "Disband", serenity::ButtonStyle::Danger),
            button(CANCEL, "Cancel", serenity::ButtonStyle::Secondary),
        ]);
        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .content(format!(
                        "⚠️ You lead **{}**. Leaving disbands the faction, removes every member \
                         and releases its territories. Are you sure?",
                        led.name
                    ))
                    .components(vec![buttons]),
            )
            .await?;
        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            [CONFIRM, CANCEL],
            faction_logic::DECISION_TIMEOUT,
            "⌛ No answer, the faction was kept.",
        )
        .await?;

        loop {
            match collector.next().await? {
                Step::Acted(press) => {
                    let content = if press.data.custom_id == CONFIRM {
                        let disbanded = faction_logic::disband(&data.database, &user_id).await?;
                        format!("💥 **{}** was disbanded.", disbanded.name)
                    } else {
                        format!("**{}** lives on.", led.name)
                    };
                    update_message(
                        ctx.serenity_context(),
                        &press,
                        serenity::CreateInteractionResponseMessage::new()
                            .content(content)
                            .components(Vec::new()),
                    )
                    .await?;
                    return Ok(());
                }
                Step::Rejected(press) => {
                    reply_ephemeral(ctx.serenity_context(), &press, "This isn't your decision.")
                        .await?;
                }
                Step::Idle => {}
                Step::TimedOut => return Ok(()),
            }
        }
    }

    /// Removes a member from the faction you lead.
    #[poise::command(slash_command, rename = "kick")]
    pub async fn faction_kick(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Member position as listed by /faction info"]
        #[min = 1]
        position: u32,
    ) -> Result<()> {
        let position = usize::try_from(position).unwrap_or(usize::MAX);
        let removed =
            faction_logic::kick(&ctx.data().database, &ctx.author().id.to_string(), position)
                .await?;
        ctx.say(format!("🥾 <@{removed}> was removed from your faction."))
            .await?;
        Ok(())
    }

    fn summary_embed(summary: &FactionSummary) -> Result<serenity::CreateEmbed> {
        let mut members = String::new();
        for (position, member) in (1..).zip(&summary.members) {
            let crown = if *member == summary.faction.leader_id {
                " 👑"
            } else {
                ""
            };
            writeln!(&mut members, "**{position}.** <@{member}>{crown}")?;
        }
        let territories = if summary.territories.is_empty() {
            "None".to_string()
        } else {
            summary.territories.join(", ")
        };

        let mut embed = serenity::CreateEmbed::default()
            .title(format!("🏴 {}", summary.faction.name))
            .description(summary.faction.description.clone())
            .field("Leader", format!("<@{}>", summary.faction.leader_id), true)
            .field("Total points", summary.total_points.to_string(), true)
            .field(
                format!(
                    "Members ({}/{})",
                    summary.members.len(),
                    faction_logic::MAX_MEMBERS
                ),
                members,
                false,
            )
            .field("Territories", territories, false)
            .color(0x00E6_7E22);
        if let Some(url) = &summary.faction.image_url {
            embed = embed.thumbnail(url.clone());
        }
        Ok(embed)
    }

    /// Shows a faction's members, points and territories.
    #[poise::command(slash_command, rename = "info")]
    pub async fn faction_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Faction to show"]
        #[autocomplete = "autocomplete_faction_name"]
        name: String,
    ) -> Result<()> {
        let summary = faction_logic::summary(&ctx.data().database, &name).await?;
        ctx.send(poise::CreateReply::default().embed(summary_embed(&summary)?))
            .await?;
        Ok(())
    }

    fn ranking_embed(
        ranked: &[FactionSummary],
        page: u64,
        pages: u64,
    ) -> Result<serenity::CreateEmbed> {
        let per_page = faction_logic::PAGE_SIZE;
        let start = usize::try_from(page).unwrap_or(usize::MAX).saturating_mul(per_page);
        let mut description = String::new();
        for (position, summary) in (start + 1..).zip(ranked.iter().skip(start).take(per_page)) {
            writeln!(
                &mut description,
                "**{position}. {}** - {} points, {} members, {} territories",
                summary.faction.name,
                summary.total_points,
                summary.members.len(),
                summary.territories.len()
            )?;
        }
        if description.is_empty() {
            description.push_str("No factions yet. Found one with `/faction create`.");
        }
        Ok(serenity::CreateEmbed::default()
            .title("🏴 Factions")
            .description(description)
            .color(0x00E6_7E22)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Page {}/{pages}",
                page + 1
            ))))
    }

    /// Ranks factions by the total points of their members.
    #[poise::command(slash_command, rename = "list")]
    pub async fn faction_list(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let ranked = faction_logic::ranked(&ctx.data().database).await?;
        let pages = components::page_count(ranked.len() as u64, faction_logic::PAGE_SIZE as u64);

        let mut page = 0;
        let mut reply = poise::CreateReply::default().embed(ranking_embed(&ranked, page, pages)?);
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
            update_message(
                ctx.serenity_context(),
                &press,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(ranking_embed(&ranked, page, pages)?)
                    .components(vec![components::pagination_row(page, pages)]),
            )
            .await?;
        }
        Ok(())
    }

    /// Tries to capture a territory for your faction (75% chance, once per hour per area).
    #[poise::command(slash_command)]
    pub async fn conquer(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Territory to attack"]
        #[autocomplete = "autocomplete_territory"]
        area: String,
    ) -> Result<()> {
        let conquest = territory::conquer(
            &ctx.data().database,
            &ctx.author().id.to_string(),
            &area,
            rand::random(),
            chrono::Utc::now(),
        )
        .await?;

        if !conquest.success {
            ctx.say(format!(
                "🛡️ **{}** resisted the attack of **{}**. Try again in an hour.",
                conquest.territory, conquest.attacker.name
            ))
            .await?;
            return Ok(());
        }
        ctx.say(format!(
            "⚔️ **{}** conquered **{}**!",
            conquest.attacker.name, conquest.territory
        ))
        .await?;

        if let Some(previous) = conquest.previous {
            let notice = serenity::CreateMessage::new().content(format!(
                "⚔️ Your faction **{}** lost **{}** to **{}**.",
                previous.name, conquest.territory, conquest.attacker.name
            ));
            let leader = serenity::UserId::new(snowflake(&previous.leader_id).max(1));
            if let Err(e) = leader.direct_message(ctx, notice).await {
                tracing::warn!(
                    "Could not notify {} about losing {}: {e}",
                    previous.leader_id,
                    conquest.territory
                );
            }
        }
        Ok(())
    }

    /// Lists every territory and who controls it.
    #[poise::command(slash_command)]
    pub async fn territories(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let names: HashMap<i64, String> = faction_logic::all(db)
            .await?
            .into_iter()
            .map(|f| (f.id, f.name))
            .collect();

        let mut description = String::new();
        for area in territory::all(db).await? {
            let holder = area
                .faction_id
                .and_then(|id| names.get(&id))
                .map_or("Unclaimed", String::as_str);
            writeln!(&mut description, "🗺️ **{}**: {holder}", area.name)?;
        }
        if description.is_empty() {
            description.push_str("No territories are configured.");
        }

        let embed = serenity::CreateEmbed::default()
            .title("🗺️ Territories")
            .description(description)
            .footer(serenity::CreateEmbedFooter::new(format!(
                "Each held territory pays every faction member {} point every {} minutes.",
                territory::INCOME_PER_TERRITORY,
                territory::INCOME_INTERVAL.as_secs() / 60
            )))
            .color(0x0027_AE60);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
