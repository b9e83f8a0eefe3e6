//! Shop Discord commands - the catalog menu and voucher checks.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::{
                autocomplete::autocomplete_shop_item,
                checks,
                components::{self, reply_ephemeral, update_message},
            },
        },
        config::settings::{ItemKind, ShopItemConfig},
        core::{
            collector::Step,
            shop::{self as shop_logic, Receipt, TokenStatus},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    const MENU_ID: &str = "shop_menu";

    fn catalog_menu(catalog: &[ShopItemConfig]) -> serenity::CreateActionRow {
        let options = catalog
            .iter()
            .map(|item| {
                serenity::CreateSelectMenuOption::new(
                    format!("{} - {} points", item.name, item.price),
                    item.name.clone(),
                )
                .description(item.description.clone())
            })
            .collect();
        serenity::CreateActionRow::SelectMenu(
            serenity::CreateSelectMenu::new(
                MENU_ID,
                serenity::CreateSelectMenuKind::String { options },
            )
            .placeholder("Pick an item to buy"),
        )
    }

    fn role_of(item: &ShopItemConfig) -> Option<serenity::RoleId> {
        item.role_id
            .as_deref()
            .and_then(|id| id.trim().parse::<u64>().ok())
            .filter(|id| *id != 0)
            .map(serenity::RoleId::new)
    }

    /// Buys `item` and hands it out. Role items are granted here; if Discord refuses,
    /// the purchase is reverted.
    async fn buy(ctx: poise::Context<'_, BotData, Error>, item: &ShopItemConfig) -> Result<Receipt> {
        let db = &ctx.data().database;
        let user_id = ctx.author().id.to_string();
        if item.kind == ItemKind::Voucher {
            return shop_logic::purchase(db, &user_id, item, false, rand::random()).await;
        }

        let (Some(role), Some(guild_id)) = (role_of(item), ctx.guild_id()) else {
            return Err(Error::PurchaseRejected {
                reason: format!("**{}** can only be bought inside the server.", item.name),
            });
        };
        let held = checks::author_role_ids(ctx).await;
        let already_has_role = held.iter().any(|id| *id == role.to_string());
        let receipt =
            shop_logic::purchase(db, &user_id, item, already_has_role, rand::random()).await?;

        if let Err(e) = ctx
            .http()
            .add_member_role(guild_id, ctx.author().id, role, Some("Shop purchase"))
            .await
        {
            tracing::error!("Failed to grant role {role} to {user_id}: {e}");
            shop_logic::revert_purchase(db, &user_id, item).await?;
            return Err(Error::PurchaseRejected {
                reason: format!(
                    "I couldn't give you the **{}** role, so your points were refunded.",
                    item.name
                ),
            });
        }
        Ok(receipt)
    }

    fn receipt_text(buyer: serenity::UserId, receipt: &Receipt) -> String {
        format!(
            "✅ <@{buyer}> bought **{}** for **{}** points. Balance: **{}**",
            receipt.item, receipt.price, receipt.balance
        )
    }

    fn voucher_text(receipt: &Receipt, token: &str) -> String {
        format!(
            "🎟️ Your voucher for **{}**: `{token}`\nShow it to staff to redeem it.",
            receipt.item
        )
    }

    /// Opens the shop, or buys an item directly.
    #[poise::command(slash_command)]
    pub async fn shop(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Item to buy right away"]
        #[autocomplete = "autocomplete_shop_item"]
        item: Option<String>,
    ) -> Result<()> {
        let catalog = &ctx.data().settings.shop;
        if catalog.is_empty() {
            ctx.say("🛒 The shop is empty right now.").await?;
            return Ok(());
        }
        if let Some(name) = item {
            let item = shop_logic::find_item(catalog, &name).ok_or_else(|| {
                Error::invalid_target(format!("The shop doesn't sell '{name}'."))
            })?;
            let receipt = buy(ctx, item).await?;
            ctx.say(receipt_text(ctx.author().id, &receipt)).await?;
            if let Some(token) = &receipt.voucher {
                ctx.send(
                    poise::CreateReply::default()
                        .content(voucher_text(&receipt, token))
                        .ephemeral(true),
                )
                .await?;
            }
            return Ok(());
        }

        let embed = catalog.iter().fold(
            serenity::CreateEmbed::default()
                .title("🛒 Shop")
                .description("Every item can be bought once.")
                .color(0x001A_BC9C),
            |embed, item| {
                embed.field(
                    format!("{} ({} points)", item.name, item.price),
                    item.description.clone(),
                    false,
                )
            },
        );
        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .embed(embed)
                    .components(vec![catalog_menu(catalog)]),
            )
            .await?;
        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            [MENU_ID],
            shop_logic::MENU_TIMEOUT,
            "⌛ The shop closed.",
        )
        .await?;

        let press = loop {
            match collector.next().await? {
                Step::Acted(press) => break press,
                Step::Rejected(press) => {
                    reply_ephemeral(
                        ctx.serenity_context(),
                        &press,
                        "Open your own shop with `/shop`.",
                    )
                    .await?;
                }
                Step::Idle => {}
                Step::TimedOut => return Ok(()),
            }
        };

        let selected = match &press.data.kind {
            serenity::ComponentInteractionDataKind::StringSelect { values } => values.first(),
            _ => None,
        };
        let Some(item) = selected.and_then(|name| shop_logic::find_item(catalog, name)) else {
            update_message(
                ctx.serenity_context(),
                &press,
                serenity::CreateInteractionResponseMessage::new()
                    .content("❌ That item is no longer sold.")
                    .components(Vec::new()),
            )
            .await?;
            return Ok(());
        };

        let receipt = match buy(ctx, item).await {
            Ok(receipt) => receipt,
            Err(e) if e.is_rejection() => {
                update_message(
                    ctx.serenity_context(),
                    &press,
                    serenity::CreateInteractionResponseMessage::new()
                        .content(format!("❌ {e}"))
                        .components(Vec::new()),
                )
                .await?;
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        update_message(
            ctx.serenity_context(),
            &press,
            serenity::CreateInteractionResponseMessage::new()
                .content(receipt_text(ctx.author().id, &receipt))
                .embeds(Vec::new())
                .components(Vec::new()),
        )
        .await?;
        if let Some(token) = &receipt.voucher {
            press
                .create_followup(
                    ctx,
                    serenity::CreateInteractionResponseFollowup::new()
                        .content(voucher_text(&receipt, token))
                        .ephemeral(true),
                )
                .await?;
        }
        Ok(())
    }

    /// Checks whether a voucher token is valid.
    #[poise::command(slash_command)]
    pub async fn check(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Voucher token"] token: String,
    ) -> Result<()> {
        let content = match shop_logic::check_token(&ctx.data().database, &token).await? {
            TokenStatus::Unknown => "❌ That token doesn't exist.".to_string(),
            TokenStatus::Used(voucher) => format!(
                "⚠️ Token already used. Product: **{}**, owner: <@{}>.",
                voucher.product, voucher.owner_id
            ),
            TokenStatus::Valid(voucher) => format!(
                "✅ Valid token. Product: **{}**, owner: <@{}>.",
                voucher.product, voucher.owner_id
            ),
        };
        ctx.send(poise::CreateReply::default().content(content).ephemeral(true))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
