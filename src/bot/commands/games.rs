//! Betting and minigame Discord commands - bet, blackjack, mines and rocket.
//!
//! Multi-step games keep their state in a core game struct and drive it from a
//! [`MessageCollector`](crate::bot::handlers::components::MessageCollector) bound
//! to the game message. Stakes are taken before the first message is sent.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            handlers::components::{self, button, reply_ephemeral, update_message},
        },
        core::{
            bet as bet_logic,
            blackjack::{self as blackjack_logic, BlackjackGame, Outcome, format_hand, hand_value},
            collector::Step,
            cooldown,
            mines::{self as mines_logic, GRID_SIDE, MinesGame, Reveal},
            rocket::{self as rocket_logic, RocketGame, Tick},
        },
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;
    use tokio::time::Instant;

    const ACCEPT: &str = "bet_accept";
    const DECLINE: &str = "bet_decline";
    const HIT: &str = "blackjack_hit";
    const STAND: &str = "blackjack_stand";
    const DOUBLE: &str = "blackjack_double";
    const CASH_OUT: &str = "mines_cash_out";
    const STOP: &str = "rocket_stop";

    /// Bets points against the house or another member.
    #[poise::command(slash_command, subcommands("bet_house", "bet_user"), subcommand_required)]
    pub async fn bet(_ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        Ok(())
    }

    /// Bets against the house. The house wins 90% of the time.
    #[poise::command(slash_command, rename = "house")]
    pub async fn bet_house(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Points to wager"] amount: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let player_id = ctx.author().id.to_string();
        let result = bet_logic::settle_house_bet(
            &data.database,
            &player_id,
            &data.house_id,
            amount,
            rand::random(),
            chrono::Utc::now(),
        )
        .await?;

        let (title, color, balance): (&str, u32, i64) = if result.is_winner(&player_id) {
            ("🎉 You beat the house!", 0x002E_CC71, result.winner_balance)
        } else {
            ("🏦 The house wins", 0x00E7_4C3C, result.loser_balance)
        };
        let embed = serenity::CreateEmbed::default()
            .title(title)
            .description(format!(
                "Wager: **{amount}** points\nYour balance: **{balance}**"
            ))
            .color(color);
        ctx.send(poise::CreateReply::default().embed(embed)).await?;
        Ok(())
    }

    /// Challenges another member to a 50/50 bet.
    #[poise::command(slash_command, rename = "user")]
    pub async fn bet_user(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Who to challenge"] opponent: serenity::User,
        #[description = "Points to wager"] amount: i64,
    ) -> Result<()> {
        if opponent.bot {
            return Err(Error::invalid_target(
                "Bots don't take bets. Use `/bet house` instead.",
            ));
        }
        let data = ctx.data();
        let challenger_id = ctx.author().id.to_string();
        let opponent_id = opponent.id.to_string();
        let now = chrono::Utc::now();
        cooldown::check(&data.database, &challenger_id, "bet", bet_logic::COOLDOWN, now).await?;
        bet_logic::validate_challenge(&data.database, &challenger_id, &opponent_id, amount)
            .await?;

        let buttons = serenity::CreateActionRow::Buttons(vec![
            button(ACCEPT, "✅ Accept", serenity::ButtonStyle::Success),
            button(DECLINE, "❌ Decline", serenity::ButtonStyle::Danger),
        ]);
        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .content(format!(
                        "🎲 <@{opponent_id}>, <@{challenger_id}> challenges you to a bet of **{amount}** points! \
                         You have {} seconds to answer.",
                        bet_logic::CHALLENGE_TIMEOUT.as_secs()
                    ))
                    .components(vec![buttons]),
            )
            .await?;

        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [opponent.id.get()],
            [ACCEPT, DECLINE],
            bet_logic::CHALLENGE_TIMEOUT,
            "⌛ The challenge expired without an answer.",
        )
        .await?;

        loop {
            match collector.next().await? {
                Step::Acted(press) if press.data.custom_id == ACCEPT => {
                    let result = bet_logic::settle_challenge(
                        &data.database,
                        &challenger_id,
                        &opponent_id,
                        amount,
                        rand::random(),
                    )
                    .await;
                    let content = match result {
                        Ok(result) => {
                            cooldown::record(&data.database, &challenger_id, "bet", now).await?;
                            format!(
                                "🏆 <@{}> won **{amount}** points from <@{}>!\n\
                                 Balances: <@{}> {} | <@{}> {}",
                                result.winner_id,
                                result.loser_id,
                                result.winner_id,
                                result.winner_balance,
                                result.loser_id,
                                result.loser_balance
                            )
                        }
                        Err(e) if e.is_rejection() => format!("❌ The bet was cancelled: {e}"),
                        Err(e) => return Err(e),
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
                Step::Acted(press) => {
                    update_message(
                        ctx.serenity_context(),
                        &press,
                        serenity::CreateInteractionResponseMessage::new()
                            .content(format!("🙅 <@{opponent_id}> declined the bet."))
                            .components(Vec::new()),
                    )
                    .await?;
                    return Ok(());
                }
                Step::Rejected(press) => {
                    reply_ephemeral(ctx.serenity_context(), &press, "This challenge isn't for you.")
                        .await?;
                }
                Step::Idle => {}
                Step::TimedOut => return Ok(()),
            }
        }
    }

    fn blackjack_embed(game: &BlackjackGame, reveal_dealer: bool) -> serenity::CreateEmbed {
        let player = game.player_hand();
        let dealer = game.dealer_hand();
        let dealer_text = if reveal_dealer {
            format!("{} ({})", format_hand(dealer), hand_value(dealer))
        } else {
            format!("{} ??", format_hand(&dealer[..1.min(dealer.len())]))
        };
        serenity::CreateEmbed::default()
            .title("🃏 Blackjack")
            .field(
                "Your hand",
                format!("{} ({})", format_hand(player), hand_value(player)),
                false,
            )
            .field("Dealer", dealer_text, false)
            .field("Stake", game.total_stake().to_string(), true)
            .color(0x0034_98DB)
    }

    fn blackjack_buttons(game: &BlackjackGame) -> serenity::CreateActionRow {
        serenity::CreateActionRow::Buttons(vec![
            button(HIT, "Hit", serenity::ButtonStyle::Primary),
            button(STAND, "Stand", serenity::ButtonStyle::Secondary),
            button(DOUBLE, "Double down", serenity::ButtonStyle::Success)
                .disabled(!game.can_double_down()),
        ])
    }

    /// Plays blackjack against the dealer (10% house commission).
    #[poise::command(slash_command)]
    pub async fn blackjack(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Points to wager (minimum 50)"] bet: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        blackjack_logic::start(&data.database, &user_id, bet, chrono::Utc::now()).await?;
        let mut game = BlackjackGame::deal(bet, &mut rand::thread_rng());

        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .embed(blackjack_embed(&game, false))
                    .components(vec![blackjack_buttons(&game)]),
            )
            .await?;
        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            [HIT, STAND, DOUBLE],
            blackjack_logic::GAME_TIMEOUT,
            "⌛ Time's up! The game was cancelled.",
        )
        .await?;

        let (press, outcome) = loop {
            let press = match collector.next().await? {
                Step::Acted(press) => press,
                Step::Rejected(press) => {
                    reply_ephemeral(ctx.serenity_context(), &press, "This isn't your game.")
                        .await?;
                    continue;
                }
                Step::Idle => continue,
                Step::TimedOut => {
                    let balance =
                        blackjack_logic::refund(&data.database, &user_id, game.total_stake())
                            .await?;
                    ctx.say(format!(
                        "⌛ <@{user_id}>, your blackjack game timed out. Your stake of **{}** was \
                         returned (balance: **{balance}**).",
                        game.total_stake()
                    ))
                    .await?;
                    return Ok(());
                }
            };

            let action = press.data.custom_id.clone();
            match action.as_str() {
                HIT => {
                    if let Some(outcome) = game.hit() {
                        break (press, outcome);
                    }
                }
                STAND => break (press, game.stand()),
                _ => {
                    if !game.can_double_down() {
                        reply_ephemeral(
                            ctx.serenity_context(),
                            &press,
                            "You can only double down on your first move.",
                        )
                        .await?;
                        continue;
                    }
                    match blackjack_logic::take_double_down_stake(&data.database, &user_id, bet)
                        .await
                    {
                        Ok(_) => break (press, game.double_down()?),
                        Err(e) if e.is_rejection() => {
                            reply_ephemeral(ctx.serenity_context(), &press, format!("❌ {e}"))
                                .await?;
                            continue;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }

            update_message(
                ctx.serenity_context(),
                &press,
                serenity::CreateInteractionResponseMessage::new()
                    .embed(blackjack_embed(&game, false))
                    .components(vec![blackjack_buttons(&game)]),
            )
            .await?;
        };

        let settlement = blackjack_logic::settle(
            &data.database,
            &user_id,
            &data.house_id,
            game.total_stake(),
            outcome,
        )
        .await?;
        let verdict = match outcome {
            Outcome::Win => format!(
                "🎉 You win **{}** points (after a **{}** point commission)!",
                settlement.net, settlement.commission
            ),
            Outcome::Loss => format!("💀 You lose **{}** points.", -settlement.net),
            Outcome::Push => "🤝 Push! Your stake was returned.".to_string(),
        };
        update_message(
            ctx.serenity_context(),
            &press,
            serenity::CreateInteractionResponseMessage::new()
                .content(format!("{verdict}\nBalance: **{}**", settlement.balance))
                .embed(blackjack_embed(&game, true))
                .components(Vec::new()),
        )
        .await?;
        Ok(())
    }

    fn mines_grid(game: &MinesGame, finished: bool) -> Vec<serenity::CreateActionRow> {
        let mut rows: Vec<serenity::CreateActionRow> = (0..GRID_SIDE)
            .map(|row| {
                let buttons = (0..GRID_SIDE)
                    .map(|col| {
                        let cell = row * GRID_SIDE + col;
                        let id = format!("mines_{cell}");
                        if game.is_revealed(cell) && !game.is_bomb(cell) {
                            button(id, "💎", serenity::ButtonStyle::Success).disabled(true)
                        } else if (finished || game.is_revealed(cell)) && game.is_bomb(cell) {
                            button(id, "💣", serenity::ButtonStyle::Danger).disabled(true)
                        } else {
                            button(id, "❓", serenity::ButtonStyle::Secondary).disabled(finished)
                        }
                    })
                    .collect();
                serenity::CreateActionRow::Buttons(buttons)
            })
            .collect();
        if !finished {
            rows.push(serenity::CreateActionRow::Buttons(vec![button(
                CASH_OUT,
                "💰 Cash out",
                serenity::ButtonStyle::Primary,
            )]));
        }
        rows
    }

    fn mines_status(game: &MinesGame) -> String {
        format!(
            "💎 Diamonds: **{}** | Cash-out value: **{}** points",
            game.diamonds(),
            game.winnings()
        )
    }

    /// Plays mines: find diamonds on a 3x3 grid hiding 2 bombs.
    #[poise::command(slash_command)]
    pub async fn mines(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Points to wager (minimum 50)"] bet: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        mines_logic::start(&data.database, &user_id, bet).await?;
        let mut game = MinesGame::new(bet, &mut rand::thread_rng());

        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .content(format!("💣 **Mines** (stake {bet})\n{}", mines_status(&game)))
                    .components(mines_grid(&game, false)),
            )
            .await?;
        let cell_ids: Vec<String> = (0..mines_logic::CELL_COUNT)
            .map(|cell| format!("mines_{cell}"))
            .chain(std::iter::once(CASH_OUT.to_string()))
            .collect();
        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            cell_ids,
            mines_logic::GAME_TIMEOUT,
            "⌛ Time's up! Your diamonds were cashed out automatically.",
        )
        .await?;

        loop {
            let press = match collector.next().await? {
                Step::Acted(press) => press,
                Step::Rejected(press) => {
                    reply_ephemeral(ctx.serenity_context(), &press, "This isn't your game.")
                        .await?;
                    continue;
                }
                Step::Idle => continue,
                Step::TimedOut => {
                    let balance =
                        mines_logic::pay_out(&data.database, &user_id, game.winnings()).await?;
                    ctx.say(format!(
                        "⌛ <@{user_id}>, your mines game timed out and paid **{}** points \
                         (balance: **{balance}**).",
                        game.winnings()
                    ))
                    .await?;
                    return Ok(());
                }
            };

            let content = if press.data.custom_id == CASH_OUT {
                match game.cash_out_value() {
                    Ok(winnings) => {
                        let balance =
                            mines_logic::pay_out(&data.database, &user_id, winnings).await?;
                        Some(format!(
                            "💰 You cashed out **{winnings}** points! Balance: **{balance}**"
                        ))
                    }
                    Err(e) => {
                        reply_ephemeral(ctx.serenity_context(), &press, format!("❌ {e}"))
                            .await?;
                        continue;
                    }
                }
            } else {
                let cell = press
                    .data
                    .custom_id
                    .trim_start_matches("mines_")
                    .parse::<usize>()
                    .unwrap_or(usize::MAX);
                match game.reveal(cell) {
                    Reveal::Bomb => Some(format!("💥 Boom! You hit a bomb and lost **{bet}** points.")),
                    Reveal::Diamond if game.is_cleared() => {
                        let winnings = game.winnings();
                        let balance =
                            mines_logic::pay_out(&data.database, &user_id, winnings).await?;
                        Some(format!(
                            "🏆 You found every diamond and won **{winnings}** points! Balance: **{balance}**"
                        ))
                    }
                    Reveal::Diamond | Reveal::Ignored => None,
                }
            };

            let finished = content.is_some();
            let text = content.unwrap_or_else(|| {
                format!("💣 **Mines** (stake {bet})\n{}", mines_status(&game))
            });
            update_message(
                ctx.serenity_context(),
                &press,
                serenity::CreateInteractionResponseMessage::new()
                    .content(text)
                    .components(mines_grid(&game, finished)),
            )
            .await?;
            if finished {
                return Ok(());
            }
        }
    }

    fn rocket_text(game: &RocketGame, bet: i64) -> String {
        format!(
            "🚀 **Rocket** (stake {bet})\nAltitude: **{}** | Prize so far: **{}** points\n\
             Press stop before it crashes!",
            game.altitude(),
            game.accumulated()
        )
    }

    /// Rides the rocket: the prize grows every second until you stop or it crashes.
    #[poise::command(slash_command)]
    pub async fn rocket(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Points to wager (minimum 50)"] bet: i64,
    ) -> Result<()> {
        let data = ctx.data();
        let user_id = ctx.author().id.to_string();
        rocket_logic::start(&data.database, &user_id, bet, chrono::Utc::now()).await?;
        let mut game = RocketGame::new(bet);

        let stop_row = || {
            serenity::CreateActionRow::Buttons(vec![button(
                STOP,
                "🛑 Stop",
                serenity::ButtonStyle::Danger,
            )])
        };
        let handle = ctx
            .send(
                poise::CreateReply::default()
                    .content(rocket_text(&game, bet))
                    .components(vec![stop_row()]),
            )
            .await?;
        let mut collector = components::collect_reply(
            ctx,
            &handle,
            [ctx.author().id.get()],
            [STOP],
            rocket_logic::GAME_TIMEOUT,
            "⌛ The rocket flew out of sight. Your stake was lost.",
        )
        .await?;

        let mut next_tick = Instant::now() + rocket_logic::TICK;
        loop {
            match collector.next_until(next_tick).await? {
                Step::Idle => {
                    next_tick += rocket_logic::TICK;
                    if game.tick(rand::random()) == Tick::Crashed {
                        handle
                            .edit(
                                ctx,
                                poise::CreateReply::default()
                                    .content(format!(
                                        "💥 The rocket crashed at altitude **{}**! You lost **{bet}** points.",
                                        game.altitude()
                                    ))
                                    .components(Vec::new()),
                            )
                            .await?;
                        return Ok(());
                    }
                    handle
                        .edit(
                            ctx,
                            poise::CreateReply::default()
                                .content(rocket_text(&game, bet))
                                .components(vec![stop_row()]),
                        )
                        .await?;
                }
                Step::Acted(press) => {
                    let balance = rocket_logic::cash_out(&data.database, &user_id, &game).await?;
                    update_message(
                        ctx.serenity_context(),
                        &press,
                        serenity::CreateInteractionResponseMessage::new()
                            .content(format!(
                                "🪂 You bailed out at altitude **{}** and won **{}** points! Balance: **{balance}**",
                                game.altitude(),
                                game.accumulated()
                            ))
                            .components(Vec::new()),
                    )
                    .await?;
                    return Ok(());
                }
                Step::Rejected(press) => {
                    reply_ephemeral(ctx.serenity_context(), &press, "This isn't your rocket.")
                        .await?;
                }
                Step::TimedOut => {
                    tracing::info!("Rocket game of {user_id} timed out");
                    return Ok(());
                }
            }
        }
    }
}

// Re-export all commands
pub use inner::*;
