//! General Discord commands - ping and help.
//! These commands don't touch the database.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::BotData,
        errors::{Error, Result},
    };

    /// Responds with "Pong!" to test bot connectivity.
    #[poise::command(slash_command)]
    pub async fn ping(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.say("Pong!").await?;
        Ok(())
    }

    /// Displays help information about available commands.
    #[poise::command(slash_command)]
    pub async fn help(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let help_text = "**SnooCredits Help**\n\
        Earn, bet and spend points with the rest of the server.\n\n\
        **Points**\n\
        • `/points [user]` - Shows a balance.\n\
        • `/pix <user> <amount>` - Sends points to someone.\n\
        • `/claim` - Claims free points every 5 hours (boosters get double).\n\
        • `/rob <user>` - Tries to steal up to 100 points (15 min cooldown).\n\
        • `/leaderboard`, `/stats [user]`, `/purchases [user]`, `/robberies` - Rankings and history.\n\n\
        **Games**\n\
        • `/bet house <amount>` or `/bet user <opponent> <amount>` - Bets against the house or a member.\n\
        • `/blackjack <bet>`, `/mines <bet>`, `/rocket <bet>` - Minigames (minimum 50).\n\n\
        **Factions**\n\
        • `/faction create|join|leave|kick|info|list` - Manage factions.\n\
        • `/conquer <territory>`, `/territories` - Fight over territories that pay income.\n\n\
        **Shop**\n\
        • `/shop` - Buys roles and vouchers. `/check <token>` - Checks a voucher.\n\n\
        Type `taxa <amount>` in any channel to get the pass price that nets that many Robux.";

        ctx.say(help_text).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
