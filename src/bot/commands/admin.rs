//! Owner-only administration commands.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, handlers::checks},
        config::env,
        core::snapshot,
        errors::{Error, Result},
    };
    use poise::serenity_prelude as serenity;

    /// Exports every table as JSON and attaches the non-empty ones.
    #[poise::command(slash_command, check = "checks::is_owner")]
    pub async fn export(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        ctx.defer_ephemeral().await?;
        let data = ctx.data();
        let dir = env::snapshot_dir();
        let paths = snapshot::export(&data.database, &data.store, &dir).await?;
        if paths.is_empty() {
            ctx.say("📦 Every table is empty, nothing to export.").await?;
            return Ok(());
        }

        let mut reply = poise::CreateReply::default()
            .content(format!(
                "📦 Exported {} tables to `{}`.",
                paths.len(),
                dir.display()
            ))
            .ephemeral(true);
        for path in &paths {
            reply = reply.attachment(serenity::CreateAttachment::path(path).await?);
        }
        ctx.send(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
