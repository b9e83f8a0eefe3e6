//! Poise framework setup: the command registry, the error hook and the client.

use crate::{
    bot::{
        BotData, commands,
        handlers::{income, listener},
    },
    config::{env::Secrets, settings::AppConfig},
    core::store::RecordStore,
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::{collections::HashSet, sync::Arc};
use tracing::{error, info, warn};

/// Generic reply for unexpected failures.
const FAILURE_MESSAGE: &str = "❌ Something went wrong while running this command.";

/// Keeps the first command of each name, logging and dropping later duplicates.
fn dedup_by_name(
    all: Vec<poise::Command<BotData, Error>>,
) -> Vec<poise::Command<BotData, Error>> {
    let mut seen = HashSet::new();
    all.into_iter()
        .filter(|command| {
            let fresh = seen.insert(command.name.clone());
            if !fresh {
                warn!("Duplicate command `{}` dropped from the registry", command.name);
            }
            fresh
        })
        .collect()
}

/// Every slash command the bot registers, unique by name.
#[must_use]
pub fn command_registry() -> Vec<poise::Command<BotData, Error>> {
    dedup_by_name(vec![
        commands::ping(),
        commands::help(),
        commands::points(),
        commands::pix(),
        commands::claim(),
        commands::rob(),
        commands::leaderboard(),
        commands::stats(),
        commands::purchases(),
        commands::robberies(),
        commands::bet(),
        commands::blackjack(),
        commands::mines(),
        commands::rocket(),
        commands::faction(),
        commands::conquer(),
        commands::territories(),
        commands::shop(),
        commands::check(),
        commands::riddle(),
        commands::drop_event(),
        commands::reaction(),
        commands::export(),
    ])
}

async fn say_ephemeral(ctx: poise::Context<'_, BotData, Error>, content: String) {
    let reply = poise::CreateReply::default().content(content).ephemeral(true);
    if let Err(e) = ctx.send(reply).await {
        error!("Failed to send error message: {e}");
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {error:?}");
        }
        poise::FrameworkError::Command { error, ctx, .. } if error.is_rejection() => {
            info!("Command `{}` rejected: {error}", ctx.command().name);
            say_ephemeral(ctx, format!("❌ {error}")).await;
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Error in command `{}`: {error:?}", ctx.command().name);
            say_ephemeral(ctx, FAILURE_MESSAGE.to_string()).await;
        }
        poise::FrameworkError::CommandCheckFailed { error, ctx, .. } => {
            if let Some(error) = error {
                error!("Check for `{}` failed: {error:?}", ctx.command().name);
            }
            say_ephemeral(ctx, format!("🔒 {}", Error::PermissionDenied)).await;
        }
        poise::FrameworkError::UnknownInteraction {
            ctx, interaction, ..
        } => {
            warn!("Received unknown command `{}`", interaction.data.name);
            let response = serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content("❓ Command not found.")
                    .ephemeral(true),
            );
            if let Err(e) = interaction.create_response(ctx, response).await {
                error!("Failed to answer unknown command: {e}");
            }
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {e}");
            }
        }
    }
}

/// Builds the framework and runs the client until it stops.
///
/// # Errors
/// Returns an error if the client can't be created or the gateway connection fails.
pub async fn run_bot(
    secrets: Secrets,
    settings: Arc<AppConfig>,
    database: DatabaseConnection,
) -> Result<()> {
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: command_registry(),
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(listener::handle_event(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                info!("Registering commands globally...");
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                income::spawn_income_task(database.clone());
                Ok(BotData::new(
                    database,
                    settings,
                    RecordStore::new(),
                    ready.user.id.to_string(),
                ))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&secrets.token, intents)
        .application_id(serenity::ApplicationId::new(secrets.application_id))
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {e:?}"))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {e:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_names_are_unique() {
        let registry = command_registry();
        let names: HashSet<&str> = registry.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), registry.len());
        for expected in ["bet", "blackjack", "faction", "shop", "export"] {
            assert!(names.contains(expected), "missing {expected}");
        }
    }

    #[test]
    fn test_duplicates_are_dropped() {
        let deduped = dedup_by_name(vec![commands::ping(), commands::help(), commands::ping()]);
        let names: Vec<&str> = deduped.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "help"]);
    }
}
