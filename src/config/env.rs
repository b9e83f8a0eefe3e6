//! Environment configuration module.
//!
//! The bot token and application ID are secrets and must come from the environment
//! (or a `.env` file loaded by `dotenvy`). There is deliberately no default for either.

use crate::errors::{Error, Result};
use std::path::PathBuf;

/// Secrets and paths required to start the bot.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Discord bot token (`DISCORD_BOT_TOKEN`)
    pub token: String,
    /// Discord application ID (`DISCORD_APPLICATION_ID`)
    pub application_id: u64,
}

/// Reads a required, non-empty environment variable.
fn required_var(name: &str) -> Result<String> {
    let value = std::env::var(name).map_err(|e| {
        tracing::error!("{name} not found: {e}");
        Error::EnvVar(e)
    })?;
    if value.trim().is_empty() {
        return Err(Error::Config {
            message: format!("{name} is set but empty"),
        });
    }
    Ok(value)
}

/// Loads the bot token and application ID from the environment.
///
/// # Errors
/// Returns an error if either variable is missing or empty, or if the application ID
/// is not a valid snowflake.
pub fn load_secrets() -> Result<Secrets> {
    let token = required_var("DISCORD_BOT_TOKEN")?;
    let application_id = required_var("DISCORD_APPLICATION_ID")?
        .trim()
        .parse::<u64>()
        .map_err(|e| Error::Config {
            message: format!("DISCORD_APPLICATION_ID is not a valid ID: {e}"),
        })?;
    if application_id == 0 {
        return Err(Error::Config {
            message: "DISCORD_APPLICATION_ID can't be 0".to_string(),
        });
    }

    Ok(Secrets {
        token,
        application_id,
    })
}

/// Path of the TOML settings file (`CONFIG_PATH`, default `config.toml`).
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var("CONFIG_PATH").map_or_else(|_| PathBuf::from("config.toml"), PathBuf::from)
}

/// Directory holding the legacy flat-file stores to import, if configured (`LEGACY_DATA_DIR`).
#[must_use]
pub fn legacy_data_dir() -> Option<PathBuf> {
    std::env::var("LEGACY_DATA_DIR").ok().map(PathBuf::from)
}

/// Directory the `/export` command writes snapshots to (`SNAPSHOT_DIR`, default `data/snapshots`).
#[must_use]
pub fn snapshot_dir() -> PathBuf {
    std::env::var("SNAPSHOT_DIR")
        .map_or_else(|_| PathBuf::from("data/snapshots"), PathBuf::from)
}
