//! Bot layer - Discord-specific interface and command handlers
//!
//! This module provides the Discord interface for `SnooCredits`, including all
//! slash commands, interaction handlers, the framework setup and the shared
//! context every command receives.

/// Discord command implementations (economy, games, factions, shop, events, admin)
pub mod commands;
/// Framework construction, command registry and error hook
pub mod framework;
/// Discord interaction handlers (autocomplete, components, messages, background tasks)
pub mod handlers;

use crate::{config::settings::AppConfig, core::store::RecordStore, errors::Error};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Shared data available to all bot commands.
/// This structure holds the database connection, the guild settings and the
/// record store used for JSON snapshots.
pub struct BotData {
    /// Database connection for all database operations
    pub database: DatabaseConnection,
    /// Guild settings loaded from `config.toml`
    pub settings: Arc<AppConfig>,
    /// JSON document store
    pub store: RecordStore,
    /// The bot's own user ID, which also holds the house balance
    pub house_id: String,
}

impl BotData {
    /// Creates a new `BotData` instance.
    #[must_use]
    pub const fn new(
        database: DatabaseConnection,
        settings: Arc<AppConfig>,
        store: RecordStore,
        house_id: String,
    ) -> Self {
        Self {
            database,
            settings,
            store,
            house_id,
        }
    }

    /// User IDs left out of the leaderboard: configured exclusions plus the house.
    #[must_use]
    pub fn leaderboard_excluded(&self) -> Vec<String> {
        let mut excluded = self.settings.leaderboard_excluded_ids.clone();
        excluded.push(self.house_id.clone());
        excluded
    }
}

/// Poise context used by every command.
pub type Context<'a> = poise::Context<'a, BotData, Error>;

pub use commands::*;
pub use handlers::*;
