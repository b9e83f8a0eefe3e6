//! Shared test utilities for `SnooCredits`.
//!
//! Helpers for an in-memory database and a few fixtures with sensible defaults.

use crate::{
    core::faction,
    entities::{Account, account, faction as faction_entity, territory},
    errors::Result,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Sets a user's balance, creating the account if needed.
pub async fn set_balance(db: &DatabaseConnection, user_id: &str, balance: i64) -> Result<()> {
    let now = chrono::Utc::now();
    match Account::find_by_id(user_id.to_string()).one(db).await? {
        Some(existing) => {
            let mut model: account::ActiveModel = existing.into();
            model.balance = Set(balance);
            model.updated_at = Set(now);
            model.update(db).await?;
        }
        None => {
            account::ActiveModel {
                user_id: Set(user_id.to_string()),
                balance: Set(balance),
                updated_at: Set(now),
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

/// Creates a faction led by `leader_id`.
///
/// # Defaults
/// * description: "Test faction"
/// * no image
/// * the leader is funded with exactly [`faction::CREATION_COST`], so ends at 0
pub async fn create_test_faction(
    db: &DatabaseConnection,
    leader_id: &str,
    name: &str,
) -> Result<faction_entity::Model> {
    set_balance(db, leader_id, faction::CREATION_COST).await?;
    faction::create(db, leader_id, name, "Test faction", None).await
}

/// Inserts a territory, optionally already held by a faction.
pub async fn seed_territory(
    db: &DatabaseConnection,
    key: &str,
    name: &str,
    faction_id: Option<i64>,
) -> Result<territory::Model> {
    territory::ActiveModel {
        key: Set(key.to_string()),
        name: Set(name.to_string()),
        faction_id: Set(faction_id),
        last_attempt_at: Set(None),
    }
    .insert(db)
    .await
    .map_err(Into::into)
}
