//! Territory control and the periodic income it pays.

use crate::{
    config::settings::TerritoryConfig,
    core::{faction, ledger},
    entities::{Faction, Territory, faction as faction_entity, territory},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use std::time::Duration;

/// Minimum time between two capture attempts on the same territory
pub const ATTEMPT_WINDOW: Duration = Duration::from_secs(60 * 60);
/// Chance that a capture attempt succeeds
pub const SUCCESS_CHANCE: f64 = 0.75;
/// Interval between income payouts
pub const INCOME_INTERVAL: Duration = Duration::from_secs(10 * 60);
/// Points paid to each member per controlled territory per payout
pub const INCOME_PER_TERRITORY: i64 = 1;

/// Inserts configured territories that are not in the database yet and refreshes names.
///
/// Returns how many territories were inserted.
pub async fn seed(db: &DatabaseConnection, configured: &[TerritoryConfig]) -> Result<usize> {
    let mut inserted = 0;
    for area in configured {
        match Territory::find_by_id(area.key.clone()).one(db).await? {
            Some(existing) if existing.name == area.name => {}
            Some(existing) => {
                let mut model: territory::ActiveModel = existing.into();
                model.name = Set(area.name.clone());
                model.update(db).await?;
            }
            None => {
                territory::ActiveModel {
                    key: Set(area.key.clone()),
                    name: Set(area.name.clone()),
                    faction_id: Set(None),
                    last_attempt_at: Set(None),
                }
                .insert(db)
                .await?;
                inserted += 1;
            }
        }
    }
    if inserted > 0 {
        tracing::info!("Seeded {inserted} new territories");
    }
    Ok(inserted)
}

/// All territories, alphabetically by display name.
pub async fn all<C>(db: &C) -> Result<Vec<territory::Model>>
where
    C: ConnectionTrait,
{
    Territory::find()
        .order_by_asc(territory::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a territory by key or display name, ignoring case and treating spaces as `_`.
pub async fn find<C>(db: &C, area: &str) -> Result<Option<territory::Model>>
where
    C: ConnectionTrait,
{
    let wanted = area.trim().to_lowercase();
    let wanted_key = wanted.replace(' ', "_");
    Ok(all(db)
        .await?
        .into_iter()
        .find(|t| t.key == wanted_key || t.name.to_lowercase() == wanted))
}

/// Outcome of a capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conquest {
    /// Display name of the territory
    pub territory: String,
    /// Whether the attacker's faction now controls it
    pub success: bool,
    /// The attacking faction
    pub attacker: faction_entity::Model,
    /// The faction that lost control, if control changed hands
    pub previous: Option<faction_entity::Model>,
}

/// Attempts to capture `area` for the caller's faction with a uniform `roll` in `[0, 1)`.
///
/// The attempt window is checked and stamped in the same transaction.
///
/// # Errors
/// Rejects callers without a faction, unknown territories and attempts inside
/// [`ATTEMPT_WINDOW`] of the previous one.
pub async fn conquer(
    db: &DatabaseConnection,
    user_id: &str,
    area: &str,
    roll: f64,
    now: DateTime<Utc>,
) -> Result<Conquest> {
    let txn = db.begin().await?;
    let attacker = faction::faction_of(&txn, user_id)
        .await?
        .ok_or_else(|| Error::faction_rule("You're not part of a faction!"))?;
    let target = find(&txn, area)
        .await?
        .ok_or_else(|| Error::invalid_target(format!("There is no territory called '{area}'.")))?;

    if let Some(last) = target.last_attempt_at {
        let elapsed = (now - last).to_std().unwrap_or_default();
        if elapsed < ATTEMPT_WINDOW {
            return Err(Error::CooldownActive {
                command: format!("conquer {}", target.name),
                remaining: ATTEMPT_WINDOW - elapsed,
            });
        }
    }

    let success = roll < SUCCESS_CHANCE;
    let previous = match target.faction_id {
        Some(id) if success && id != attacker.id => Faction::find_by_id(id).one(&txn).await?,
        _ => None,
    };

    let mut model: territory::ActiveModel = target.clone().into();
    model.last_attempt_at = Set(Some(now));
    if success {
        model.faction_id = Set(Some(attacker.id));
    }
    model.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        "Faction '{}' attempted to conquer {}: success={success}",
        attacker.name,
        target.name
    );
    Ok(Conquest {
        territory: target.name,
        success,
        attacker,
        previous,
    })
}

/// Pays every member of each controlling faction for each territory it holds.
///
/// Returns the total number of points paid.
pub async fn pay_income(db: &DatabaseConnection) -> Result<i64> {
    let held = Territory::find()
        .filter(territory::Column::FactionId.is_not_null())
        .all(db)
        .await?;

    let txn = db.begin().await?;
    let mut paid = 0;
    for area in &held {
        let Some(faction_id) = area.faction_id else {
            continue;
        };
        for member in faction::members(&txn, faction_id).await? {
            ledger::adjust(&txn, &member, INCOME_PER_TERRITORY).await?;
            paid += INCOME_PER_TERRITORY;
        }
    }
    txn.commit().await?;
    Ok(paid)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn areas() -> Vec<TerritoryConfig> {
        vec![
            TerritoryConfig {
                key: "sao_paulo".to_string(),
                name: "São Paulo".to_string(),
            },
            TerritoryConfig {
                key: "parana".to_string(),
                name: "Paraná".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(seed(&db, &areas()).await?, 2);
        assert_eq!(seed(&db, &areas()).await?, 0);
        assert_eq!(all(&db).await?.len(), 2);
        assert_eq!(find(&db, "sao paulo").await?.unwrap().key, "sao_paulo");
        assert_eq!(find(&db, "PARANÁ").await?.unwrap().key, "parana");
        Ok(())
    }

    #[tokio::test]
    async fn test_conquest_changes_hands_and_respects_window() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db, &areas()).await?;
        let red = create_test_faction(&db, "red", "Red").await?;
        create_test_faction(&db, "blue", "Blue").await?;
        let now = Utc::now();

        let first = conquer(&db, "red", "parana", 0.1, now).await?;
        assert!(first.success);
        assert!(first.previous.is_none());

        let err = conquer(&db, "blue", "parana", 0.1, now + chrono::Duration::minutes(30))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CooldownActive { .. }));
        let area = find(&db, "parana").await?.unwrap();
        assert_eq!(area.faction_id, Some(red.id));
        assert!(area.last_attempt_at.unwrap() < now + chrono::Duration::minutes(1));

        let second = conquer(&db, "blue", "parana", 0.1, now + chrono::Duration::minutes(61)).await?;
        assert!(second.success);
        assert_eq!(second.previous.unwrap().id, red.id);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_conquest_only_records_attempt() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db, &areas()).await?;
        create_test_faction(&db, "red", "Red").await?;

        let result = conquer(&db, "red", "sao_paulo", 0.9, Utc::now()).await?;
        assert!(!result.success);
        let area = find(&db, "sao_paulo").await?.unwrap();
        assert!(area.faction_id.is_none());
        assert!(area.last_attempt_at.is_some());

        assert!(conquer(&db, "loner", "parana", 0.1, Utc::now()).await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_income_pays_each_member_per_territory() -> Result<()> {
        let db = setup_test_db().await?;
        seed(&db, &areas()).await?;
        let red = create_test_faction(&db, "red", "Red").await?;
        faction::add_member(&db, red.id, "member").await?;
        let now = Utc::now();
        conquer(&db, "red", "parana", 0.0, now).await?;
        conquer(&db, "red", "sao_paulo", 0.0, now).await?;

        assert_eq!(pay_income(&db).await?, 4);
        assert_eq!(ledger::balance_of(&db, "member").await?, 2);
        assert_eq!(ledger::balance_of(&db, "red").await?, 2);
        Ok(())
    }
}
