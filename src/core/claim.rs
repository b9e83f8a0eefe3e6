//! Periodic free points (`/claim`).

use crate::{
    core::{cooldown, ledger},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::{ops::RangeInclusive, time::Duration};

/// Window between two claims
pub const COOLDOWN: Duration = Duration::from_secs(5 * 60 * 60);
/// Points granted per claim before the booster bonus
pub const REWARD_RANGE: RangeInclusive<i64> = 5..=35;

/// A granted claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimResult {
    /// Points granted
    pub points: i64,
    /// Whether the booster bonus doubled them
    pub doubled: bool,
    /// Balance afterwards
    pub balance: i64,
}

/// Grants `base_points` (doubled for boosters) if the cooldown allows it.
///
/// `base_points` is clamped into [`REWARD_RANGE`].
///
/// # Errors
/// Returns [`crate::errors::Error::CooldownActive`] inside the window; nothing is written then.
pub async fn claim(
    db: &DatabaseConnection,
    user_id: &str,
    base_points: i64,
    is_booster: bool,
    now: DateTime<Utc>,
) -> Result<ClaimResult> {
    let points = base_points.clamp(*REWARD_RANGE.start(), *REWARD_RANGE.end())
        * if is_booster { 2 } else { 1 };

    let txn = db.begin().await?;
    cooldown::check_and_record(&txn, user_id, "claim", COOLDOWN, now).await?;
    let balance = ledger::adjust(&txn, user_id, points).await?;
    txn.commit().await?;

    Ok(ClaimResult {
        points,
        doubled: is_booster,
        balance,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{errors::Error, test_utils::setup_test_db};

    #[tokio::test]
    async fn test_claim_respects_cooldown() -> Result<()> {
        let db = setup_test_db().await?;
        let now = Utc::now();

        let first = claim(&db, "A", 20, false, now).await?;
        assert_eq!(first.balance, 20);

        let err = claim(&db, "A", 20, false, now + chrono::Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CooldownActive { .. }));
        assert_eq!(ledger::balance_of(&db, "A").await?, 20);

        let later = claim(&db, "A", 5, false, now + chrono::Duration::hours(5)).await?;
        assert_eq!(later.balance, 25);
        Ok(())
    }

    #[tokio::test]
    async fn test_booster_doubles_and_range_is_clamped() -> Result<()> {
        let db = setup_test_db().await?;
        let result = claim(&db, "B", 100, true, Utc::now()).await?;
        assert_eq!(result.points, 70);
        assert!(result.doubled);
        Ok(())
    }
}
