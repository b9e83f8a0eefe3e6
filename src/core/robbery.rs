//! Robbery attempts between users.
//!
//! A robber needs at least [`MINIMUM_HELD`] points and may try once every
//! [`COOLDOWN`]. The stake is a random amount up to [`MAX_STAKE`]. On success the
//! target loses up to the stake (never more than they hold) and the robber gains the
//! same; on failure the robber pays the stake to the target, again capped at what
//! the robber holds.

use crate::{
    core::{
        cooldown, faction,
        history::{self, HistoryKind, NewRecord},
        ledger,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::time::Duration;

/// Points the robber must hold to attempt a robbery
pub const MINIMUM_HELD: i64 = 100;
/// Cooldown between attempts
pub const COOLDOWN: Duration = Duration::from_secs(15 * 60);
/// Largest stake a single attempt can move
pub const MAX_STAKE: i64 = 100;
/// Success chance against a human
pub const SUCCESS_CHANCE: f64 = 0.5;
/// Success chance against a bot account
pub const SUCCESS_CHANCE_VS_BOT: f64 = 0.3;

/// Who is being robbed.
#[derive(Debug, Clone, Copy)]
pub struct Target<'a> {
    /// Discord user ID of the target
    pub user_id: &'a str,
    /// Whether the target is a bot account
    pub is_bot: bool,
}

/// Random inputs of one attempt.
#[derive(Debug, Clone, Copy)]
pub struct RobberyRoll {
    /// Stake in `0..=MAX_STAKE`
    pub stake: i64,
    /// Uniform draw in `[0, 1)` compared against the success chance
    pub chance: f64,
}

impl RobberyRoll {
    /// Draws a roll from `rng`.
    pub fn random(rng: &mut impl rand::Rng) -> Self {
        Self {
            stake: rng.gen_range(0..=MAX_STAKE),
            chance: rng.r#gen(),
        }
    }
}

/// Outcome of an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RobberyResult {
    /// Whether the robbery succeeded
    pub success: bool,
    /// Points actually moved
    pub moved: i64,
    /// Robber's balance afterwards
    pub robber_balance: i64,
    /// Target's balance afterwards
    pub target_balance: i64,
}

/// Attempts a robbery of `target` by `robber_id`.
///
/// # Errors
/// Rejects self-robbery, protected targets, members of the robber's own faction,
/// robbers holding fewer than [`MINIMUM_HELD`] points, targets with nothing to steal
/// and attempts inside the cooldown window. Rejections write nothing.
pub async fn attempt(
    db: &DatabaseConnection,
    robber_id: &str,
    target: Target<'_>,
    protected_ids: &[String],
    roll: RobberyRoll,
    now: DateTime<Utc>,
) -> Result<RobberyResult> {
    if robber_id == target.user_id {
        return Err(Error::invalid_target("You can't rob yourself!"));
    }
    if protected_ids.iter().any(|id| id == target.user_id) {
        return Err(Error::invalid_target("You can't rob this user!"));
    }

    let txn = db.begin().await?;

    let robber_balance = ledger::balance_of(&txn, robber_id).await?;
    if robber_balance < MINIMUM_HELD {
        return Err(Error::InsufficientFunds {
            current: robber_balance,
            required: MINIMUM_HELD,
        });
    }
    cooldown::check(&txn, robber_id, "rob", COOLDOWN, now).await?;

    let target_balance = ledger::balance_of(&txn, target.user_id).await?;
    if target_balance == 0 {
        return Err(Error::invalid_target("That user has no points to steal!"));
    }

    let robber_faction = faction::faction_of(&txn, robber_id).await?;
    let target_faction = faction::faction_of(&txn, target.user_id).await?;
    let same_faction = robber_faction
        .zip(target_faction)
        .is_some_and(|(a, b)| a.id == b.id);
    if same_faction {
        return Err(Error::invalid_target(
            "You can't rob members of your own faction!",
        ));
    }

    cooldown::record(&txn, robber_id, "rob", now).await?;

    let threshold = if target.is_bot {
        SUCCESS_CHANCE_VS_BOT
    } else {
        SUCCESS_CHANCE
    };
    let success = roll.chance < threshold;
    let stake = roll.stake.clamp(0, MAX_STAKE);

    let (robber_balance, target_balance, moved) = if success {
        let (target_after, applied) = ledger::adjust_clamped(&txn, target.user_id, -stake).await?;
        let robber_after = ledger::adjust(&txn, robber_id, -applied).await?;
        (robber_after, target_after, -applied)
    } else {
        let (robber_after, applied) = ledger::adjust_clamped(&txn, robber_id, -stake).await?;
        let target_after = ledger::adjust(&txn, target.user_id, -applied).await?;
        (robber_after, target_after, -applied)
    };

    history::record(
        &txn,
        NewRecord {
            kind: HistoryKind::Robbery,
            actor_id: robber_id,
            counterpart_id: Some(target.user_id),
            amount: moved,
            success,
            detail: None,
        },
    )
    .await?;
    txn.commit().await?;

    tracing::info!(
        "Robbery by {robber_id} on {}: success={success}, moved={moved}",
        target.user_id
    );
    Ok(RobberyResult {
        success,
        moved,
        robber_balance,
        target_balance,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    const HUMAN: &str = "target";

    fn human() -> Target<'static> {
        Target {
            user_id: HUMAN,
            is_bot: false,
        }
    }

    #[tokio::test]
    async fn test_successful_robbery_caps_at_target_balance() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "robber", 200).await?;
        set_balance(&db, HUMAN, 40).await?;

        let roll = RobberyRoll {
            stake: 90,
            chance: 0.1,
        };
        let result = attempt(&db, "robber", human(), &[], roll, Utc::now()).await?;
        assert!(result.success);
        assert_eq!(result.moved, 40);
        assert_eq!(result.robber_balance, 240);
        assert_eq!(result.target_balance, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_robbery_pays_target() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "robber", 150).await?;
        set_balance(&db, HUMAN, 10).await?;

        let roll = RobberyRoll {
            stake: 60,
            chance: 0.9,
        };
        let result = attempt(&db, "robber", human(), &[], roll, Utc::now()).await?;
        assert!(!result.success);
        assert_eq!(result.robber_balance, 90);
        assert_eq!(result.target_balance, 70);
        Ok(())
    }

    #[tokio::test]
    async fn test_bots_are_harder_to_rob() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "robber", 150).await?;
        set_balance(&db, "bot", 100).await?;

        let roll = RobberyRoll {
            stake: 10,
            chance: 0.4,
        };
        let target = Target {
            user_id: "bot",
            is_bot: true,
        };
        let result = attempt(&db, "robber", target, &[], roll, Utc::now()).await?;
        assert!(!result.success);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejections() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "robber", 150).await?;
        set_balance(&db, "poor", 99).await?;
        set_balance(&db, HUMAN, 100).await?;
        let roll = RobberyRoll {
            stake: 10,
            chance: 0.0,
        };
        let now = Utc::now();

        assert!(attempt(&db, "robber", Target { user_id: "robber", is_bot: false }, &[], roll, now).await.is_err());
        let protected = vec![HUMAN.to_string()];
        assert!(attempt(&db, "robber", human(), &protected, roll, now).await.is_err());
        let err = attempt(&db, "poor", human(), &[], roll, now).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        let err = attempt(&db, "robber", Target { user_id: "nobody", is_bot: false }, &[], roll, now)
            .await
            .unwrap_err();
        assert!(err.is_rejection());

        attempt(&db, "robber", human(), &[], roll, now).await?;
        let err = attempt(&db, "robber", human(), &[], roll, now).await.unwrap_err();
        assert!(matches!(err, Error::CooldownActive { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_same_faction_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "robber", 1_000).await?;
        set_balance(&db, HUMAN, 100).await?;
        let created = faction::create(&db, "robber", "Crew", "desc", None).await?;
        faction::add_member(&db, created.id, HUMAN).await?;

        let roll = RobberyRoll {
            stake: 10,
            chance: 0.0,
        };
        let err = attempt(&db, "robber", human(), &[], roll, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
        assert_eq!(ledger::balance_of(&db, HUMAN).await?, 100);
        Ok(())
    }
}
