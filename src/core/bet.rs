//! Coin-flip bets against the house or another user.
//!
//! Against the house the house wins 90% of the time. Against a user the challenge
//! must be accepted first and the outcome is an even 50/50. Either way the winner
//! gains exactly the wager and the loser loses it.

use crate::{
    core::{
        cooldown,
        history::{self, HistoryKind, NewRecord},
        ledger,
        wager::validate_wager,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::time::Duration;

/// Smallest accepted wager
pub const MINIMUM_WAGER: i64 = 1;
/// Cooldown between bets by the same user
pub const COOLDOWN: Duration = Duration::from_secs(3);
/// How long the challenged user has to accept
pub const CHALLENGE_TIMEOUT: Duration = Duration::from_secs(30);
/// Probability that the house wins a house bet
pub const HOUSE_WIN_CHANCE: f64 = 0.90;

/// A settled bet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BetResult {
    /// User ID of the winner
    pub winner_id: String,
    /// User ID of the loser
    pub loser_id: String,
    /// Points that changed hands
    pub amount: i64,
    /// Winner's balance afterwards
    pub winner_balance: i64,
    /// Loser's balance afterwards
    pub loser_balance: i64,
}

impl BetResult {
    /// Whether `user_id` won this bet.
    #[must_use]
    pub fn is_winner(&self, user_id: &str) -> bool {
        self.winner_id == user_id
    }
}

/// Whether a roll in `[0, 1)` lands on the house.
#[must_use]
pub fn house_wins(roll: f64) -> bool {
    roll < HOUSE_WIN_CHANCE
}

/// Whether a roll in `[0, 1)` lands on the challenger in a user-vs-user bet.
#[must_use]
pub fn challenger_wins(roll: f64) -> bool {
    roll < 0.5
}

async fn move_stake<C>(db: &C, winner_id: &str, loser_id: &str, amount: i64) -> Result<BetResult>
where
    C: ConnectionTrait,
{
    let loser_balance = ledger::adjust(db, loser_id, -amount).await?;
    let winner_balance = ledger::adjust(db, winner_id, amount).await?;

    history::record(
        db,
        NewRecord {
            kind: HistoryKind::Bet,
            actor_id: winner_id,
            counterpart_id: Some(loser_id),
            amount,
            success: true,
            detail: None,
        },
    )
    .await?;

    Ok(BetResult {
        winner_id: winner_id.to_string(),
        loser_id: loser_id.to_string(),
        amount,
        winner_balance,
        loser_balance,
    })
}

/// Settles a bet of `player_id` against the house.
///
/// `roll` is a uniform draw in `[0, 1)`. The cooldown is checked and recorded in the
/// same transaction as the transfer.
///
/// # Errors
/// Rejects bets during the cooldown, invalid wagers, players who cannot cover
/// `amount` and a house that could not pay out `amount`, all before any write.
pub async fn settle_house_bet(
    db: &DatabaseConnection,
    player_id: &str,
    house_id: &str,
    amount: i64,
    roll: f64,
    now: DateTime<Utc>,
) -> Result<BetResult> {
    let txn = db.begin().await?;
    cooldown::check(&txn, player_id, "bet", COOLDOWN, now).await?;
    let balance = ledger::balance_of(&txn, player_id).await?;
    validate_wager(amount, MINIMUM_WAGER, balance)?;
    let house_balance = ledger::balance_of(&txn, house_id).await?;
    if house_balance < amount {
        return Err(Error::invalid_target(format!(
            "The house only has {house_balance} points and can't cover this bet."
        )));
    }

    let result = if house_wins(roll) {
        move_stake(&txn, house_id, player_id, amount).await?
    } else {
        move_stake(&txn, player_id, house_id, amount).await?
    };
    cooldown::record(&txn, player_id, "bet", now).await?;
    txn.commit().await?;

    tracing::info!(
        "House bet of {amount} by {player_id}: {}",
        if result.is_winner(player_id) { "won" } else { "lost" }
    );
    Ok(result)
}

/// Checks that a user-vs-user challenge can be issued.
///
/// # Errors
/// Rejects self-challenges, invalid wagers and either side lacking `amount` points.
pub async fn validate_challenge(
    db: &DatabaseConnection,
    challenger_id: &str,
    opponent_id: &str,
    amount: i64,
) -> Result<()> {
    if challenger_id == opponent_id {
        return Err(Error::invalid_target("You can't bet against yourself."));
    }
    let challenger_balance = ledger::balance_of(db, challenger_id).await?;
    validate_wager(amount, MINIMUM_WAGER, challenger_balance)?;

    let opponent_balance = ledger::balance_of(db, opponent_id).await?;
    if opponent_balance < amount {
        return Err(Error::invalid_target(format!(
            "Your opponent only has {opponent_balance} points and can't cover this bet."
        )));
    }
    Ok(())
}

/// Settles an accepted challenge. Both balances are re-validated inside the
/// transaction, since they may have changed while the challenge was pending.
pub async fn settle_challenge(
    db: &DatabaseConnection,
    challenger_id: &str,
    opponent_id: &str,
    amount: i64,
    roll: f64,
) -> Result<BetResult> {
    let txn = db.begin().await?;
    let challenger_balance = ledger::balance_of(&txn, challenger_id).await?;
    validate_wager(amount, MINIMUM_WAGER, challenger_balance)?;
    let opponent_balance = ledger::balance_of(&txn, opponent_id).await?;
    validate_wager(amount, MINIMUM_WAGER, opponent_balance)?;

    let result = if challenger_wins(roll) {
        move_stake(&txn, challenger_id, opponent_id, amount).await?
    } else {
        move_stake(&txn, opponent_id, challenger_id, amount).await?
    };
    txn.commit().await?;

    tracing::info!(
        "Challenge bet of {amount} between {challenger_id} and {opponent_id} won by {}",
        result.winner_id
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{entities::History, test_utils::*};
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[tokio::test]
    async fn test_house_bet_scenario_loss() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 1_000).await?;
        set_balance(&db, "house", 500).await?;

        let result = settle_house_bet(&db, "A", "house", 100, 0.10, Utc::now()).await?;
        assert!(!result.is_winner("A"));
        assert_eq!(ledger::balance_of(&db, "A").await?, 900);
        assert_eq!(ledger::balance_of(&db, "house").await?, 600);
        Ok(())
    }

    #[tokio::test]
    async fn test_house_bet_scenario_win() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 1_000).await?;
        set_balance(&db, "house", 500).await?;

        let result = settle_house_bet(&db, "A", "house", 100, 0.95, Utc::now()).await?;
        assert!(result.is_winner("A"));
        assert_eq!(ledger::balance_of(&db, "A").await?, 1_100);
        assert_eq!(ledger::balance_of(&db, "house").await?, 400);
        Ok(())
    }

    #[tokio::test]
    async fn test_house_bet_only_two_outcomes() -> Result<()> {
        for step in 0..20 {
            let roll = f64::from(step) / 20.0;
            let db = setup_test_db().await?;
            set_balance(&db, "A", 1_000).await?;
            set_balance(&db, "house", 1_000).await?;

            settle_house_bet(&db, "A", "house", 100, roll, Utc::now()).await?;
            let player = ledger::balance_of(&db, "A").await?;
            let house = ledger::balance_of(&db, "house").await?;
            assert!(player == 1_100 || player == 900, "roll {roll} gave {player}");
            assert_eq!(player + house, 2_000);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_rejected_wager_leaves_ledger_untouched() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 50).await?;
        set_balance(&db, "house", 1_000).await?;
        let now = Utc::now();

        assert!(settle_house_bet(&db, "A", "house", 0, 0.5, now).await.is_err());
        assert!(settle_house_bet(&db, "A", "house", 51, 0.5, now).await.is_err());
        assert_eq!(ledger::balance_of(&db, "A").await?, 50);
        assert_eq!(ledger::balance_of(&db, "house").await?, 1_000);

        // A rejected bet does not start the cooldown
        settle_house_bet(&db, "A", "house", 10, 0.5, now).await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_house_short_of_points_rejects_bet() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 1_000).await?;
        set_balance(&db, "house", 50).await?;

        let err = settle_house_bet(&db, "A", "house", 100, 0.95, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
        assert_eq!(ledger::balance_of(&db, "A").await?, 1_000);
        assert_eq!(ledger::balance_of(&db, "house").await?, 50);
        assert_eq!(History::find().count(&db).await?, 0);

        // Covering the full wager is enough
        settle_house_bet(&db, "A", "house", 50, 0.95, Utc::now()).await?;
        assert_eq!(ledger::balance_of(&db, "A").await?, 1_050);
        assert_eq!(ledger::balance_of(&db, "house").await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_house_bet_cooldown() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 1_000).await?;
        set_balance(&db, "house", 1_000).await?;
        let start = Utc::now();

        settle_house_bet(&db, "A", "house", 100, 0.10, start).await?;
        let soon = start + chrono::Duration::seconds(1);
        let err = settle_house_bet(&db, "A", "house", 100, 0.10, soon)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CooldownActive { .. }));
        assert_eq!(ledger::balance_of(&db, "A").await?, 900);

        let later = start + chrono::Duration::seconds(4);
        settle_house_bet(&db, "A", "house", 100, 0.10, later).await?;
        assert_eq!(ledger::balance_of(&db, "A").await?, 800);
        Ok(())
    }

    #[tokio::test]
    async fn test_challenge() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 200).await?;
        set_balance(&db, "B", 50).await?;

        assert!(validate_challenge(&db, "A", "A", 10).await.is_err());
        let err = validate_challenge(&db, "A", "B", 100).await.unwrap_err();
        assert!(matches!(err, Error::InvalidTarget { .. }));
        validate_challenge(&db, "A", "B", 50).await?;

        let result = settle_challenge(&db, "A", "B", 50, 0.9).await?;
        assert_eq!(result.winner_id, "B");
        assert_eq!(ledger::balance_of(&db, "A").await?, 150);
        assert_eq!(ledger::balance_of(&db, "B").await?, 100);
        Ok(())
    }
}
