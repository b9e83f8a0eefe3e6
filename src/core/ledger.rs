//! Points ledger - balances, transfers and rankings.
//!
//! Accounts are created lazily: reading an unknown user yields 0 and the first
//! write inserts the row. Every write goes through [`adjust`] or [`adjust_clamped`],
//! which refuse or clamp a negative result, so a balance is never persisted negative.
//! Functions generic over `ConnectionTrait` are meant to be composed inside a
//! caller's transaction; the ones taking a `DatabaseConnection` open their own.

use crate::{
    entities::{Account, account},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, ConnectionTrait, PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait,
    prelude::*,
};

/// Current balance of `user_id`, 0 if the user has no account yet.
pub async fn balance_of<C>(db: &C, user_id: &str) -> Result<i64>
where
    C: ConnectionTrait,
{
    Ok(Account::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .map_or(0, |account| account.balance))
}

async fn write_balance<C>(db: &C, user_id: &str, exists: bool, balance: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let model = account::ActiveModel {
        user_id: Set(user_id.to_string()),
        balance: Set(balance),
        updated_at: Set(chrono::Utc::now()),
    };
    if exists {
        model.update(db).await?;
    } else {
        model.insert(db).await?;
    }
    Ok(())
}

/// Adds `delta` to a balance, rejecting the change if it would go negative.
///
/// Returns the new balance.
///
/// # Errors
/// Returns [`Error::InsufficientFunds`] if the account cannot cover a negative delta.
pub async fn adjust<C>(db: &C, user_id: &str, delta: i64) -> Result<i64>
where
    C: ConnectionTrait,
{
    let existing = Account::find_by_id(user_id.to_string()).one(db).await?;
    let current = existing.as_ref().map_or(0, |a| a.balance);
    let new_balance = current.saturating_add(delta);
    if new_balance < 0 {
        return Err(Error::InsufficientFunds {
            current,
            required: -delta,
        });
    }
    write_balance(db, user_id, existing.is_some(), new_balance).await?;
    Ok(new_balance)
}

/// Adds `delta` to a balance, flooring the result at zero.
///
/// Returns `(new_balance, applied_delta)`; the applied delta differs from `delta`
/// only when the balance was clamped.
pub async fn adjust_clamped<C>(db: &C, user_id: &str, delta: i64) -> Result<(i64, i64)>
where
    C: ConnectionTrait,
{
    let existing = Account::find_by_id(user_id.to_string()).one(db).await?;
    let current = existing.as_ref().map_or(0, |a| a.balance);
    let new_balance = current.saturating_add(delta).max(0);
    write_balance(db, user_id, existing.is_some(), new_balance).await?;
    Ok((new_balance, new_balance - current))
}

/// Credits a positive amount in its own transaction.
pub async fn credit(db: &DatabaseConnection, user_id: &str, amount: i64) -> Result<i64> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    let txn = db.begin().await?;
    let balance = adjust(&txn, user_id, amount).await?;
    txn.commit().await?;
    Ok(balance)
}

/// Debits a positive amount in its own transaction.
///
/// # Errors
/// Returns [`Error::InsufficientFunds`] without changing anything if the balance is too low.
pub async fn debit(db: &DatabaseConnection, user_id: &str, amount: i64) -> Result<i64> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    let txn = db.begin().await?;
    let balance = adjust(&txn, user_id, -amount).await?;
    txn.commit().await?;
    Ok(balance)
}

/// Balances of both sides after a [`transfer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReceipt {
    /// Sender's balance after the transfer
    pub sender_balance: i64,
    /// Recipient's balance after the transfer
    pub recipient_balance: i64,
}

/// Moves points between two users atomically (`/pix`).
///
/// # Errors
/// Rejects non-positive amounts, transfers to oneself, and senders who cannot cover
/// the amount. Nothing is written when a rejection is returned.
pub async fn transfer(
    db: &DatabaseConnection,
    sender_id: &str,
    recipient_id: &str,
    amount: i64,
) -> Result<TransferReceipt> {
    if amount <= 0 {
        return Err(Error::InvalidAmount { amount });
    }
    if sender_id == recipient_id {
        return Err(Error::invalid_target("You can't send points to yourself."));
    }

    let txn = db.begin().await?;
    let sender_balance = adjust(&txn, sender_id, -amount).await?;
    let recipient_balance = adjust(&txn, recipient_id, amount).await?;
    txn.commit().await?;

    tracing::info!("{sender_id} sent {amount} points to {recipient_id}");
    Ok(TransferReceipt {
        sender_balance,
        recipient_balance,
    })
}

/// Sum of the balances of the given users.
pub async fn total_of<C>(db: &C, user_ids: &[String]) -> Result<i64>
where
    C: ConnectionTrait,
{
    if user_ids.is_empty() {
        return Ok(0);
    }
    let accounts = Account::find()
        .filter(account::Column::UserId.is_in(user_ids.iter().cloned()))
        .all(db)
        .await?;
    Ok(accounts.iter().map(|a| a.balance).sum())
}

/// Whether no account has been created yet.
pub async fn is_empty(db: &DatabaseConnection) -> Result<bool> {
    Ok(Account::find().count(db).await? == 0)
}

/// One page of the leaderboard, richest first, skipping `excluded` users.
///
/// `page` is zero-based.
pub async fn ranking_page(
    db: &DatabaseConnection,
    excluded: &[String],
    page: u64,
    per_page: u64,
) -> Result<Vec<account::Model>> {
    Account::find()
        .filter(account::Column::UserId.is_not_in(excluded.iter().cloned()))
        .order_by_desc(account::Column::Balance)
        .order_by_asc(account::Column::UserId)
        .offset(page * per_page)
        .limit(per_page)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Number of ranked accounts (everyone not in `excluded`).
pub async fn ranked_count(db: &DatabaseConnection, excluded: &[String]) -> Result<u64> {
    Account::find()
        .filter(account::Column::UserId.is_not_in(excluded.iter().cloned()))
        .count(db)
        .await
        .map_err(Into::into)
}

/// 1-based leaderboard position of `user_id`, or `None` if unranked.
pub async fn rank_of(
    db: &DatabaseConnection,
    user_id: &str,
    excluded: &[String],
) -> Result<Option<u64>> {
    if excluded.iter().any(|id| id == user_id) {
        return Ok(None);
    }
    let Some(account) = Account::find_by_id(user_id.to_string()).one(db).await? else {
        return Ok(None);
    };

    // Ties are broken by user ID, matching `ranking_page`.
    let ahead = Account::find()
        .filter(account::Column::UserId.is_not_in(excluded.iter().cloned()))
        .filter(
            Condition::any()
                .add(account::Column::Balance.gt(account.balance))
                .add(
                    Condition::all()
                        .add(account::Column::Balance.eq(account.balance))
                        .add(account::Column::UserId.lt(user_id)),
                ),
        )
        .count(db)
        .await?;
    Ok(Some(ahead + 1))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_unknown_user_has_zero_balance() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(balance_of(&db, "ghost").await?, 0);
        assert!(is_empty(&db).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_debit_rejects_overdraft_without_writing() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 50).await?;

        let err = debit(&db, "A", 80).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientFunds {
                current: 50,
                required: 80
            }
        ));
        assert_eq!(balance_of(&db, "A").await?, 50);
        Ok(())
    }

    #[tokio::test]
    async fn test_adjust_clamped_floors_at_zero() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 30).await?;

        let (balance, applied) = adjust_clamped(&db, "A", -100).await?;
        assert_eq!((balance, applied), (0, -30));
        Ok(())
    }

    #[tokio::test]
    async fn test_transfer_moves_points() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 100).await?;

        let receipt = transfer(&db, "A", "B", 40).await?;
        assert_eq!(receipt.sender_balance, 60);
        assert_eq!(receipt.recipient_balance, 40);

        assert!(transfer(&db, "A", "A", 10).await.is_err());
        assert!(transfer(&db, "A", "B", 0).await.is_err());
        let err = transfer(&db, "B", "A", 41).await.unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(balance_of(&db, "A").await?, 60);
        assert_eq!(balance_of(&db, "B").await?, 40);
        Ok(())
    }

    #[tokio::test]
    async fn test_ranking_and_rank() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 10).await?;
        set_balance(&db, "B", 30).await?;
        set_balance(&db, "C", 20).await?;
        set_balance(&db, "house", 1_000).await?;
        let excluded = vec!["house".to_string()];

        let page = ranking_page(&db, &excluded, 0, 2).await?;
        let ids: Vec<_> = page.iter().map(|a| a.user_id.as_str()).collect();
        assert_eq!(ids, ["B", "C"]);

        assert_eq!(ranked_count(&db, &excluded).await?, 3);
        assert_eq!(rank_of(&db, "A", &excluded).await?, Some(3));
        assert_eq!(rank_of(&db, "house", &excluded).await?, None);
        assert_eq!(total_of(&db, &["A".to_string(), "B".to_string()]).await?, 40);
        Ok(())
    }

    #[tokio::test]
    async fn test_rank_breaks_ties_by_user_id() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "B", 20).await?;
        set_balance(&db, "A", 20).await?;
        set_balance(&db, "C", 50).await?;

        assert_eq!(rank_of(&db, "C", &[]).await?, Some(1));
        assert_eq!(rank_of(&db, "A", &[]).await?, Some(2));
        assert_eq!(rank_of(&db, "B", &[]).await?, Some(3));
        let ids: Vec<_> = ranking_page(&db, &[], 0, 3)
            .await?
            .into_iter()
            .map(|a| a.user_id)
            .collect();
        assert_eq!(ids, ["C", "A", "B"]);
        Ok(())
    }
}
