//! Append-only event history: bets, robberies, purchases and riddle wins.
//!
//! Records are never updated or compacted. Statistics are computed by reading them back.

use crate::{
    entities::{History, history},
    errors::Result,
};
use sea_orm::{Condition, ConnectionTrait, PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*};

/// Kind of a history record, stored as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    /// A settled bet; actor is the winner, counterpart the loser
    Bet,
    /// A robbery attempt; actor is the robber, counterpart the target
    Robbery,
    /// A shop purchase; detail holds the product name
    Purchase,
    /// A solved riddle
    Riddle,
}

impl HistoryKind {
    /// Stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bet => "bet",
            Self::Robbery => "robbery",
            Self::Purchase => "purchase",
            Self::Riddle => "riddle",
        }
    }
}

/// Fields of a new history record.
#[derive(Debug, Clone)]
pub struct NewRecord<'a> {
    /// Event kind
    pub kind: HistoryKind,
    /// Acting user
    pub actor_id: &'a str,
    /// Other party, if any
    pub counterpart_id: Option<&'a str>,
    /// Points moved
    pub amount: i64,
    /// Whether the actor succeeded
    pub success: bool,
    /// Extra detail (e.g., product name)
    pub detail: Option<&'a str>,
}

/// Appends one record.
pub async fn record<C>(db: &C, new: NewRecord<'_>) -> Result<history::Model>
where
    C: ConnectionTrait,
{
    let model = history::ActiveModel {
        kind: Set(new.kind.as_str().to_string()),
        actor_id: Set(new.actor_id.to_string()),
        counterpart_id: Set(new.counterpart_id.map(str::to_string)),
        amount: Set(new.amount),
        success: Set(new.success),
        detail: Set(new.detail.map(str::to_string)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    model.insert(db).await.map_err(Into::into)
}

/// Whether `user_id` already bought `product`.
pub async fn has_purchased<C>(db: &C, user_id: &str, product: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = History::find()
        .filter(history::Column::Kind.eq(HistoryKind::Purchase.as_str()))
        .filter(history::Column::ActorId.eq(user_id))
        .filter(history::Column::Detail.eq(product))
        .count(db)
        .await?;
    Ok(count > 0)
}

async fn page_of(
    db: &DatabaseConnection,
    kind: HistoryKind,
    column: history::Column,
    user_id: &str,
    page: u64,
    per_page: u64,
) -> Result<(Vec<history::Model>, u64)> {
    let query = History::find()
        .filter(history::Column::Kind.eq(kind.as_str()))
        .filter(column.eq(user_id));
    let total = query.clone().count(db).await?;
    let records = query
        .order_by_desc(history::Column::CreatedAt)
        .order_by_desc(history::Column::Id)
        .offset(page * per_page)
        .limit(per_page)
        .all(db)
        .await?;
    Ok((records, total))
}

/// One page of a user's purchases, newest first, plus the total count.
pub async fn purchases_page(
    db: &DatabaseConnection,
    user_id: &str,
    page: u64,
    per_page: u64,
) -> Result<(Vec<history::Model>, u64)> {
    page_of(
        db,
        HistoryKind::Purchase,
        history::Column::ActorId,
        user_id,
        page,
        per_page,
    )
    .await
}

/// One page of robberies targeting `user_id`, newest first, plus the total count.
pub async fn robberies_against_page(
    db: &DatabaseConnection,
    user_id: &str,
    page: u64,
    per_page: u64,
) -> Result<(Vec<history::Model>, u64)> {
    page_of(
        db,
        HistoryKind::Robbery,
        history::Column::CounterpartId,
        user_id,
        page,
        per_page,
    )
    .await
}

/// Betting, robbery and riddle counters for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityStats {
    /// Bets won
    pub bets_won: u64,
    /// Bets lost
    pub bets_lost: u64,
    /// Points won across won bets
    pub points_won_betting: i64,
    /// Successful robberies
    pub robberies: u64,
    /// Failed robbery attempts
    pub failed_robberies: u64,
    /// Riddles solved
    pub riddles_solved: u64,
}

/// Computes [`ActivityStats`] for `user_id` from the history.
pub async fn activity_stats(db: &DatabaseConnection, user_id: &str) -> Result<ActivityStats> {
    let records = History::find()
        .filter(
            Condition::any()
                .add(history::Column::ActorId.eq(user_id))
                .add(history::Column::CounterpartId.eq(user_id)),
        )
        .all(db)
        .await?;

    let mut stats = ActivityStats::default();
    for record in &records {
        let is_actor = record.actor_id == user_id;
        match record.kind.as_str() {
            "bet" if is_actor => {
                stats.bets_won += 1;
                stats.points_won_betting += record.amount;
            }
            "bet" => stats.bets_lost += 1,
            "robbery" if is_actor && record.success => stats.robberies += 1,
            "robbery" if is_actor => stats.failed_robberies += 1,
            "riddle" if is_actor => stats.riddles_solved += 1,
            _ => {}
        }
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    fn bet<'a>(winner: &'a str, loser: &'a str, amount: i64) -> NewRecord<'a> {
        NewRecord {
            kind: HistoryKind::Bet,
            actor_id: winner,
            counterpart_id: Some(loser),
            amount,
            success: true,
            detail: None,
        }
    }

    #[tokio::test]
    async fn test_activity_stats() -> Result<()> {
        let db = setup_test_db().await?;
        record(&db, bet("A", "B", 100)).await?;
        record(&db, bet("A", "B", 50)).await?;
        record(&db, bet("B", "A", 10)).await?;
        record(
            &db,
            NewRecord {
                kind: HistoryKind::Robbery,
                actor_id: "A",
                counterpart_id: Some("B"),
                amount: 30,
                success: false,
                detail: None,
            },
        )
        .await?;

        record(&db, bet("C", "D", 500)).await?;

        let stats = activity_stats(&db, "A").await?;
        assert_eq!(stats.bets_won, 2);
        assert_eq!(stats.bets_lost, 1);
        assert_eq!(stats.points_won_betting, 150);
        assert_eq!(stats.failed_robberies, 1);
        assert_eq!(stats.robberies, 0);

        let (against_b, total) = robberies_against_page(&db, "B", 0, 5).await?;
        assert_eq!((against_b.len(), total), (1, 1));
        Ok(())
    }

    #[tokio::test]
    async fn test_has_purchased() -> Result<()> {
        let db = setup_test_db().await?;
        record(
            &db,
            NewRecord {
                kind: HistoryKind::Purchase,
                actor_id: "A",
                counterpart_id: None,
                amount: 550,
                success: true,
                detail: Some("100 Robux"),
            },
        )
        .await?;

        assert!(has_purchased(&db, "A", "100 Robux").await?);
        assert!(!has_purchased(&db, "A", "Angel").await?);
        assert!(!has_purchased(&db, "B", "100 Robux").await?);

        let (page, total) = purchases_page(&db, "A", 0, 5).await?;
        assert_eq!(total, 1);
        assert_eq!(page[0].detail.as_deref(), Some("100 Robux"));
        Ok(())
    }
}
