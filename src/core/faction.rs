//! Faction business logic - creation, membership, leadership and rankings.
//!
//! A faction is owned by its leader, who is always its first member. Membership is
//! capped at [`MAX_MEMBERS`] and a user belongs to at most one faction. When the
//! leader leaves, the faction is disbanded: its members are removed and its
//! territories released. Names are unique ignoring case.

use crate::{
    core::ledger,
    entities::{Faction, FactionMember, Territory, faction, faction_member, territory},
    errors::{Error, Result},
};
use sea_orm::{
    ConnectionTrait, PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*,
    sea_query::Expr,
};

/// Points charged to found a faction
pub const CREATION_COST: i64 = 300;
/// Maximum members, leader included
pub const MAX_MEMBERS: u64 = 15;
/// Factions shown per page of `/faction list`
pub const PAGE_SIZE: usize = 5;
/// How long a leader has to answer a join request or confirm disbanding
pub const DECISION_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// The faction `user_id` belongs to, if any.
pub async fn faction_of<C>(db: &C, user_id: &str) -> Result<Option<faction::Model>>
where
    C: ConnectionTrait,
{
    let Some(membership) = FactionMember::find()
        .filter(faction_member::Column::UserId.eq(user_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };
    Faction::find_by_id(membership.faction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a faction by name, ignoring case and surrounding whitespace.
pub async fn find_by_name<C>(db: &C, name: &str) -> Result<Option<faction::Model>>
where
    C: ConnectionTrait,
{
    let wanted = name.trim().to_lowercase();
    Ok(Faction::find()
        .all(db)
        .await?
        .into_iter()
        .find(|f| f.name.to_lowercase() == wanted))
}

/// All factions, alphabetically.
pub async fn all(db: &DatabaseConnection) -> Result<Vec<faction::Model>> {
    Faction::find()
        .order_by_asc(faction::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Member IDs of a faction in join order (the leader first).
pub async fn members<C>(db: &C, faction_id: i64) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    Ok(FactionMember::find()
        .filter(faction_member::Column::FactionId.eq(faction_id))
        .order_by_asc(faction_member::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|m| m.user_id)
        .collect())
}

async fn member_count<C>(db: &C, faction_id: i64) -> Result<u64>
where
    C: ConnectionTrait,
{
    FactionMember::find()
        .filter(faction_member::Column::FactionId.eq(faction_id))
        .count(db)
        .await
        .map_err(Into::into)
}

async fn insert_member<C>(db: &C, faction_id: i64, user_id: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    faction_member::ActiveModel {
        faction_id: Set(faction_id),
        user_id: Set(user_id.to_string()),
        joined_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Founds a faction led by `leader_id`, charging [`CREATION_COST`].
///
/// # Errors
/// Rejects blank or taken names, callers already in a faction, and callers who
/// can't pay. Nothing is written on rejection.
pub async fn create(
    db: &DatabaseConnection,
    leader_id: &str,
    name: &str,
    description: &str,
    image_url: Option<String>,
) -> Result<faction::Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::faction_rule("The faction name can't be empty."));
    }

    let txn = db.begin().await?;
    if faction_of(&txn, leader_id).await?.is_some() {
        return Err(Error::faction_rule(
            "You already belong to a faction. Leave it before founding a new one.",
        ));
    }
    if find_by_name(&txn, name).await?.is_some() {
        return Err(Error::faction_rule(format!(
            "A faction named '{name}' already exists."
        )));
    }
    ledger::adjust(&txn, leader_id, -CREATION_COST).await?;

    let created = faction::ActiveModel {
        name: Set(name.to_string()),
        description: Set(description.trim().to_string()),
        image_url: Set(image_url.filter(|url| !url.trim().is_empty())),
        leader_id: Set(leader_id.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_member(&txn, created.id, leader_id).await?;
    txn.commit().await?;

    tracing::info!("{leader_id} founded faction '{}'", created.name);
    Ok(created)
}

/// Checks that `user_id` may ask to join the faction called `name`.
///
/// # Errors
/// Rejects unknown factions, users already in a faction and full factions.
pub async fn validate_join(
    db: &DatabaseConnection,
    user_id: &str,
    name: &str,
) -> Result<faction::Model> {
    let target = find_by_name(db, name)
        .await?
        .ok_or_else(|| Error::FactionNotFound {
            name: name.to_string(),
        })?;
    if faction_of(db, user_id).await?.is_some() {
        return Err(Error::faction_rule(
            "You're already in a faction. Leave it before joining another.",
        ));
    }
    if member_count(db, target.id).await? >= MAX_MEMBERS {
        return Err(Error::faction_rule(format!(
            "'{}' already has the maximum of {MAX_MEMBERS} members.",
            target.name
        )));
    }
    Ok(target)
}

/// Adds `user_id` to a faction after the leader accepted, re-checking every rule.
///
/// # Errors
/// Same rejections as [`validate_join`]; a full faction is left untouched.
pub async fn add_member(db: &DatabaseConnection, faction_id: i64, user_id: &str) -> Result<()> {
    let txn = db.begin().await?;
    let target = Faction::find_by_id(faction_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::FactionNotFound {
            name: faction_id.to_string(),
        })?;
    if faction_of(&txn, user_id).await?.is_some() {
        return Err(Error::faction_rule("That user already joined a faction."));
    }
    if member_count(&txn, faction_id).await? >= MAX_MEMBERS {
        return Err(Error::faction_rule(format!(
            "'{}' already has the maximum of {MAX_MEMBERS} members.",
            target.name
        )));
    }
    insert_member(&txn, faction_id, user_id).await?;
    txn.commit().await?;

    tracing::info!("{user_id} joined faction '{}'", target.name);
    Ok(())
}

/// What happened when a member asked to leave.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The member left
    Left(faction::Model),
    /// The caller leads the faction; leaving disbands it and needs confirmation
    LeaderMustConfirm(faction::Model),
}

/// Removes `user_id` from their faction, unless they lead it.
///
/// # Errors
/// Rejects users that are not in a faction.
pub async fn leave(db: &DatabaseConnection, user_id: &str) -> Result<Departure> {
    let Some(current) = faction_of(db, user_id).await? else {
        return Err(Error::faction_rule("You're not in a faction."));
    };
    if current.leader_id == user_id {
        return Ok(Departure::LeaderMustConfirm(current));
    }

    FactionMember::delete_many()
        .filter(faction_member::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    tracing::info!("{user_id} left faction '{}'", current.name);
    Ok(Departure::Left(current))
}

/// Deletes the faction led by `leader_id`, its member list and its territory claims.
///
/// # Errors
/// Rejects callers that don't lead a faction.
pub async fn disband(db: &DatabaseConnection, leader_id: &str) -> Result<faction::Model> {
    let txn = db.begin().await?;
    let led = Faction::find()
        .filter(faction::Column::LeaderId.eq(leader_id))
        .one(&txn)
        .await?
        .ok_or_else(|| Error::faction_rule("You don't lead a faction."))?;

    FactionMember::delete_many()
        .filter(faction_member::Column::FactionId.eq(led.id))
        .exec(&txn)
        .await?;
    Territory::update_many()
        .col_expr(territory::Column::FactionId, Expr::value(Option::<i64>::None))
        .filter(territory::Column::FactionId.eq(led.id))
        .exec(&txn)
        .await?;
    Faction::delete_by_id(led.id).exec(&txn).await?;
    txn.commit().await?;

    tracing::info!("Faction '{}' was disbanded by {leader_id}", led.name);
    Ok(led)
}

/// The faction led by `leader_id` and its members in join order.
///
/// # Errors
/// Rejects callers that don't lead a faction.
pub async fn roster(
    db: &DatabaseConnection,
    leader_id: &str,
) -> Result<(faction::Model, Vec<String>)> {
    let led = Faction::find()
        .filter(faction::Column::LeaderId.eq(leader_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::faction_rule("You don't lead a faction."))?;
    let members = members(db, led.id).await?;
    Ok((led, members))
}

/// Removes the member at 1-based `position` of the leader's roster.
///
/// Returns the removed user's ID.
///
/// # Errors
/// Rejects non-leaders, positions outside the roster and the leader's own position.
pub async fn kick(db: &DatabaseConnection, leader_id: &str, position: usize) -> Result<String> {
    let (led, members) = roster(db, leader_id).await?;
    let removed = position
        .checked_sub(1)
        .and_then(|index| members.get(index))
        .ok_or_else(|| {
            Error::faction_rule(format!(
                "Invalid position. Pick a number between 1 and {}.",
                members.len()
            ))
        })?
        .clone();
    if removed == leader_id {
        return Err(Error::faction_rule("You can't remove yourself from your own faction."));
    }

    FactionMember::delete_many()
        .filter(faction_member::Column::FactionId.eq(led.id))
        .filter(faction_member::Column::UserId.eq(removed.as_str()))
        .exec(db)
        .await?;
    tracing::info!("{leader_id} removed {removed} from faction '{}'", led.name);
    Ok(removed)
}

/// A faction with its aggregate figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactionSummary {
    /// The faction itself
    pub faction: faction::Model,
    /// Member IDs in join order
    pub members: Vec<String>,
    /// Sum of the members' balances
    pub total_points: i64,
    /// Display names of the territories it controls
    pub territories: Vec<String>,
}

async fn summarize(db: &DatabaseConnection, faction: faction::Model) -> Result<FactionSummary> {
    let members = members(db, faction.id).await?;
    let total_points = ledger::total_of(db, &members).await?;
    let territories = Territory::find()
        .filter(territory::Column::FactionId.eq(faction.id))
        .order_by_asc(territory::Column::Name)
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();
    Ok(FactionSummary {
        faction,
        members,
        total_points,
        territories,
    })
}

/// Details of the faction called `name`.
///
/// # Errors
/// Returns [`Error::FactionNotFound`] for unknown names.
pub async fn summary(db: &DatabaseConnection, name: &str) -> Result<FactionSummary> {
    let found = find_by_name(db, name)
        .await?
        .ok_or_else(|| Error::FactionNotFound {
            name: name.to_string(),
        })?;
    summarize(db, found).await
}

/// Every faction ranked by the total points of its members, richest first.
pub async fn ranked(db: &DatabaseConnection) -> Result<Vec<FactionSummary>> {
    let mut summaries = Vec::new();
    for found in all(db).await? {
        summaries.push(summarize(db, found).await?);
    }
    summaries.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.faction.name.cmp(&b.faction.name))
    });
    Ok(summaries)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_create_charges_and_adds_leader() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "leader", 350).await?;

        let created = create(&db, "leader", "  Red  ", "The red crew", None).await?;
        assert_eq!(created.name, "Red");
        assert_eq!(ledger::balance_of(&db, "leader").await?, 50);
        assert_eq!(members(&db, created.id).await?, ["leader"]);

        set_balance(&db, "other", 1_000).await?;
        let err = create(&db, "other", "red", "dup", None).await.unwrap_err();
        assert!(matches!(err, Error::FactionRule { .. }));
        assert_eq!(ledger::balance_of(&db, "other").await?, 1_000);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_requires_points() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "poor", 299).await?;
        let err = create(&db, "poor", "Blue", "", None).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));
        assert!(find_by_name(&db, "Blue").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_full_faction_rejects_sixteenth_member() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_test_faction(&db, "leader", "Full").await?;
        for i in 1..MAX_MEMBERS {
            add_member(&db, created.id, &format!("member{i}")).await?;
        }
        let before = members(&db, created.id).await?;
        assert_eq!(before.len(), 15);

        let err = validate_join(&db, "newcomer", "Full").await.unwrap_err();
        assert!(matches!(err, Error::FactionRule { .. }));
        let err = add_member(&db, created.id, "newcomer").await.unwrap_err();
        assert!(matches!(err, Error::FactionRule { .. }));
        assert_eq!(members(&db, created.id).await?, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_join_rules() -> Result<()> {
        let db = setup_test_db().await?;
        let red = create_test_faction(&db, "red_leader", "Red").await?;
        create_test_faction(&db, "blue_leader", "Blue").await?;

        let err = validate_join(&db, "x", "Green").await.unwrap_err();
        assert!(matches!(err, Error::FactionNotFound { .. }));

        assert_eq!(validate_join(&db, "x", "red").await?.id, red.id);
        add_member(&db, red.id, "x").await?;
        assert!(validate_join(&db, "x", "Blue").await.is_err());
        assert!(validate_join(&db, "blue_leader", "Red").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_leave_and_disband() -> Result<()> {
        let db = setup_test_db().await?;
        let red = create_test_faction(&db, "leader", "Red").await?;
        add_member(&db, red.id, "a").await?;
        add_member(&db, red.id, "b").await?;
        seed_territory(&db, "parana", "Paraná", Some(red.id)).await?;

        assert!(matches!(leave(&db, "a").await?, Departure::Left(_)));
        assert!(matches!(
            leave(&db, "leader").await?,
            Departure::LeaderMustConfirm(_)
        ));
        assert!(leave(&db, "nobody").await.is_err());

        disband(&db, "leader").await?;
        assert!(find_by_name(&db, "Red").await?.is_none());
        assert!(faction_of(&db, "b").await?.is_none());
        let territory = Territory::find_by_id("parana".to_string())
            .one(&db)
            .await?
            .unwrap();
        assert_eq!(territory.faction_id, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_kick_by_position() -> Result<()> {
        let db = setup_test_db().await?;
        let red = create_test_faction(&db, "leader", "Red").await?;
        add_member(&db, red.id, "a").await?;
        add_member(&db, red.id, "b").await?;

        assert!(kick(&db, "leader", 1).await.is_err());
        assert!(kick(&db, "leader", 0).await.is_err());
        assert!(kick(&db, "leader", 4).await.is_err());
        assert!(kick(&db, "a", 3).await.is_err());

        assert_eq!(kick(&db, "leader", 2).await?, "a");
        assert_eq!(members(&db, red.id).await?, ["leader", "b"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_ranking_by_member_points() -> Result<()> {
        let db = setup_test_db().await?;
        let red = create_test_faction(&db, "red_leader", "Red").await?;
        let blue = create_test_faction(&db, "blue_leader", "Blue").await?;
        add_member(&db, red.id, "rich").await?;
        set_balance(&db, "rich", 5_000).await?;
        seed_territory(&db, "parana", "Paraná", Some(blue.id)).await?;

        let ranked = ranked(&db).await?;
        assert_eq!(ranked[0].faction.name, "Red");
        assert_eq!(ranked[1].territories, ["Paraná"]);

        let info = summary(&db, "RED").await?;
        assert_eq!(info.members, ["red_leader", "rich"]);
        Ok(())
    }
}
