//! History entity - Append-only log of bets, robberies, purchases and event wins.
//!
//! `kind` is one of `"bet"`, `"robbery"`, `"purchase"` or `"riddle"`.
//! For bets the actor is the winner and the counterpart the loser; for robberies
//! the actor is the robber and the counterpart the target.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// History record model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "history")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Event kind
    pub kind: String,
    /// Discord user ID of the acting user
    pub actor_id: String,
    /// Discord user ID on the other side, if any
    pub counterpart_id: Option<String>,
    /// Points moved by the event
    pub amount: i64,
    /// Whether the actor's attempt succeeded (always true for bets and purchases)
    pub success: bool,
    /// Extra detail such as the product name
    pub detail: Option<String>,
    /// When the event happened
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
