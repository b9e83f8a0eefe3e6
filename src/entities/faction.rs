//! Faction entity - A named group owned by its leader.
//!
//! The member list lives in `faction_members`; the leader is always its first entry.
//! Deleting a faction removes its members and releases its territories.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Faction database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "factions")]
pub struct Model {
    /// Unique identifier for the faction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across factions
    #[sea_orm(unique)]
    pub name: String,
    /// Free-form description shown in `/faction info`
    pub description: String,
    /// Optional image shown as the embed thumbnail
    pub image_url: Option<String>,
    /// Discord user ID of the leader; a user leads at most one faction
    #[sea_orm(unique)]
    pub leader_id: String,
    /// When the faction was founded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Faction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One faction has many members
    #[sea_orm(has_many = "super::faction_member::Entity")]
    Members,
}

impl Related<super::faction_member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
