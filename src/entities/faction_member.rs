//! Faction member entity - Ordered membership list of a faction.
//!
//! Insertion order (the autoincrement `id`) defines the member's position,
//! which `/faction kick` uses to address members.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Faction membership model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "faction_members")]
pub struct Model {
    /// Monotonic identifier, also the ordering key
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Faction the user belongs to
    pub faction_id: i64,
    /// Discord user ID; a user belongs to at most one faction
    #[sea_orm(unique)]
    pub user_id: String,
    /// When the user joined
    pub joined_at: DateTimeUtc,
}

/// Defines relationships between `FactionMember` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each member belongs to one faction
    #[sea_orm(
        belongs_to = "super::faction::Entity",
        from = "Column::FactionId",
        to = "super::faction::Column::Id"
    )]
    Faction,
}

impl Related<super::faction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Faction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
