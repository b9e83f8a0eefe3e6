//! Cooldown entity - Last use of a command per user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cooldown model keyed by (user, command)
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cooldowns")]
pub struct Model {
    /// Discord user ID
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Command name the window applies to (e.g., `"claim"`)
    #[sea_orm(primary_key, auto_increment = false)]
    pub command: String,
    /// When the command was last accepted
    pub last_used_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
