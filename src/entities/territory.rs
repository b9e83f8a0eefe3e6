//! Territory entity - A fixed area that factions fight over.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Territory model, seeded from `config.toml`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "territories")]
pub struct Model {
    /// Stable key such as `"sao_paulo"`
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Display name such as `"São Paulo"`
    pub name: String,
    /// Controlling faction, if any
    pub faction_id: Option<i64>,
    /// Last capture attempt by any faction
    pub last_attempt_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
