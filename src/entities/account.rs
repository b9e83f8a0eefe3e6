//! Account entity - One row per user in the points ledger.
//!
//! Rows are created lazily the first time a user is credited or debited.
//! The balance is never written negative; callers either reject or clamp.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ledger account model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Discord user ID owning the balance
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    /// Current balance in points
    pub balance: i64,
    /// When the balance last changed
    pub updated_at: DateTimeUtc,
}

/// Accounts have no relationships; membership and history reference user IDs loosely
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
