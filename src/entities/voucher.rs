//! Voucher entity - Redeemable token minted by a shop purchase.
//!
//! Redemption happens outside the bot; the bot only mints and reports tokens.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Voucher model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vouchers")]
pub struct Model {
    /// Opaque token, e.g. `"VOUCHER-1735689600000-42"`
    #[sea_orm(primary_key, auto_increment = false)]
    pub token: String,
    /// Discord user ID of the buyer
    pub owner_id: String,
    /// Name of the purchased product
    pub product: String,
    /// Set by the external redemption process
    pub used: bool,
    /// When the voucher was minted
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
