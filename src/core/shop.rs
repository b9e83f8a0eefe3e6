//! Shop purchases and voucher tokens.
//!
//! The catalog comes from `config.toml`. Every item can be bought once per user.
//! Voucher items mint a token that is redeemed outside the bot; role items are
//! granted by the caller after the purchase commits.

use crate::{
    config::settings::{ItemKind, ShopItemConfig},
    core::{
        history::{self, HistoryKind, NewRecord},
        ledger,
    },
    entities::{History, Voucher, history as history_entity, voucher},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use std::time::Duration;

/// How long the shop menu accepts a selection
pub const MENU_TIMEOUT: Duration = Duration::from_secs(60);
/// Purchases shown per page of `/purchases`
pub const PAGE_SIZE: u64 = 5;

/// Looks up a catalog item by name, ignoring case.
#[must_use]
pub fn find_item<'a>(catalog: &'a [ShopItemConfig], name: &str) -> Option<&'a ShopItemConfig> {
    catalog
        .iter()
        .find(|item| item.name.eq_ignore_ascii_case(name.trim()))
}

/// Builds a voucher token from a millisecond timestamp and a number in `0..1_000_000`.
#[must_use]
pub fn voucher_token(epoch_millis: i64, nonce: u32) -> String {
    format!("VOUCHER-{epoch_millis}-{}", nonce % 1_000_000)
}

/// A completed purchase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Name of the item bought
    pub item: String,
    /// Price paid
    pub price: i64,
    /// Buyer's balance afterwards
    pub balance: i64,
    /// Voucher token for voucher items
    pub voucher: Option<String>,
}

/// Buys `item` for `user_id`.
///
/// `already_has_role` tells whether the member already holds a role item's role.
/// `nonce` seeds the voucher token.
///
/// # Errors
/// Rejects repeat purchases, roles the member already holds, and buyers who can't
/// afford the price. Nothing is written on rejection.
pub async fn purchase(
    db: &DatabaseConnection,
    user_id: &str,
    item: &ShopItemConfig,
    already_has_role: bool,
    nonce: u32,
) -> Result<Receipt> {
    let txn = db.begin().await?;
    if history::has_purchased(&txn, user_id, &item.name).await? {
        return Err(Error::PurchaseRejected {
            reason: format!(
                "You already bought **{}** and can't buy it again.",
                item.name
            ),
        });
    }
    if item.kind == ItemKind::Role && already_has_role {
        return Err(Error::PurchaseRejected {
            reason: format!("You already have the **{}** role.", item.name),
        });
    }

    let balance = ledger::adjust(&txn, user_id, -item.price).await?;
    history::record(
        &txn,
        NewRecord {
            kind: HistoryKind::Purchase,
            actor_id: user_id,
            counterpart_id: None,
            amount: item.price,
            success: true,
            detail: Some(&item.name),
        },
    )
    .await?;

    let voucher = if item.kind == ItemKind::Voucher {
        let now = chrono::Utc::now();
        let token = voucher_token(now.timestamp_millis(), nonce);
        voucher::ActiveModel {
            token: Set(token.clone()),
            owner_id: Set(user_id.to_string()),
            product: Set(item.name.clone()),
            used: Set(false),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        Some(token)
    } else {
        None
    };
    txn.commit().await?;

    tracing::info!("{user_id} bought '{}' for {}", item.name, item.price);
    Ok(Receipt {
        item: item.name.clone(),
        price: item.price,
        balance,
        voucher,
    })
}

/// Undoes a role purchase whose role could not be granted: refunds the price and
/// removes the purchase record so the item can be bought again.
pub async fn revert_purchase(
    db: &DatabaseConnection,
    user_id: &str,
    item: &ShopItemConfig,
) -> Result<i64> {
    let txn = db.begin().await?;
    let latest = History::find()
        .filter(history_entity::Column::Kind.eq(HistoryKind::Purchase.as_str()))
        .filter(history_entity::Column::ActorId.eq(user_id))
        .filter(history_entity::Column::Detail.eq(item.name.as_str()))
        .order_by_desc(history_entity::Column::Id)
        .one(&txn)
        .await?;
    if let Some(record) = latest {
        record.delete(&txn).await?;
    }
    let balance = ledger::adjust(&txn, user_id, item.price).await?;
    txn.commit().await?;

    tracing::warn!("Reverted purchase of '{}' by {user_id}", item.name);
    Ok(balance)
}

/// State of a voucher token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No such token
    Unknown,
    /// Already redeemed
    Used(voucher::Model),
    /// Minted and not redeemed yet
    Valid(voucher::Model),
}

/// Looks up a voucher token.
pub async fn check_token(db: &DatabaseConnection, token: &str) -> Result<TokenStatus> {
    Ok(
        match Voucher::find_by_id(token.trim().to_string()).one(db).await? {
            None => TokenStatus::Unknown,
            Some(found) if found.used => TokenStatus::Used(found),
            Some(found) => TokenStatus::Valid(found),
        },
    )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn robux() -> ShopItemConfig {
        ShopItemConfig {
            name: "100 Robux".to_string(),
            price: 550,
            description: "100 Robux after fees.".to_string(),
            kind: ItemKind::Voucher,
            role_id: None,
        }
    }

    fn angel() -> ShopItemConfig {
        ShopItemConfig {
            name: "Angel".to_string(),
            price: 3_500,
            description: "Above Client".to_string(),
            kind: ItemKind::Role,
            role_id: Some("42".to_string()),
        }
    }

    #[test]
    fn test_voucher_token_format() {
        assert_eq!(voucher_token(1_735_689_600_000, 42), "VOUCHER-1735689600000-42");
        assert_eq!(voucher_token(1, 1_000_001), "VOUCHER-1-1");
    }

    #[test]
    fn test_find_item_ignores_case() {
        let catalog = vec![robux(), angel()];
        assert_eq!(find_item(&catalog, "angel").unwrap().price, 3_500);
        assert!(find_item(&catalog, "devil").is_none());
    }

    #[tokio::test]
    async fn test_voucher_purchase_is_one_time() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 2_000).await?;

        let receipt = purchase(&db, "A", &robux(), false, 7).await?;
        assert_eq!(receipt.balance, 1_450);
        let token = receipt.voucher.unwrap();
        assert!(token.starts_with("VOUCHER-"));
        assert!(matches!(
            check_token(&db, &token).await?,
            TokenStatus::Valid(v) if v.owner_id == "A" && v.product == "100 Robux"
        ));

        let err = purchase(&db, "A", &robux(), false, 8).await.unwrap_err();
        assert!(matches!(err, Error::PurchaseRejected { .. }));
        assert_eq!(ledger::balance_of(&db, "A").await?, 1_450);
        assert_eq!(check_token(&db, "VOUCHER-0-0").await?, TokenStatus::Unknown);
        Ok(())
    }

    #[tokio::test]
    async fn test_role_purchase_rules() -> Result<()> {
        let db = setup_test_db().await?;
        set_balance(&db, "A", 4_000).await?;

        assert!(purchase(&db, "A", &angel(), true, 0).await.is_err());
        set_balance(&db, "B", 100).await?;
        let err = purchase(&db, "B", &angel(), false, 0).await.unwrap_err();
        assert!(matches!(err, Error::InsufficientFunds { .. }));

        let receipt = purchase(&db, "A", &angel(), false, 0).await?;
        assert!(receipt.voucher.is_none());
        assert_eq!(receipt.balance, 500);

        assert_eq!(revert_purchase(&db, "A", &angel()).await?, 4_000);
        assert!(!history::has_purchased(&db, "A", "Angel").await?);
        Ok(())
    }
}
