//! JSON snapshots of the database and the one-time import of the legacy flat files.

use crate::{
    core::{faction::MAX_MEMBERS, history::HistoryKind, ledger, store::RecordStore},
    entities::{
        Account, Cooldown, Faction, FactionMember, History, Territory, Voucher, account, cooldown,
        faction, faction_member, history, voucher,
    },
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashSet},
    path::{Path, PathBuf},
};

async fn write_table<T>(
    store: &RecordStore,
    dir: &Path,
    table: &str,
    rows: Vec<T>,
) -> Result<Option<PathBuf>>
where
    T: Serialize + Sync,
{
    let path = dir.join(format!("{table}.json"));
    store.save(&path, &rows).await?;
    Ok((!rows.is_empty()).then_some(path))
}

/// Writes every table as a pretty JSON array under `dir`.
///
/// Returns the paths of the documents that hold at least one row.
pub async fn export(
    db: &DatabaseConnection,
    store: &RecordStore,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    let written = [
        write_table(store, dir, "accounts", Account::find().all(db).await?).await?,
        write_table(store, dir, "cooldowns", Cooldown::find().all(db).await?).await?,
        write_table(store, dir, "factions", Faction::find().all(db).await?).await?,
        write_table(store, dir, "faction_members", FactionMember::find().all(db).await?).await?,
        write_table(store, dir, "territories", Territory::find().all(db).await?).await?,
        write_table(store, dir, "vouchers", Voucher::find().all(db).await?).await?,
        write_table(store, dir, "history", History::find().all(db).await?).await?,
    ];
    let paths: Vec<PathBuf> = written.into_iter().flatten().collect();
    tracing::info!("Exported {} non-empty tables to {}", paths.len(), dir.display());
    Ok(paths)
}

#[derive(Debug, Default, Deserialize)]
struct LegacyFaction {
    #[serde(rename = "nome")]
    name: String,
    #[serde(rename = "descricao", default)]
    description: String,
    #[serde(rename = "imagem", default)]
    image: Option<String>,
    #[serde(rename = "membros", default)]
    members: Vec<String>,
    #[serde(rename = "lider")]
    leader: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyToken {
    user_id: String,
    product: String,
    #[serde(default)]
    used: bool,
}

#[derive(Debug, Deserialize)]
struct LegacyPurchase {
    product: String,
    #[serde(default)]
    price: i64,
}

/// Rows brought in by [`import_legacy`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    /// Balances imported
    pub accounts: usize,
    /// Factions imported
    pub factions: usize,
    /// Voucher tokens imported
    pub vouchers: usize,
    /// Purchase records imported
    pub purchases: usize,
}

/// Imports the legacy flat files from `dir` when the ledger is still empty.
///
/// Reads `userPoints.json`, `cooldowns.json`, `factions.json`, `tokens.json` and
/// `purchaseHistory.json`. Missing or corrupt files count as empty. Returns `None`
/// when the ledger already holds data.
pub async fn import_legacy(
    db: &DatabaseConnection,
    store: &RecordStore,
    dir: &Path,
) -> Result<Option<ImportReport>> {
    if !ledger::is_empty(db).await? {
        tracing::info!("Ledger already populated, skipping legacy import");
        return Ok(None);
    }

    let points: BTreeMap<String, i64> = store.load(dir.join("userPoints.json")).await;
    let cooldowns: BTreeMap<String, i64> = store.load(dir.join("cooldowns.json")).await;
    let factions: BTreeMap<String, LegacyFaction> = store.load(dir.join("factions.json")).await;
    let tokens: BTreeMap<String, LegacyToken> = store.load(dir.join("tokens.json")).await;
    let purchases: BTreeMap<String, Vec<LegacyPurchase>> =
        store.load(dir.join("purchaseHistory.json")).await;

    let now = Utc::now();
    let mut report = ImportReport::default();
    let txn = db.begin().await?;

    for (user_id, balance) in points {
        account::ActiveModel {
            user_id: Set(user_id),
            balance: Set(balance.max(0)),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        report.accounts += 1;
    }

    // The legacy cooldown file was shared by several commands; the claim window is
    // the only one long enough to still matter.
    for (user_id, millis) in cooldowns {
        let Some(last_used_at) = DateTime::from_timestamp_millis(millis) else {
            continue;
        };
        cooldown::ActiveModel {
            user_id: Set(user_id),
            command: Set("claim".to_string()),
            last_used_at: Set(last_used_at),
        }
        .insert(&txn)
        .await?;
    }

    let mut seen_members = HashSet::new();
    let mut seen_names = HashSet::new();
    for legacy in factions.into_values() {
        if !seen_names.insert(legacy.name.to_lowercase()) || seen_members.contains(&legacy.leader) {
            tracing::warn!("Skipping duplicate legacy faction '{}'", legacy.name);
            continue;
        }
        let created = faction::ActiveModel {
            name: Set(legacy.name),
            description: Set(legacy.description),
            image_url: Set(legacy.image),
            leader_id: Set(legacy.leader.clone()),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let roster = std::iter::once(legacy.leader)
            .chain(legacy.members)
            .filter(|id| seen_members.insert(id.clone()))
            .take(usize::try_from(MAX_MEMBERS).unwrap_or(usize::MAX));
        for user_id in roster {
            faction_member::ActiveModel {
                faction_id: Set(created.id),
                user_id: Set(user_id),
                joined_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
        }
        report.factions += 1;
    }

    for (token, legacy) in tokens {
        voucher::ActiveModel {
            token: Set(token),
            owner_id: Set(legacy.user_id),
            product: Set(legacy.product),
            used: Set(legacy.used),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;
        report.vouchers += 1;
    }

    for (user_id, bought) in purchases {
        for purchase in bought {
            history::ActiveModel {
                kind: Set(HistoryKind::Purchase.as_str().to_string()),
                actor_id: Set(user_id.clone()),
                counterpart_id: Set(None),
                amount: Set(purchase.price),
                success: Set(true),
                detail: Set(Some(purchase.product)),
                created_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            report.purchases += 1;
        }
    }

    txn.commit().await?;
    tracing::info!(
        "Imported legacy data: {} accounts, {} factions, {} vouchers, {} purchases",
        report.accounts,
        report.factions,
        report.vouchers,
        report.purchases
    );
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{faction as faction_logic, history as history_logic},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_export_writes_only_non_empty_tables() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        let store = RecordStore::new();
        set_balance(&db, "A", 120).await?;

        let paths = export(&db, &store, dir.path()).await?;
        assert_eq!(paths, vec![dir.path().join("accounts.json")]);

        let rows: Vec<account::Model> = store.load(&paths[0]).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, 120);
        assert!(dir.path().join("history.json").exists());
        Ok(())
    }

    #[tokio::test]
    async fn test_legacy_import() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        let store = RecordStore::new();

        std::fs::write(dir.path().join("userPoints.json"), r#"{"1": 500, "2": 40}"#)?;
        std::fs::write(dir.path().join("cooldowns.json"), r#"{"1": 1735689600000}"#)?;
        std::fs::write(
            dir.path().join("factions.json"),
            r#"{"1": {"nome": "Red", "descricao": "d", "imagem": null, "membros": ["1", "2"], "lider": "1"}}"#,
        )?;
        std::fs::write(
            dir.path().join("tokens.json"),
            r#"{"VOUCHER-1-1": {"userId": "2", "product": "100 Robux", "used": true}}"#,
        )?;
        std::fs::write(
            dir.path().join("purchaseHistory.json"),
            r#"{"2": [{"product": "100 Robux", "date": "1/1/2025", "price": 550}]}"#,
        )?;

        let report = import_legacy(&db, &store, dir.path()).await?.unwrap();
        assert_eq!(
            report,
            ImportReport {
                accounts: 2,
                factions: 1,
                vouchers: 1,
                purchases: 1
            }
        );
        assert_eq!(ledger::balance_of(&db, "1").await?, 500);
        let red = faction_logic::find_by_name(&db, "red").await?.unwrap();
        assert_eq!(faction_logic::members(&db, red.id).await?, vec!["1", "2"]);
        assert!(history_logic::has_purchased(&db, "2", "100 Robux").await?);

        assert!(import_legacy(&db, &store, dir.path()).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_import_tolerates_missing_files() -> Result<()> {
        let db = setup_test_db().await?;
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("userPoints.json"), "not json")?;

        let report = import_legacy(&db, &RecordStore::new(), dir.path()).await?;
        assert_eq!(report, Some(ImportReport::default()));
        Ok(())
    }
}
