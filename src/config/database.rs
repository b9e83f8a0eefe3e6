//! Database configuration module for `SnooCredits`.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema always matches the Rust structs. Creation is idempotent (`IF NOT EXISTS`)
//! because the bot runs it on every start.

use crate::entities::{Account, Cooldown, Faction, FactionMember, History, Territory, Voucher};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};

/// Default location of the live database when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/snoocredits.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if the variable is unset. The `data/` directory is
/// created first so that `mode=rwc` can create the file.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if database_url == DEFAULT_DATABASE_URL {
        tokio::fs::create_dir_all("data").await?;
    }

    tracing::debug!("Connecting to database at {database_url}");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, schema: &Schema, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table of the economy if it does not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Account).await?;
    create_table(db, &schema, Cooldown).await?;
    create_table(db, &schema, Faction).await?;
    create_table(db, &schema, FactionMember).await?;
    create_table(db, &schema, Territory).await?;
    create_table(db, &schema, Voucher).await?;
    create_table(db, &schema, History).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        AccountModel, CooldownModel, FactionMemberModel, FactionModel, HistoryModel,
        TerritoryModel, VoucherModel,
    };
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<AccountModel> = Account::find().limit(1).all(&db).await?;
        let _: Vec<CooldownModel> = Cooldown::find().limit(1).all(&db).await?;
        let _: Vec<FactionModel> = Faction::find().limit(1).all(&db).await?;
        let _: Vec<FactionMemberModel> = FactionMember::find().limit(1).all(&db).await?;
        let _: Vec<TerritoryModel> = Territory::find().limit(1).all(&db).await?;
        let _: Vec<VoucherModel> = Voucher::find().limit(1).all(&db).await?;
        let _: Vec<HistoryModel> = History::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<AccountModel> = Account::find().limit(1).all(&db).await?;
        Ok(())
    }
}
