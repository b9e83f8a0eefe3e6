#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use snoocredits::{
    bot::framework,
    config::{database, env, settings},
    core::{snapshot, store::RecordStore, territory},
    errors::Result,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Secrets first, so a missing token fails before anything touches disk
    let secrets = env::load_secrets()?;
    let config_path = env::config_path();
    let app_config = settings::load_config(&config_path)
        .inspect(|_| info!("Loaded settings from {}", config_path.display()))
        .inspect_err(|e| error!("Failed to load {}: {e}", config_path.display()))?;
    let app_config = Arc::new(app_config);

    // 4. Initialize database
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Seed territories and import legacy data if asked to
    territory::seed(&db, &app_config.territories)
        .await
        .inspect(|added| info!("Seeded {added} new territories."))
        .inspect_err(|e| error!("Failed to seed territories: {e}"))?;
    if let Some(dir) = env::legacy_data_dir() {
        match snapshot::import_legacy(&db, &RecordStore::new(), &dir).await? {
            Some(report) => info!("Imported legacy data from {}: {report:?}", dir.display()),
            None => info!("Ledger already has accounts, skipping legacy import."),
        }
    }

    // 6. Run the bot
    framework::run_bot(secrets, app_config, db).await
}
