/// Database configuration and connection management
pub mod database;

/// Guild settings, shop catalog and territories loaded from config.toml
pub mod settings;

/// Secrets and paths read from the environment
pub mod env;
