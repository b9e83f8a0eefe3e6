//! Guild settings loading from config.toml
//!
//! Everything guild-specific lives here instead of in the command code: the owner
//! allowed to export data, staff roles allowed to run events, the booster role that
//! doubles rewards, users protected from robbery, users hidden from the leaderboard,
//! the channel where faction join requests are posted, the shop catalog and the
//! territories factions can conquer.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    /// Discord user ID allowed to run `/export`
    #[serde(default)]
    pub owner_id: Option<String>,
    /// Roles allowed to start staff events (`/riddle`, `/drop`, `/reaction`)
    #[serde(default)]
    pub staff_role_ids: Vec<String>,
    /// Role whose holders earn double rewards
    #[serde(default)]
    pub booster_role_id: Option<String>,
    /// Users that can never be robbed
    #[serde(default)]
    pub protected_user_ids: Vec<String>,
    /// Users hidden from the leaderboard
    #[serde(default)]
    pub leaderboard_excluded_ids: Vec<String>,
    /// Channel where faction join requests are posted
    #[serde(default)]
    pub faction_requests_channel_id: Option<String>,
    /// Shop catalog
    #[serde(default)]
    pub shop: Vec<ShopItemConfig>,
    /// Territories factions can conquer
    #[serde(default)]
    pub territories: Vec<TerritoryConfig>,
}

/// What buying a shop item hands out
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// Mints a voucher token redeemed outside the bot
    Voucher,
    /// Grants a guild role
    Role,
}

/// Configuration for a single shop item
#[derive(Debug, Deserialize, Clone)]
pub struct ShopItemConfig {
    /// Unique display name (e.g., "100 Robux")
    pub name: String,
    /// Price in points
    pub price: i64,
    /// Short description shown in the select menu
    pub description: String,
    /// What the purchase grants
    pub kind: ItemKind,
    /// Role granted by `kind = "role"` items
    #[serde(default)]
    pub role_id: Option<String>,
}

/// Configuration for a single territory
#[derive(Debug, Deserialize, Clone)]
pub struct TerritoryConfig {
    /// Stable key (e.g., `"sao_paulo"`)
    pub key: String,
    /// Display name (e.g., "São Paulo")
    pub name: String,
}

impl AppConfig {
    /// Checks the invariants serde cannot express.
    ///
    /// # Errors
    /// Returns an error if a shop item has a non-positive price, a role item has no
    /// `role_id`, or names/keys are duplicated.
    pub fn validate(&self) -> Result<()> {
        let mut names = std::collections::HashSet::new();
        for item in &self.shop {
            if item.price <= 0 {
                return Err(Error::Config {
                    message: format!("Shop item '{}' must have a positive price", item.name),
                });
            }
            if item.kind == ItemKind::Role && item.role_id.is_none() {
                return Err(Error::Config {
                    message: format!("Shop item '{}' is a role but has no role_id", item.name),
                });
            }
            if !names.insert(item.name.to_lowercase()) {
                return Err(Error::Config {
                    message: format!("Duplicate shop item '{}'", item.name),
                });
            }
        }

        let mut keys = std::collections::HashSet::new();
        for territory in &self.territories {
            if !keys.insert(territory.key.as_str()) {
                return Err(Error::Config {
                    message: format!("Duplicate territory key '{}'", territory.key),
                });
            }
        }
        Ok(())
    }

    /// Whether any of the given role IDs is a staff role.
    #[must_use]
    pub fn is_staff<'a>(&self, mut role_ids: impl Iterator<Item = &'a str>) -> bool {
        role_ids.any(|role| self.staff_role_ids.iter().any(|staff| staff == role))
    }

    /// Whether the given role IDs include the booster role.
    #[must_use]
    pub fn is_booster<'a>(&self, mut role_ids: impl Iterator<Item = &'a str>) -> bool {
        self.booster_role_id
            .as_deref()
            .is_some_and(|booster| role_ids.any(|role| role == booster))
    }
}

/// Parses settings from a TOML string and validates them.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// Loads settings from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing or the catalog is inconsistent
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    tracing::debug!("Attempting to load configuration from: {:?}", path.as_ref());
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const SAMPLE: &str = r#"
        owner_id = "100"
        staff_role_ids = ["200", "201"]
        booster_role_id = "300"
        protected_user_ids = ["400"]
        leaderboard_excluded_ids = ["500"]
        faction_requests_channel_id = "600"

        [[shop]]
        name = "100 Robux"
        price = 550
        description = "100 Robux after fees."
        kind = "voucher"

        [[shop]]
        name = "Bloxy Cola Role"
        price = 950
        description = "Doubles your points"
        kind = "role"
        role_id = "300"

        [[territories]]
        key = "sao_paulo"
        name = "São Paulo"
    "#;

    #[test]
    fn test_parse_app_config() {
        let config = parse_config(SAMPLE).unwrap();
        assert_eq!(config.owner_id.as_deref(), Some("100"));
        assert_eq!(config.shop.len(), 2);
        assert_eq!(config.shop[0].kind, ItemKind::Voucher);
        assert_eq!(config.shop[1].role_id.as_deref(), Some("300"));
        assert_eq!(config.territories[0].name, "São Paulo");
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.shop.is_empty());
        assert!(config.owner_id.is_none());
    }

    #[test]
    fn test_role_item_requires_role_id() {
        let toml_str = r#"
            [[shop]]
            name = "Angel"
            price = 3500
            description = "Above Client"
            kind = "role"
        "#;
        let err = parse_config(toml_str).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_duplicate_territories_rejected() {
        let toml_str = r#"
            [[territories]]
            key = "parana"
            name = "Paraná"

            [[territories]]
            key = "parana"
            name = "Paraná again"
        "#;
        assert!(parse_config(toml_str).is_err());
    }

    #[test]
    fn test_role_checks() {
        let config = parse_config(SAMPLE).unwrap();
        assert!(config.is_staff(["999", "201"].into_iter()));
        assert!(!config.is_staff(["999"].into_iter()));
        assert!(config.is_booster(["300"].into_iter()));
        assert!(!AppConfig::default().is_booster(["300"].into_iter()));
    }
}
