//! Autocomplete handlers for Discord slash command parameters.
//!
//! This module suggests faction names, territory names and shop items as the user
//! types, so commands receive names that actually exist.

use crate::{
    bot::BotData,
    core::{faction, territory},
    errors::Error,
};

/// Keeps the names containing `partial` (case-insensitive), sorted, at most 25.
fn matching(names: impl IntoIterator<Item = String>, partial: &str) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    let mut matching: Vec<String> = names
        .into_iter()
        .filter(|name| name.to_lowercase().contains(&partial_lower))
        .take(25) // Discord autocomplete limit
        .collect();
    matching.sort();
    matching
}

/// Provides autocomplete suggestions for faction names.
pub async fn autocomplete_faction_name(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(factions) = faction::all(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(factions.into_iter().map(|f| f.name), partial)
}

/// Provides autocomplete suggestions for territory names.
pub async fn autocomplete_territory(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(areas) = territory::all(&ctx.data().database).await else {
        return Vec::new();
    };
    matching(areas.into_iter().map(|t| t.name), partial)
}

/// Provides autocomplete suggestions for shop items from the configured catalog.
#[allow(clippy::unused_async)] // poise requires autocomplete callbacks to be async
pub async fn autocomplete_shop_item(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    matching(
        ctx.data().settings.shop.iter().map(|item| item.name.clone()),
        partial,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_filters_and_sorts() {
        let names = ["Red Army", "blue crew", "Redwood"].map(String::from);
        assert_eq!(matching(names.clone(), "red"), vec!["Red Army", "Redwood"]);
        assert_eq!(matching(names, "").len(), 3);
    }
}
