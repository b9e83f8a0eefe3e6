//! Discord interaction handlers
//!
//! This module provides handlers for Discord interactions such as autocomplete,
//! button clicks, command checks, gateway events and background tasks.

/// Autocomplete handlers for faction, territory and shop item names
pub mod autocomplete;
/// Role and identity checks used by restricted commands
pub mod checks;
/// Button and menu helpers built on the core collector
pub mod components;
/// Periodic territory income
pub mod income;
/// Gateway event listener (`taxa` helper)
pub mod listener;
