//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Owner-only administration commands
pub mod admin;

/// Balances, transfers, claims, robberies and rankings
pub mod economy;

/// Staff events
pub mod events;

/// Factions and territories
pub mod faction;

/// Bets and minigames
pub mod games;

/// General utility commands
pub mod general;

/// Shop and voucher commands
pub mod shop;

// Export commands
pub use admin::*;
pub use economy::*;
pub use events::*;
pub use faction::*;
pub use games::*;
pub use general::*;
pub use shop::*;
