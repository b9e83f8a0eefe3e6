//! Framework-agnostic economy logic.
//!
//! Everything here works on a `sea-orm` connection and plain values so it can be
//! tested against an in-memory database without Discord.

/// Two-player and house bets
pub mod bet;
/// Blackjack against the dealer
pub mod blackjack;
/// Periodic free points
pub mod claim;
/// Time-boxed component listeners
pub mod collector;
/// Per-user command cooldowns
pub mod cooldown;
/// Staff events and the pass price helper
pub mod events;
/// Factions and their membership
pub mod faction;
/// Purchases, bets, robberies and riddles on record
pub mod history;
/// Point balances
pub mod ledger;
/// Mines minigame
pub mod mines;
/// Robbing other users
pub mod robbery;
/// Rocket minigame
pub mod rocket;
/// Shop purchases and vouchers
pub mod shop;
/// JSON export and legacy import
pub mod snapshot;
/// JSON document store
pub mod store;
/// Territory control
pub mod territory;
pub mod wager;
