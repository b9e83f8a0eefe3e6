//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each logical store of the economy (ledger, cooldowns, factions, territories,
//! vouchers, history) is one table; no referential integrity is enforced
//! across them beyond the faction membership relation.

pub mod account;
pub mod cooldown;
pub mod faction;
pub mod faction_member;
pub mod history;
pub mod territory;
pub mod voucher;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use cooldown::{Column as CooldownColumn, Entity as Cooldown, Model as CooldownModel};
pub use faction::{Column as FactionColumn, Entity as Faction, Model as FactionModel};
pub use faction_member::{
    Column as FactionMemberColumn, Entity as FactionMember, Model as FactionMemberModel,
};
pub use history::{Column as HistoryColumn, Entity as History, Model as HistoryModel};
pub use territory::{Column as TerritoryColumn, Entity as Territory, Model as TerritoryModel};
pub use voucher::{Column as VoucherColumn, Entity as Voucher, Model as VoucherModel};
