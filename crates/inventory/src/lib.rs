//! Inventory domain module.
//!
//! This crate contains inventory records, their lookup tables and the
//! `created_after` filter, implemented purely as domain logic (no IO, no HTTP,
//! no storage).

pub mod filter;
pub mod item;
pub mod lookup;

pub use filter::{CreatedAfter, CreatedAfterError};
pub use item::{CreateInventory, Inventory, InventoryDraft, UpdateInventory};
pub use lookup::{
    InventoryLanguage, InventoryTag, InventoryTagDraft, InventoryType, LookupDraft,
};
