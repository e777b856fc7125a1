//! Orders domain module.
//!
//! Orders placed against inventory, the tags attached to them and the date
//! window used to query them. Pure domain logic (no IO, no HTTP, no storage).

pub mod filter;
pub mod order;
pub mod tag;

pub use filter::{DateWindow, DateWindowError};
pub use order::{CreateOrder, DeactivateOrder, Order, OrderDraft, TagLink};
pub use tag::{CreateOrderTag, OrderTag, OrderTagDraft};
