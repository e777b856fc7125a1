//! `stockroom-core`: shared domain building blocks.
//!
//! This crate contains **pure domain** primitives (no HTTP, no storage).

pub mod date;
pub mod entity;
pub mod error;
pub mod id;
pub mod page;
pub mod validation;
pub mod value_object;

pub use date::{CalendarDateError, parse_calendar_date, start_of_day};
pub use entity::Entity;
pub use error::{DomainError, DomainResult, FieldErrors};
pub use id::{
    InventoryId, InventoryLanguageId, InventoryTagId, InventoryTypeId, OrderId, OrderTagId, UserId,
};
pub use page::{LimitOffset, Page};
pub use value_object::ValueObject;
