//! Persistence abstractions for inventory, orders and user profiles.
//!
//! Handlers only ever see these traits. Two implementations exist:
//! [`InMemoryStore`] for dev/tests and [`PostgresStore`] for real
//! deployments; both honour the same ordering and validation rules.
//!
//! ## Default orderings
//!
//! - inventory and orders: `created_at` descending, then `id` descending
//! - lookups and tags: `name` ascending, then `id` ascending

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use stockroom_core::{
    DomainError, DomainResult, FieldErrors, InventoryId, InventoryLanguageId, InventoryTypeId,
    LimitOffset, OrderId, OrderTagId, Page,
};
use stockroom_inventory::{
    CreateInventory, CreatedAfter, Inventory, InventoryLanguage, InventoryTag, InventoryTagDraft,
    InventoryType, LookupDraft, UpdateInventory,
};
use stockroom_orders::{CreateOrder, CreateOrderTag, DateWindow, DeactivateOrder, Order, OrderTag};
use stockroom_profiles::{NewUserProfile, UserProfile};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Store failure.
///
/// - **NotFound**: the addressed record does not exist
/// - **Conflict**: a uniqueness rule was broken
/// - **Invalid**: the write was rejected field by field (blank names, dangling references)
/// - **Backend**: the backing store itself failed (connection, SQL, poisoned lock)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid fields: {0}")]
    Invalid(FieldErrors),

    #[error("store backend failure: {0}")]
    Backend(String),
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Fields(errors) => StoreError::Invalid(errors),
            DomainError::InvalidId(msg) => {
                StoreError::Invalid(FieldErrors::single("non_field_errors", msg))
            }
        }
    }
}

/// Field errors of a draft check, or an empty set when it passed.
pub(crate) fn field_errors_of(result: DomainResult<()>) -> StoreResult<FieldErrors> {
    match result {
        Ok(()) => Ok(FieldErrors::new()),
        Err(DomainError::Fields(errors)) => Ok(errors),
        Err(other) => Err(other.into()),
    }
}

/// Inventory records and their lookup tables.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn create_inventory(&self, cmd: CreateInventory) -> StoreResult<Inventory>;

    /// Full replacement; `NotFound` when the record does not exist.
    async fn update_inventory(&self, cmd: UpdateInventory) -> StoreResult<Inventory>;

    async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>>;

    /// One window of all inventory, newest first.
    async fn list_inventory(&self, window: LimitOffset) -> StoreResult<Page<Inventory>>;

    /// Every record created strictly after the filter's threshold, newest first.
    async fn list_inventory_created_after(
        &self,
        filter: CreatedAfter,
    ) -> StoreResult<Vec<Inventory>>;

    /// Field errors for the given references that name no record. `None`
    /// references are skipped.
    async fn missing_inventory_refs(
        &self,
        type_id: Option<InventoryTypeId>,
        language_id: Option<InventoryLanguageId>,
    ) -> StoreResult<FieldErrors>;

    async fn create_inventory_type(
        &self,
        draft: LookupDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryType>;

    async fn list_inventory_types(&self) -> StoreResult<Vec<InventoryType>>;

    async fn create_inventory_language(
        &self,
        draft: LookupDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryLanguage>;

    async fn list_inventory_languages(&self) -> StoreResult<Vec<InventoryLanguage>>;

    async fn create_inventory_tag(
        &self,
        draft: InventoryTagDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryTag>;

    async fn list_inventory_tags(&self) -> StoreResult<Vec<InventoryTag>>;
}

/// Orders, order tags and the order/tag join table.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Insert an order and its tag links atomically.
    async fn create_order(&self, cmd: CreateOrder) -> StoreResult<Order>;

    /// Field errors for an order's references that name no record.
    async fn missing_order_refs(
        &self,
        inventory_id: Option<InventoryId>,
        tag_ids: &[OrderTagId],
    ) -> StoreResult<FieldErrors>;

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>>;

    async fn list_orders(&self) -> StoreResult<Vec<Order>>;

    /// `NotFound` when the order does not exist.
    async fn deactivate_order(&self, cmd: DeactivateOrder) -> StoreResult<Order>;

    /// Orders whose whole interval lies inside the window.
    async fn list_orders_in_window(&self, window: DateWindow) -> StoreResult<Vec<Order>>;

    /// Tags of an order; `NotFound` when the order does not exist.
    async fn tags_for_order(&self, order_id: OrderId) -> StoreResult<Vec<OrderTag>>;

    /// Orders carrying a tag; `NotFound` when the tag does not exist.
    async fn orders_for_tag(&self, tag_id: OrderTagId) -> StoreResult<Vec<Order>>;

    async fn create_order_tag(&self, cmd: CreateOrderTag) -> StoreResult<OrderTag>;

    async fn list_order_tags(&self) -> StoreResult<Vec<OrderTag>>;
}

/// Credential store for user profiles. Emails are unique.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `Conflict` when the email is already taken.
    async fn insert_profile(&self, profile: NewUserProfile) -> StoreResult<UserProfile>;

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>>;
}

/// Readiness check for the backing store.
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}
