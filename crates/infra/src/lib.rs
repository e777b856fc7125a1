//! Infrastructure layer: stores (in-memory and Postgres) and account wiring.

pub mod profiles;
pub mod store;

pub use profiles::{UserManager, UserManagerError};
pub use store::{
    InMemoryStore, InventoryStore, OrderStore, PostgresStore, ProfileStore, StoreError, StoreHealth,
    StoreResult,
};
