//! Store wiring shared by every handler.

use std::sync::Arc;

use stockroom_infra::{
    InMemoryStore, InventoryStore, OrderStore, PostgresStore, ProfileStore, StoreHealth,
    StoreResult, UserManager,
};
use tracing::info;

use crate::config::{ApiConfig, StoreBackend};

/// Anything that can back the whole API.
pub trait Store: InventoryStore + OrderStore + ProfileStore + StoreHealth + 'static {}

impl<T> Store for T where T: InventoryStore + OrderStore + ProfileStore + StoreHealth + 'static {}

#[derive(Clone)]
pub struct AppServices {
    inventory: Arc<dyn InventoryStore>,
    orders: Arc<dyn OrderStore>,
    profiles: Arc<dyn ProfileStore>,
    health: Arc<dyn StoreHealth>,
    page_size: usize,
    backend: &'static str,
}

impl AppServices {
    pub fn from_store<S: Store>(store: Arc<S>, page_size: usize, backend: &'static str) -> Self {
        Self {
            inventory: store.clone(),
            orders: store.clone(),
            profiles: store.clone(),
            health: store,
            page_size,
            backend,
        }
    }

    pub fn in_memory(page_size: usize) -> Self {
        Self::from_store(Arc::new(InMemoryStore::new()), page_size, "in-memory")
    }

    /// Build services for the configured backend. Postgres connections are
    /// opened and migrated here.
    pub async fn from_config(config: &ApiConfig) -> StoreResult<Self> {
        match &config.backend {
            StoreBackend::InMemory => {
                info!("using in-memory stores");
                Ok(Self::in_memory(config.page_size))
            }
            StoreBackend::Postgres {
                database_url,
                max_connections,
            } => {
                let store = PostgresStore::connect(database_url, *max_connections).await?;
                store.migrate().await?;
                info!(max_connections, "using postgres stores");
                Ok(Self::from_store(Arc::new(store), config.page_size, "postgres"))
            }
        }
    }

    pub fn inventory(&self) -> &dyn InventoryStore {
        self.inventory.as_ref()
    }

    pub fn orders(&self) -> &dyn OrderStore {
        self.orders.as_ref()
    }

    pub fn health(&self) -> &dyn StoreHealth {
        self.health.as_ref()
    }

    pub fn users(&self) -> UserManager {
        UserManager::new(self.profiles.clone())
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }
}
