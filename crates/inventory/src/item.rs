use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use stockroom_core::{
    DomainResult, Entity, FieldErrors, InventoryId, InventoryLanguageId, InventoryTypeId,
    validation,
};

/// A stocked inventory record.
///
/// Inventory is never deleted; it changes only through a full update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub id: InventoryId,
    pub name: String,
    #[serde(rename = "type")]
    pub type_id: InventoryTypeId,
    #[serde(rename = "language")]
    pub language_id: InventoryLanguageId,
    pub metadata: Map<String, Value>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Inventory {
    /// Materialise a stored record from a validated draft.
    pub fn from_draft(id: InventoryId, draft: InventoryDraft, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            type_id: draft.type_id,
            language_id: draft.language_id,
            metadata: draft.metadata,
            is_active: draft.is_active,
            created_at: occurred_at,
            updated_at: occurred_at,
        }
    }

    /// Replace every writable field. `created_at` is preserved.
    pub fn apply_update(&mut self, draft: InventoryDraft, occurred_at: DateTime<Utc>) {
        self.name = draft.name;
        self.type_id = draft.type_id;
        self.language_id = draft.language_id;
        self.metadata = draft.metadata;
        self.is_active = draft.is_active;
        self.updated_at = occurred_at;
    }
}

impl Entity for Inventory {
    type Id = InventoryId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Writable fields of an inventory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDraft {
    pub name: String,
    pub type_id: InventoryTypeId,
    pub language_id: InventoryLanguageId,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl InventoryDraft {
    pub fn new(
        name: impl Into<String>,
        type_id: InventoryTypeId,
        language_id: InventoryLanguageId,
    ) -> Self {
        Self {
            name: name.into(),
            type_id,
            language_id,
            metadata: Map::new(),
            is_active: true,
        }
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Field checks that do not need the store (reference existence is the
    /// store's job).
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::check_name("name", &self.name, &mut errors);
        errors.into_result()
    }
}

/// Command: CreateInventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateInventory {
    pub draft: InventoryDraft,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateInventory (full replacement).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateInventory {
    pub id: InventoryId,
    pub draft: InventoryDraft,
    pub occurred_at: DateTime<Utc>,
}
