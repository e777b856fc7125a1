//! Lookup tables referenced by inventory records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{
    DomainResult, Entity, FieldErrors, InventoryLanguageId, InventoryTagId, InventoryTypeId,
    validation,
};

/// Kind of inventory (e.g. "Movie", "Book").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryType {
    pub id: InventoryTypeId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Language an inventory item is published in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryLanguage {
    pub id: InventoryLanguageId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Free-form label for inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTag {
    pub id: InventoryTagId,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Draft for the name-only lookups (types and languages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupDraft {
    pub name: String,
}

impl LookupDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::check_name("name", &self.name, &mut errors);
        errors.into_result()
    }
}

/// Draft for an inventory tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTagDraft {
    pub name: String,
    pub is_active: bool,
}

impl InventoryTagDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_active: true,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        validation::check_name("name", &self.name, &mut errors);
        errors.into_result()
    }
}

impl InventoryType {
    pub fn from_draft(id: InventoryTypeId, draft: LookupDraft, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            created_at: occurred_at,
            updated_at: occurred_at,
        }
    }
}

impl InventoryLanguage {
    pub fn from_draft(
        id: InventoryLanguageId,
        draft: LookupDraft,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            created_at: occurred_at,
            updated_at: occurred_at,
        }
    }
}

impl InventoryTag {
    pub fn from_draft(
        id: InventoryTagId,
        draft: InventoryTagDraft,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: draft.name,
            is_active: draft.is_active,
            created_at: occurred_at,
            updated_at: occurred_at,
        }
    }
}

impl Entity for InventoryType {
    type Id = InventoryTypeId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for InventoryLanguage {
    type Id = InventoryLanguageId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Entity for InventoryTag {
    type Id = InventoryTagId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_draft_defaults_to_active() {
        let draft = InventoryTagDraft::new("classic");
        let tag = InventoryTag::from_draft(InventoryTagId::new(1), draft, Utc::now());
        assert!(tag.is_active);
        assert_eq!(tag.created_at, tag.updated_at);
    }

    #[test]
    fn lookup_names_are_validated() {
        assert!(LookupDraft::new("English").validate().is_ok());
        assert!(LookupDraft::new("").validate().is_err());
        assert!(InventoryTagDraft::new(" ").validate().is_err());
    }
}
