use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainResult, Entity, FieldErrors, OrderTagId, validation};

/// Label that can be attached to any number of orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTag {
    pub id: OrderTagId,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderTag {
    pub fn from_draft(id: OrderTagId, draft: OrderTagDraft, occurred_at: DateTime<Utc>) -> Self {
        Self {
            id,
            name: draft.name,
            is_active: draft.is_active,
            created_at: occurred_at,
            updated_at: occurred_at,
        }
    }
}

impl Entity for OrderTag {
    type Id = OrderTagId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTagDraft {
    pub name: String,
    pub is_active: bool,
}

impl OrderTagDraft {
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

/// Command: CreateOrderTag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrderTag {
    pub draft: OrderTagDraft,
    pub occurred_at: DateTime<Utc>,
}
