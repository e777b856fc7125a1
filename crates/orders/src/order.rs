use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, InventoryId, OrderId, OrderTagId};

/// An order placed against an inventory item.
///
/// `start_date <= embargo_date` is not enforced when an order is written;
/// only range queries validate their own bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    #[serde(rename = "inventory")]
    pub inventory_id: InventoryId,
    pub start_date: NaiveDate,
    pub embargo_date: NaiveDate,
    pub is_active: bool,
    /// Linked tags, ascending and without duplicates.
    #[serde(rename = "tags")]
    pub tag_ids: Vec<OrderTagId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn from_draft(id: OrderId, draft: OrderDraft, occurred_at: DateTime<Utc>) -> Self {
        let tag_ids = draft.unique_tag_ids();
        Self {
            id,
            inventory_id: draft.inventory_id,
            start_date: draft.start_date,
            embargo_date: draft.embargo_date,
            is_active: draft.is_active,
            tag_ids,
            created_at: occurred_at,
            updated_at: occurred_at,
        }
    }

    /// Mark the order inactive. Deactivating an inactive order only bumps
    /// `updated_at`.
    pub fn deactivate(&mut self, occurred_at: DateTime<Utc>) {
        self.is_active = false;
        self.updated_at = occurred_at;
    }

    /// Join rows for the order's tags.
    pub fn links(&self) -> Vec<TagLink> {
        self.tag_ids
            .iter()
            .map(|tag_id| TagLink::new(self.id, *tag_id))
            .collect()
    }
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> Self::Id {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Writable fields of a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDraft {
    pub inventory_id: InventoryId,
    pub start_date: NaiveDate,
    pub embargo_date: NaiveDate,
    pub is_active: bool,
    pub tag_ids: Vec<OrderTagId>,
}

impl OrderDraft {
    pub fn new(inventory_id: InventoryId, start_date: NaiveDate, embargo_date: NaiveDate) -> Self {
        Self {
            inventory_id,
            start_date,
            embargo_date,
            is_active: true,
            tag_ids: Vec::new(),
        }
    }

    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = OrderTagId>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }

    pub fn unique_tag_ids(&self) -> Vec<OrderTagId> {
        let set: BTreeSet<OrderTagId> = self.tag_ids.iter().copied().collect();
        set.into_iter().collect()
    }
}

/// Command: CreateOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOrder {
    pub draft: OrderDraft,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateOrder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateOrder {
    pub id: OrderId,
    pub occurred_at: DateTime<Utc>,
}

/// One row of the order/tag join table. `(order_id, tag_id)` is unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagLink {
    pub order_id: OrderId,
    pub tag_id: OrderTagId,
}

impl TagLink {
    pub fn new(order_id: OrderId, tag_id: OrderTagId) -> Self {
        Self { order_id, tag_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        stockroom_core::parse_calendar_date(s).unwrap()
    }

    fn order() -> Order {
        Order::from_draft(
            OrderId::new(1),
            OrderDraft::new(InventoryId::new(1), date("2024-01-01"), date("2024-01-08")),
            Utc::now(),
        )
    }

    #[test]
    fn new_order_is_active_without_tags() {
        let o = order();
        assert!(o.is_active);
        assert!(o.tag_ids.is_empty());
    }

    #[test]
    fn deactivate_clears_the_flag() {
        let mut o = order();
        let later = o.updated_at + chrono::Duration::seconds(5);
        o.deactivate(later);
        assert!(!o.is_active);
        assert_eq!(o.updated_at, later);

        // again: still inactive
        o.deactivate(later);
        assert!(!o.is_active);
    }

    #[test]
    fn draft_tags_are_deduplicated() {
        let draft = OrderDraft::new(InventoryId::new(1), date("2024-01-01"), date("2024-01-02"))
            .with_tags([OrderTagId::new(3), OrderTagId::new(3), OrderTagId::new(1)]);
        let o = Order::from_draft(OrderId::new(9), draft, Utc::now());
        assert_eq!(o.tag_ids, vec![OrderTagId::new(1), OrderTagId::new(3)]);
        assert_eq!(o.links().len(), 2);
    }

    #[test]
    fn reversed_dates_are_accepted_on_write() {
        let draft = OrderDraft::new(InventoryId::new(1), date("2024-02-01"), date("2024-01-01"));
        let o = Order::from_draft(OrderId::new(2), draft, Utc::now());
        assert!(o.start_date > o.embargo_date);
    }

    #[test]
    fn serializes_wire_names() {
        let draft = OrderDraft::new(InventoryId::new(1), date("2024-01-01"), date("2024-01-02"))
            .with_tags([OrderTagId::new(4)]);
        let o = Order::from_draft(OrderId::new(1), draft, Utc::now());
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["inventory"], 1);
        assert_eq!(json["tags"], serde_json::json!([4]));
        assert_eq!(json["start_date"], "2024-01-01");
    }
}
