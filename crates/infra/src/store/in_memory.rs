use std::collections::{BTreeMap, BTreeSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockroom_core::{
    Entity, FieldErrors, InventoryId, InventoryLanguageId, InventoryTagId, InventoryTypeId,
    LimitOffset, OrderId, OrderTagId, Page, UserId, validation,
};
use stockroom_inventory::{
    CreateInventory, CreatedAfter, Inventory, InventoryDraft, InventoryLanguage, InventoryTag,
    InventoryTagDraft, InventoryType, LookupDraft, UpdateInventory,
};
use stockroom_orders::{
    CreateOrder, CreateOrderTag, DateWindow, DeactivateOrder, Order, OrderDraft, OrderTag, TagLink,
};
use stockroom_profiles::{NewUserProfile, UserProfile};

use super::{
    InventoryStore, OrderStore, ProfileStore, StoreError, StoreHealth, StoreResult, field_errors_of,
};

#[derive(Debug, Default)]
struct Sequences {
    inventory: i64,
    types: i64,
    languages: i64,
    inventory_tags: i64,
    orders: i64,
    order_tags: i64,
    profiles: i64,
}

fn bump(seq: &mut i64) -> i64 {
    *seq += 1;
    *seq
}

#[derive(Debug, Default)]
struct Tables {
    inventory: BTreeMap<InventoryId, Inventory>,
    types: BTreeMap<InventoryTypeId, InventoryType>,
    languages: BTreeMap<InventoryLanguageId, InventoryLanguage>,
    inventory_tags: BTreeMap<InventoryTagId, InventoryTag>,
    /// Orders are kept without tags; `links` is the source of truth.
    orders: BTreeMap<OrderId, Order>,
    order_tags: BTreeMap<OrderTagId, OrderTag>,
    links: BTreeSet<TagLink>,
    profiles: BTreeMap<UserId, UserProfile>,
    seq: Sequences,
}

impl Tables {
    fn missing_inventory_refs(
        &self,
        type_id: Option<InventoryTypeId>,
        language_id: Option<InventoryLanguageId>,
    ) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(id) = type_id.filter(|id| !self.types.contains_key(id)) {
            errors.add("type", validation::missing_pk(id.get()));
        }
        if let Some(id) = language_id.filter(|id| !self.languages.contains_key(id)) {
            errors.add("language", validation::missing_pk(id.get()));
        }
        errors
    }

    fn check_inventory_refs(&self, draft: &InventoryDraft) -> StoreResult<()> {
        let mut errors = field_errors_of(draft.validate())?;
        errors.extend(self.missing_inventory_refs(Some(draft.type_id), Some(draft.language_id)));
        into_store_result(errors)
    }

    fn missing_order_refs(
        &self,
        inventory_id: Option<InventoryId>,
        tag_ids: &[OrderTagId],
    ) -> FieldErrors {
        let mut errors = FieldErrors::new();
        if let Some(id) = inventory_id.filter(|id| !self.inventory.contains_key(id)) {
            errors.add("inventory", validation::missing_pk(id.get()));
        }
        for tag_id in tag_ids {
            if !self.order_tags.contains_key(tag_id) {
                errors.add("tags", validation::missing_pk(tag_id.get()));
            }
        }
        errors
    }

    fn check_order_refs(&self, draft: &OrderDraft) -> StoreResult<()> {
        into_store_result(self.missing_order_refs(Some(draft.inventory_id), &draft.tag_ids))
    }

    fn tag_ids_of(&self, order_id: OrderId) -> Vec<OrderTagId> {
        let from = TagLink::new(order_id, OrderTagId::new(i64::MIN));
        let to = TagLink::new(order_id, OrderTagId::new(i64::MAX));
        self.links.range(from..=to).map(|link| link.tag_id).collect()
    }

    fn hydrate(&self, order: &Order) -> Order {
        let mut order = order.clone();
        order.tag_ids = self.tag_ids_of(order.id);
        order
    }

    fn hydrated_orders(&self, keep: impl Fn(&Order) -> bool) -> Vec<Order> {
        let mut orders: Vec<Order> = self
            .orders
            .values()
            .filter(|o| keep(o))
            .map(|o| self.hydrate(o))
            .collect();
        orders.sort_by(newest_first);
        orders
    }

    fn inventory_sorted(&self) -> Vec<Inventory> {
        let mut items: Vec<Inventory> = self.inventory.values().cloned().collect();
        items.sort_by(newest_first);
        items
    }
}

fn into_store_result(errors: FieldErrors) -> StoreResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Invalid(errors))
    }
}

/// `created_at` descending, then id descending.
fn newest_first<E: Entity>(a: &E, b: &E) -> std::cmp::Ordering {
    b.created_at().cmp(&a.created_at()).then(b.id().cmp(&a.id()))
}

fn by_name<'a, T, I>(items: impl Iterator<Item = &'a T>, key: impl Fn(&T) -> (&str, I)) -> Vec<T>
where
    T: Clone + 'a,
    I: Ord,
{
    let mut out: Vec<T> = items.cloned().collect();
    out.sort_by(|a, b| key(a).cmp(&key(b)));
    out
}

/// In-memory store for tests/dev.
///
/// All tables sit behind one lock, so multi-table writes (an order plus its
/// tag links) are atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn create_inventory(&self, cmd: CreateInventory) -> StoreResult<Inventory> {
        let mut t = self.write()?;
        t.check_inventory_refs(&cmd.draft)?;
        let id = InventoryId::new(bump(&mut t.seq.inventory));
        let item = Inventory::from_draft(id, cmd.draft, cmd.occurred_at);
        t.inventory.insert(id, item.clone());
        Ok(item)
    }

    async fn update_inventory(&self, cmd: UpdateInventory) -> StoreResult<Inventory> {
        let mut t = self.write()?;
        if !t.inventory.contains_key(&cmd.id) {
            return Err(StoreError::NotFound);
        }
        t.check_inventory_refs(&cmd.draft)?;
        let item = t.inventory.get_mut(&cmd.id).ok_or(StoreError::NotFound)?;
        item.apply_update(cmd.draft, cmd.occurred_at);
        Ok(item.clone())
    }

    async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        Ok(self.read()?.inventory.get(&id).cloned())
    }

    async fn list_inventory(&self, window: LimitOffset) -> StoreResult<Page<Inventory>> {
        let items = self.read()?.inventory_sorted();
        Ok(Page {
            count: items.len(),
            items: window.apply(&items),
            window,
        })
    }

    async fn list_inventory_created_after(
        &self,
        filter: CreatedAfter,
    ) -> StoreResult<Vec<Inventory>> {
        let mut items = self.read()?.inventory_sorted();
        items.retain(|item| filter.matches(item));
        Ok(items)
    }

    async fn missing_inventory_refs(
        &self,
        type_id: Option<InventoryTypeId>,
        language_id: Option<InventoryLanguageId>,
    ) -> StoreResult<FieldErrors> {
        Ok(self.read()?.missing_inventory_refs(type_id, language_id))
    }

    async fn create_inventory_type(
        &self,
        draft: LookupDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryType> {
        draft.validate()?;
        let mut t = self.write()?;
        let id = InventoryTypeId::new(bump(&mut t.seq.types));
        let row = InventoryType::from_draft(id, draft, occurred_at);
        t.types.insert(id, row.clone());
        Ok(row)
    }

    async fn list_inventory_types(&self) -> StoreResult<Vec<InventoryType>> {
        let t = self.read()?;
        Ok(by_name(t.types.values(), |r| (r.name.as_str(), r.id)))
    }

    async fn create_inventory_language(
        &self,
        draft: LookupDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryLanguage> {
        draft.validate()?;
        let mut t = self.write()?;
        let id = InventoryLanguageId::new(bump(&mut t.seq.languages));
        let row = InventoryLanguage::from_draft(id, draft, occurred_at);
        t.languages.insert(id, row.clone());
        Ok(row)
    }

    async fn list_inventory_languages(&self) -> StoreResult<Vec<InventoryLanguage>> {
        let t = self.read()?;
        Ok(by_name(t.languages.values(), |r| (r.name.as_str(), r.id)))
    }

    async fn create_inventory_tag(
        &self,
        draft: InventoryTagDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryTag> {
        draft.validate()?;
        let mut t = self.write()?;
        let id = InventoryTagId::new(bump(&mut t.seq.inventory_tags));
        let row = InventoryTag::from_draft(id, draft, occurred_at);
        t.inventory_tags.insert(id, row.clone());
        Ok(row)
    }

    async fn list_inventory_tags(&self) -> StoreResult<Vec<InventoryTag>> {
        let t = self.read()?;
        Ok(by_name(t.inventory_tags.values(), |r| (r.name.as_str(), r.id)))
    }
}

#[async_trait]
impl OrderStore for InMemoryStore {
    async fn create_order(&self, cmd: CreateOrder) -> StoreResult<Order> {
        let mut t = self.write()?;
        t.check_order_refs(&cmd.draft)?;
        let id = OrderId::new(bump(&mut t.seq.orders));
        let order = Order::from_draft(id, cmd.draft, cmd.occurred_at);
        t.links.extend(order.links());

        let mut bare = order.clone();
        bare.tag_ids.clear();
        t.orders.insert(id, bare);
        Ok(order)
    }

    async fn missing_order_refs(
        &self,
        inventory_id: Option<InventoryId>,
        tag_ids: &[OrderTagId],
    ) -> StoreResult<FieldErrors> {
        Ok(self.read()?.missing_order_refs(inventory_id, tag_ids))
    }

    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        let t = self.read()?;
        Ok(t.orders.get(&id).map(|o| t.hydrate(o)))
    }

    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        Ok(self.read()?.hydrated_orders(|_| true))
    }

    async fn deactivate_order(&self, cmd: DeactivateOrder) -> StoreResult<Order> {
        let mut t = self.write()?;
        let order = t.orders.get_mut(&cmd.id).ok_or(StoreError::NotFound)?;
        order.deactivate(cmd.occurred_at);
        let order = order.clone();
        Ok(t.hydrate(&order))
    }

    async fn list_orders_in_window(&self, window: DateWindow) -> StoreResult<Vec<Order>> {
        Ok(self.read()?.hydrated_orders(|o| window.contains(o)))
    }

    async fn tags_for_order(&self, order_id: OrderId) -> StoreResult<Vec<OrderTag>> {
        let t = self.read()?;
        if !t.orders.contains_key(&order_id) {
            return Err(StoreError::NotFound);
        }
        let tag_ids = t.tag_ids_of(order_id);
        let linked = tag_ids.iter().filter_map(|id| t.order_tags.get(id));
        Ok(by_name(linked, |r| (r.name.as_str(), r.id)))
    }

    async fn orders_for_tag(&self, tag_id: OrderTagId) -> StoreResult<Vec<Order>> {
        let t = self.read()?;
        if !t.order_tags.contains_key(&tag_id) {
            return Err(StoreError::NotFound);
        }
        Ok(t.hydrated_orders(|o| t.links.contains(&TagLink::new(o.id, tag_id))))
    }

    async fn create_order_tag(&self, cmd: CreateOrderTag) -> StoreResult<OrderTag> {
        cmd.draft.validate()?;
        let mut t = self.write()?;
        let id = OrderTagId::new(bump(&mut t.seq.order_tags));
        let tag = OrderTag::from_draft(id, cmd.draft, cmd.occurred_at);
        t.order_tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn list_order_tags(&self) -> StoreResult<Vec<OrderTag>> {
        let t = self.read()?;
        Ok(by_name(t.order_tags.values(), |r| (r.name.as_str(), r.id)))
    }
}

#[async_trait]
impl ProfileStore for InMemoryStore {
    async fn insert_profile(&self, profile: NewUserProfile) -> StoreResult<UserProfile> {
        let mut t = self.write()?;
        if t.profiles.values().any(|p| p.email == profile.email) {
            return Err(StoreError::Conflict(format!(
                "user profile with email {} already exists",
                profile.email
            )));
        }
        let id = UserId::new(bump(&mut t.seq.profiles));
        let stored = profile.into_profile(id);
        t.profiles.insert(id, stored.clone());
        Ok(stored)
    }

    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        let t = self.read()?;
        Ok(t.profiles.values().find(|p| p.email == email).cloned())
    }
}

#[async_trait]
impl StoreHealth for InMemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
