//! Postgres-backed store.
//!
//! Every table uses `BIGSERIAL` ids, so identifiers start at 1 and are never
//! reused. The schema lives in `crates/infra/migrations` and is applied with
//! [`PostgresStore::migrate`].
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (foreign key violation) | `23503` | `Invalid` |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Other | N/A | `Backend` |
//!
//! Reference checks (unknown type, language, inventory or tag ids) run before
//! the write so that they surface as field errors rather than raw FK failures.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::{FromRow, PgConnection, PgExecutor, PgPool};
use tracing::instrument;

use stockroom_core::{
    FieldErrors, InventoryId, InventoryLanguageId, InventoryTagId, InventoryTypeId, LimitOffset,
    OrderId, OrderTagId, Page, UserId, validation,
};
use stockroom_inventory::{
    CreateInventory, CreatedAfter, Inventory, InventoryDraft, InventoryLanguage, InventoryTag,
    InventoryTagDraft, InventoryType, LookupDraft, UpdateInventory,
};
use stockroom_orders::{CreateOrder, CreateOrderTag, DateWindow, DeactivateOrder, Order, OrderTag};
use stockroom_profiles::{NewUserProfile, UserProfile};

use super::{
    InventoryStore, OrderStore, ProfileStore, StoreError, StoreHealth, StoreResult, field_errors_of,
};

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply pending schema migrations.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }

    async fn check_inventory_refs(&self, draft: &InventoryDraft) -> StoreResult<()> {
        let mut errors = field_errors_of(draft.validate())?;
        errors.extend(
            self.missing_inventory_refs(Some(draft.type_id), Some(draft.language_id))
                .await?,
        );
        into_store_result(errors)
    }

    async fn fetch_orders(
        &self,
        op: &str,
        filter: &str,
        bind: OrderFilter,
    ) -> StoreResult<Vec<Order>> {
        let sql = order_sql(filter);
        let query = sqlx::query_as::<_, OrderRow>(&sql);
        let query = match bind {
            OrderFilter::All => query,
            OrderFilter::Key(id) => query.bind(id),
            OrderFilter::Window(start, embargo) => query.bind(start).bind(embargo),
        };
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn fetch_order(&self, op: &str, id: OrderId) -> StoreResult<Option<Order>> {
        let mut orders = self
            .fetch_orders(op, "WHERE o.id = $1", OrderFilter::Key(id.get()))
            .await?;
        Ok(orders.pop())
    }
}

enum OrderFilter {
    All,
    Key(i64),
    Window(NaiveDate, NaiveDate),
}

const ORDER_COLUMNS: &str = r#"
    SELECT
        o.id,
        o.inventory_id,
        o.start_date,
        o.embargo_date,
        o.is_active,
        o.created_at,
        o.updated_at,
        COALESCE(
            ARRAY_AGG(l.tag_id ORDER BY l.tag_id) FILTER (WHERE l.tag_id IS NOT NULL),
            '{}'::BIGINT[]
        ) AS tag_ids
    FROM orders o
    LEFT JOIN order_tag_links l ON l.order_id = o.id
"#;

fn order_sql(filter: &str) -> String {
    format!("{ORDER_COLUMNS} {filter} GROUP BY o.id ORDER BY o.created_at DESC, o.id DESC")
}

const INVENTORY_COLUMNS: &str =
    "id, name, type_id, language_id, metadata, is_active, created_at, updated_at";

/// Ids from `ids` that have no row in `table`.
async fn missing_ids<'e, E>(
    executor: E,
    table: &'static str,
    ids: &[i64],
) -> Result<Vec<i64>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let found: Vec<i64> = sqlx::query_scalar(&format!("SELECT id FROM {table} WHERE id = ANY($1)"))
        .bind(ids)
        .fetch_all(executor)
        .await?;
    let mut missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    missing.dedup();
    Ok(missing)
}

/// Dangling inventory and tag references of an order, as field errors.
async fn order_ref_errors(
    conn: &mut PgConnection,
    inventory_id: Option<i64>,
    tag_ids: &[i64],
) -> Result<FieldErrors, sqlx::Error> {
    let mut errors = FieldErrors::new();
    if let Some(id) = inventory_id {
        if !missing_ids(&mut *conn, "inventory", &[id]).await?.is_empty() {
            errors.add("inventory", validation::missing_pk(id));
        }
    }
    for tag_id in missing_ids(&mut *conn, "order_tags", tag_ids).await? {
        errors.add("tags", validation::missing_pk(tag_id));
    }
    Ok(errors)
}

fn into_store_result(errors: FieldErrors) -> StoreResult<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(StoreError::Invalid(errors))
    }
}

fn raw_ids(tag_ids: &[OrderTagId]) -> Vec<i64> {
    tag_ids.iter().map(|id| id.get()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Rows
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, FromRow)]
struct InventoryRow {
    id: i64,
    name: String,
    type_id: i64,
    language_id: i64,
    metadata: Json<Map<String, Value>>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InventoryRow> for Inventory {
    fn from(row: InventoryRow) -> Self {
        Self {
            id: InventoryId::new(row.id),
            name: row.name,
            type_id: InventoryTypeId::new(row.type_id),
            language_id: InventoryLanguageId::new(row.language_id),
            metadata: row.metadata.0,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LookupRow {
    id: i64,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct TagRow {
    id: i64,
    name: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<LookupRow> for InventoryType {
    fn from(row: LookupRow) -> Self {
        Self {
            id: InventoryTypeId::new(row.id),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<LookupRow> for InventoryLanguage {
    fn from(row: LookupRow) -> Self {
        Self {
            id: InventoryLanguageId::new(row.id),
            name: row.name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<TagRow> for InventoryTag {
    fn from(row: TagRow) -> Self {
        Self {
            id: InventoryTagId::new(row.id),
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<TagRow> for OrderTag {
    fn from(row: TagRow) -> Self {
        Self {
            id: OrderTagId::new(row.id),
            name: row.name,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: i64,
    inventory_id: i64,
    start_date: NaiveDate,
    embargo_date: NaiveDate,
    is_active: bool,
    tag_ids: Vec<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            inventory_id: InventoryId::new(row.inventory_id),
            start_date: row.start_date,
            embargo_date: row.embargo_date,
            is_active: row.is_active,
            tag_ids: row.tag_ids.into_iter().map(OrderTagId::new).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProfileRow {
    id: i64,
    email: String,
    username: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    date_joined: DateTime<Utc>,
    last_login: Option<DateTime<Utc>>,
    is_staff: bool,
    is_superuser: bool,
    is_admin: bool,
    is_active: bool,
    avatar: Option<String>,
}

impl From<ProfileRow> for UserProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: UserId::new(row.id),
            email: row.email,
            username: row.username,
            first_name: row.first_name,
            last_name: row.last_name,
            date_joined: row.date_joined,
            last_login: row.last_login,
            is_staff: row.is_staff,
            is_superuser: row.is_superuser,
            is_admin: row.is_admin,
            is_active: row.is_active,
            avatar: row.avatar,
            password_hash: row.password_hash,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inventory
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl InventoryStore for PostgresStore {
    #[instrument(skip(self, cmd), err)]
    async fn create_inventory(&self, cmd: CreateInventory) -> StoreResult<Inventory> {
        self.check_inventory_refs(&cmd.draft).await?;
        let draft = cmd.draft;
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            INSERT INTO inventory
                (name, type_id, language_id, metadata, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.type_id.get())
        .bind(draft.language_id.get())
        .bind(Json(&draft.metadata))
        .bind(draft.is_active)
        .bind(cmd.occurred_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_inventory", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self, cmd), fields(inventory_id = %cmd.id), err)]
    async fn update_inventory(&self, cmd: UpdateInventory) -> StoreResult<Inventory> {
        if self.get_inventory(cmd.id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        self.check_inventory_refs(&cmd.draft).await?;
        let draft = cmd.draft;
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            r#"
            UPDATE inventory
            SET name = $2, type_id = $3, language_id = $4, metadata = $5,
                is_active = $6, updated_at = $7
            WHERE id = $1
            RETURNING {INVENTORY_COLUMNS}
            "#
        ))
        .bind(cmd.id.get())
        .bind(&draft.name)
        .bind(draft.type_id.get())
        .bind(draft.language_id.get())
        .bind(Json(&draft.metadata))
        .bind(draft.is_active)
        .bind(cmd.occurred_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_inventory", e))?;
        row.map(Inventory::from).ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_inventory(&self, id: InventoryId) -> StoreResult<Option<Inventory>> {
        let row = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_inventory", e))?;
        Ok(row.map(Inventory::from))
    }

    #[instrument(skip(self), err)]
    async fn list_inventory(&self, window: LimitOffset) -> StoreResult<Page<Inventory>> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_inventory", e))?;

        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(window.limit as i64)
        .bind(window.offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory", e))?;

        Ok(Page {
            count: count as usize,
            items: rows.into_iter().map(Inventory::from).collect(),
            window,
        })
    }

    #[instrument(skip(self), fields(created_after = %filter.date()), err)]
    async fn list_inventory_created_after(
        &self,
        filter: CreatedAfter,
    ) -> StoreResult<Vec<Inventory>> {
        let rows = sqlx::query_as::<_, InventoryRow>(&format!(
            "SELECT {INVENTORY_COLUMNS} FROM inventory WHERE created_at > $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(filter.threshold())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory_created_after", e))?;
        Ok(rows.into_iter().map(Inventory::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn missing_inventory_refs(
        &self,
        type_id: Option<InventoryTypeId>,
        language_id: Option<InventoryLanguageId>,
    ) -> StoreResult<FieldErrors> {
        let checks = [
            ("type", "inventory_types", type_id.map(InventoryTypeId::get)),
            ("language", "inventory_languages", language_id.map(InventoryLanguageId::get)),
        ];
        let mut errors = FieldErrors::new();
        for (field, table, id) in checks {
            let Some(id) = id else { continue };
            let missing = missing_ids(&self.pool, table, &[id])
                .await
                .map_err(|e| map_sqlx_error("missing_inventory_refs", e))?;
            if !missing.is_empty() {
                errors.add(field, validation::missing_pk(id));
            }
        }
        Ok(errors)
    }

    async fn create_inventory_type(
        &self,
        draft: LookupDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryType> {
        draft.validate()?;
        let row = sqlx::query_as::<_, LookupRow>(
            r#"
            INSERT INTO inventory_types (name, created_at, updated_at)
            VALUES ($1, $2, $2)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(&draft.name)
        .bind(occurred_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_inventory_type", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_inventory_types(&self) -> StoreResult<Vec<InventoryType>> {
        let rows = sqlx::query_as::<_, LookupRow>(
            "SELECT id, name, created_at, updated_at FROM inventory_types \
             ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory_types", e))?;
        Ok(rows.into_iter().map(InventoryType::from).collect())
    }

    #[instrument(skip(self, draft), err)]
    async fn create_inventory_language(
        &self,
        draft: LookupDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryLanguage> {
        draft.validate()?;
        let row = sqlx::query_as::<_, LookupRow>(
            r#"
            INSERT INTO inventory_languages (name, created_at, updated_at)
            VALUES ($1, $2, $2)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(&draft.name)
        .bind(occurred_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_inventory_language", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_inventory_languages(&self) -> StoreResult<Vec<InventoryLanguage>> {
        let rows = sqlx::query_as::<_, LookupRow>(
            "SELECT id, name, created_at, updated_at FROM inventory_languages \
             ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory_languages", e))?;
        Ok(rows.into_iter().map(InventoryLanguage::from).collect())
    }

    #[instrument(skip(self, draft), err)]
    async fn create_inventory_tag(
        &self,
        draft: InventoryTagDraft,
        occurred_at: DateTime<Utc>,
    ) -> StoreResult<InventoryTag> {
        draft.validate()?;
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO inventory_tags (name, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, is_active, created_at, updated_at
            "#,
        )
        .bind(&draft.name)
        .bind(draft.is_active)
        .bind(occurred_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_inventory_tag", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_inventory_tags(&self) -> StoreResult<Vec<InventoryTag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, is_active, created_at, updated_at FROM inventory_tags \
             ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_inventory_tags", e))?;
        Ok(rows.into_iter().map(InventoryTag::from).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Orders
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl OrderStore for PostgresStore {
    #[instrument(skip(self, cmd), fields(inventory_id = %cmd.draft.inventory_id), err)]
    async fn create_order(&self, cmd: CreateOrder) -> StoreResult<Order> {
        let op = "create_order";
        let tag_ids = raw_ids(&cmd.draft.unique_tag_ids());

        let mut tx = self.pool.begin().await.map_err(|e| map_sqlx_error(op, e))?;

        let inventory_id = cmd.draft.inventory_id.get();
        let errors = order_ref_errors(&mut *tx, Some(inventory_id), &tag_ids)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;
        into_store_result(errors)?;

        let order_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders
                (inventory_id, start_date, embargo_date, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING id
            "#,
        )
        .bind(inventory_id)
        .bind(cmd.draft.start_date)
        .bind(cmd.draft.embargo_date)
        .bind(cmd.draft.is_active)
        .bind(cmd.occurred_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error(op, e))?;

        link_tags(&mut tx, order_id, &tag_ids)
            .await
            .map_err(|e| map_sqlx_error(op, e))?;

        tx.commit().await.map_err(|e| map_sqlx_error(op, e))?;

        self.fetch_order(op, OrderId::new(order_id))
            .await?
            .ok_or_else(|| StoreError::Backend("order vanished after insert".to_string()))
    }

    #[instrument(skip(self, tag_ids), err)]
    async fn missing_order_refs(
        &self,
        inventory_id: Option<InventoryId>,
        tag_ids: &[OrderTagId],
    ) -> StoreResult<FieldErrors> {
        let op = "missing_order_refs";
        if inventory_id.is_none() && tag_ids.is_empty() {
            return Ok(FieldErrors::new());
        }
        let mut conn = self.pool.acquire().await.map_err(|e| map_sqlx_error(op, e))?;
        order_ref_errors(&mut conn, inventory_id.map(InventoryId::get), &raw_ids(tag_ids))
            .await
            .map_err(|e| map_sqlx_error(op, e))
    }

    #[instrument(skip(self), err)]
    async fn get_order(&self, id: OrderId) -> StoreResult<Option<Order>> {
        self.fetch_order("get_order", id).await
    }

    #[instrument(skip(self), err)]
    async fn list_orders(&self) -> StoreResult<Vec<Order>> {
        self.fetch_orders("list_orders", "", OrderFilter::All).await
    }

    #[instrument(skip(self, cmd), fields(order_id = %cmd.id), err)]
    async fn deactivate_order(&self, cmd: DeactivateOrder) -> StoreResult<Order> {
        let op = "deactivate_order";
        let updated =
            sqlx::query("UPDATE orders SET is_active = FALSE, updated_at = $2 WHERE id = $1")
                .bind(cmd.id.get())
                .bind(cmd.occurred_at)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error(op, e))?;
        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        self.fetch_order(op, cmd.id).await?.ok_or(StoreError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn list_orders_in_window(&self, window: DateWindow) -> StoreResult<Vec<Order>> {
        self.fetch_orders(
            "list_orders_in_window",
            "WHERE o.start_date >= $1 AND o.embargo_date <= $2",
            OrderFilter::Window(window.start_date(), window.embargo_date()),
        )
        .await
    }

    #[instrument(skip(self), err)]
    async fn tags_for_order(&self, order_id: OrderId) -> StoreResult<Vec<OrderTag>> {
        let op = "tags_for_order";
        if self.fetch_order(op, order_id).await?.is_none() {
            return Err(StoreError::NotFound);
        }
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT t.id, t.name, t.is_active, t.created_at, t.updated_at
            FROM order_tags t
            JOIN order_tag_links l ON l.tag_id = t.id
            WHERE l.order_id = $1
            ORDER BY t.name ASC, t.id ASC
            "#,
        )
        .bind(order_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error(op, e))?;
        Ok(rows.into_iter().map(OrderTag::from).collect())
    }

    #[instrument(skip(self), err)]
    async fn orders_for_tag(&self, tag_id: OrderTagId) -> StoreResult<Vec<Order>> {
        let op = "orders_for_tag";
        if !missing_ids(&self.pool, "order_tags", &[tag_id.get()])
            .await
            .map_err(|e| map_sqlx_error(op, e))?
            .is_empty()
        {
            return Err(StoreError::NotFound);
        }
        self.fetch_orders(
            op,
            "WHERE EXISTS \
             (SELECT 1 FROM order_tag_links x WHERE x.order_id = o.id AND x.tag_id = $1)",
            OrderFilter::Key(tag_id.get()),
        )
        .await
    }

    #[instrument(skip(self, cmd), err)]
    async fn create_order_tag(&self, cmd: CreateOrderTag) -> StoreResult<OrderTag> {
        cmd.draft.validate()?;
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO order_tags (name, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $3)
            RETURNING id, name, is_active, created_at, updated_at
            "#,
        )
        .bind(&cmd.draft.name)
        .bind(cmd.draft.is_active)
        .bind(cmd.occurred_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_order_tag", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_order_tags(&self) -> StoreResult<Vec<OrderTag>> {
        let rows = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, is_active, created_at, updated_at FROM order_tags \
             ORDER BY name ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_order_tags", e))?;
        Ok(rows.into_iter().map(OrderTag::from).collect())
    }
}

async fn link_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: i64,
    tag_ids: &[i64],
) -> Result<(), sqlx::Error> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    sqlx::query(
        r#"
        INSERT INTO order_tag_links (order_id, tag_id)
        SELECT $1, UNNEST($2::BIGINT[])
        ON CONFLICT (order_id, tag_id) DO NOTHING
        "#,
    )
    .bind(order_id)
    .bind(tag_ids)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Profiles / health
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl ProfileStore for PostgresStore {
    #[instrument(skip(self, profile), fields(email = %profile.email), err)]
    async fn insert_profile(&self, profile: NewUserProfile) -> StoreResult<UserProfile> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            INSERT INTO user_profiles
                (email, username, first_name, last_name, password_hash, date_joined,
                 is_staff, is_superuser, is_admin, is_active, avatar)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id, email, username, first_name, last_name, password_hash, date_joined,
                      last_login, is_staff, is_superuser, is_admin, is_active, avatar
            "#,
        )
        .bind(&profile.email)
        .bind(&profile.username)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.password_hash)
        .bind(profile.date_joined)
        .bind(profile.is_staff)
        .bind(profile.is_superuser)
        .bind(profile.is_admin)
        .bind(profile.is_active)
        .bind(&profile.avatar)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_profile", e))?;
        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn find_profile_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id, email, username, first_name, last_name, password_hash, date_joined,
                   last_login, is_staff, is_superuser, is_admin, is_active, avatar
            FROM user_profiles
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_profile_by_email", e))?;
        Ok(row.map(UserProfile::from))
    }
}

#[async_trait]
impl StoreHealth for PostgresStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                Some("23503") => StoreError::Invalid(FieldErrors::single("non_field_errors", msg)),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
