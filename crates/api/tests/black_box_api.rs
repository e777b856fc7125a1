use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::StatusCode;
use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;

use stockroom_api::app::{AppServices, build_app};
use stockroom_core::{InventoryId, InventoryLanguageId, InventoryTypeId, parse_calendar_date};
use stockroom_infra::{InMemoryStore, InventoryStore, OrderStore, PostgresStore};
use stockroom_inventory::{CreateInventory, InventoryDraft, LookupDraft};
use stockroom_orders::{CreateOrder, OrderDraft};

async fn serve(services: AppServices) -> (String, tokio::task::JoinHandle<()>) {
    let app = build_app(services);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), handle)
}

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory store the test can seed directly.
        let store = Arc::new(InMemoryStore::new());
        let (base_url, handle) =
            serve(AppServices::from_store(store.clone(), 3, "in-memory")).await;

        Self {
            base_url,
            store,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn lookups(&self) -> (InventoryTypeId, InventoryLanguageId) {
        let now = Utc::now();
        let ty = self
            .store
            .create_inventory_type(LookupDraft::new("Movie"), now)
            .await
            .unwrap();
        let lang = self
            .store
            .create_inventory_language(LookupDraft::new("English"), now)
            .await
            .unwrap();
        (ty.id, lang.id)
    }

    async fn seed_inventory(&self, name: &str, created_at: DateTime<Utc>) -> InventoryId {
        let (ty, lang) = self.lookups().await;
        self.store
            .create_inventory(CreateInventory {
                draft: InventoryDraft::new(name, ty, lang),
                occurred_at: created_at,
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_order(&self, inventory: InventoryId, start: &str, embargo: &str) -> i64 {
        self.store
            .create_order(CreateOrder {
                draft: OrderDraft::new(
                    inventory,
                    parse_calendar_date(start).unwrap(),
                    parse_calendar_date(embargo).unwrap(),
                ),
                occurred_at: Utc::now(),
            })
            .await
            .unwrap()
            .id
            .get()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn ids(body: &Value) -> Vec<i64> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/health/db")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client.get(srv.url("/nowhere/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Not found."}));
}

#[tokio::test]
async fn db_health_reports_an_unreachable_store() {
    let pool = PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy("postgres://stockroom@127.0.0.1:1/stockroom")
        .unwrap();
    pool.close().await;
    let store = Arc::new(PostgresStore::new(pool));
    let (base_url, handle) = serve(AppServices::from_store(store, 3, "postgres")).await;

    let res = reqwest::get(format!("{base_url}/health/db")).await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Store unavailable."}));

    // The liveness route never touches the store.
    let res = reqwest::get(format!("{base_url}/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    handle.abort();
}

#[tokio::test]
async fn created_after_requires_a_valid_date() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/inventory/created-after/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({"error": "The \"created_after\" query parameter is required."})
    );

    // Padded or signed years are not calendar dates either.
    for raw in ["invalid-date", "%202024-01-01", "%2B2024-01-01", "-2024-01-01"] {
        let res = client
            .get(srv.url(&format!("/inventory/created-after/?created_after={raw}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{raw}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(
            body,
            json!({"error": "Invalid date format for \"created_after\". Use YYYY-MM-DD."})
        );
    }
}

#[tokio::test]
async fn created_after_keeps_only_newer_inventory() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();
    srv.seed_inventory("old", now - ChronoDuration::days(10)).await;
    let recent = srv.seed_inventory("recent", now - ChronoDuration::days(1)).await;
    let newest = srv.seed_inventory("newest", now).await;

    let threshold = (now - ChronoDuration::days(5)).format("%Y-%m-%d");
    let res = reqwest::get(srv.url(&format!("/inventory/created-after/?created_after={threshold}")))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(ids(&body), vec![newest.get(), recent.get()]);
}

#[tokio::test]
async fn inventory_list_is_paginated() {
    let srv = TestServer::spawn().await;
    let now = Utc::now();
    let mut seeded = Vec::new();
    for i in 0..10 {
        seeded.push(
            srv.seed_inventory(&format!("Item {i}"), now - ChronoDuration::minutes(i))
                .await
                .get(),
        );
    }
    // newest first == seeding order here
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/inventory/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 10);
    assert_eq!(ids(&body["results"]), seeded[0..3].to_vec());
    assert_eq!(body["next"], srv.url("/inventory/?limit=3&offset=3"));
    assert!(body["previous"].is_null());

    let res = client
        .get(srv.url("/inventory/?limit=5&offset=5"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["count"], 10);
    assert_eq!(ids(&body["results"]), seeded[5..10].to_vec());
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], srv.url("/inventory/?limit=5"));

    let res = client
        .get(srv.url("/inventory/?limit=oops&offset=-1"))
        .send()
        .await
        .unwrap();
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["results"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn inventory_create_retrieve_update() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let ty: Value = client
        .post(srv.url("/inventory/types/"))
        .json(&json!({"name": "Book"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let lang: Value = client
        .post(srv.url("/inventory/languages/"))
        .json(&json!({"name": "French"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let res = client
        .post(srv.url("/inventory/"))
        .json(&json!({
            "name": "Les Misérables",
            "type": ty["id"],
            "language": lang["id"],
            "metadata": {"author": "Hugo"},
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["metadata"]["author"], "Hugo");
    assert_eq!(created["is_active"], true);
    let id = created["id"].as_i64().unwrap();

    let res = client
        .put(srv.url(&format!("/inventory/{id}/")))
        .json(&json!({
            "name": "Notre-Dame de Paris",
            "type": ty["id"],
            "language": lang["id"],
            "is_active": false,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let fetched: Value = client
        .get(srv.url(&format!("/inventory/{id}/")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["name"], "Notre-Dame de Paris");
    assert_eq!(fetched["is_active"], false);
    assert_eq!(fetched["metadata"], json!({}));
    assert_eq!(fetched["created_at"], created["created_at"]);

    let res = client.get(srv.url("/inventory/9999/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let res = client.get(srv.url("/inventory/abc/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn inventory_create_reports_field_errors() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/inventory/"))
        .json(&json!({"name": "", "type": 42, "language": "x"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    // The dangling type is reported in the same response as the bad fields.
    assert_eq!(
        body,
        json!({
            "name": ["This field may not be blank."],
            "type": ["Invalid pk \"42\" - object does not exist."],
            "language": ["Incorrect type. Expected pk value, received str."],
        })
    );

    // Well-formed but dangling references.
    let res = client
        .post(srv.url("/inventory/"))
        .json(&json!({"name": "Widget", "type": 42, "language": 7}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["type"], json!(["Invalid pk \"42\" - object does not exist."]));
    assert_eq!(body["language"], json!(["Invalid pk \"7\" - object does not exist."]));
}

#[tokio::test]
async fn deactivate_order() {
    let srv = TestServer::spawn().await;
    let inv = srv.seed_inventory("Item", Utc::now()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders/"))
        .json(&json!({
            "inventory": inv.get(),
            "start_date": "2024-01-01",
            "embargo_date": "2024-01-31",
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    assert_eq!(order["is_active"], true);
    assert_eq!(order["tags"], json!([]));
    let id = order["id"].as_i64().unwrap();

    for _ in 0..2 {
        let res = client
            .patch(srv.url(&format!("/orders/{id}/deactivate/")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["is_active"], false);
        assert_eq!(body["id"], id);
    }

    for path in ["/orders/9999/deactivate/".to_string(), format!("/orders/+{id}/deactivate/")] {
        let res = client.patch(srv.url(&path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"detail": "Not found."}));
    }
}

#[tokio::test]
async fn signed_ids_do_not_address_records() {
    let srv = TestServer::spawn().await;
    let inv = srv.seed_inventory("Item", Utc::now()).await;
    let order = srv.seed_order(inv, "2024-01-01", "2024-01-31").await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url(&format!("/inventory/{}/", inv.get()))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    for path in [
        format!("/inventory/+{}/", inv.get()),
        format!("/inventory/%2B{}/", inv.get()),
        format!("/orders/+{order}/tags/"),
    ] {
        let res = client.get(srv.url(&path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "{path}");
    }

    let res = client
        .patch(srv.url(&format!("/orders/+{order}/deactivate/")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let orders: Value = reqwest::get(srv.url("/orders/")).await.unwrap().json().await.unwrap();
    assert_eq!(orders[0]["id"], order);
    assert_eq!(orders[0]["is_active"], true);
}

#[tokio::test]
async fn orders_by_date_use_containment() {
    let srv = TestServer::spawn().await;
    let inv = srv.seed_inventory("Item", Utc::now()).await;
    let inside = srv.seed_order(inv, "2024-01-05", "2024-01-10").await;
    let exact = srv.seed_order(inv, "2024-01-01", "2024-01-31").await;
    srv.seed_order(inv, "2023-12-20", "2024-01-10").await;
    srv.seed_order(inv, "2024-01-20", "2024-02-10").await;

    let client = reqwest::Client::new();
    let res = client
        .get(srv.url("/orders/by-date/?start_date=2024-01-01&embargo_date=2024-01-31"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    let mut found = ids(&body);
    found.sort();
    assert_eq!(found, vec![inside, exact]);

    for (query, message) in [
        (
            "start_date=2024-02-01&embargo_date=2024-01-01",
            "\"start_date\" must be before or equal to \"embargo_date\".",
        ),
        (
            "start_date=2024-01-01",
            "Both \"start_date\" and \"embargo_date\" query parameters are required.",
        ),
        (
            "start_date=2024-01-01&embargo_date=31-01-2024",
            "Invalid date format. Use \"YYYY-MM-DD\".",
        ),
        (
            "start_date=%2B2024-01-01&embargo_date=2024-01-31",
            "Invalid date format. Use \"YYYY-MM-DD\".",
        ),
        (
            "start_date=%202024-01-01&embargo_date=2024-01-31",
            "Invalid date format. Use \"YYYY-MM-DD\".",
        ),
    ] {
        let res = client
            .get(srv.url(&format!("/orders/by-date/?{query}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{query}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body, json!({"error": message}));
    }
}

#[tokio::test]
async fn order_tags_are_symmetric() {
    let srv = TestServer::spawn().await;
    let inv = srv.seed_inventory("Item", Utc::now()).await;
    let client = reqwest::Client::new();

    let mut tag_ids = Vec::new();
    for name in ["urgent", "bulk"] {
        let res = client
            .post(srv.url("/orders/tags/"))
            .json(&json!({"name": name}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let tag: Value = res.json().await.unwrap();
        tag_ids.push(tag["id"].as_i64().unwrap());
    }

    let res = client
        .post(srv.url("/orders/"))
        .json(&json!({
            "inventory": inv.get(),
            "start_date": "2024-03-01",
            "embargo_date": "2024-03-02",
            "tags": [tag_ids[0], tag_ids[1], tag_ids[0]],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let order: Value = res.json().await.unwrap();
    let order_id = order["id"].as_i64().unwrap();
    assert_eq!(order["tags"], json!(tag_ids));

    let tags: Value = client
        .get(srv.url(&format!("/orders/{order_id}/tags/")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["bulk", "urgent"]);

    for tag_id in &tag_ids {
        let orders: Value = client
            .get(srv.url(&format!("/orders/tags/{tag_id}/orders/")))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ids(&orders), vec![order_id]);
    }

    let res = client.get(srv.url("/orders/9999/tags/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Order not found."}));

    let res = client
        .get(srv.url("/orders/tags/9999/orders/"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"detail": "Tag not found."}));
}

#[tokio::test]
async fn order_create_validates_fields() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/orders/"))
        .json(&json!({"inventory": 5, "start_date": "2024-01-01", "tags": [77]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "embargo_date": ["This field is required."],
            "inventory": ["Invalid pk \"5\" - object does not exist."],
            "tags": ["Invalid pk \"77\" - object does not exist."],
        })
    );

    let res = client
        .post(srv.url("/orders/"))
        .json(&json!({
            "inventory": 5,
            "start_date": "2024-01-01",
            "embargo_date": "2024-01-02",
            "tags": [77],
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["inventory"], json!(["Invalid pk \"5\" - object does not exist."]));
    assert_eq!(body["tags"], json!(["Invalid pk \"77\" - object does not exist."]));

    // An empty body is an empty object, not a parse error.
    let res = client.post(srv.url("/orders/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "inventory": ["This field is required."],
            "start_date": ["This field is required."],
            "embargo_date": ["This field is required."],
        })
    );

    let res = client
        .post(srv.url("/orders/"))
        .header("content-type", "application/json")
        .body("[1, 2]")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("Expected a dictionary"));
}

#[tokio::test]
async fn lookup_lists_are_sorted_by_name() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    for name in ["sequel", "classic", "award"] {
        let res = client
            .post(srv.url("/inventory/tags/"))
            .json(&json!({"name": name, "is_active": name != "award"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let tags: Value = reqwest::get(srv.url("/inventory/tags/"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let names: Vec<&str> = tags
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["award", "classic", "sequel"]);
    assert_eq!(tags[0]["is_active"], false);

    let res = client
        .post(srv.url("/inventory/types/"))
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"name": ["This field is required."]}));
}
