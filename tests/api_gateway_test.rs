//! Gateway-level tests: commands and read models over the HTTP surface.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shelfsense::config::Config;
use shelfsense::engine::InventoryEngine;
use shelfsense::events::EventSender;
use shelfsense::{app_router, AppState};
use std::sync::{Arc, RwLock};
use tower::ServiceExt;

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        log_level: "warn".to_string(),
        seed_demo_data: false,
        dedup_window_sec: 15,
        presence_ttl_sec: 300,
        auto_sweep_interval_sec: 30,
    }
}

fn test_app() -> axum::Router {
    let config = test_config();
    let mut dataset = common::small_store();
    dataset
        .epc_mappings
        .push(common::mapping("epc-0", "sku-rfid-1", common::t(0)));
    let engine = InventoryEngine::new(dataset, config.engine_config());
    let (tx, mut rx) = tokio::sync::mpsc::channel(256);
    // Drain events silently; the processor task is exercised in main.
    tokio::spawn(async move { while rx.recv().await.is_some() {} });
    let state = AppState {
        engine: Arc::new(RwLock::new(engine)),
        event_sender: Arc::new(EventSender::new(tx)),
        config,
    };
    app_router(state)
}

async fn send(app: &axum::Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn health_is_ok() {
    let app = test_app();
    let (status, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn unknown_route_returns_typed_404() {
    let app = test_app();
    let (status, body) = send(&app, get("/api/v1/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn read_ingestion_roundtrip() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post(
            "/api/v1/reads",
            json!({
                "epc": "epc-0",
                "antenna_id": "ant-shelf-a",
                "location_id": "shelf-a",
                "timestamp": "2024-01-01T09:00:00Z",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    // Duplicate inside the window surfaces its own status.
    let (status, body) = send(
        &app,
        post(
            "/api/v1/reads",
            json!({
                "epc": "epc-0",
                "antenna_id": "ant-shelf-a",
                "location_id": "shelf-a",
                "timestamp": "2024-01-01T09:00:10Z",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "duplicate_ignored");

    let (status, body) = send(&app, get("/api/v1/zones/shelf-a")).await;
    assert_eq!(status, StatusCode::OK);
    let row = body["inventory"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["sku_id"] == "sku-rfid-1")
        .unwrap()
        .clone();
    assert_eq!(row["qty"], 1);
    assert_eq!(row["source"], "RFID");
}

#[tokio::test]
async fn unknown_epc_maps_to_unprocessable() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post(
            "/api/v1/reads",
            json!({
                "epc": "epc-ghost",
                "antenna_id": "ant-shelf-a",
                "location_id": "shelf-a",
                "timestamp": "2024-01-01T09:00:00Z",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "unknown_epc");
}

#[tokio::test]
async fn rule_upsert_validation_and_task_flow() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post("/api/v1/sales-events", json!({
            "sku_id": "sku-nr-1",
            "location_id": "shelf-a",
            "event_type": "SALE",
            "qty": 6,
            "timestamp": "2024-01-01T09:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "accepted");

    // Bad min/max is rejected with its taxonomy code.
    let (status, body) = send(
        &app,
        send_rule(json!({
            "location_id": "shelf-a", "sku_id": "sku-nr-1", "min": 9, "max": 2
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_min_max");

    // A real rule triggers a task for the shelf (qty 1 < min 2).
    let (status, _) = send(
        &app,
        send_rule(json!({
            "location_id": "shelf-a", "sku_id": "sku-nr-1", "min": 2, "max": 8
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, get("/api/v1/tasks?zone_id=shelf-a")).await;
    assert_eq!(status, StatusCode::OK);
    let tasks = body.as_array().unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0]["deficit_qty"], 7);
    assert_eq!(tasks[0]["status"], "ASSIGNED");

    let (status, body) = send(&app, get("/api/v1/tasks?status=bogus")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");
}

fn send_rule(body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/api/v1/rules")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn basket_insufficient_inventory_carries_available_qty() {
    let app = test_app();
    let (status, body) = send(
        &app,
        post("/api/v1/baskets/items", json!({
            "customer_id": "cust-1",
            "location_id": "shelf-a",
            "sku_id": "sku-nr-1",
            "qty": 50,
            "timestamp": "2024-01-01T09:00:00Z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "insufficient_inventory");
    assert_eq!(body["available_qty"], 7);
}

#[tokio::test]
async fn dashboard_lists_every_zone() {
    let app = test_app();
    let (status, body) = send(&app, get("/api/v1/dashboard")).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["location_id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"shelf-a"));
    assert!(ids.contains(&"warehouse"));
    assert!(ids.contains(&"zone-printing-wall"));
}
