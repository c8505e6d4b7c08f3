//! shelfsense — store inventory engine for RFID-instrumented retail floors.
//!
//! This crate keeps a live per-zone view of stock for tagged (RFID) and
//! untagged (ledger-tracked) merchandise and drives the operational loop
//! around it: min/max rule evaluation, replenishment tasks, receiving
//! orders, customer baskets with pending RFID picks, and staff assignment.
//! All state lives in the process; the HTTP gateway serialises commands
//! through a single engine lock.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]

pub mod config;
pub mod engine;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;

use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::json;

pub use handlers::AppState;

/// Full application router: health, versioned API, JSON 404 fallback.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", handlers::api_v1_router())
        .fallback(fallback)
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn fallback() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "type": "invalid_request",
            "code": "not_found",
            "message": "Unknown route",
        })),
    )
}
