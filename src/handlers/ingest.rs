use super::{publish, AppState};
use crate::engine::SalesEventType;
use crate::errors::ApiError;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct IngestReadRequest {
    #[validate(length(min = 1))]
    pub epc: String,
    #[validate(length(min = 1))]
    pub antenna_id: String,
    #[validate(length(min = 1))]
    pub location_id: String,
    pub timestamp: DateTime<Utc>,
    pub rssi: Option<f64>,
}

pub async fn ingest_read(
    State(state): State<AppState>,
    Json(req): Json<IngestReadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.ingest_rfid_read(
            &req.epc,
            &req.antenna_id,
            &req.location_id,
            req.timestamp,
            req.rssi,
        );
        (result, engine.drain_events())
    };
    let outcome = result?;
    publish(&state, events).await;
    Ok(Json(json!({ "status": outcome })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct SalesEventRequest {
    #[validate(length(min = 1))]
    pub sku_id: String,
    #[validate(length(min = 1))]
    pub location_id: String,
    pub event_type: SalesEventType,
    #[validate(range(min = 1))]
    pub qty: i64,
    pub timestamp: DateTime<Utc>,
}

pub async fn ingest_sales_event(
    State(state): State<AppState>,
    Json(req): Json<SalesEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.ingest_sales_event(
            &req.sku_id,
            &req.location_id,
            req.event_type,
            req.qty,
            req.timestamp,
        );
        (result, engine.drain_events())
    };
    let outcome = result?;
    publish(&state, events).await;
    Ok(Json(json!({ "status": outcome })))
}

#[derive(Debug, Deserialize)]
pub struct SweepRequest {
    pub timestamp: DateTime<Utc>,
}

pub async fn sweep_zone(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Json(req): Json<SweepRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.force_zone_sweep(&location_id, req.timestamp);
        (result, engine.drain_events())
    };
    let refreshed = result?;
    publish(&state, events).await;
    Ok(Json(json!({ "status": "accepted", "refreshed": refreshed })))
}
