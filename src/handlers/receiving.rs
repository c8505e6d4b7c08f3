use super::{publish, AppState};
use crate::errors::ApiError;
use crate::models::StockSource;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub async fn list_orders(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.receiving_orders())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderRequest {
    #[validate(length(min = 1))]
    pub source_location_id: String,
    #[validate(length(min = 1))]
    pub destination_location_id: String,
    #[validate(length(min = 1))]
    pub sku_id: String,
    #[validate(range(min = 1))]
    pub requested_qty: i64,
    pub source: Option<StockSource>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.create_receiving_order(
            &req.source_location_id,
            &req.destination_location_id,
            &req.sku_id,
            req.requested_qty,
            req.source,
        );
        (result, engine.drain_events())
    };
    let order = result?;
    publish(&state, events).await;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize, Default)]
pub struct ConfirmOrderRequest {
    pub confirmed_by: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

pub async fn confirm_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<ConfirmOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.confirm_receiving_order(order_id, req.confirmed_by, req.timestamp);
        (result, engine.drain_events())
    };
    let outcome = result?;
    publish(&state, events).await;
    Ok(Json(outcome))
}
