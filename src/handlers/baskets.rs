use super::{publish, AppState};
use crate::errors::ApiError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct BasketFilters {
    pub customer_id: Option<String>,
}

pub async fn list_items(
    State(state): State<AppState>,
    Query(filters): Query<BasketFilters>,
) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.basket_items(filters.customer_id.as_deref()))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddItemRequest {
    #[validate(length(min = 1))]
    pub customer_id: String,
    #[validate(length(min = 1))]
    pub location_id: String,
    #[validate(length(min = 1))]
    pub sku_id: String,
    #[validate(range(min = 1))]
    pub qty: i64,
    pub timestamp: DateTime<Utc>,
}

pub async fn add_item(
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.add_customer_item(
            &req.customer_id,
            &req.location_id,
            &req.sku_id,
            req.qty,
            req.timestamp,
        );
        (result, engine.drain_events())
    };
    let item = result?;
    publish(&state, events).await;
    Ok((StatusCode::CREATED, Json(item)))
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemRequest {
    pub timestamp: DateTime<Utc>,
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path(basket_item_id): Path<Uuid>,
    Json(req): Json<RemoveItemRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.remove_customer_item(basket_item_id, req.timestamp);
        (result, engine.drain_events())
    };
    let item = result?;
    publish(&state, events).await;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub timestamp: DateTime<Utc>,
}

pub async fn checkout(
    State(state): State<AppState>,
    Path(customer_id): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.checkout_customer(&customer_id, req.timestamp);
        (result, engine.drain_events())
    };
    let summary = result?;
    publish(&state, events).await;
    Ok(Json(summary))
}
