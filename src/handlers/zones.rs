use super::{publish, AppState};
use crate::engine::{LocationSeed, ZoneUpdate};
use crate::errors::ApiError;
use crate::models::Point;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

pub async fn list_zones(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.dashboard())
}

pub async fn zone_detail(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.read().unwrap();
    let detail = engine.zone_detail(&location_id)?;
    Ok(Json(detail))
}

pub async fn create_zone(
    State(state): State<AppState>,
    Json(seed): Json<LocationSeed>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.create_zone(seed);
        (result, engine.drain_events())
    };
    let zone = result?;
    publish(&state, events).await;
    Ok((StatusCode::CREATED, Json(zone)))
}

#[derive(Debug, Deserialize, Default)]
pub struct ZoneUpdateRequest {
    pub name: Option<String>,
    pub polygon: Option<Vec<Point>>,
    pub color: Option<String>,
    pub is_sales_location: Option<bool>,
    pub replenishment_sources: Option<Vec<String>>,
}

pub async fn update_zone(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Json(req): Json<ZoneUpdateRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let update = ZoneUpdate {
        name: req.name,
        polygon: req.polygon,
        color: req.color,
        is_sales_location: req.is_sales_location,
        replenishment_sources: req.replenishment_sources,
    };
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.update_zone(&location_id, update);
        (result, engine.drain_events())
    };
    let zone = result?;
    publish(&state, events).await;
    Ok(Json(zone))
}

pub async fn delete_zone(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.delete_zone(&location_id);
        (result, engine.drain_events())
    };
    result?;
    publish(&state, events).await;
    Ok(Json(json!({ "status": "deleted" })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AddSourceRequest {
    #[validate(length(min = 1))]
    pub source_id: String,
}

pub async fn add_source(
    State(state): State<AppState>,
    Path(location_id): Path<String>,
    Json(req): Json<AddSourceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.add_zone_source(&location_id, &req.source_id);
        (result, engine.drain_events())
    };
    let zone = result?;
    publish(&state, events).await;
    Ok(Json(zone))
}

pub async fn remove_source(
    State(state): State<AppState>,
    Path((location_id, source_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.remove_zone_source(&location_id, &source_id);
        (result, engine.drain_events())
    };
    let zone = result?;
    publish(&state, events).await;
    Ok(Json(zone))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateExternalRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
}

pub async fn create_external(
    State(state): State<AppState>,
    Json(req): Json<CreateExternalRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let result = {
        let mut engine = state.engine.write().unwrap();
        engine.create_external_location(&req.id, &req.name)
    };
    let external = result?;
    Ok((StatusCode::CREATED, Json(external)))
}
