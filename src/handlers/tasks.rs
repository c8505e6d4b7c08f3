use super::{publish, AppState};
use crate::errors::ApiError;
use crate::models::TaskStatus;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct TaskFilters {
    pub status: Option<String>,
    pub zone_id: Option<String>,
    pub sku_id: Option<String>,
}

fn parse_status(raw: &str) -> Option<TaskStatus> {
    match raw.to_ascii_uppercase().as_str() {
        "CREATED" => Some(TaskStatus::Created),
        "ASSIGNED" => Some(TaskStatus::Assigned),
        "IN_PROGRESS" => Some(TaskStatus::InProgress),
        "CONFIRMED" => Some(TaskStatus::Confirmed),
        "REJECTED" => Some(TaskStatus::Rejected),
        _ => None,
    }
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Query(filters): Query<TaskFilters>,
) -> Result<impl IntoResponse, ApiError> {
    let status = match &filters.status {
        Some(raw) => Some(
            parse_status(raw)
                .ok_or_else(|| ApiError::Validation(format!("unknown status {}", raw)))?,
        ),
        None => None,
    };
    let engine = state.engine.read().unwrap();
    Ok(Json(engine.tasks_filtered(
        status,
        filters.zone_id.as_deref(),
        filters.sku_id.as_deref(),
    )))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let engine = state.engine.read().unwrap();
    let task = engine.task(task_id)?;
    let audit = engine.audit_entries(Some(&task_id.to_string()));
    Ok(Json(json!({ "task": task, "audit": audit })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AssignRequest {
    #[validate(length(min = 1))]
    pub staff_id: String,
}

pub async fn assign_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.assign_task(task_id, &req.staff_id);
        (result, engine.drain_events())
    };
    let task = result?;
    publish(&state, events).await;
    Ok(Json(task))
}

pub async fn start_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.start_task(task_id, &req.staff_id);
        (result, engine.drain_events())
    };
    let task = result?;
    publish(&state, events).await;
    Ok(Json(task))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmTaskRequest {
    #[validate(range(min = 1))]
    pub confirmed_qty: i64,
    #[validate(length(min = 1))]
    pub confirmed_by: String,
    pub source_zone_id: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

pub async fn confirm_task(
    State(state): State<AppState>,
    Path(task_id): Path<Uuid>,
    Json(req): Json<ConfirmTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.confirm_task(
            task_id,
            req.confirmed_qty,
            &req.confirmed_by,
            req.source_zone_id,
            req.timestamp,
        );
        (result, engine.drain_events())
    };
    let outcome = result?;
    publish(&state, events).await;
    Ok(Json(outcome))
}
