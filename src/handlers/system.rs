use super::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.dashboard())
}

#[derive(Debug, Deserialize)]
pub struct AuditFilters {
    pub subject_id: Option<String>,
}

pub async fn audit_log(
    State(state): State<AppState>,
    Query(filters): Query<AuditFilters>,
) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.audit_entries(filters.subject_id.as_deref()))
}

pub async fn timeline(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.timeline())
}
