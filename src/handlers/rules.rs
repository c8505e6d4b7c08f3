use super::{publish, AppState};
use crate::engine::RuleTemplateInput;
use crate::errors::ApiError;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

pub async fn list_templates(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.rule_templates())
}

pub async fn upsert_template(
    State(state): State<AppState>,
    Json(input): Json<RuleTemplateInput>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.upsert_rule_template(input);
        (result, engine.drain_events())
    };
    let template = result?;
    publish(&state, events).await;
    Ok(Json(template))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.delete_rule_template(template_id);
        (result, engine.drain_events())
    };
    result?;
    publish(&state, events).await;
    Ok(Json(json!({ "status": "deleted" })))
}

pub async fn list_rules(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.effective_rules())
}

/// Legacy direct upsert; proxied through a LOCATION/SKU template inside the
/// engine so the registry stays projection-owned.
#[derive(Debug, Deserialize, Validate)]
pub struct UpsertRuleRequest {
    #[validate(length(min = 1))]
    pub location_id: String,
    #[validate(length(min = 1))]
    pub sku_id: String,
    #[validate(range(min = 0))]
    pub min: i64,
    #[validate(range(min = 0))]
    pub max: i64,
    #[serde(default)]
    pub priority: i32,
    pub inbound_source_id: Option<String>,
}

pub async fn upsert_rule(
    State(state): State<AppState>,
    Json(req): Json<UpsertRuleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.upsert_rule_direct(
            &req.location_id,
            &req.sku_id,
            req.min,
            req.max,
            req.priority,
            req.inbound_source_id,
        );
        (result, engine.drain_events())
    };
    let rule = result?;
    publish(&state, events).await;
    Ok(Json(rule))
}

pub async fn delete_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (result, events) = {
        let mut engine = state.engine.write().unwrap();
        let result = engine.delete_rule(&rule_id);
        (result, engine.drain_events())
    };
    result?;
    publish(&state, events).await;
    Ok(Json(json!({ "status": "deleted" })))
}
