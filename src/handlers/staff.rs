use super::AppState;
use crate::errors::ApiError;
use crate::models::{StaffMember, StaffRole, ZoneScope};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use validator::Validate;

pub async fn list_staff(State(state): State<AppState>) -> impl IntoResponse {
    let engine = state.engine.read().unwrap();
    Json(engine.staff_members())
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(length(min = 1))]
    pub id: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub role: StaffRole,
    #[serde(default)]
    pub on_shift: bool,
    pub scope: Option<ZoneScope>,
}

pub async fn create_staff(
    State(state): State<AppState>,
    Json(req): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;
    let member = StaffMember {
        id: req.id,
        name: req.name,
        role: req.role,
        on_shift: req.on_shift,
        scope: req.scope.unwrap_or(ZoneScope::All),
    };
    let result = {
        let mut engine = state.engine.write().unwrap();
        engine.create_staff(member)
    };
    let created = result?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize, Default)]
pub struct UpdateStaffRequest {
    pub role: Option<StaffRole>,
    pub on_shift: Option<bool>,
    pub scope: Option<ZoneScope>,
}

pub async fn update_staff(
    State(state): State<AppState>,
    Path(staff_id): Path<String>,
    Json(req): Json<UpdateStaffRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let result = {
        let mut engine = state.engine.write().unwrap();
        engine.update_staff(&staff_id, req.role, req.on_shift, req.scope)
    };
    let updated = result?;
    Ok(Json(updated))
}
