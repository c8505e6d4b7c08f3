use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Typed error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    #[serde(rename = "type")]
    pub error_type: String,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_qty: Option<i64>,
}

/// Engine errors are values: every command either succeeds with a typed
/// outcome or returns one of these without mutating state.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Zone {0} not found")]
    ZoneNotFound(String),

    #[error("Zone {0} already exists")]
    ZoneExists(String),

    #[error("Zone {0} is not a sales location")]
    ZoneNotOrderable(String),

    #[error("Zone id is required for a location-scoped template")]
    ZoneRequired,

    #[error("SKU {0} not found")]
    SkuNotFound(String),

    #[error("SKU id is required for a SKU-selector template")]
    SkuRequired,

    #[error("Invalid min/max: min {min} exceeds max {max}")]
    InvalidMinMax { min: i64, max: i64 },

    #[error("No active mapping for EPC {0}")]
    UnknownEpc(String),

    #[error("Antenna {antenna_id} is not bound to zone {location_id}")]
    InvalidAntennaOrZone {
        antenna_id: String,
        location_id: String,
    },

    #[error("Insufficient inventory: {available} available")]
    InsufficientInventory { available: i64 },

    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Task is not open (status {status})")]
    TaskNotOpen { status: String },

    #[error("Receiving order {0} not found")]
    OrderNotFound(Uuid),

    #[error("Receiving order is not open (status {status})")]
    OrderNotOpen { status: String },

    #[error("Staff member {0} not found")]
    StaffNotFound(String),

    #[error("Staff member {staff_id} is not eligible for zone {location_id}")]
    StaffNotEligibleForZone {
        staff_id: String,
        location_id: String,
    },

    #[error("Basket item {0} not found")]
    BasketItemNotFound(Uuid),

    #[error("Basket item {0} is not in the cart")]
    BasketItemNotOpen(Uuid),

    #[error("Rule template {0} not found")]
    TemplateNotFound(Uuid),

    #[error("Rule template {0} is already inactive")]
    AlreadyInactive(Uuid),

    #[error("Rule {0} not found")]
    RuleNotFound(String),

    #[error("Source type {got} does not match SKU source {expected}")]
    SourceMismatch { expected: String, got: String },

    #[error("Source {0} equals destination")]
    SourceEqualsDestination(String),

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("External location id {0} must start with \"external-\"")]
    InvalidExternalId(String),

    #[error("Source {0} is not a known zone or external location")]
    SourceNotFound(String),

    #[error("Staff member {0} already exists")]
    StaffExists(String),
}

impl EngineError {
    /// Stable machine-readable code, mirrored in the JSON body.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::ZoneNotFound(_) => "zone_not_found",
            EngineError::ZoneExists(_) => "zone_exists",
            EngineError::ZoneNotOrderable(_) => "zone_not_orderable",
            EngineError::ZoneRequired => "zone_required",
            EngineError::SkuNotFound(_) => "sku_not_found",
            EngineError::SkuRequired => "sku_required",
            EngineError::InvalidMinMax { .. } => "invalid_min_max",
            EngineError::UnknownEpc(_) => "unknown_epc",
            EngineError::InvalidAntennaOrZone { .. } => "invalid_antenna_or_zone",
            EngineError::InsufficientInventory { .. } => "insufficient_inventory",
            EngineError::TaskNotFound(_) => "task_not_found",
            EngineError::TaskNotOpen { .. } => "task_not_open",
            EngineError::OrderNotFound(_) => "order_not_found",
            EngineError::OrderNotOpen { .. } => "order_not_open",
            EngineError::StaffNotFound(_) => "staff_not_found",
            EngineError::StaffNotEligibleForZone { .. } => "staff_not_eligible_for_zone",
            EngineError::BasketItemNotFound(_) => "basket_item_not_found",
            EngineError::BasketItemNotOpen(_) => "basket_item_not_open",
            EngineError::TemplateNotFound(_) => "template_not_found",
            EngineError::AlreadyInactive(_) => "already_inactive",
            EngineError::RuleNotFound(_) => "rule_not_found",
            EngineError::SourceMismatch { .. } => "source_mismatch",
            EngineError::SourceEqualsDestination(_) => "source_equals_destination",
            EngineError::InvalidQuantity(_) => "invalid_quantity",
            EngineError::InvalidExternalId(_) => "invalid_external_id",
            EngineError::SourceNotFound(_) => "source_not_found",
            EngineError::StaffExists(_) => "staff_exists",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            EngineError::ZoneNotFound(_)
            | EngineError::SkuNotFound(_)
            | EngineError::TaskNotFound(_)
            | EngineError::OrderNotFound(_)
            | EngineError::StaffNotFound(_)
            | EngineError::BasketItemNotFound(_)
            | EngineError::TemplateNotFound(_)
            | EngineError::RuleNotFound(_)
            | EngineError::SourceNotFound(_) => StatusCode::NOT_FOUND,

            EngineError::ZoneExists(_)
            | EngineError::StaffExists(_)
            | EngineError::AlreadyInactive(_)
            | EngineError::TaskNotOpen { .. }
            | EngineError::OrderNotOpen { .. }
            | EngineError::BasketItemNotOpen(_) => StatusCode::CONFLICT,

            EngineError::InsufficientInventory { .. }
            | EngineError::UnknownEpc(_)
            | EngineError::StaffNotEligibleForZone { .. } => StatusCode::UNPROCESSABLE_ENTITY,

            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = if status.is_client_error() {
            "invalid_request"
        } else {
            "processing_error"
        };
        let available_qty = match &self {
            EngineError::InsufficientInventory { available } => Some(*available),
            _ => None,
        };
        let body = ErrorResponse {
            error_type: error_type.to_string(),
            code: self.code().to_string(),
            message: self.to_string(),
            available_qty,
        };
        (status, Json(body)).into_response()
    }
}

/// Gateway-level errors wrapping engine errors plus request-shape failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Engine(e) => e.into_response(),
            ApiError::Validation(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error_type: "invalid_request".to_string(),
                    code: "validation_failed".to_string(),
                    message,
                    available_qty: None,
                }),
            )
                .into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_inventory_carries_available_qty() {
        let err = EngineError::InsufficientInventory { available: 3 };
        assert_eq!(err.code(), "insufficient_inventory");
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn lifecycle_errors_map_to_conflict() {
        let err = EngineError::TaskNotOpen {
            status: "CONFIRMED".to_string(),
        };
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
