use super::StockSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReceivingStatus {
    InTransit,
    Confirmed,
    Cancelled,
}

impl ReceivingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceivingStatus::InTransit => "IN_TRANSIT",
            ReceivingStatus::Confirmed => "CONFIRMED",
            ReceivingStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Inbound stock movement into a zone, from another zone or an external
/// origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceivingOrder {
    pub id: Uuid,
    pub seq: u64,
    /// Internal zone id or an `external-*` id.
    pub source_location_id: String,
    pub destination_location_id: String,
    pub sku_id: String,
    pub source: StockSource,
    pub requested_qty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmed_qty: Option<i64>,
    pub status: ReceivingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_staff_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReceivingOrder {
    pub fn is_external(&self) -> bool {
        self.source_location_id
            .starts_with(super::EXTERNAL_SOURCE_PREFIX)
    }
}
