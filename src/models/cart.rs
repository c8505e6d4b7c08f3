use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BasketStatus {
    InCart,
    Sold,
    Removed,
}

/// One line of a customer's in-store basket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BasketItem {
    pub id: Uuid,
    pub seq: u64,
    pub customer_id: String,
    pub location_id: String,
    pub sku_id: String,
    pub qty: i64,
    /// RFID units physically confirmed into the basket by reads.
    pub picked_confirmed_qty: i64,
    pub status: BasketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reconciliation record for an RFID basket item: subsequent reads consume
/// present EPCs against it until `qty_remaining` reaches zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingPick {
    pub basket_item_id: Uuid,
    pub customer_id: String,
    pub location_id: String,
    pub sku_id: String,
    pub qty_remaining: i64,
    pub consumed_epcs: Vec<String>,
    pub created_at: DateTime<Utc>,
}
