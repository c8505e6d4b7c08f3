//! Plain in-memory entities for the inventory engine.
//!
//! Everything here is an owned value: read models hand out clones, and the
//! engine is the only writer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod cart;
mod order;
mod rule;
mod staff;
mod task;

pub use cart::{BasketItem, BasketStatus, PendingPick};
pub use order::{ReceivingOrder, ReceivingStatus};
pub use rule::{
    rule_id, AttributeFilter, EffectiveRule, RuleTemplate, TemplateScope, TemplateSelector,
};
pub use staff::{StaffMember, StaffRole, ZoneScope};
pub use task::{AuditAction, AuditEntry, CloseReason, ReplenishmentTask, SourceCandidate, TaskStatus};

/// Implicit staging location for sold personalisable items.
pub const CASHIER_STORAGE_ZONE: &str = "zone-cashier-storage";
/// Destination for replacement stock when a personalisable SKU is exhausted.
pub const PRINTING_WALL_ZONE: &str = "zone-printing-wall";
/// Replenishment sources outside the store carry this id prefix.
pub const EXTERNAL_SOURCE_PREFIX: &str = "external-";

/// Whether a SKU's stock is tracked by RFID presence or by the signed ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockSource {
    Rfid,
    NonRfid,
}

impl StockSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockSource::Rfid => "RFID",
            StockSource::NonRfid => "NON_RFID",
        }
    }
}

impl std::fmt::Display for StockSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A store zone: shelf, stock room, cashier staging, printing wall.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub polygon: Vec<Point>,
    pub color: String,
    pub is_sales_location: bool,
    /// Ordered replenishment sources: other location ids or `external-*` ids.
    pub replenishment_sources: Vec<String>,
    /// Antenna ids in registration order; the first one is the primary.
    pub antenna_ids: Vec<String>,
}

impl Location {
    pub fn primary_antenna(&self) -> Option<&str> {
        self.antenna_ids.first().map(|s| s.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Antenna {
    pub id: String,
    pub location_id: String,
}

/// A receiving origin outside the store (supplier, central warehouse).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalLocation {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sku {
    pub id: String,
    pub name: String,
    /// Immutable for the lifetime of the SKU.
    pub source: StockSource,
}

/// Time-windowed EPC to SKU association. At most one mapping is active for a
/// given EPC at any instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpcMapping {
    pub epc: String,
    pub sku_id: String,
    pub active_from: DateTime<Utc>,
    pub active_to: Option<DateTime<Utc>>,
}

impl EpcMapping {
    pub fn active_at(&self, at: DateTime<Utc>) -> bool {
        self.active_from <= at && self.active_to.map(|to| at < to).unwrap_or(true)
    }
}

/// The engine's belief that an EPC is physically in a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub epc: String,
    pub sku_id: String,
    pub location_id: String,
    pub antenna_id: String,
    pub last_seen_at: DateTime<Utc>,
    pub rssi: Option<f64>,
}

/// Most recent trusted NON_RFID count for a (location, SKU) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerBaseline {
    pub location_id: String,
    pub sku_id: String,
    pub qty: i64,
    pub taken_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Sale,
    Return,
    ConfirmedReplenishment,
}

/// Signed NON_RFID stock movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub location_id: String,
    pub sku_id: String,
    /// Negative for sales, positive for returns and replenishment.
    pub qty: i64,
    pub kind: MovementKind,
    pub recorded_at: DateTime<Utc>,
}

/// Versioned quantity per (location, SKU, source).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub location_id: String,
    pub sku_id: String,
    pub source: StockSource,
    pub qty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub version: u64,
    pub last_calculated_at: DateTime<Utc>,
}

/// Catalog variant attributes, evaluated as a typed bag in one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogVariant {
    pub sku_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

/// One RFID read retained for the zone-detail read model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadRecord {
    pub epc: String,
    pub sku_id: String,
    pub location_id: String,
    pub antenna_id: String,
    pub read_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<f64>,
    /// Set for reads the engine fabricates during internal transfers.
    pub synthetic: bool,
}
