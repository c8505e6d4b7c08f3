use crate::models::{StockSnapshot, StockSource, CASHIER_STORAGE_ZONE};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

pub const CONFIDENCE_PRESENT: f64 = 0.9;
pub const CONFIDENCE_EMPTY: f64 = 0.7;
pub const CONFIDENCE_IMMEDIATE_DEDUCTION: f64 = 0.55;

pub type SnapshotKey = (String, String, StockSource);

/// Floor left behind by an immediate RFID deduction after a sale.
///
/// While presence still counts more than the floor (the sold tags are being
/// re-read), recompute republishes the floor at reduced confidence. The
/// first recompute at or below the floor clears it. `fresh` marks the floor
/// as just written, so the recompute triggered by the sale itself keeps the
/// reduced-confidence value visible.
#[derive(Debug, Clone, Copy)]
pub struct DeductionFloor {
    pub qty: i64,
    pub fresh: bool,
}

/// Per (location, SKU, source) quantity with version and confidence.
///
/// Rows are created lazily and never removed, except that a zero quantity at
/// the implicit cashier staging zone deletes the row. Versions increment on
/// every write, no-op writes included, so collaborators can detect drift.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    rows: BTreeMap<SnapshotKey, StockSnapshot>,
    floors: BTreeMap<(String, String), DeductionFloor>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(
        &mut self,
        location_id: &str,
        sku_id: &str,
        source: StockSource,
        qty: i64,
        confidence: Option<f64>,
        at: DateTime<Utc>,
    ) {
        let key = (location_id.to_string(), sku_id.to_string(), source);
        if location_id == CASHIER_STORAGE_ZONE && qty <= 0 {
            self.rows.remove(&key);
            return;
        }
        let version = self.rows.get(&key).map(|s| s.version).unwrap_or(0) + 1;
        debug!(
            "Snapshot {}/{}/{} -> {} (v{})",
            location_id,
            sku_id,
            source.as_str(),
            qty,
            version
        );
        self.rows.insert(
            key,
            StockSnapshot {
                location_id: location_id.to_string(),
                sku_id: sku_id.to_string(),
                source,
                qty,
                confidence,
                version,
                last_calculated_at: at,
            },
        );
    }

    pub fn get(&self, location_id: &str, sku_id: &str, source: StockSource) -> Option<&StockSnapshot> {
        self.rows
            .get(&(location_id.to_string(), sku_id.to_string(), source))
    }

    pub fn qty(&self, location_id: &str, sku_id: &str, source: StockSource) -> i64 {
        self.get(location_id, sku_id, source).map(|s| s.qty).unwrap_or(0)
    }

    /// Add to a row outside recompute (cashier staging credits).
    pub fn credit(
        &mut self,
        location_id: &str,
        sku_id: &str,
        source: StockSource,
        delta: i64,
        at: DateTime<Utc>,
    ) {
        let current = self.qty(location_id, sku_id, source);
        self.upsert(location_id, sku_id, source, current + delta, None, at);
    }

    /// SKUs with an existing snapshot of the given source in the location.
    pub fn skus_snapshotted_in(&self, location_id: &str, source: StockSource) -> Vec<String> {
        self.rows
            .values()
            .filter(|s| s.location_id == location_id && s.source == source)
            .map(|s| s.sku_id.clone())
            .collect()
    }

    pub fn rows_for_location(&self, location_id: &str) -> Vec<StockSnapshot> {
        self.rows
            .values()
            .filter(|s| s.location_id == location_id)
            .cloned()
            .collect()
    }

    pub fn remove_location(&mut self, location_id: &str) {
        self.rows.retain(|_, s| s.location_id != location_id);
        self.floors.retain(|(loc, _), _| loc != location_id);
    }

    pub fn set_floor(&mut self, location_id: &str, sku_id: &str, qty: i64) {
        self.floors.insert(
            (location_id.to_string(), sku_id.to_string()),
            DeductionFloor { qty, fresh: true },
        );
    }

    pub fn floor(&self, location_id: &str, sku_id: &str) -> Option<DeductionFloor> {
        self.floors
            .get(&(location_id.to_string(), sku_id.to_string()))
            .copied()
    }

    pub fn age_floor(&mut self, location_id: &str, sku_id: &str) {
        if let Some(f) = self
            .floors
            .get_mut(&(location_id.to_string(), sku_id.to_string()))
        {
            f.fresh = false;
        }
    }

    pub fn clear_floor(&mut self, location_id: &str, sku_id: &str) {
        self.floors
            .remove(&(location_id.to_string(), sku_id.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn version_increments_on_every_write_including_noops() {
        let mut store = SnapshotStore::new();
        store.upsert("shelf-a", "sku-1", StockSource::Rfid, 5, Some(0.9), t(0));
        store.upsert("shelf-a", "sku-1", StockSource::Rfid, 5, Some(0.9), t(10));
        let snap = store.get("shelf-a", "sku-1", StockSource::Rfid).unwrap();
        assert_eq!(snap.version, 2);
        assert_eq!(snap.qty, 5);
    }

    #[test]
    fn zero_qty_at_cashier_storage_deletes_the_row() {
        let mut store = SnapshotStore::new();
        store.credit(CASHIER_STORAGE_ZONE, "sku-1", StockSource::Rfid, 2, t(0));
        assert_eq!(store.qty(CASHIER_STORAGE_ZONE, "sku-1", StockSource::Rfid), 2);
        store.credit(CASHIER_STORAGE_ZONE, "sku-1", StockSource::Rfid, -2, t(10));
        assert!(store.get(CASHIER_STORAGE_ZONE, "sku-1", StockSource::Rfid).is_none());
    }

    #[test]
    fn zero_qty_elsewhere_keeps_the_row() {
        let mut store = SnapshotStore::new();
        store.upsert("shelf-a", "sku-1", StockSource::Rfid, 0, Some(0.7), t(0));
        assert!(store.get("shelf-a", "sku-1", StockSource::Rfid).is_some());
    }

    #[test]
    fn floor_ages_and_clears() {
        let mut store = SnapshotStore::new();
        store.set_floor("shelf-a", "sku-1", 3);
        assert!(store.floor("shelf-a", "sku-1").unwrap().fresh);
        store.age_floor("shelf-a", "sku-1");
        assert!(!store.floor("shelf-a", "sku-1").unwrap().fresh);
        store.clear_floor("shelf-a", "sku-1");
        assert!(store.floor("shelf-a", "sku-1").is_none());
    }
}
