use crate::models::PresenceRecord;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tracing::debug;

/// Per-EPC last-seen records plus the read dedup window.
///
/// An EPC contributes to a location's RFID stock iff its record points at
/// that location and `cursor - last_seen_at <= ttl`. Expiry is evaluated
/// lazily against the cursor; nothing is purged on a timer.
#[derive(Debug, Default)]
pub struct PresenceStore {
    records: BTreeMap<String, PresenceRecord>,
    /// Most recent accepted read per (epc, antenna).
    dedup: HashMap<(String, String), DateTime<Utc>>,
}

impl PresenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A read is a duplicate when the previous accepted read for the same
    /// (epc, antenna) falls inside the window: `prev >= t - window`.
    pub fn is_duplicate(&self, epc: &str, antenna_id: &str, t: DateTime<Utc>, window: Duration) -> bool {
        let window = chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::seconds(15));
        self.dedup
            .get(&(epc.to_string(), antenna_id.to_string()))
            .map(|prev| *prev >= t - window)
            .unwrap_or(false)
    }

    /// Record an accepted read, rebinding the EPC if it moved. Returns the
    /// location the EPC was previously bound to, when different.
    pub fn note_read(
        &mut self,
        epc: &str,
        sku_id: &str,
        location_id: &str,
        antenna_id: &str,
        t: DateTime<Utc>,
        rssi: Option<f64>,
    ) -> Option<String> {
        self.dedup
            .insert((epc.to_string(), antenna_id.to_string()), t);
        let previous = self
            .records
            .get(epc)
            .filter(|r| r.location_id != location_id)
            .map(|r| r.location_id.clone());
        if previous.is_some() {
            debug!("EPC {} moved to {}", epc, location_id);
        }
        self.records.insert(
            epc.to_string(),
            PresenceRecord {
                epc: epc.to_string(),
                sku_id: sku_id.to_string(),
                location_id: location_id.to_string(),
                antenna_id: antenna_id.to_string(),
                last_seen_at: t,
                rssi,
            },
        );
        previous
    }

    /// Re-materialise a record directly (cart removal, synthetic stock).
    pub fn insert(&mut self, record: PresenceRecord) {
        self.records.insert(record.epc.clone(), record);
    }

    pub fn remove(&mut self, epc: &str) -> Option<PresenceRecord> {
        self.records.remove(epc)
    }

    pub fn get(&self, epc: &str) -> Option<&PresenceRecord> {
        self.records.get(epc)
    }

    fn is_live(record: &PresenceRecord, cursor: DateTime<Utc>, ttl: Duration) -> bool {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(300));
        cursor - record.last_seen_at <= ttl
    }

    /// Live EPCs of one SKU in one location, oldest-seen first (ties break on
    /// EPC so walks are deterministic).
    pub fn present_of_sku(
        &self,
        location_id: &str,
        sku_id: &str,
        cursor: DateTime<Utc>,
        ttl: Duration,
    ) -> Vec<PresenceRecord> {
        let mut live: Vec<PresenceRecord> = self
            .records
            .values()
            .filter(|r| {
                r.location_id == location_id && r.sku_id == sku_id && Self::is_live(r, cursor, ttl)
            })
            .cloned()
            .collect();
        live.sort_by(|a, b| a.last_seen_at.cmp(&b.last_seen_at).then(a.epc.cmp(&b.epc)));
        live
    }

    /// Distinct SKUs with at least one live EPC in the location.
    pub fn skus_present_in(
        &self,
        location_id: &str,
        cursor: DateTime<Utc>,
        ttl: Duration,
    ) -> Vec<String> {
        let mut skus: Vec<String> = self
            .records
            .values()
            .filter(|r| r.location_id == location_id && Self::is_live(r, cursor, ttl))
            .map(|r| r.sku_id.clone())
            .collect();
        skus.sort();
        skus.dedup();
        skus
    }

    pub fn count_of_sku(
        &self,
        location_id: &str,
        sku_id: &str,
        cursor: DateTime<Utc>,
        ttl: Duration,
    ) -> i64 {
        self.records
            .values()
            .filter(|r| {
                r.location_id == location_id && r.sku_id == sku_id && Self::is_live(r, cursor, ttl)
            })
            .count() as i64
    }

    /// Forced zone sweep: refresh last-seen of every EPC currently bound to
    /// the location without changing any binding. Returns how many records
    /// were touched.
    pub fn refresh_zone(&mut self, location_id: &str, t: DateTime<Utc>) -> usize {
        let mut refreshed = 0;
        for record in self.records.values_mut() {
            if record.location_id == location_id {
                record.last_seen_at = t;
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Drop every record bound to a deleted location.
    pub fn remove_zone(&mut self, location_id: &str) {
        self.records.retain(|_, r| r.location_id != location_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    const WINDOW: Duration = Duration::from_secs(15);
    const TTL: Duration = Duration::from_secs(300);

    #[test]
    fn dedup_rejects_within_window_and_accepts_after() {
        let mut store = PresenceStore::new();
        store.note_read("EPC-0001", "sku-1", "warehouse", "ant-warehouse", t(0), None);
        assert!(store.is_duplicate("EPC-0001", "ant-warehouse", t(10), WINDOW));
        assert!(!store.is_duplicate("EPC-0001", "ant-warehouse", t(16), WINDOW));
        // A different antenna has its own window.
        assert!(!store.is_duplicate("EPC-0001", "ant-shelf-a", t(10), WINDOW));
    }

    #[test]
    fn ttl_expires_stale_records() {
        let mut store = PresenceStore::new();
        store.note_read("EPC-0001", "sku-1", "warehouse", "ant-warehouse", t(0), None);
        assert_eq!(store.count_of_sku("warehouse", "sku-1", t(300), TTL), 1);
        assert_eq!(store.count_of_sku("warehouse", "sku-1", t(400), TTL), 0);
    }

    #[test]
    fn read_rebinds_location_and_reports_previous() {
        let mut store = PresenceStore::new();
        store.note_read("EPC-0001", "sku-1", "warehouse", "ant-warehouse", t(0), None);
        let prev = store.note_read("EPC-0001", "sku-1", "shelf-a", "ant-shelf-a", t(20), Some(-40.0));
        assert_eq!(prev.as_deref(), Some("warehouse"));
        assert_eq!(store.count_of_sku("warehouse", "sku-1", t(20), TTL), 0);
        assert_eq!(store.count_of_sku("shelf-a", "sku-1", t(20), TTL), 1);
    }

    #[test]
    fn sweep_refreshes_without_rebinding() {
        let mut store = PresenceStore::new();
        store.note_read("EPC-0001", "sku-1", "shelf-a", "ant-shelf-a", t(0), None);
        store.note_read("EPC-0002", "sku-1", "warehouse", "ant-warehouse", t(0), None);
        assert_eq!(store.refresh_zone("shelf-a", t(290)), 1);
        assert_eq!(store.count_of_sku("shelf-a", "sku-1", t(400), TTL), 1);
        assert_eq!(store.count_of_sku("warehouse", "sku-1", t(400), TTL), 0);
    }

    #[test]
    fn present_of_sku_orders_oldest_first() {
        let mut store = PresenceStore::new();
        store.note_read("EPC-0002", "sku-1", "shelf-a", "ant-shelf-a", t(5), None);
        store.note_read("EPC-0001", "sku-1", "shelf-a", "ant-shelf-a", t(1), None);
        let present = store.present_of_sku("shelf-a", "sku-1", t(10), TTL);
        assert_eq!(present[0].epc, "EPC-0001");
        assert_eq!(present[1].epc, "EPC-0002");
    }
}
