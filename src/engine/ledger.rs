use crate::models::{LedgerBaseline, LedgerEntry, MovementKind};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Baseline snapshot plus signed movement log for NON_RFID merchandise.
///
/// A location's quantity is `max(0, baseline + Σ signed entries recorded at
/// or after the baseline timestamp)`.
#[derive(Debug, Default)]
pub struct MovementLedger {
    baselines: BTreeMap<(String, String), LedgerBaseline>,
    entries: Vec<LedgerEntry>,
}

impl MovementLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_baseline(&mut self, baseline: LedgerBaseline) {
        self.baselines.insert(
            (baseline.location_id.clone(), baseline.sku_id.clone()),
            baseline,
        );
    }

    pub fn append(
        &mut self,
        location_id: &str,
        sku_id: &str,
        qty: i64,
        kind: MovementKind,
        recorded_at: DateTime<Utc>,
    ) {
        self.entries.push(LedgerEntry {
            location_id: location_id.to_string(),
            sku_id: sku_id.to_string(),
            qty,
            kind,
            recorded_at,
        });
    }

    pub fn quantity(&self, location_id: &str, sku_id: &str) -> i64 {
        let key = (location_id.to_string(), sku_id.to_string());
        let (base, since) = match self.baselines.get(&key) {
            Some(b) => (b.qty, Some(b.taken_at)),
            None => (0, None),
        };
        let delta: i64 = self
            .entries
            .iter()
            .filter(|e| {
                e.location_id == location_id
                    && e.sku_id == sku_id
                    && since.map(|s| e.recorded_at >= s).unwrap_or(true)
            })
            .map(|e| e.qty)
            .sum();
        (base + delta).max(0)
    }

    /// SKUs with a baseline or at least one movement in the location.
    pub fn skus_tracked_in(&self, location_id: &str) -> Vec<String> {
        let mut skus: Vec<String> = self
            .baselines
            .keys()
            .filter(|(loc, _)| loc == location_id)
            .map(|(_, sku)| sku.clone())
            .chain(
                self.entries
                    .iter()
                    .filter(|e| e.location_id == location_id)
                    .map(|e| e.sku_id.clone()),
            )
            .collect();
        skus.sort();
        skus.dedup();
        skus
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
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
    fn quantity_is_baseline_plus_signed_deltas() {
        let mut ledger = MovementLedger::new();
        ledger.set_baseline(LedgerBaseline {
            location_id: "shelf-a".to_string(),
            sku_id: "sku-nr-1".to_string(),
            qty: 7,
            taken_at: t(0),
        });
        ledger.append("shelf-a", "sku-nr-1", -2, MovementKind::Sale, t(10));
        ledger.append("shelf-a", "sku-nr-1", 1, MovementKind::Return, t(20));
        ledger.append("shelf-a", "sku-nr-1", 3, MovementKind::ConfirmedReplenishment, t(30));
        assert_eq!(ledger.quantity("shelf-a", "sku-nr-1"), 9);
    }

    #[test]
    fn quantity_clamps_at_zero() {
        let mut ledger = MovementLedger::new();
        ledger.set_baseline(LedgerBaseline {
            location_id: "shelf-a".to_string(),
            sku_id: "sku-nr-1".to_string(),
            qty: 1,
            taken_at: t(0),
        });
        ledger.append("shelf-a", "sku-nr-1", -5, MovementKind::Sale, t(10));
        assert_eq!(ledger.quantity("shelf-a", "sku-nr-1"), 0);
    }

    #[test]
    fn entries_before_baseline_do_not_count() {
        let mut ledger = MovementLedger::new();
        ledger.append("shelf-a", "sku-nr-1", -3, MovementKind::Sale, t(5));
        ledger.set_baseline(LedgerBaseline {
            location_id: "shelf-a".to_string(),
            sku_id: "sku-nr-1".to_string(),
            qty: 10,
            taken_at: t(10),
        });
        ledger.append("shelf-a", "sku-nr-1", -1, MovementKind::Sale, t(15));
        assert_eq!(ledger.quantity("shelf-a", "sku-nr-1"), 9);
    }

    #[test]
    fn untracked_pair_is_zero() {
        let ledger = MovementLedger::new();
        assert_eq!(ledger.quantity("shelf-a", "missing"), 0);
    }
}
