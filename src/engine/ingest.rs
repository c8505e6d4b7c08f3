//! Event ingestion: RFID reads, forced zone sweeps, and the sales stream.

use super::InventoryEngine;
use crate::errors::EngineError;
use crate::events::Event;
use crate::models::{MovementKind, ReadRecord, StockSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadOutcome {
    Accepted,
    DuplicateIgnored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SalesEventType {
    Sale,
    Return,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalesOutcome {
    Accepted,
    AcceptedRfidImmediate,
}

impl InventoryEngine {
    /// Ingest one antenna read.
    ///
    /// Duplicate reads inside the dedup window are ignored without advancing
    /// the cursor. An accepted read rebinds the EPC (a tag physically moved),
    /// feeds pending basket picks, and recomputes every affected location.
    #[instrument(skip(self))]
    pub fn ingest_rfid_read(
        &mut self,
        epc: &str,
        antenna_id: &str,
        location_id: &str,
        timestamp: DateTime<Utc>,
        rssi: Option<f64>,
    ) -> Result<ReadOutcome, EngineError> {
        let antenna_ok = self
            .antennas
            .get(antenna_id)
            .map(|a| a.location_id == location_id)
            .unwrap_or(false);
        if !antenna_ok || !self.locations.contains_key(location_id) {
            return Err(EngineError::InvalidAntennaOrZone {
                antenna_id: antenna_id.to_string(),
                location_id: location_id.to_string(),
            });
        }
        let sku_id = self
            .active_mapping(epc, timestamp)
            .map(|m| m.sku_id.clone())
            .ok_or_else(|| EngineError::UnknownEpc(epc.to_string()))?;

        if self
            .presence
            .is_duplicate(epc, antenna_id, timestamp, self.cfg.dedup_window)
        {
            debug!("Duplicate read ignored: {} @ {}", epc, antenna_id);
            return Ok(ReadOutcome::DuplicateIgnored);
        }

        self.clock.observe(timestamp);
        let previous_location =
            self.presence
                .note_read(epc, &sku_id, location_id, antenna_id, timestamp, rssi);
        self.record_read(ReadRecord {
            epc: epc.to_string(),
            sku_id: sku_id.clone(),
            location_id: location_id.to_string(),
            antenna_id: antenna_id.to_string(),
            read_at: timestamp,
            rssi,
            synthetic: false,
        });
        self.push_event(Event::ReadAccepted {
            epc: epc.to_string(),
            location_id: location_id.to_string(),
            at: timestamp,
        });

        self.resolve_pending_picks(location_id, &sku_id);

        if let Some(previous) = previous_location {
            self.recompute_location(&previous);
        }
        self.recompute_location(location_id);
        Ok(ReadOutcome::Accepted)
    }

    /// Forced sweep: refresh the last-seen stamp of every EPC bound to the
    /// zone without changing any binding. Returns how many were refreshed.
    #[instrument(skip(self))]
    pub fn force_zone_sweep(
        &mut self,
        location_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<usize, EngineError> {
        self.location(location_id)?;
        self.clock.observe(timestamp);
        let refreshed = self.presence.refresh_zone(location_id, timestamp);
        self.push_event(Event::ZoneSwept {
            location_id: location_id.to_string(),
            refreshed,
        });
        self.recompute_location(location_id);
        Ok(refreshed)
    }

    /// Ingest a point-of-sale event.
    ///
    /// A SALE of an RFID SKU deducts immediately from presence and leaves a
    /// reduced-confidence snapshot floor; everything else is a signed ledger
    /// movement.
    #[instrument(skip(self))]
    pub fn ingest_sales_event(
        &mut self,
        sku_id: &str,
        location_id: &str,
        event_type: SalesEventType,
        qty: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<SalesOutcome, EngineError> {
        self.location(location_id)?;
        let sku = self.sku(sku_id)?.clone();
        if qty <= 0 {
            return Err(EngineError::InvalidQuantity(qty));
        }
        self.clock.observe(timestamp);
        let now = self.now();

        let outcome = match (sku.source, event_type) {
            (StockSource::Rfid, SalesEventType::Sale) => {
                let removed = self.immediate_rfid_deduction(location_id, sku_id, qty);
                debug!(
                    "Immediate RFID deduction: {} x{} at {} ({} tags removed)",
                    sku_id, qty, location_id, removed
                );
                self.push_event(Event::SaleRecorded {
                    sku_id: sku_id.to_string(),
                    location_id: location_id.to_string(),
                    qty,
                });
                SalesOutcome::AcceptedRfidImmediate
            }
            (_, SalesEventType::Sale) => {
                self.ledger
                    .append(location_id, sku_id, -qty, MovementKind::Sale, now);
                self.push_event(Event::SaleRecorded {
                    sku_id: sku_id.to_string(),
                    location_id: location_id.to_string(),
                    qty,
                });
                SalesOutcome::Accepted
            }
            (_, SalesEventType::Return) => {
                // Returns are ledger movements for both source kinds; an RFID
                // return only affects counted stock once the tag is re-read.
                self.ledger
                    .append(location_id, sku_id, qty, MovementKind::Return, now);
                self.push_event(Event::ReturnRecorded {
                    sku_id: sku_id.to_string(),
                    location_id: location_id.to_string(),
                    qty,
                });
                SalesOutcome::Accepted
            }
        };

        self.recompute_location(location_id);
        Ok(outcome)
    }

    /// Remove up to `qty` oldest-seen EPCs of the SKU from the location and
    /// floor the snapshot at the remaining count. Returns tags removed.
    pub(crate) fn immediate_rfid_deduction(
        &mut self,
        location_id: &str,
        sku_id: &str,
        qty: i64,
    ) -> i64 {
        let now = self.now();
        let present = self
            .presence
            .present_of_sku(location_id, sku_id, now, self.cfg.presence_ttl);
        let n = (qty.max(0) as usize).min(present.len());
        for record in present.iter().take(n) {
            self.presence.remove(&record.epc);
        }
        let remaining = (present.len() - n) as i64;
        self.snapshots.set_floor(location_id, sku_id, remaining);
        n as i64
    }
}
