//! Receiving orders: inbound stock for non-sales zones and external origins.

use super::InventoryEngine;
use crate::errors::EngineError;
use crate::events::Event;
use crate::models::{
    AuditAction, ReceivingOrder, ReceivingStatus, StockSource, EXTERNAL_SOURCE_PREFIX,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmOrderOutcome {
    Confirmed { moved_qty: i64 },
    NoInventoryMoved,
}

impl InventoryEngine {
    /// Create an inbound order. Internal sources must exist and must not be
    /// the destination itself; external sources must be registered.
    #[instrument(skip(self))]
    pub fn create_receiving_order(
        &mut self,
        source_location_id: &str,
        destination_location_id: &str,
        sku_id: &str,
        requested_qty: i64,
        declared_source: Option<StockSource>,
    ) -> Result<ReceivingOrder, EngineError> {
        self.location(destination_location_id)?;
        let sku = self.sku(sku_id)?.clone();
        if let Some(declared) = declared_source {
            if declared != sku.source {
                return Err(EngineError::SourceMismatch {
                    expected: sku.source.as_str().to_string(),
                    got: declared.as_str().to_string(),
                });
            }
        }
        if requested_qty <= 0 {
            return Err(EngineError::InvalidQuantity(requested_qty));
        }
        if source_location_id.starts_with(EXTERNAL_SOURCE_PREFIX) {
            if !self.externals.contains_key(source_location_id) {
                return Err(EngineError::SourceNotFound(source_location_id.to_string()));
            }
        } else {
            if !self.locations.contains_key(source_location_id) {
                return Err(EngineError::SourceNotFound(source_location_id.to_string()));
            }
            if source_location_id == destination_location_id {
                return Err(EngineError::SourceEqualsDestination(
                    source_location_id.to_string(),
                ));
            }
        }
        let order = self.insert_order(
            source_location_id,
            destination_location_id,
            sku_id,
            sku.source,
            requested_qty,
            "gateway",
        );
        self.auto_assign_pending();
        Ok(order)
    }

    /// Planner-side creation; preconditions hold by construction.
    pub(crate) fn create_receiving_order_internal(
        &mut self,
        source_location_id: &str,
        destination_location_id: &str,
        sku_id: &str,
        source: StockSource,
        requested_qty: i64,
    ) -> Uuid {
        self.insert_order(
            source_location_id,
            destination_location_id,
            sku_id,
            source,
            requested_qty,
            "planner",
        )
        .id
    }

    fn insert_order(
        &mut self,
        source_location_id: &str,
        destination_location_id: &str,
        sku_id: &str,
        source: StockSource,
        requested_qty: i64,
        actor: &str,
    ) -> ReceivingOrder {
        let id = Uuid::new_v4();
        let seq = self.next_seq();
        let now = self.now();
        let order = ReceivingOrder {
            id,
            seq,
            source_location_id: source_location_id.to_string(),
            destination_location_id: destination_location_id.to_string(),
            sku_id: sku_id.to_string(),
            source,
            requested_qty,
            confirmed_qty: None,
            status: ReceivingStatus::InTransit,
            assigned_staff_id: None,
            created_at: now,
            updated_at: now,
        };
        info!(
            "Receiving order {} created: {} x{} {} -> {}",
            id, sku_id, requested_qty, source_location_id, destination_location_id
        );
        self.orders.insert(id, order.clone());
        self.audit.record(
            id.to_string(),
            AuditAction::Created,
            actor,
            format!("requested {} from {}", requested_qty, source_location_id),
            now,
        );
        self.push_event(Event::ReceivingOrderCreated {
            order_id: id,
            destination_location_id: destination_location_id.to_string(),
            requested_qty,
        });
        order
    }

    /// Confirm arrival.
    ///
    /// External RFID receipts synthesise new tags at the destination's
    /// primary antenna; internal moves are bounded by what the source
    /// actually holds. Zero movement leaves the order open.
    #[instrument(skip(self))]
    pub fn confirm_receiving_order(
        &mut self,
        order_id: Uuid,
        confirmed_by: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<ConfirmOrderOutcome, EngineError> {
        let order = self
            .orders
            .get(&order_id)
            .cloned()
            .ok_or(EngineError::OrderNotFound(order_id))?;
        if order.status != ReceivingStatus::InTransit {
            return Err(EngineError::OrderNotOpen {
                status: order.status.as_str().to_string(),
            });
        }
        if let Some(t) = timestamp {
            self.clock.observe(t);
        }
        let moved = self.execute_transfer(
            &order.source_location_id,
            &order.destination_location_id,
            &order.sku_id,
            order.source,
            order.requested_qty,
        );
        if moved == 0 {
            info!("Receiving order {}: no inventory moved", order_id);
            return Ok(ConfirmOrderOutcome::NoInventoryMoved);
        }
        let now = self.now();
        let actor = confirmed_by.unwrap_or_else(|| "gateway".to_string());
        if let Some(stored) = self.orders.get_mut(&order_id) {
            stored.confirmed_qty = Some(moved);
            stored.status = ReceivingStatus::Confirmed;
            stored.updated_at = now;
        }
        self.audit.record(
            order_id.to_string(),
            AuditAction::Confirmed,
            actor,
            format!("received {} of {}", moved, order.requested_qty),
            now,
        );
        self.push_event(Event::ReceivingOrderConfirmed {
            order_id,
            moved_qty: moved,
        });
        if self.locations.contains_key(&order.source_location_id) {
            self.recompute_location(&order.source_location_id);
        }
        self.recompute_location(&order.destination_location_id);
        Ok(ConfirmOrderOutcome::Confirmed { moved_qty: moved })
    }
}
