//! Customer baskets: reservation of in-flight picks, pending RFID pick
//! reconciliation, removal repair, and checkout with the personalisation
//! routing through cashier staging.

use super::InventoryEngine;
use crate::errors::EngineError;
use crate::events::Event;
use crate::models::{
    BasketItem, BasketStatus, MovementKind, PendingPick, PresenceRecord, StockSource,
    CASHIER_STORAGE_ZONE, PRINTING_WALL_ZONE,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSummary {
    pub customer_id: String,
    pub sold_items: usize,
    pub personalised_items: usize,
    pub replacement_tasks: usize,
}

impl InventoryEngine {
    /// Add an item to a customer's basket, reserving it against the zone's
    /// available stock.
    #[instrument(skip(self))]
    pub fn add_customer_item(
        &mut self,
        customer_id: &str,
        location_id: &str,
        sku_id: &str,
        qty: i64,
        timestamp: DateTime<Utc>,
    ) -> Result<BasketItem, EngineError> {
        let location = self.location(location_id)?;
        if !location.is_sales_location {
            return Err(EngineError::ZoneNotOrderable(location_id.to_string()));
        }
        let sku = self.sku(sku_id)?.clone();
        if qty <= 0 {
            return Err(EngineError::InvalidQuantity(qty));
        }
        self.clock.observe(timestamp);
        let now = self.now();

        let current = self.snapshots.qty(location_id, sku_id, sku.source);
        let reserved = self.reserved_qty(location_id, sku_id);
        let available = current - reserved;
        if qty > available {
            return Err(EngineError::InsufficientInventory {
                available: available.max(0),
            });
        }

        let id = Uuid::new_v4();
        let seq = self.next_seq();
        let item = BasketItem {
            id,
            seq,
            customer_id: customer_id.to_string(),
            location_id: location_id.to_string(),
            sku_id: sku_id.to_string(),
            qty,
            picked_confirmed_qty: 0,
            status: BasketStatus::InCart,
            created_at: now,
            updated_at: now,
        };
        self.baskets.insert(id, item.clone());
        if sku.source == StockSource::Rfid {
            self.picks.insert(
                id,
                PendingPick {
                    basket_item_id: id,
                    customer_id: customer_id.to_string(),
                    location_id: location_id.to_string(),
                    sku_id: sku_id.to_string(),
                    qty_remaining: qty,
                    consumed_epcs: Vec::new(),
                    created_at: now,
                },
            );
        }
        info!(
            "Basket item {} added: {} x{} for {} at {}",
            id, sku_id, qty, customer_id, location_id
        );
        self.push_event(Event::BasketItemAdded {
            basket_item_id: id,
            customer_id: customer_id.to_string(),
            sku_id: sku_id.to_string(),
            qty,
        });
        Ok(item)
    }

    /// Units already spoken for by IN_CART items in this zone. RFID items
    /// reserve only what reads have not yet confirmed into the basket.
    pub(crate) fn reserved_qty(&self, location_id: &str, sku_id: &str) -> i64 {
        self.baskets
            .values()
            .filter(|b| {
                b.status == BasketStatus::InCart
                    && b.location_id == location_id
                    && b.sku_id == sku_id
            })
            .map(|b| match self.skus.get(sku_id).map(|s| s.source) {
                Some(StockSource::Rfid) => (b.qty - b.picked_confirmed_qty).max(0),
                _ => b.qty,
            })
            .sum()
    }

    /// Reconcile pending picks after a read: consume present EPCs of the SKU
    /// (oldest first), delete them from presence, and attribute them to the
    /// basket item.
    pub(crate) fn resolve_pending_picks(&mut self, location_id: &str, sku_id: &str) {
        let now = self.now();
        let ttl = self.cfg.presence_ttl;
        let mut pick_ids: Vec<(u64, Uuid)> = self
            .picks
            .values()
            .filter(|p| {
                p.location_id == location_id && p.sku_id == sku_id && p.qty_remaining > 0
            })
            .filter_map(|p| self.baskets.get(&p.basket_item_id).map(|b| (b.seq, p.basket_item_id)))
            .collect();
        pick_ids.sort();

        for (_, pick_id) in pick_ids {
            loop {
                let remaining = self
                    .picks
                    .get(&pick_id)
                    .map(|p| p.qty_remaining)
                    .unwrap_or(0);
                if remaining == 0 {
                    break;
                }
                let next_epc = self
                    .presence
                    .present_of_sku(location_id, sku_id, now, ttl)
                    .first()
                    .map(|r| r.epc.clone());
                let Some(epc) = next_epc else {
                    break;
                };
                self.presence.remove(&epc);
                if let Some(pick) = self.picks.get_mut(&pick_id) {
                    pick.qty_remaining -= 1;
                    pick.consumed_epcs.push(epc.clone());
                }
                if let Some(item) = self.baskets.get_mut(&pick_id) {
                    item.picked_confirmed_qty += 1;
                    item.updated_at = now;
                }
                debug!("Pick {}: consumed {}", pick_id, epc);
            }
        }
    }

    /// Remove a basket item, restoring its reserved units. Consumed EPCs are
    /// re-materialised in the original zone; a shortfall against the
    /// confirmed count is synthesised as new tags (legacy repair).
    #[instrument(skip(self))]
    pub fn remove_customer_item(
        &mut self,
        basket_item_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> Result<BasketItem, EngineError> {
        let item = self
            .baskets
            .get(&basket_item_id)
            .cloned()
            .ok_or(EngineError::BasketItemNotFound(basket_item_id))?;
        if item.status != BasketStatus::InCart {
            return Err(EngineError::BasketItemNotOpen(basket_item_id));
        }
        self.clock.observe(timestamp);
        let now = self.now();

        if self.skus.get(&item.sku_id).map(|s| s.source) == Some(StockSource::Rfid) {
            let pick = self.picks.remove(&basket_item_id);
            let consumed = pick.map(|p| p.consumed_epcs).unwrap_or_default();
            let antenna_id = self.primary_antenna_of(&item.location_id);
            for epc in &consumed {
                self.presence.insert(PresenceRecord {
                    epc: epc.clone(),
                    sku_id: item.sku_id.clone(),
                    location_id: item.location_id.clone(),
                    antenna_id: antenna_id.clone(),
                    last_seen_at: now,
                    rssi: None,
                });
            }
            let shortfall = item.picked_confirmed_qty - consumed.len() as i64;
            for _ in 0..shortfall.max(0) {
                let epc = self.synthesise_epc(&item.sku_id, now);
                self.presence.insert(PresenceRecord {
                    epc,
                    sku_id: item.sku_id.clone(),
                    location_id: item.location_id.clone(),
                    antenna_id: antenna_id.clone(),
                    last_seen_at: now,
                    rssi: None,
                });
            }
        }

        let stored = self
            .baskets
            .get_mut(&basket_item_id)
            .expect("item checked above");
        stored.status = BasketStatus::Removed;
        stored.updated_at = now;
        let updated = stored.clone();
        info!("Basket item {} removed", basket_item_id);
        self.push_event(Event::BasketItemRemoved { basket_item_id });
        let location_id = item.location_id.clone();
        self.recompute_location(&location_id);
        Ok(updated)
    }

    /// Check out every IN_CART item of a customer.
    ///
    /// Personalisable SKUs route their physical units through cashier
    /// staging and demand a replacement: from the origin while stock remains
    /// reachable, from the printing wall once projected supply is exhausted.
    #[instrument(skip(self))]
    pub fn checkout_customer(
        &mut self,
        customer_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<CheckoutSummary, EngineError> {
        self.clock.observe(timestamp);
        let mut items: Vec<BasketItem> = self
            .baskets
            .values()
            .filter(|b| b.customer_id == customer_id && b.status == BasketStatus::InCart)
            .cloned()
            .collect();
        items.sort_by_key(|b| b.seq);

        let mut summary = CheckoutSummary {
            customer_id: customer_id.to_string(),
            sold_items: 0,
            personalised_items: 0,
            replacement_tasks: 0,
        };

        for item in items {
            let now = self.now();
            let sku = self.sku(&item.sku_id)?.clone();
            let personalisable = self.catalog.is_personalisable(&item.sku_id);

            // Take the physical units out of the origin zone. Picked RFID
            // units are already gone from presence; the rest leave now.
            match sku.source {
                StockSource::Rfid => {
                    let unpicked = (item.qty - item.picked_confirmed_qty).max(0);
                    if unpicked > 0 {
                        self.immediate_rfid_deduction(&item.location_id, &item.sku_id, unpicked);
                    }
                    self.picks.remove(&item.id);
                }
                StockSource::NonRfid => {
                    self.ledger.append(
                        &item.location_id,
                        &item.sku_id,
                        -item.qty,
                        MovementKind::Sale,
                        now,
                    );
                }
            }

            if let Some(stored) = self.baskets.get_mut(&item.id) {
                stored.status = BasketStatus::Sold;
                stored.updated_at = now;
            }
            summary.sold_items += 1;
            self.recompute_location(&item.location_id);

            if personalisable {
                summary.personalised_items += 1;
                // Sold units wait at the cashier for personalisation.
                self.snapshots.credit(
                    CASHIER_STORAGE_ZONE,
                    &item.sku_id,
                    sku.source,
                    item.qty,
                    now,
                );
                let projected =
                    self.projected_supply(&item.location_id, &item.sku_id, sku.source);
                let destination = if projected > 0 {
                    item.location_id.clone()
                } else {
                    PRINTING_WALL_ZONE.to_string()
                };
                self.create_replacement_task(&destination, &item.sku_id, sku.source, item.qty);
                summary.replacement_tasks += 1;
                // Re-evaluate the destination so the planner can fold the
                // replacement into any plan the rule already raised.
                self.recompute_location(&destination);
            }
        }

        info!(
            "Checkout for {}: {} items sold ({} personalised)",
            customer_id, summary.sold_items, summary.personalised_items
        );
        self.push_event(Event::CustomerCheckedOut {
            customer_id: customer_id.to_string(),
            items: summary.sold_items,
        });
        self.auto_assign_pending();
        Ok(summary)
    }

    /// Replacement demand raised by a personalisation checkout. Reuses the
    /// destination's effective rule when one exists; otherwise the task
    /// carries the canonical rule id it would have.
    fn create_replacement_task(
        &mut self,
        destination_id: &str,
        sku_id: &str,
        source_type: StockSource,
        qty: i64,
    ) {
        use crate::models::rule_id;
        let rid = rule_id(destination_id, sku_id, source_type);
        let current = self.snapshots.qty(destination_id, sku_id, source_type);
        let sources: Vec<String> = self
            .locations
            .get(destination_id)
            .map(|l| l.replenishment_sources.clone())
            .unwrap_or_default();
        let candidates = self.build_candidates(&sources, sku_id, source_type, None);
        let selected = candidates
            .iter()
            .find(|c| c.available_qty > 0)
            .or(candidates.first())
            .map(|c| c.zone_id.clone());
        let target = self
            .rules
            .get(&rid)
            .map(|r| r.max)
            .unwrap_or(current + qty);
        let synthetic_rule = crate::models::EffectiveRule {
            id: rid,
            location_id: destination_id.to_string(),
            sku_id: sku_id.to_string(),
            source: source_type,
            min: 0,
            max: target,
            priority: 0,
            inbound_source_id: None,
            active: true,
            template_id: Uuid::nil(),
            updated_at: self.now(),
        };
        self.create_planned_task(&synthetic_rule, current, qty, selected, candidates);
    }
}
