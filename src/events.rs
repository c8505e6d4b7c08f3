use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

/// Domain events emitted by the engine after each accepted command.
///
/// The engine itself is synchronous; events accumulate in its outbox and the
/// gateway forwards them here after the command completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    ReadAccepted {
        epc: String,
        location_id: String,
        at: DateTime<Utc>,
    },
    ZoneSwept {
        location_id: String,
        refreshed: usize,
    },
    SaleRecorded {
        sku_id: String,
        location_id: String,
        qty: i64,
    },
    ReturnRecorded {
        sku_id: String,
        location_id: String,
        qty: i64,
    },
    TaskCreated {
        task_id: Uuid,
        location_id: String,
        sku_id: String,
        deficit_qty: i64,
    },
    TaskAssigned {
        task_id: Uuid,
        staff_id: String,
        fallback: bool,
    },
    TaskStarted {
        task_id: Uuid,
        staff_id: String,
    },
    TaskConfirmed {
        task_id: Uuid,
        confirmed_qty: i64,
        partial: bool,
    },
    TaskClosed {
        task_id: Uuid,
        close_reason: String,
    },
    ReceivingOrderCreated {
        order_id: Uuid,
        destination_location_id: String,
        requested_qty: i64,
    },
    ReceivingOrderAssigned {
        order_id: Uuid,
        staff_id: String,
        fallback: bool,
    },
    ReceivingOrderConfirmed {
        order_id: Uuid,
        moved_qty: i64,
    },
    ReceivingOrderCancelled {
        order_id: Uuid,
    },
    BasketItemAdded {
        basket_item_id: Uuid,
        customer_id: String,
        sku_id: String,
        qty: i64,
    },
    BasketItemRemoved {
        basket_item_id: Uuid,
    },
    CustomerCheckedOut {
        customer_id: String,
        items: usize,
    },
    RulesProjected {
        created: usize,
        updated: usize,
        removed: usize,
    },
}

#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    pub async fn send(&self, event: Event) {
        if let Err(e) = self.tx.send(event).await {
            warn!("Failed to forward event: {}", e);
        }
    }
}

/// Background consumer: logs every domain event as one timeline line.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    while let Some(event) = rx.recv().await {
        match &event {
            Event::TaskCreated {
                task_id,
                location_id,
                sku_id,
                deficit_qty,
            } => info!(
                "Replenishment task {} created: {} x{} -> {}",
                task_id, sku_id, deficit_qty, location_id
            ),
            Event::TaskConfirmed {
                task_id,
                confirmed_qty,
                partial,
            } => info!(
                "Task {} confirmed ({} units{})",
                task_id,
                confirmed_qty,
                if *partial { ", partial" } else { "" }
            ),
            Event::ReceivingOrderCreated {
                order_id,
                destination_location_id,
                requested_qty,
            } => info!(
                "Receiving order {} created: {} units -> {}",
                order_id, requested_qty, destination_location_id
            ),
            other => info!(event = ?other, "Engine event"),
        }
    }
}
