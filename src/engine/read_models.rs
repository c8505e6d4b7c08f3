//! Read models: point-in-time copies handed to collaborators. Nothing here
//! mutates engine state, and returned values are defensive clones.

use super::InventoryEngine;
use crate::errors::EngineError;
use crate::models::{
    AuditEntry, BasketItem, EffectiveRule, Location, PresenceRecord, ReadRecord, ReceivingOrder,
    ReplenishmentTask, RuleTemplate, StaffMember, StockSnapshot, TaskStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

const RECENT_READS: usize = 50;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardRow {
    pub location_id: String,
    pub name: String,
    pub is_sales_location: bool,
    pub sku_count: usize,
    pub total_qty: i64,
    pub low_stock_count: usize,
    pub open_task_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct InventoryRow {
    pub sku_id: String,
    pub sku_name: String,
    pub source: String,
    pub qty: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    pub version: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    pub last_calculated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ZoneDetail {
    pub location: Location,
    pub inventory: Vec<InventoryRow>,
    pub recent_reads: Vec<ReadRecord>,
    pub open_tasks: Vec<ReplenishmentTask>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineEntry {
    pub at: DateTime<Utc>,
    pub kind: String,
    pub detail: String,
}

impl InventoryEngine {
    /// Per-location summary for the dashboard.
    pub fn dashboard(&self) -> Vec<DashboardRow> {
        self.locations
            .values()
            .map(|location| {
                let snapshots = self.snapshots.rows_for_location(&location.id);
                let low_stock_count = self
                    .rules
                    .for_location(&location.id)
                    .iter()
                    .filter(|rule| {
                        self.snapshots.qty(&rule.location_id, &rule.sku_id, rule.source)
                            <= rule.min
                    })
                    .count();
                let open_task_count = self
                    .tasks
                    .values()
                    .filter(|t| t.status.is_open() && t.location_id == location.id)
                    .count();
                DashboardRow {
                    location_id: location.id.clone(),
                    name: location.name.clone(),
                    is_sales_location: location.is_sales_location,
                    sku_count: snapshots.len(),
                    total_qty: snapshots.iter().map(|s| s.qty).sum(),
                    low_stock_count,
                    open_task_count,
                }
            })
            .collect()
    }

    /// Inventory rows, recent reads and open tasks for one zone.
    pub fn zone_detail(&self, location_id: &str) -> Result<ZoneDetail, EngineError> {
        let location = self.location(location_id)?.clone();
        let rules = self.rules.for_location(location_id);
        let mut inventory: Vec<InventoryRow> = self
            .snapshots
            .rows_for_location(location_id)
            .into_iter()
            .map(|snapshot| {
                let rule = rules
                    .iter()
                    .find(|r| r.sku_id == snapshot.sku_id && r.source == snapshot.source);
                InventoryRow {
                    sku_name: self
                        .skus
                        .get(&snapshot.sku_id)
                        .map(|s| s.name.clone())
                        .unwrap_or_default(),
                    sku_id: snapshot.sku_id,
                    source: snapshot.source.as_str().to_string(),
                    qty: snapshot.qty,
                    confidence: snapshot.confidence,
                    version: snapshot.version,
                    min: rule.map(|r| r.min),
                    max: rule.map(|r| r.max),
                    last_calculated_at: snapshot.last_calculated_at,
                }
            })
            .collect();
        inventory.sort_by(|a, b| a.sku_id.cmp(&b.sku_id));
        let recent_reads: Vec<ReadRecord> = self
            .read_log
            .iter()
            .rev()
            .filter(|r| r.location_id == location_id)
            .take(RECENT_READS)
            .cloned()
            .collect();
        let mut open_tasks: Vec<ReplenishmentTask> = self
            .tasks
            .values()
            .filter(|t| t.status.is_open() && t.location_id == location_id)
            .cloned()
            .collect();
        open_tasks.sort_by_key(|t| t.seq);
        Ok(ZoneDetail {
            location,
            inventory,
            recent_reads,
            open_tasks,
        })
    }

    pub fn tasks_filtered(
        &self,
        status: Option<TaskStatus>,
        location_id: Option<&str>,
        sku_id: Option<&str>,
    ) -> Vec<ReplenishmentTask> {
        let mut tasks: Vec<ReplenishmentTask> = self
            .tasks
            .values()
            .filter(|t| status.map(|s| t.status == s).unwrap_or(true))
            .filter(|t| location_id.map(|l| t.location_id == l).unwrap_or(true))
            .filter(|t| sku_id.map(|s| t.sku_id == s).unwrap_or(true))
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.seq);
        tasks
    }

    pub fn task(&self, task_id: uuid::Uuid) -> Result<ReplenishmentTask, EngineError> {
        self.tasks
            .get(&task_id)
            .cloned()
            .ok_or(EngineError::TaskNotFound(task_id))
    }

    pub fn receiving_orders(&self) -> Vec<ReceivingOrder> {
        let mut orders: Vec<ReceivingOrder> = self.orders.values().cloned().collect();
        orders.sort_by_key(|o| o.seq);
        orders
    }

    pub fn receiving_order(&self, order_id: uuid::Uuid) -> Result<ReceivingOrder, EngineError> {
        self.orders
            .get(&order_id)
            .cloned()
            .ok_or(EngineError::OrderNotFound(order_id))
    }

    pub fn audit_entries(&self, subject_id: Option<&str>) -> Vec<AuditEntry> {
        match subject_id {
            Some(subject) => self.audit.for_subject(subject),
            None => self.audit.entries().to_vec(),
        }
    }

    /// Chronological feed merging audit lines, ledger movements and reads.
    pub fn timeline(&self) -> Vec<TimelineEntry> {
        let mut entries: Vec<TimelineEntry> = self
            .audit
            .entries()
            .iter()
            .map(|e| TimelineEntry {
                at: e.recorded_at,
                kind: format!("audit:{:?}", e.action).to_lowercase(),
                detail: format!("{} {} ({})", e.subject_id, e.details, e.actor),
            })
            .chain(self.ledger.entries().iter().map(|e| TimelineEntry {
                at: e.recorded_at,
                kind: "ledger".to_string(),
                detail: format!("{} {:+} at {}", e.sku_id, e.qty, e.location_id),
            }))
            .chain(self.read_log.iter().map(|r| TimelineEntry {
                at: r.read_at,
                kind: if r.synthetic {
                    "read:synthetic".to_string()
                } else {
                    "read".to_string()
                },
                detail: format!("{} at {} via {}", r.epc, r.location_id, r.antenna_id),
            }))
            .collect();
        entries.sort_by_key(|e| e.at);
        entries
    }

    pub fn staff_members(&self) -> Vec<StaffMember> {
        self.staff.values().cloned().collect()
    }

    pub fn effective_rules(&self) -> Vec<EffectiveRule> {
        self.rules.rules().cloned().collect()
    }

    pub fn rule_templates(&self) -> Vec<RuleTemplate> {
        self.templates.values().cloned().collect()
    }

    pub fn snapshots_for(&self, location_id: &str) -> Vec<StockSnapshot> {
        self.snapshots.rows_for_location(location_id)
    }

    pub fn basket_items(&self, customer_id: Option<&str>) -> Vec<BasketItem> {
        let mut items: Vec<BasketItem> = self
            .baskets
            .values()
            .filter(|b| customer_id.map(|c| b.customer_id == c).unwrap_or(true))
            .cloned()
            .collect();
        items.sort_by_key(|b| b.seq);
        items
    }

    /// Presence lookup, mainly for diagnostics and tests.
    pub fn presence_of(&self, epc: &str) -> Option<PresenceRecord> {
        self.presence.get(epc).cloned()
    }

    pub fn cursor(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
