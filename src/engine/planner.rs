//! Min/max evaluation: merging, trimming, source scoring and task creation
//! for sales zones, and the receiving takeover for non-sales zones.

use super::InventoryEngine;
use crate::events::Event;
use crate::models::{
    CloseReason, EffectiveRule, ReplenishmentTask, SourceCandidate, StockSource, TaskStatus,
    AuditAction, EXTERNAL_SOURCE_PREFIX,
};
use tracing::{debug, info};
use uuid::Uuid;

impl InventoryEngine {
    /// Evaluate every active rule in a location against its snapshot.
    pub(crate) fn evaluate_location(&mut self, location_id: &str) {
        let Some(location) = self.locations.get(location_id) else {
            return;
        };
        let is_sales = location.is_sales_location;
        for rule in self.rules.for_location(location_id) {
            if is_sales {
                self.evaluate_sales_rule(&rule);
            } else {
                self.evaluate_non_sales_rule(&rule);
            }
        }
    }

    fn evaluate_sales_rule(&mut self, rule: &EffectiveRule) {
        let current = self
            .snapshots
            .qty(&rule.location_id, &rule.sku_id, rule.source);
        let dest_sources: Vec<String> = self
            .locations
            .get(&rule.location_id)
            .map(|l| l.replenishment_sources.clone())
            .unwrap_or_default();

        // Merge: with a single possible source (or one shared selection)
        // parallel plans are redundant; fold them into the oldest.
        let auto = self.auto_adjustable_tasks(&rule.id);
        if auto.len() > 1 {
            let single_source = dest_sources.len() <= 1;
            let first_selection = self.tasks[&auto[0]].source_zone_id.clone();
            let shared = auto
                .iter()
                .all(|id| self.tasks[id].source_zone_id == first_selection);
            if single_source || shared {
                let keeper = auto[0];
                let merged: i64 = auto[1..]
                    .iter()
                    .map(|id| self.tasks[id].deficit_qty)
                    .sum();
                for id in &auto[1..] {
                    self.reject_task(*id, CloseReason::MergedPlan, "planner");
                }
                let now = self.now();
                if let Some(task) = self.tasks.get_mut(&keeper) {
                    task.deficit_qty += merged;
                    task.updated_at = now;
                }
                debug!("Merged {} plans into task {}", auto.len() - 1, keeper);
            }
        }

        // Over-stock: demand is gone.
        if current >= rule.max {
            for id in self.auto_adjustable_tasks(&rule.id) {
                self.reject_task(id, CloseReason::StockRecovered, "planner");
            }
        }

        // Trim: open deficits must never overshoot the gap to max.
        let desired = (rule.max - current).max(0);
        let open = self.open_tasks_for_rule(&rule.id);
        let total: i64 = open.iter().map(|id| self.tasks[id].deficit_qty).sum();
        if total > desired {
            let mut excess = total - desired;
            let newest_first: Vec<Uuid> = self
                .auto_adjustable_tasks(&rule.id)
                .into_iter()
                .rev()
                .collect();
            for id in newest_first {
                if excess == 0 {
                    break;
                }
                let deficit = self.tasks[&id].deficit_qty;
                if deficit <= excess {
                    excess -= deficit;
                    self.reject_task(id, CloseReason::PlanAdjusted, "planner");
                } else {
                    let now = self.now();
                    if let Some(task) = self.tasks.get_mut(&id) {
                        task.deficit_qty -= excess;
                        task.updated_at = now;
                    }
                    excess = 0;
                }
            }
        }

        // Source refresh: re-score candidates and drop stale selections.
        for id in self.open_tasks_for_rule(&rule.id) {
            let candidates =
                self.build_candidates(&dest_sources, &rule.sku_id, rule.source, Some(id));
            if let Some(task) = self.tasks.get_mut(&id) {
                if let Some(selected) = &task.source_zone_id {
                    if !candidates.iter().any(|c| &c.zone_id == selected) {
                        task.source_zone_id = None;
                    }
                }
                task.source_candidates = candidates;
            }
        }

        // Trigger: strictly below min with uncovered demand. Sitting exactly
        // at min does not raise a plan.
        if current >= rule.min {
            return;
        }
        let open = self.open_tasks_for_rule(&rule.id);
        let covered: i64 = open.iter().map(|id| self.tasks[id].deficit_qty).sum();
        let mut remaining = desired - covered;
        if remaining <= 0 {
            return;
        }
        let candidates = self.build_candidates(&dest_sources, &rule.sku_id, rule.source, None);
        let mut created_any = false;
        for candidate in &candidates {
            if remaining == 0 {
                break;
            }
            let alloc = remaining.min(candidate.available_qty);
            if alloc > 0 {
                self.create_planned_task(
                    rule,
                    current,
                    alloc,
                    Some(candidate.zone_id.clone()),
                    candidates.clone(),
                );
                remaining -= alloc;
                created_any = true;
            }
        }
        if !created_any && remaining > 0 {
            // No candidate has stock: one zero-stock task keeps the demand
            // visible to the floor.
            let first = dest_sources.first().cloned();
            self.create_planned_task(rule, current, remaining, first, candidates);
        }
    }

    /// Non-sales zones replenish through receiving orders; open tasks are
    /// taken over by that flow.
    fn evaluate_non_sales_rule(&mut self, rule: &EffectiveRule) {
        for id in self.auto_adjustable_tasks(&rule.id) {
            self.reject_task(id, CloseReason::NonSalesReceivingFlow, "planner");
        }
        let current = self
            .snapshots
            .qty(&rule.location_id, &rule.sku_id, rule.source);
        if current >= rule.min {
            return;
        }
        let desired = rule.max - current;
        let in_transit: i64 = self
            .orders
            .values()
            .filter(|o| {
                o.status == crate::models::ReceivingStatus::InTransit
                    && o.destination_location_id == rule.location_id
                    && o.sku_id == rule.sku_id
                    && o.source == rule.source
            })
            .map(|o| o.requested_qty)
            .sum();
        let remainder = desired - in_transit;
        if remainder <= 0 {
            return;
        }
        let sources: Vec<String> = self
            .locations
            .get(&rule.location_id)
            .map(|l| l.replenishment_sources.clone())
            .unwrap_or_default();
        let chosen = rule
            .inbound_source_id
            .clone()
            .or_else(|| self.pick_best_source(&sources, &rule.sku_id, rule.source, remainder));
        let Some(source_id) = chosen else {
            return;
        };
        self.create_receiving_order_internal(
            &source_id,
            &rule.location_id,
            &rule.sku_id,
            rule.source,
            remainder,
        );
    }

    /// Best receiving origin: first internal source able to cover the
    /// remainder, else first internal source with anything, else first
    /// external, else the first configured source.
    fn pick_best_source(
        &self,
        sources: &[String],
        sku_id: &str,
        source_type: StockSource,
        needed: i64,
    ) -> Option<String> {
        let internal = |s: &&String| self.locations.contains_key(*s);
        if let Some(s) = sources
            .iter()
            .filter(internal)
            .find(|s| self.snapshots.qty(s, sku_id, source_type) >= needed)
        {
            return Some(s.clone());
        }
        if let Some(s) = sources
            .iter()
            .filter(internal)
            .find(|s| self.snapshots.qty(s, sku_id, source_type) > 0)
        {
            return Some(s.clone());
        }
        if let Some(s) = sources
            .iter()
            .find(|s| s.starts_with(EXTERNAL_SOURCE_PREFIX))
        {
            return Some(s.clone());
        }
        sources.first().cloned()
    }

    /// Score the destination's ordered source list. Availability nets out
    /// deficits other open tasks already reserved against each source.
    pub(crate) fn build_candidates(
        &self,
        sources: &[String],
        sku_id: &str,
        source_type: StockSource,
        exclude_task: Option<Uuid>,
    ) -> Vec<SourceCandidate> {
        sources
            .iter()
            .enumerate()
            .map(|(sort_order, zone_id)| {
                let available_qty = if self.locations.contains_key(zone_id) {
                    (self.snapshots.qty(zone_id, sku_id, source_type)
                        - self.reserved_from_source(zone_id, sku_id, exclude_task))
                    .max(0)
                } else {
                    0
                };
                SourceCandidate {
                    zone_id: zone_id.clone(),
                    sort_order,
                    available_qty,
                }
            })
            .collect()
    }

    /// Open tasks of a rule that the planner may still reshape (everything
    /// not yet IN_PROGRESS), oldest first.
    fn auto_adjustable_tasks(&self, rule_id: &str) -> Vec<Uuid> {
        self.open_tasks_for_rule(rule_id)
            .into_iter()
            .filter(|id| self.tasks[id].status != TaskStatus::InProgress)
            .collect()
    }

    pub(crate) fn create_planned_task(
        &mut self,
        rule: &EffectiveRule,
        trigger_qty: i64,
        deficit_qty: i64,
        source_zone_id: Option<String>,
        source_candidates: Vec<SourceCandidate>,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let seq = self.next_seq();
        let now = self.now();
        let task = ReplenishmentTask {
            id,
            seq,
            rule_id: rule.id.clone(),
            location_id: rule.location_id.clone(),
            sku_id: rule.sku_id.clone(),
            source: rule.source,
            source_candidates,
            source_zone_id,
            status: TaskStatus::Created,
            trigger_qty,
            deficit_qty,
            target_qty: rule.max,
            assigned_staff_id: None,
            assigned_at: None,
            started_at: None,
            confirmed_qty: None,
            confirmed_by: None,
            close_reason: None,
            created_at: now,
            updated_at: now,
        };
        info!(
            "Task {} created: {} x{} -> {} (trigger {})",
            id, rule.sku_id, deficit_qty, rule.location_id, trigger_qty
        );
        self.tasks.insert(id, task);
        self.audit.record(
            id.to_string(),
            AuditAction::Created,
            "planner",
            format!("deficit {} toward target {}", deficit_qty, rule.max),
            now,
        );
        self.push_event(Event::TaskCreated {
            task_id: id,
            location_id: rule.location_id.clone(),
            sku_id: rule.sku_id.clone(),
            deficit_qty,
        });
        id
    }

    /// Projected supply of a location for one SKU: on-hand stock, open
    /// inbound deficits, and whatever its configured sources could still
    /// spare.
    pub(crate) fn projected_supply(
        &self,
        location_id: &str,
        sku_id: &str,
        source_type: StockSource,
    ) -> i64 {
        let on_hand = self.snapshots.qty(location_id, sku_id, source_type);
        let inbound_tasks: i64 = self
            .tasks
            .values()
            .filter(|t| {
                t.status.is_open() && t.location_id == location_id && t.sku_id == sku_id
            })
            .map(|t| t.deficit_qty)
            .sum();
        let inbound_orders: i64 = self
            .orders
            .values()
            .filter(|o| {
                o.status == crate::models::ReceivingStatus::InTransit
                    && o.destination_location_id == location_id
                    && o.sku_id == sku_id
            })
            .map(|o| o.requested_qty)
            .sum();
        let spare: i64 = self
            .locations
            .get(location_id)
            .map(|l| {
                l.replenishment_sources
                    .iter()
                    .filter(|s| self.locations.contains_key(*s))
                    .map(|s| {
                        (self.snapshots.qty(s, sku_id, source_type)
                            - self.reserved_from_source(s, sku_id, None))
                        .max(0)
                    })
                    .sum()
            })
            .unwrap_or(0);
        on_hand + inbound_tasks + inbound_orders + spare
    }
}
