//! Load-balanced staff auto-assignment with zone-scope fallback.

use super::InventoryEngine;
use crate::events::Event;
use crate::models::{AuditAction, ReceivingStatus, StaffRole, TaskStatus};
use std::collections::BTreeMap;
use tracing::debug;
use uuid::Uuid;

enum PendingItem {
    Task(Uuid),
    Order(Uuid),
}

impl InventoryEngine {
    /// Assign every unowned pending task and in-transit order.
    ///
    /// Pool: active associates, or any active member when no associate is on
    /// shift. Load counts open tasks plus in-transit orders per member. Each
    /// item prefers in-scope members and falls back to the whole pool;
    /// minimum load wins, ties break on ascending member id.
    pub(crate) fn auto_assign_pending(&mut self) {
        let mut pool: Vec<String> = self
            .staff
            .values()
            .filter(|m| m.on_shift && m.role == StaffRole::Associate)
            .map(|m| m.id.clone())
            .collect();
        if pool.is_empty() {
            pool = self
                .staff
                .values()
                .filter(|m| m.on_shift)
                .map(|m| m.id.clone())
                .collect();
        }
        if pool.is_empty() {
            return;
        }

        let mut load: BTreeMap<String, usize> =
            pool.iter().map(|id| (id.clone(), 0usize)).collect();
        for task in self.tasks.values().filter(|t| t.status.is_open()) {
            if let Some(staff_id) = &task.assigned_staff_id {
                if let Some(count) = load.get_mut(staff_id) {
                    *count += 1;
                }
            }
        }
        for order in self
            .orders
            .values()
            .filter(|o| o.status == ReceivingStatus::InTransit)
        {
            if let Some(staff_id) = &order.assigned_staff_id {
                if let Some(count) = load.get_mut(staff_id) {
                    *count += 1;
                }
            }
        }

        let mut pending: Vec<(u64, String, PendingItem)> = self
            .tasks
            .values()
            .filter(|t| t.status == TaskStatus::Created && t.assigned_staff_id.is_none())
            .map(|t| (t.seq, t.location_id.clone(), PendingItem::Task(t.id)))
            .chain(
                self.orders
                    .values()
                    .filter(|o| {
                        o.status == ReceivingStatus::InTransit && o.assigned_staff_id.is_none()
                    })
                    .map(|o| {
                        (
                            o.seq,
                            o.destination_location_id.clone(),
                            PendingItem::Order(o.id),
                        )
                    }),
            )
            .collect();
        pending.sort_by_key(|(seq, _, _)| *seq);

        for (_, location_id, item) in pending {
            let in_scope: Vec<&String> = pool
                .iter()
                .filter(|id| {
                    self.staff
                        .get(*id)
                        .map(|m| m.scope.covers(&location_id))
                        .unwrap_or(false)
                })
                .collect();
            let fallback = in_scope.is_empty();
            let chosen_pool: Vec<&String> = if fallback {
                pool.iter().collect()
            } else {
                in_scope
            };
            let Some(staff_id) = chosen_pool
                .into_iter()
                .min_by_key(|id| (load.get(*id).copied().unwrap_or(0), (*id).clone()))
                .cloned()
            else {
                continue;
            };
            *load.entry(staff_id.clone()).or_insert(0) += 1;
            let now = self.now();
            let details = if fallback {
                "auto-assigned (out-of-scope fallback)"
            } else {
                "auto-assigned"
            };

            match item {
                PendingItem::Task(task_id) => {
                    if let Some(task) = self.tasks.get_mut(&task_id) {
                        task.status = TaskStatus::Assigned;
                        task.assigned_staff_id = Some(staff_id.clone());
                        task.assigned_at = Some(now);
                        task.updated_at = now;
                    }
                    debug!("Task {} auto-assigned to {}", task_id, staff_id);
                    self.audit.record(
                        task_id.to_string(),
                        AuditAction::Assigned,
                        "auto-assigner",
                        details,
                        now,
                    );
                    self.push_event(Event::TaskAssigned {
                        task_id,
                        staff_id,
                        fallback,
                    });
                }
                PendingItem::Order(order_id) => {
                    if let Some(order) = self.orders.get_mut(&order_id) {
                        order.assigned_staff_id = Some(staff_id.clone());
                        order.updated_at = now;
                    }
                    debug!("Order {} auto-assigned to {}", order_id, staff_id);
                    self.audit.record(
                        order_id.to_string(),
                        AuditAction::Assigned,
                        "auto-assigner",
                        details,
                        now,
                    );
                    self.push_event(Event::ReceivingOrderAssigned {
                        order_id,
                        staff_id,
                        fallback,
                    });
                }
            }
        }
    }
}
