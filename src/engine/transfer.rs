//! Transfer execution and the task state machine transitions that move
//! stock: assign, start, confirm.

use super::InventoryEngine;
use crate::errors::EngineError;
use crate::events::Event;
use crate::models::{
    AuditAction, CloseReason, MovementKind, PresenceRecord, ReadRecord, ReplenishmentTask,
    StockSource, TaskStatus, EXTERNAL_SOURCE_PREFIX,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConfirmTaskOutcome {
    Confirmed { confirmed_qty: i64 },
    ConfirmedPartial { confirmed_qty: i64 },
    NoInventoryMoved,
}

impl InventoryEngine {
    /// Move up to `qty` units of a SKU between locations. Returns how many
    /// actually moved; zero means no mutation happened.
    ///
    /// External origins fabricate stock: RFID receipts synthesise new EPCs at
    /// the destination's primary antenna, NON_RFID receipts credit the
    /// destination ledger. Internal moves are bounded by the source's actual
    /// holdings.
    pub(crate) fn execute_transfer(
        &mut self,
        source_id: &str,
        destination_id: &str,
        sku_id: &str,
        source_type: StockSource,
        qty: i64,
    ) -> i64 {
        if qty <= 0 {
            return 0;
        }
        let now = self.now();
        let external = source_id.starts_with(EXTERNAL_SOURCE_PREFIX);
        match (external, source_type) {
            (true, StockSource::Rfid) => {
                let antenna_id = self.primary_antenna_of(destination_id);
                for _ in 0..qty {
                    let epc = self.synthesise_epc(sku_id, now);
                    self.presence.insert(PresenceRecord {
                        epc: epc.clone(),
                        sku_id: sku_id.to_string(),
                        location_id: destination_id.to_string(),
                        antenna_id: antenna_id.clone(),
                        last_seen_at: now,
                        rssi: None,
                    });
                    self.record_read(ReadRecord {
                        epc,
                        sku_id: sku_id.to_string(),
                        location_id: destination_id.to_string(),
                        antenna_id: antenna_id.clone(),
                        read_at: now,
                        rssi: None,
                        synthetic: true,
                    });
                }
                qty
            }
            (true, StockSource::NonRfid) => {
                self.ledger.append(
                    destination_id,
                    sku_id,
                    qty,
                    MovementKind::ConfirmedReplenishment,
                    now,
                );
                qty
            }
            (false, StockSource::Rfid) => {
                let present =
                    self.presence
                        .present_of_sku(source_id, sku_id, now, self.cfg.presence_ttl);
                let n = (qty as usize).min(present.len());
                if n == 0 {
                    return 0;
                }
                let antenna_id = self.primary_antenna_of(destination_id);
                for record in present.iter().take(n) {
                    self.presence.note_read(
                        &record.epc,
                        sku_id,
                        destination_id,
                        &antenna_id,
                        now,
                        None,
                    );
                    // Synthetic reads keep the move visible in the zone feed.
                    self.record_read(ReadRecord {
                        epc: record.epc.clone(),
                        sku_id: sku_id.to_string(),
                        location_id: destination_id.to_string(),
                        antenna_id: antenna_id.clone(),
                        read_at: now,
                        rssi: None,
                        synthetic: true,
                    });
                }
                debug!(
                    "Moved {} tagged units of {} from {} to {}",
                    n, sku_id, source_id, destination_id
                );
                n as i64
            }
            (false, StockSource::NonRfid) => {
                let available = self.ledger.quantity(source_id, sku_id);
                let n = qty.min(available);
                if n <= 0 {
                    return 0;
                }
                self.ledger.append(
                    source_id,
                    sku_id,
                    -n,
                    MovementKind::ConfirmedReplenishment,
                    now,
                );
                self.ledger.append(
                    destination_id,
                    sku_id,
                    n,
                    MovementKind::ConfirmedReplenishment,
                    now,
                );
                n
            }
        }
    }

    /// Explicit assignment; unlike `start_task` there is no out-of-scope
    /// fallback here.
    #[instrument(skip(self))]
    pub fn assign_task(
        &mut self,
        task_id: Uuid,
        staff_id: &str,
    ) -> Result<ReplenishmentTask, EngineError> {
        let task = self
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(EngineError::TaskNotFound(task_id))?;
        if !matches!(task.status, TaskStatus::Created | TaskStatus::Assigned) {
            return Err(EngineError::TaskNotOpen {
                status: task.status.as_str().to_string(),
            });
        }
        let member = self
            .staff
            .get(staff_id)
            .ok_or_else(|| EngineError::StaffNotFound(staff_id.to_string()))?;
        if !member.on_shift || !member.scope.covers(&task.location_id) {
            return Err(EngineError::StaffNotEligibleForZone {
                staff_id: staff_id.to_string(),
                location_id: task.location_id.clone(),
            });
        }
        let now = self.now();
        let stored = self.tasks.get_mut(&task_id).expect("task checked above");
        stored.status = TaskStatus::Assigned;
        stored.assigned_staff_id = Some(staff_id.to_string());
        stored.assigned_at = Some(now);
        stored.updated_at = now;
        let updated = stored.clone();
        self.audit.record(
            task_id.to_string(),
            AuditAction::Assigned,
            staff_id,
            "assigned explicitly",
            now,
        );
        self.push_event(Event::TaskAssigned {
            task_id,
            staff_id: staff_id.to_string(),
            fallback: false,
        });
        Ok(updated)
    }

    /// Start work on a task.
    ///
    /// Allowed for active in-scope staff, or for the already-assigned member
    /// when no other active in-scope staff exists.
    #[instrument(skip(self))]
    pub fn start_task(
        &mut self,
        task_id: Uuid,
        staff_id: &str,
    ) -> Result<ReplenishmentTask, EngineError> {
        let task = self
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(EngineError::TaskNotFound(task_id))?;
        if !matches!(task.status, TaskStatus::Created | TaskStatus::Assigned) {
            return Err(EngineError::TaskNotOpen {
                status: task.status.as_str().to_string(),
            });
        }
        let member = self
            .staff
            .get(staff_id)
            .ok_or_else(|| EngineError::StaffNotFound(staff_id.to_string()))?;
        let eligible = member.on_shift && member.scope.covers(&task.location_id);
        if !eligible {
            let is_assigned = task.assigned_staff_id.as_deref() == Some(staff_id);
            let another_eligible = self
                .staff
                .values()
                .any(|m| m.id != staff_id && m.on_shift && m.scope.covers(&task.location_id));
            if !(is_assigned && !another_eligible) {
                return Err(EngineError::StaffNotEligibleForZone {
                    staff_id: staff_id.to_string(),
                    location_id: task.location_id.clone(),
                });
            }
            debug!(
                "Out-of-scope start of task {} by assigned staff {}",
                task_id, staff_id
            );
        }
        let now = self.now();
        let stored = self.tasks.get_mut(&task_id).expect("task checked above");
        stored.status = TaskStatus::InProgress;
        stored.assigned_staff_id = Some(staff_id.to_string());
        stored.started_at = Some(now);
        stored.updated_at = now;
        let updated = stored.clone();
        self.audit.record(
            task_id.to_string(),
            AuditAction::Started,
            staff_id,
            "started",
            now,
        );
        self.push_event(Event::TaskStarted {
            task_id,
            staff_id: staff_id.to_string(),
        });
        Ok(updated)
    }

    /// Confirm a task by executing its transfer.
    ///
    /// If the chosen source yields nothing, candidate sources are walked in
    /// order (remembered list first, then the destination's configured list)
    /// until one moves stock. If every source is dry the task stays
    /// IN_PROGRESS and nothing changes.
    #[instrument(skip(self))]
    pub fn confirm_task(
        &mut self,
        task_id: Uuid,
        confirmed_qty: i64,
        confirmed_by: &str,
        source_zone_override: Option<String>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<ConfirmTaskOutcome, EngineError> {
        let task = self
            .tasks
            .get(&task_id)
            .cloned()
            .ok_or(EngineError::TaskNotFound(task_id))?;
        if task.status != TaskStatus::InProgress {
            return Err(EngineError::TaskNotOpen {
                status: task.status.as_str().to_string(),
            });
        }
        if confirmed_qty <= 0 {
            return Err(EngineError::InvalidQuantity(confirmed_qty));
        }
        if let Some(t) = timestamp {
            self.clock.observe(t);
        }

        let mut attempt_order: Vec<String> = Vec::new();
        if let Some(overridden) = source_zone_override {
            attempt_order.push(overridden);
        } else if let Some(selected) = &task.source_zone_id {
            attempt_order.push(selected.clone());
        }
        attempt_order.extend(task.source_candidates.iter().map(|c| c.zone_id.clone()));
        if let Some(location) = self.locations.get(&task.location_id) {
            attempt_order.extend(location.replenishment_sources.clone());
        }
        attempt_order.retain(|s| s != &task.location_id);
        let mut seen = std::collections::BTreeSet::new();
        attempt_order.retain(|s| seen.insert(s.clone()));

        let mut moved = 0i64;
        let mut selected_source = None;
        for source_id in attempt_order {
            moved = self.execute_transfer(
                &source_id,
                &task.location_id,
                &task.sku_id,
                task.source,
                confirmed_qty,
            );
            if moved > 0 {
                selected_source = Some(source_id);
                break;
            }
        }
        if moved == 0 {
            info!("Task {}: no inventory moved, staying in progress", task_id);
            return Ok(ConfirmTaskOutcome::NoInventoryMoved);
        }

        let now = self.now();
        let partial = moved < task.deficit_qty;
        let reason = if partial {
            CloseReason::ConfirmedPartial
        } else {
            CloseReason::Confirmed
        };
        if let Some(stored) = self.tasks.get_mut(&task_id) {
            stored.status = TaskStatus::Confirmed;
            stored.confirmed_qty = Some(moved);
            stored.confirmed_by = Some(confirmed_by.to_string());
            stored.source_zone_id = selected_source.clone();
            stored.close_reason = Some(reason);
            stored.updated_at = now;
        }
        self.audit.record(
            task_id.to_string(),
            AuditAction::Confirmed,
            confirmed_by,
            format!(
                "moved {} of {} from {}",
                moved,
                task.deficit_qty,
                selected_source.as_deref().unwrap_or("-")
            ),
            now,
        );
        self.audit.record(
            task_id.to_string(),
            AuditAction::Closed,
            confirmed_by,
            reason.as_str(),
            now,
        );
        self.push_event(Event::TaskConfirmed {
            task_id,
            confirmed_qty: moved,
            partial,
        });
        self.push_event(Event::TaskClosed {
            task_id,
            close_reason: reason.as_str().to_string(),
        });

        if let Some(source_id) = &selected_source {
            if self.locations.contains_key(source_id) {
                let source_id = source_id.clone();
                self.recompute_location(&source_id);
            }
        }
        let destination = task.location_id.clone();
        self.recompute_location(&destination);

        if partial {
            Ok(ConfirmTaskOutcome::ConfirmedPartial {
                confirmed_qty: moved,
            })
        } else {
            Ok(ConfirmTaskOutcome::Confirmed {
                confirmed_qty: moved,
            })
        }
    }
}
