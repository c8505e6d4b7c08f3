//! Zone, external-location and staff administration.

use super::dataset::LocationSeed;
use super::InventoryEngine;
use crate::errors::EngineError;
use crate::events::Event;
use crate::models::{
    Antenna, CloseReason, ExternalLocation, Location, Point, ReceivingStatus, StaffMember,
    StaffRole, TaskStatus, ZoneScope, EXTERNAL_SOURCE_PREFIX,
};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
pub struct ZoneUpdate {
    pub name: Option<String>,
    pub polygon: Option<Vec<Point>>,
    pub color: Option<String>,
    pub is_sales_location: Option<bool>,
    pub replenishment_sources: Option<Vec<String>>,
}

impl InventoryEngine {
    #[instrument(skip(self, seed))]
    pub fn create_zone(&mut self, seed: LocationSeed) -> Result<Location, EngineError> {
        if self.locations.contains_key(&seed.id) {
            return Err(EngineError::ZoneExists(seed.id));
        }
        for source in &seed.replenishment_sources {
            if !self.is_known_source(source) {
                return Err(EngineError::SourceNotFound(source.clone()));
            }
            if source == &seed.id {
                return Err(EngineError::SourceEqualsDestination(source.clone()));
            }
        }
        let mut location = Location {
            id: seed.id.clone(),
            name: seed.name,
            polygon: seed.polygon,
            color: seed.color,
            is_sales_location: seed.is_sales_location,
            replenishment_sources: seed.replenishment_sources,
            antenna_ids: Vec::new(),
        };
        for antenna_id in seed.antennas {
            location.antenna_ids.push(antenna_id.clone());
            self.antennas.insert(
                antenna_id.clone(),
                Antenna {
                    id: antenna_id,
                    location_id: location.id.clone(),
                },
            );
        }
        let created = location.clone();
        info!("Zone {} created", location.id);
        self.locations.insert(location.id.clone(), location);
        // Generic templates now cover the new zone.
        self.project_templates();
        self.recompute_location(&created.id);
        Ok(created)
    }

    #[instrument(skip(self, update))]
    pub fn update_zone(
        &mut self,
        location_id: &str,
        update: ZoneUpdate,
    ) -> Result<Location, EngineError> {
        self.location(location_id)?;
        if let Some(sources) = &update.replenishment_sources {
            for source in sources {
                if !self.is_known_source(source) {
                    return Err(EngineError::SourceNotFound(source.clone()));
                }
                if source == location_id {
                    return Err(EngineError::SourceEqualsDestination(source.clone()));
                }
            }
            let previous = self
                .locations
                .get(location_id)
                .map(|l| l.replenishment_sources.clone())
                .unwrap_or_default();
            for removed in previous.iter().filter(|s| !sources.contains(s)) {
                self.cancel_tasks_pulling_from(location_id, removed);
            }
        }
        let location = self.locations.get_mut(location_id).expect("checked above");
        if let Some(name) = update.name {
            location.name = name;
        }
        if let Some(polygon) = update.polygon {
            location.polygon = polygon;
        }
        if let Some(color) = update.color {
            location.color = color;
        }
        if let Some(is_sales) = update.is_sales_location {
            location.is_sales_location = is_sales;
        }
        if let Some(sources) = update.replenishment_sources {
            location.replenishment_sources = sources;
        }
        let updated = location.clone();
        self.recompute_location(location_id);
        Ok(updated)
    }

    /// Delete a zone: open work pointing at it (either direction) is
    /// cancelled, its state is dropped, and its location-scoped templates are
    /// retired.
    #[instrument(skip(self))]
    pub fn delete_zone(&mut self, location_id: &str) -> Result<(), EngineError> {
        self.location(location_id)?;
        let now = self.now();

        let doomed_tasks: Vec<Uuid> = self
            .tasks
            .values()
            .filter(|t| t.status.is_open() && t.location_id == location_id)
            .map(|t| t.id)
            .collect();
        for task_id in doomed_tasks {
            self.reject_task(task_id, CloseReason::ZoneDeleted, "gateway");
        }
        let sourced_tasks: Vec<Uuid> = self
            .tasks
            .values()
            .filter(|t| t.status.is_open() && t.source_zone_id.as_deref() == Some(location_id))
            .map(|t| t.id)
            .collect();
        for task_id in sourced_tasks {
            self.reject_task(task_id, CloseReason::SourceRemoved, "gateway");
        }
        let doomed_orders: Vec<Uuid> = self
            .orders
            .values()
            .filter(|o| {
                o.status == ReceivingStatus::InTransit
                    && (o.destination_location_id == location_id
                        || o.source_location_id == location_id)
            })
            .map(|o| o.id)
            .collect();
        for order_id in doomed_orders {
            if let Some(order) = self.orders.get_mut(&order_id) {
                order.status = ReceivingStatus::Cancelled;
                order.updated_at = now;
            }
            self.audit.record(
                order_id.to_string(),
                crate::models::AuditAction::Cancelled,
                "gateway",
                "zone deleted",
                now,
            );
            self.push_event(Event::ReceivingOrderCancelled { order_id });
        }

        for location in self.locations.values_mut() {
            location
                .replenishment_sources
                .retain(|s| s != location_id);
        }
        self.presence.remove_zone(location_id);
        self.snapshots.remove_location(location_id);
        self.antennas.retain(|_, a| a.location_id != location_id);
        self.locations.remove(location_id);

        for template in self.templates.values_mut() {
            if template.active && template.zone_id.as_deref() == Some(location_id) {
                template.active = false;
                template.updated_at = now;
            }
        }
        info!("Zone {} deleted", location_id);
        self.project_templates();
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn add_zone_source(
        &mut self,
        location_id: &str,
        source_id: &str,
    ) -> Result<Location, EngineError> {
        self.location(location_id)?;
        if source_id == location_id {
            return Err(EngineError::SourceEqualsDestination(source_id.to_string()));
        }
        if !self.is_known_source(source_id) {
            return Err(EngineError::SourceNotFound(source_id.to_string()));
        }
        let location = self.locations.get_mut(location_id).expect("checked above");
        if !location
            .replenishment_sources
            .iter()
            .any(|s| s == source_id)
        {
            location.replenishment_sources.push(source_id.to_string());
        }
        let updated = location.clone();
        self.recompute_location(location_id);
        Ok(updated)
    }

    /// Remove a replenishment source; open tasks pulling from it are
    /// cancelled.
    #[instrument(skip(self))]
    pub fn remove_zone_source(
        &mut self,
        location_id: &str,
        source_id: &str,
    ) -> Result<Location, EngineError> {
        self.location(location_id)?;
        self.cancel_tasks_pulling_from(location_id, source_id);
        let location = self.locations.get_mut(location_id).expect("checked above");
        location.replenishment_sources.retain(|s| s != source_id);
        let updated = location.clone();
        self.recompute_location(location_id);
        Ok(updated)
    }

    fn cancel_tasks_pulling_from(&mut self, destination_id: &str, source_id: &str) {
        let doomed: Vec<Uuid> = self
            .tasks
            .values()
            .filter(|t| {
                t.status.is_open()
                    && t.location_id == destination_id
                    && t.source_zone_id.as_deref() == Some(source_id)
            })
            .map(|t| t.id)
            .collect();
        for task_id in doomed {
            self.reject_task(task_id, CloseReason::SourceRemoved, "gateway");
        }
    }

    #[instrument(skip(self))]
    pub fn create_external_location(
        &mut self,
        id: &str,
        name: &str,
    ) -> Result<ExternalLocation, EngineError> {
        if !id.starts_with(EXTERNAL_SOURCE_PREFIX) {
            return Err(EngineError::InvalidExternalId(id.to_string()));
        }
        if self.externals.contains_key(id) {
            return Err(EngineError::ZoneExists(id.to_string()));
        }
        let external = ExternalLocation {
            id: id.to_string(),
            name: name.to_string(),
        };
        self.externals.insert(id.to_string(), external.clone());
        info!("External location {} registered", id);
        Ok(external)
    }

    // ---- staff administration ------------------------------------------

    #[instrument(skip(self, member))]
    pub fn create_staff(&mut self, member: StaffMember) -> Result<StaffMember, EngineError> {
        if self.staff.contains_key(&member.id) {
            return Err(EngineError::StaffExists(member.id));
        }
        let created = member.clone();
        self.staff.insert(member.id.clone(), member);
        self.auto_assign_pending();
        Ok(created)
    }

    #[instrument(skip(self))]
    pub fn update_staff(
        &mut self,
        staff_id: &str,
        role: Option<StaffRole>,
        on_shift: Option<bool>,
        scope: Option<ZoneScope>,
    ) -> Result<StaffMember, EngineError> {
        let member = self
            .staff
            .get_mut(staff_id)
            .ok_or_else(|| EngineError::StaffNotFound(staff_id.to_string()))?;
        if let Some(role) = role {
            member.role = role;
        }
        if let Some(on_shift) = on_shift {
            member.on_shift = on_shift;
        }
        if let Some(scope) = scope {
            member.scope = scope;
        }
        let updated = member.clone();
        self.auto_assign_pending();
        Ok(updated)
    }

    /// Open tasks a just-rostered member could pick up immediately.
    pub fn tasks_in_scope_of(&self, staff_id: &str) -> Result<Vec<Uuid>, EngineError> {
        let member = self
            .staff
            .get(staff_id)
            .ok_or_else(|| EngineError::StaffNotFound(staff_id.to_string()))?;
        let mut open: Vec<(u64, Uuid)> = self
            .tasks
            .values()
            .filter(|t| {
                matches!(t.status, TaskStatus::Created | TaskStatus::Assigned)
                    && member.scope.covers(&t.location_id)
            })
            .map(|t| (t.seq, t.id))
            .collect();
        open.sort();
        Ok(open.into_iter().map(|(_, id)| id).collect())
    }
}
