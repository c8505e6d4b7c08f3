//! The inventory engine: single owner of all live state.
//!
//! Every external command runs end-to-end, including cascading recomputes,
//! before the next one is admitted; the gateway serialises access through
//! one lock. Commands observe their event timestamp on the clock, mutate,
//! recompute affected locations, and leave domain events in the outbox.

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::events::Event;
use crate::models::{
    Antenna, AuditAction, BasketItem, EpcMapping, ExternalLocation, Location, PendingPick,
    ReadRecord, ReceivingOrder, ReplenishmentTask, RuleTemplate, Sku, StaffMember, StockSource,
    TaskStatus, PRINTING_WALL_ZONE,
};

mod audit;
mod cart;
mod catalog;
mod clock;
mod dataset;
mod ingest;
mod ledger;
mod planner;
mod presence;
mod read_models;
mod receiving;
mod rules;
mod snapshot;
mod staffing;
mod templates;
mod transfer;
mod zones;

pub use cart::CheckoutSummary;
pub use dataset::{demo_dataset, LocationSeed, StoreDataset};
pub use ingest::{ReadOutcome, SalesEventType, SalesOutcome};
pub use read_models::{
    DashboardRow, InventoryRow, TimelineEntry, ZoneDetail,
};
pub use receiving::ConfirmOrderOutcome;
pub use templates::RuleTemplateInput;
pub use transfer::ConfirmTaskOutcome;
pub use zones::ZoneUpdate;

use audit::AuditLog;
use catalog::Catalog;
use chrono::{DateTime, Utc};
use clock::EventClock;
use ledger::MovementLedger;
use presence::PresenceStore;
use rules::RuleRegistry;
use snapshot::SnapshotStore;
use std::collections::{BTreeMap, HashMap, VecDeque};
use tracing::info;
use uuid::Uuid;

const READ_LOG_CAPACITY: usize = 1000;

pub struct InventoryEngine {
    cfg: EngineConfig,
    clock: EventClock,
    locations: BTreeMap<String, Location>,
    antennas: BTreeMap<String, Antenna>,
    externals: BTreeMap<String, ExternalLocation>,
    skus: BTreeMap<String, Sku>,
    catalog: Catalog,
    /// EPC -> time-windowed SKU mappings.
    mappings: BTreeMap<String, Vec<EpcMapping>>,
    presence: PresenceStore,
    ledger: MovementLedger,
    snapshots: SnapshotStore,
    rules: RuleRegistry,
    templates: BTreeMap<Uuid, RuleTemplate>,
    tasks: HashMap<Uuid, ReplenishmentTask>,
    orders: HashMap<Uuid, ReceivingOrder>,
    baskets: HashMap<Uuid, BasketItem>,
    picks: HashMap<Uuid, PendingPick>,
    staff: BTreeMap<String, StaffMember>,
    audit: AuditLog,
    read_log: VecDeque<ReadRecord>,
    outbox: Vec<Event>,
    seq: u64,
    synth_epc_counter: u64,
}

impl InventoryEngine {
    pub fn new(dataset: StoreDataset, cfg: EngineConfig) -> Self {
        let mut engine = Self {
            cfg,
            clock: EventClock::starting_at_epoch(),
            locations: BTreeMap::new(),
            antennas: BTreeMap::new(),
            externals: BTreeMap::new(),
            skus: BTreeMap::new(),
            catalog: Catalog::new(),
            mappings: BTreeMap::new(),
            presence: PresenceStore::new(),
            ledger: MovementLedger::new(),
            snapshots: SnapshotStore::new(),
            rules: RuleRegistry::new(),
            templates: BTreeMap::new(),
            tasks: HashMap::new(),
            orders: HashMap::new(),
            baskets: HashMap::new(),
            picks: HashMap::new(),
            staff: BTreeMap::new(),
            audit: AuditLog::new(),
            read_log: VecDeque::new(),
            outbox: Vec::new(),
            seq: 0,
            synth_epc_counter: 0,
        };
        engine.load(dataset);
        engine
    }

    fn load(&mut self, dataset: StoreDataset) {
        for seed in dataset.locations {
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
            self.locations.insert(location.id.clone(), location);
        }
        // The printing wall participates as an ordinary non-sales zone even
        // when the dataset does not declare it.
        self.locations
            .entry(PRINTING_WALL_ZONE.to_string())
            .or_insert_with(|| Location {
                id: PRINTING_WALL_ZONE.to_string(),
                name: "Printing wall".to_string(),
                polygon: Vec::new(),
                color: "#888888".to_string(),
                is_sales_location: false,
                replenishment_sources: Vec::new(),
                antenna_ids: Vec::new(),
            });
        for external in dataset.externals {
            self.externals.insert(external.id.clone(), external);
        }
        for sku in dataset.skus {
            self.skus.insert(sku.id.clone(), sku);
        }
        for variant in dataset.variants {
            self.catalog.upsert(variant);
        }
        for mapping in dataset.epc_mappings {
            self.clock.observe(mapping.active_from);
            self.mappings
                .entry(mapping.epc.clone())
                .or_default()
                .push(mapping);
        }
        for baseline in dataset.baselines {
            self.clock.observe(baseline.taken_at);
            self.ledger.set_baseline(baseline);
        }
        for member in dataset.staff {
            self.staff.insert(member.id.clone(), member);
        }
        for template in dataset.templates {
            self.templates.insert(template.id, template);
        }
        self.project_templates();
        let locations: Vec<String> = self.locations.keys().cloned().collect();
        for location_id in locations {
            self.recompute_location(&location_id);
        }
        info!(
            "Engine loaded: {} zones, {} SKUs, {} staff",
            self.locations.len(),
            self.skus.len(),
            self.staff.len()
        );
    }

    // ---- shared plumbing ------------------------------------------------

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    pub(crate) fn push_event(&mut self, event: Event) {
        self.outbox.push(event);
    }

    /// Hand the accumulated domain events to the gateway.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.outbox)
    }

    pub(crate) fn location(&self, id: &str) -> Result<&Location, EngineError> {
        self.locations
            .get(id)
            .ok_or_else(|| EngineError::ZoneNotFound(id.to_string()))
    }

    pub(crate) fn sku(&self, id: &str) -> Result<&Sku, EngineError> {
        self.skus
            .get(id)
            .ok_or_else(|| EngineError::SkuNotFound(id.to_string()))
    }

    pub(crate) fn is_known_source(&self, id: &str) -> bool {
        self.locations.contains_key(id) || self.externals.contains_key(id)
    }

    pub(crate) fn active_mapping(&self, epc: &str, at: DateTime<Utc>) -> Option<&EpcMapping> {
        self.mappings
            .get(epc)
            .and_then(|ms| ms.iter().rev().find(|m| m.active_at(at)))
    }

    /// Deterministic id for stock the engine fabricates (external receipts,
    /// legacy cart repairs).
    pub(crate) fn synthesise_epc(&mut self, sku_id: &str, from: DateTime<Utc>) -> String {
        self.synth_epc_counter += 1;
        let epc = format!("epc-syn-{:06}", self.synth_epc_counter);
        self.mappings.entry(epc.clone()).or_default().push(EpcMapping {
            epc: epc.clone(),
            sku_id: sku_id.to_string(),
            active_from: from,
            active_to: None,
        });
        epc
    }

    pub(crate) fn primary_antenna_of(&self, location_id: &str) -> String {
        self.locations
            .get(location_id)
            .and_then(|l| l.primary_antenna().map(String::from))
            .unwrap_or_else(|| format!("ant-{}-virtual", location_id))
    }

    pub(crate) fn record_read(&mut self, record: ReadRecord) {
        if self.read_log.len() == READ_LOG_CAPACITY {
            self.read_log.pop_front();
        }
        self.read_log.push_back(record);
    }

    // ---- task helpers shared by planner / transfer / templates ----------

    /// Open tasks for a rule, oldest first.
    pub(crate) fn open_tasks_for_rule(&self, rule_id: &str) -> Vec<Uuid> {
        let mut open: Vec<(u64, Uuid)> = self
            .tasks
            .values()
            .filter(|t| t.rule_id == rule_id && t.status.is_open())
            .map(|t| (t.seq, t.id))
            .collect();
        open.sort();
        open.into_iter().map(|(_, id)| id).collect()
    }

    /// Deficits other open tasks have already reserved from a source zone
    /// for the same SKU.
    pub(crate) fn reserved_from_source(
        &self,
        source_zone_id: &str,
        sku_id: &str,
        exclude: Option<Uuid>,
    ) -> i64 {
        self.tasks
            .values()
            .filter(|t| {
                t.status.is_open()
                    && t.sku_id == sku_id
                    && t.source_zone_id.as_deref() == Some(source_zone_id)
                    && Some(t.id) != exclude
            })
            .map(|t| t.deficit_qty)
            .sum()
    }

    /// Close an open task as rejected by the planner or a cascade.
    pub(crate) fn reject_task(
        &mut self,
        task_id: Uuid,
        reason: crate::models::CloseReason,
        actor: &str,
    ) {
        let now = self.now();
        let Some(task) = self.tasks.get_mut(&task_id) else {
            return;
        };
        if !task.status.is_open() {
            return;
        }
        task.status = TaskStatus::Rejected;
        task.close_reason = Some(reason);
        task.updated_at = now;
        let action = match reason {
            crate::models::CloseReason::MergedPlan
            | crate::models::CloseReason::StockRecovered
            | crate::models::CloseReason::PlanAdjusted => AuditAction::Closed,
            _ => AuditAction::Cancelled,
        };
        self.audit
            .record(task_id.to_string(), action, actor, reason.as_str(), now);
        self.push_event(Event::TaskClosed {
            task_id,
            close_reason: reason.as_str().to_string(),
        });
    }

    // ---- recompute ------------------------------------------------------

    /// Recompute one location end-to-end: snapshots, rule evaluation, then
    /// staff auto-assignment.
    pub(crate) fn recompute_location(&mut self, location_id: &str) {
        if !self.locations.contains_key(location_id) {
            // Cashier staging and external origins keep no derived state.
            return;
        }
        self.recompute_snapshots(location_id);
        self.evaluate_location(location_id);
        self.auto_assign_pending();
    }

    fn recompute_snapshots(&mut self, location_id: &str) {
        let now = self.now();
        let ttl = self.cfg.presence_ttl;

        // RFID pass: presence count per candidate SKU.
        let mut rfid_candidates: Vec<String> = self
            .presence
            .skus_present_in(location_id, now, ttl)
            .into_iter()
            .chain(self.rules.active_skus_in(location_id, StockSource::Rfid))
            .chain(self.snapshots.skus_snapshotted_in(location_id, StockSource::Rfid))
            .collect();
        rfid_candidates.sort();
        rfid_candidates.dedup();
        for sku_id in rfid_candidates {
            if self.skus.get(&sku_id).map(|s| s.source) != Some(StockSource::Rfid) {
                continue;
            }
            let computed = self.presence.count_of_sku(location_id, &sku_id, now, ttl);
            match self.snapshots.floor(location_id, &sku_id) {
                Some(floor) if floor.fresh => {
                    self.snapshots.upsert(
                        location_id,
                        &sku_id,
                        StockSource::Rfid,
                        floor.qty,
                        Some(snapshot::CONFIDENCE_IMMEDIATE_DEDUCTION),
                        now,
                    );
                    self.snapshots.age_floor(location_id, &sku_id);
                }
                Some(floor) if computed > floor.qty => {
                    // The deducted tags are still being read; hold the floor
                    // until reads confirm the sale.
                    self.snapshots.upsert(
                        location_id,
                        &sku_id,
                        StockSource::Rfid,
                        floor.qty,
                        Some(snapshot::CONFIDENCE_IMMEDIATE_DEDUCTION),
                        now,
                    );
                }
                Some(_) => {
                    self.snapshots.clear_floor(location_id, &sku_id);
                    self.snapshots.upsert(
                        location_id,
                        &sku_id,
                        StockSource::Rfid,
                        computed,
                        Some(rfid_confidence(computed)),
                        now,
                    );
                }
                None => {
                    self.snapshots.upsert(
                        location_id,
                        &sku_id,
                        StockSource::Rfid,
                        computed,
                        Some(rfid_confidence(computed)),
                        now,
                    );
                }
            }
        }

        // NON_RFID pass: ledger-derived quantities.
        let mut nr_candidates: Vec<String> = self
            .rules
            .active_skus_in(location_id, StockSource::NonRfid)
            .into_iter()
            .chain(self.ledger.skus_tracked_in(location_id))
            .chain(self.snapshots.skus_snapshotted_in(location_id, StockSource::NonRfid))
            .collect();
        nr_candidates.sort();
        nr_candidates.dedup();
        for sku_id in nr_candidates {
            if self.skus.get(&sku_id).map(|s| s.source) != Some(StockSource::NonRfid) {
                continue;
            }
            let qty = self.ledger.quantity(location_id, &sku_id);
            self.snapshots
                .upsert(location_id, &sku_id, StockSource::NonRfid, qty, None, now);
        }
    }
}

pub(crate) fn rfid_confidence(qty: i64) -> f64 {
    if qty > 0 {
        snapshot::CONFIDENCE_PRESENT
    } else {
        snapshot::CONFIDENCE_EMPTY
    }
}
