//! Rule templates and their projection into the effective rule registry.
//!
//! Templates own min/max policy. Projection recomputes the full winner set,
//! diffs it against the registry, hard-deletes orphaned rules (cancelling the
//! open tasks they owned) and recomputes every affected location.

use super::InventoryEngine;
use crate::errors::EngineError;
use crate::events::Event;
use crate::models::{
    rule_id, CloseReason, EffectiveRule, RuleTemplate, StockSource, TemplateScope,
    TemplateSelector,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct RuleTemplateInput {
    pub id: Option<Uuid>,
    pub name: Option<String>,
    pub scope: TemplateScope,
    pub zone_id: Option<String>,
    pub selector: TemplateSelector,
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub priority: i32,
    pub inbound_source_id: Option<String>,
}

/// Winner candidate during projection, ordered lexicographically by
/// (scope rank, priority, updated_at, template id).
struct Candidate {
    rank: (u8, i32, DateTime<Utc>, Uuid),
    location_id: String,
    sku_id: String,
    source: StockSource,
    min: i64,
    max: i64,
    priority: i32,
    inbound_source_id: Option<String>,
    template_id: Uuid,
}

impl InventoryEngine {
    #[instrument(skip(self, input))]
    pub fn upsert_rule_template(
        &mut self,
        input: RuleTemplateInput,
    ) -> Result<RuleTemplate, EngineError> {
        if input.min < 0 || input.max < input.min {
            return Err(EngineError::InvalidMinMax {
                min: input.min,
                max: input.max,
            });
        }
        if input.scope == TemplateScope::Location {
            let zone_id = input.zone_id.as_deref().ok_or(EngineError::ZoneRequired)?;
            self.location(zone_id)?;
        }
        if let TemplateSelector::Sku { sku_id } = &input.selector {
            if sku_id.is_empty() {
                return Err(EngineError::SkuRequired);
            }
            self.sku(sku_id)?;
        }

        let id = input.id.unwrap_or_else(Uuid::new_v4);
        let now = self.now();
        let template = RuleTemplate {
            id,
            name: input
                .name
                .unwrap_or_else(|| format!("template-{}", id.simple())),
            scope: input.scope,
            zone_id: input.zone_id,
            selector: input.selector,
            min: input.min,
            max: input.max,
            priority: input.priority,
            inbound_source_id: input.inbound_source_id,
            active: true,
            proxied: false,
            updated_at: now,
        };
        self.templates.insert(id, template.clone());
        info!("Rule template {} upserted", id);
        self.project_templates();
        Ok(template)
    }

    #[instrument(skip(self))]
    pub fn delete_rule_template(&mut self, id: Uuid) -> Result<(), EngineError> {
        let now = self.now();
        let template = self
            .templates
            .get_mut(&id)
            .ok_or(EngineError::TemplateNotFound(id))?;
        if !template.active {
            return Err(EngineError::AlreadyInactive(id));
        }
        template.active = false;
        template.updated_at = now;
        info!("Rule template {} deactivated", id);
        self.project_templates();
        Ok(())
    }

    /// Legacy direct rule upsert: proxied through a single LOCATION/SKU
    /// template so effective rules always derive from projection.
    #[instrument(skip(self))]
    pub fn upsert_rule_direct(
        &mut self,
        location_id: &str,
        sku_id: &str,
        min: i64,
        max: i64,
        priority: i32,
        inbound_source_id: Option<String>,
    ) -> Result<EffectiveRule, EngineError> {
        if min < 0 || max < min {
            return Err(EngineError::InvalidMinMax { min, max });
        }
        self.location(location_id)?;
        let sku = self.sku(sku_id)?.clone();
        let now = self.now();

        let existing = self
            .templates
            .values()
            .find(|t| {
                t.proxied
                    && t.zone_id.as_deref() == Some(location_id)
                    && matches!(&t.selector, TemplateSelector::Sku { sku_id: s } if s == sku_id)
            })
            .map(|t| t.id);
        let id = existing.unwrap_or_else(Uuid::new_v4);
        self.templates.insert(
            id,
            RuleTemplate {
                id,
                name: format!("direct-{}-{}", location_id, sku_id),
                scope: TemplateScope::Location,
                zone_id: Some(location_id.to_string()),
                selector: TemplateSelector::Sku {
                    sku_id: sku_id.to_string(),
                },
                min,
                max,
                priority,
                inbound_source_id,
                active: true,
                proxied: true,
                updated_at: now,
            },
        );
        self.project_templates();

        let rid = rule_id(location_id, sku_id, sku.source);
        self.rules
            .get(&rid)
            .cloned()
            .ok_or(EngineError::RuleNotFound(rid))
    }

    /// Deleting an effective rule soft-deletes its owning template and
    /// reprojects; the cascade closes any open tasks the rule owned.
    #[instrument(skip(self))]
    pub fn delete_rule(&mut self, rule_id: &str) -> Result<(), EngineError> {
        let rule = self
            .rules
            .get(rule_id)
            .cloned()
            .ok_or_else(|| EngineError::RuleNotFound(rule_id.to_string()))?;
        let now = self.now();
        if let Some(template) = self.templates.get_mut(&rule.template_id) {
            template.active = false;
            template.updated_at = now;
        }
        self.project_templates();
        Ok(())
    }

    /// Recompute the effective rule set from the active templates and diff it
    /// against the registry.
    pub(crate) fn project_templates(&mut self) {
        let now = self.now();
        let mut winners: BTreeMap<String, Candidate> = BTreeMap::new();

        for template in self.templates.values().filter(|t| t.active) {
            let zone_ids: Vec<String> = match template.scope {
                TemplateScope::Generic => self.locations.keys().cloned().collect(),
                TemplateScope::Location => template
                    .zone_id
                    .iter()
                    .filter(|z| self.locations.contains_key(*z))
                    .cloned()
                    .collect(),
            };
            let sku_ids: Vec<String> = match &template.selector {
                TemplateSelector::Sku { sku_id } => self
                    .skus
                    .contains_key(sku_id)
                    .then(|| vec![sku_id.clone()])
                    .unwrap_or_default(),
                TemplateSelector::Attributes { filter } => self.catalog.matching(filter),
            };
            let rank_scope = match template.scope {
                TemplateScope::Location => 1u8,
                TemplateScope::Generic => 0u8,
            };
            for zone_id in &zone_ids {
                for sku_id in &sku_ids {
                    let Some(sku) = self.skus.get(sku_id) else {
                        continue;
                    };
                    let key = rule_id(zone_id, sku_id, sku.source);
                    let candidate = Candidate {
                        rank: (rank_scope, template.priority, template.updated_at, template.id),
                        location_id: zone_id.clone(),
                        sku_id: sku_id.clone(),
                        source: sku.source,
                        min: template.min,
                        max: template.max,
                        priority: template.priority,
                        inbound_source_id: template.inbound_source_id.clone(),
                        template_id: template.id,
                    };
                    match winners.get(&key) {
                        Some(current) if current.rank >= candidate.rank => {}
                        _ => {
                            winners.insert(key, candidate);
                        }
                    }
                }
            }
        }

        let old_ids: BTreeSet<String> = self.rules.ids().into_iter().collect();
        let new_ids: BTreeSet<String> = winners.keys().cloned().collect();
        let mut affected: BTreeSet<String> = BTreeSet::new();

        let mut removed = 0usize;
        for id in old_ids.difference(&new_ids) {
            if let Some(rule) = self.rules.remove(id) {
                affected.insert(rule.location_id.clone());
                removed += 1;
                for task_id in self.open_tasks_for_rule(id) {
                    self.reject_task(task_id, CloseReason::RuleDeleted, "projection");
                }
            }
        }

        let mut created = 0usize;
        let mut updated = 0usize;
        for (id, winner) in winners {
            let previous = self.rules.get(&id).cloned();
            let changed = previous
                .as_ref()
                .map(|p| {
                    p.min != winner.min
                        || p.max != winner.max
                        || p.priority != winner.priority
                        || p.inbound_source_id != winner.inbound_source_id
                        || p.template_id != winner.template_id
                })
                .unwrap_or(true);
            match &previous {
                None => created += 1,
                Some(_) if changed => updated += 1,
                Some(_) => {}
            }
            if changed {
                affected.insert(winner.location_id.clone());
            }
            let updated_at = match (&previous, changed) {
                (Some(p), false) => p.updated_at,
                _ => now,
            };
            self.rules.upsert(EffectiveRule {
                id,
                location_id: winner.location_id,
                sku_id: winner.sku_id,
                source: winner.source,
                min: winner.min,
                max: winner.max,
                priority: winner.priority,
                inbound_source_id: winner.inbound_source_id,
                active: true,
                template_id: winner.template_id,
                updated_at,
            });
        }

        if created + updated + removed > 0 {
            info!(
                "Rule projection: {} created, {} updated, {} removed",
                created, updated, removed
            );
        }
        self.push_event(Event::RulesProjected {
            created,
            updated,
            removed,
        });
        for location_id in affected {
            self.recompute_location(&location_id);
        }
    }
}
