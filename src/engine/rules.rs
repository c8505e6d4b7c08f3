use crate::models::{EffectiveRule, StockSource};
use std::collections::BTreeMap;

/// Live effective rules keyed by canonical id.
///
/// The registry is entirely derived state: templates own the policy and the
/// projection in `templates.rs` is the only writer.
#[derive(Debug, Default)]
pub struct RuleRegistry {
    rules: BTreeMap<String, EffectiveRule>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&EffectiveRule> {
        self.rules.get(id)
    }

    pub fn upsert(&mut self, rule: EffectiveRule) {
        self.rules.insert(rule.id.clone(), rule);
    }

    pub fn remove(&mut self, id: &str) -> Option<EffectiveRule> {
        self.rules.remove(id)
    }

    /// Active rules for one location, in canonical-id order.
    pub fn for_location(&self, location_id: &str) -> Vec<EffectiveRule> {
        self.rules
            .values()
            .filter(|r| r.active && r.location_id == location_id)
            .cloned()
            .collect()
    }

    pub fn active_skus_in(&self, location_id: &str, source: StockSource) -> Vec<String> {
        self.rules
            .values()
            .filter(|r| r.active && r.location_id == location_id && r.source == source)
            .map(|r| r.sku_id.clone())
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.rules.keys().cloned().collect()
    }

    pub fn rules(&self) -> impl Iterator<Item = &EffectiveRule> {
        self.rules.values()
    }
}
