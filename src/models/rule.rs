use super::{CatalogVariant, StockSource};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Live min/max record the planner consults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveRule {
    /// Canonical form `rule-<locationId>-<skuId>-<source>`, lowercased.
    pub id: String,
    pub location_id: String,
    pub sku_id: String,
    pub source: StockSource,
    pub min: i64,
    pub max: i64,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound_source_id: Option<String>,
    pub active: bool,
    /// Template that projected this rule.
    pub template_id: Uuid,
    pub updated_at: DateTime<Utc>,
}

pub fn rule_id(location_id: &str, sku_id: &str, source: StockSource) -> String {
    format!("rule-{}-{}-{}", location_id, sku_id, source.as_str()).to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateScope {
    Generic,
    Location,
}

/// Equality filter over catalog variant attributes; `None` fields match any.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,
}

impl AttributeFilter {
    pub fn is_empty(&self) -> bool {
        self.kit.is_none()
            && self.age_group.is_none()
            && self.gender.is_none()
            && self.role.is_none()
            && self.quality.is_none()
    }

    pub fn matches(&self, variant: &CatalogVariant) -> bool {
        fn eq(filter: &Option<String>, value: &Option<String>) -> bool {
            match filter {
                None => true,
                Some(want) => value.as_deref() == Some(want.as_str()),
            }
        }
        eq(&self.kit, &variant.kit)
            && eq(&self.age_group, &variant.age_group)
            && eq(&self.gender, &variant.gender)
            && eq(&self.role, &variant.role)
            && eq(&self.quality, &variant.quality)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateSelector {
    Sku { sku_id: String },
    Attributes { filter: AttributeFilter },
}

/// A min/max rule template. Projection expands the cross-product of matching
/// SKUs and matching locations into effective rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleTemplate {
    pub id: Uuid,
    pub name: String,
    pub scope: TemplateScope,
    /// Required when `scope` is LOCATION.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<String>,
    pub selector: TemplateSelector,
    pub min: i64,
    pub max: i64,
    pub priority: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inbound_source_id: Option<String>,
    pub active: bool,
    /// Set when the template fronts a legacy direct rule upsert.
    pub proxied: bool,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(role: Option<&str>, kit: Option<&str>) -> CatalogVariant {
        CatalogVariant {
            sku_id: "sku-1".to_string(),
            title: "Home Shirt".to_string(),
            kit: kit.map(String::from),
            role: role.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn rule_id_is_lowercased_canonical() {
        assert_eq!(
            rule_id("Shelf-A", "SKU-NR-1", StockSource::NonRfid),
            "rule-shelf-a-sku-nr-1-non_rfid"
        );
    }

    #[test]
    fn attribute_filter_matches_subset() {
        let filter = AttributeFilter {
            role: Some("player".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&variant(Some("player"), Some("home"))));
        assert!(!filter.matches(&variant(Some("goalkeeper"), None)));
        assert!(!filter.matches(&variant(None, None)));
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(AttributeFilter::default().matches(&variant(None, None)));
    }
}
