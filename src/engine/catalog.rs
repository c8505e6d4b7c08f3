use crate::models::{AttributeFilter, CatalogVariant};
use std::collections::BTreeMap;

/// Catalog roles whose sold units route through cashier staging.
const PERSONALISABLE_ROLES: [&str; 2] = ["player", "goalkeeper"];
/// Jersey products are personalisable regardless of role.
const JERSEY_TITLE_MARKER: &str = "JSY";

/// In-memory catalog of variant attributes, keyed by SKU.
#[derive(Debug, Default)]
pub struct Catalog {
    variants: BTreeMap<String, CatalogVariant>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&mut self, variant: CatalogVariant) {
        self.variants.insert(variant.sku_id.clone(), variant);
    }

    /// SKUs whose variant satisfies every specified attribute equality.
    pub fn matching(&self, filter: &AttributeFilter) -> Vec<String> {
        self.variants
            .values()
            .filter(|v| filter.matches(v))
            .map(|v| v.sku_id.clone())
            .collect()
    }

    /// A SKU is personalisable when its variant role is player/goalkeeper or
    /// its title carries the jersey marker.
    pub fn is_personalisable(&self, sku_id: &str) -> bool {
        self.variants
            .get(sku_id)
            .map(|v| {
                v.role
                    .as_deref()
                    .map(|r| PERSONALISABLE_ROLES.contains(&r))
                    .unwrap_or(false)
                    || v.title.contains(JERSEY_TITLE_MARKER)
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(sku: &str, title: &str, role: Option<&str>) -> CatalogVariant {
        CatalogVariant {
            sku_id: sku.to_string(),
            title: title.to_string(),
            role: role.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn player_and_goalkeeper_roles_are_personalisable() {
        let mut catalog = Catalog::new();
        catalog.upsert(variant("sku-1", "Home Shirt", Some("player")));
        catalog.upsert(variant("sku-2", "Away Shirt", Some("goalkeeper")));
        catalog.upsert(variant("sku-3", "Scarf", Some("fan")));
        assert!(catalog.is_personalisable("sku-1"));
        assert!(catalog.is_personalisable("sku-2"));
        assert!(!catalog.is_personalisable("sku-3"));
    }

    #[test]
    fn jersey_marker_in_title_is_personalisable() {
        let mut catalog = Catalog::new();
        catalog.upsert(variant("sku-4", "Home JSY 24/25", None));
        assert!(catalog.is_personalisable("sku-4"));
        assert!(!catalog.is_personalisable("unknown"));
    }

    #[test]
    fn matching_applies_all_specified_attributes() {
        let mut catalog = Catalog::new();
        catalog.upsert(CatalogVariant {
            sku_id: "sku-1".to_string(),
            title: "Home JSY".to_string(),
            kit: Some("home".to_string()),
            gender: Some("men".to_string()),
            ..Default::default()
        });
        catalog.upsert(CatalogVariant {
            sku_id: "sku-2".to_string(),
            title: "Away JSY".to_string(),
            kit: Some("away".to_string()),
            gender: Some("men".to_string()),
            ..Default::default()
        });
        let filter = AttributeFilter {
            kit: Some("home".to_string()),
            gender: Some("men".to_string()),
            ..Default::default()
        };
        assert_eq!(catalog.matching(&filter), vec!["sku-1".to_string()]);
    }
}
