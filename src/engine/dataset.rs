//! Explicit seed datasets. The engine is always constructed from one of
//! these rather than from module-level state; tests build their own.

use crate::models::{
    CatalogVariant, EpcMapping, ExternalLocation, LedgerBaseline, Point, RuleTemplate, Sku,
    StaffMember, StaffRole, StockSource, TemplateScope, TemplateSelector, ZoneScope,
};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize)]
pub struct LocationSeed {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub polygon: Vec<Point>,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default)]
    pub is_sales_location: bool,
    #[serde(default)]
    pub replenishment_sources: Vec<String>,
    #[serde(default)]
    pub antennas: Vec<String>,
}

fn default_color() -> String {
    "#4477aa".to_string()
}

#[derive(Debug, Clone, Default)]
pub struct StoreDataset {
    pub locations: Vec<LocationSeed>,
    pub externals: Vec<ExternalLocation>,
    pub skus: Vec<Sku>,
    pub variants: Vec<CatalogVariant>,
    pub epc_mappings: Vec<EpcMapping>,
    pub baselines: Vec<LedgerBaseline>,
    pub staff: Vec<StaffMember>,
    pub templates: Vec<RuleTemplate>,
}

fn rect(x: f64, y: f64, w: f64, h: f64) -> Vec<Point> {
    vec![
        Point { x, y },
        Point { x: x + w, y },
        Point { x: x + w, y: y + h },
        Point { x, y: y + h },
    ]
}

/// Demo store: two sales shelves fed by a warehouse, a printing wall, an
/// external supplier, jersey SKUs on RFID and accessories on the ledger.
pub fn demo_dataset() -> StoreDataset {
    let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
    let mut dataset = StoreDataset {
        locations: vec![
            LocationSeed {
                id: "shelf-a".to_string(),
                name: "Shelf A".to_string(),
                polygon: rect(0.0, 0.0, 4.0, 3.0),
                color: "#cc3311".to_string(),
                is_sales_location: true,
                replenishment_sources: vec!["warehouse".to_string(), "external-supplier".to_string()],
                antennas: vec!["ant-shelf-a-1".to_string(), "ant-shelf-a-2".to_string()],
            },
            LocationSeed {
                id: "shelf-b".to_string(),
                name: "Shelf B".to_string(),
                polygon: rect(5.0, 0.0, 4.0, 3.0),
                color: "#ee7733".to_string(),
                is_sales_location: true,
                replenishment_sources: vec!["warehouse".to_string()],
                antennas: vec!["ant-shelf-b-1".to_string()],
            },
            LocationSeed {
                id: "warehouse".to_string(),
                name: "Back-of-house".to_string(),
                polygon: rect(0.0, 5.0, 9.0, 4.0),
                color: "#009988".to_string(),
                is_sales_location: false,
                replenishment_sources: vec!["external-supplier".to_string()],
                antennas: vec!["ant-warehouse".to_string()],
            },
            LocationSeed {
                id: "zone-printing-wall".to_string(),
                name: "Printing wall".to_string(),
                polygon: rect(10.0, 5.0, 2.0, 2.0),
                color: "#33bbee".to_string(),
                is_sales_location: false,
                replenishment_sources: vec!["external-supplier".to_string()],
                antennas: vec![],
            },
        ],
        externals: vec![ExternalLocation {
            id: "external-supplier".to_string(),
            name: "Central distribution".to_string(),
        }],
        skus: vec![
            Sku {
                id: "sku-jsy-home".to_string(),
                name: "Home JSY 24/25".to_string(),
                source: StockSource::Rfid,
            },
            Sku {
                id: "sku-jsy-gk".to_string(),
                name: "Goalkeeper JSY 24/25".to_string(),
                source: StockSource::Rfid,
            },
            Sku {
                id: "sku-scarf".to_string(),
                name: "Supporter Scarf".to_string(),
                source: StockSource::NonRfid,
            },
            Sku {
                id: "sku-mug".to_string(),
                name: "Crest Mug".to_string(),
                source: StockSource::NonRfid,
            },
        ],
        variants: vec![
            CatalogVariant {
                sku_id: "sku-jsy-home".to_string(),
                title: "Home JSY 24/25".to_string(),
                kit: Some("home".to_string()),
                age_group: Some("adult".to_string()),
                gender: Some("men".to_string()),
                role: Some("player".to_string()),
                quality: Some("replica".to_string()),
            },
            CatalogVariant {
                sku_id: "sku-jsy-gk".to_string(),
                title: "Goalkeeper JSY 24/25".to_string(),
                kit: Some("home".to_string()),
                age_group: Some("adult".to_string()),
                gender: Some("men".to_string()),
                role: Some("goalkeeper".to_string()),
                quality: Some("replica".to_string()),
            },
            CatalogVariant {
                sku_id: "sku-scarf".to_string(),
                title: "Supporter Scarf".to_string(),
                kit: None,
                age_group: Some("adult".to_string()),
                gender: None,
                role: Some("fan".to_string()),
                quality: None,
            },
            CatalogVariant {
                sku_id: "sku-mug".to_string(),
                title: "Crest Mug".to_string(),
                kit: None,
                age_group: None,
                gender: None,
                role: Some("fan".to_string()),
                quality: None,
            },
        ],
        epc_mappings: Vec::new(),
        baselines: vec![
            LedgerBaseline {
                location_id: "shelf-a".to_string(),
                sku_id: "sku-scarf".to_string(),
                qty: 12,
                taken_at: t0,
            },
            LedgerBaseline {
                location_id: "warehouse".to_string(),
                sku_id: "sku-scarf".to_string(),
                qty: 180,
                taken_at: t0,
            },
            LedgerBaseline {
                location_id: "warehouse".to_string(),
                sku_id: "sku-mug".to_string(),
                qty: 60,
                taken_at: t0,
            },
        ],
        staff: vec![
            StaffMember {
                id: "staff-ada".to_string(),
                name: "Ada".to_string(),
                role: StaffRole::Associate,
                on_shift: true,
                scope: ZoneScope::All,
            },
            StaffMember {
                id: "staff-bo".to_string(),
                name: "Bo".to_string(),
                role: StaffRole::Associate,
                on_shift: true,
                scope: ZoneScope::Zones(
                    ["shelf-a".to_string(), "warehouse".to_string()]
                        .into_iter()
                        .collect(),
                ),
            },
            StaffMember {
                id: "staff-cleo".to_string(),
                name: "Cleo".to_string(),
                role: StaffRole::Supervisor,
                on_shift: true,
                scope: ZoneScope::All,
            },
        ],
        templates: vec![
            RuleTemplate {
                id: Uuid::new_v4(),
                name: "jerseys-on-shelf-a".to_string(),
                scope: TemplateScope::Location,
                zone_id: Some("shelf-a".to_string()),
                selector: TemplateSelector::Attributes {
                    filter: crate::models::AttributeFilter {
                        role: Some("player".to_string()),
                        ..Default::default()
                    },
                },
                min: 2,
                max: 8,
                priority: 10,
                inbound_source_id: None,
                active: true,
                proxied: false,
                updated_at: t0,
            },
            RuleTemplate {
                id: Uuid::new_v4(),
                name: "scarves-everywhere".to_string(),
                scope: TemplateScope::Generic,
                zone_id: None,
                selector: TemplateSelector::Sku {
                    sku_id: "sku-scarf".to_string(),
                },
                min: 3,
                max: 15,
                priority: 0,
                inbound_source_id: None,
                active: true,
                proxied: false,
                updated_at: t0,
            },
        ],
    };

    // A dozen tagged home jerseys on shelf A, a handful in the back.
    for i in 0..12 {
        dataset.epc_mappings.push(EpcMapping {
            epc: format!("epc-home-{:04}", i),
            sku_id: "sku-jsy-home".to_string(),
            active_from: t0,
            active_to: None,
        });
    }
    for i in 0..4 {
        dataset.epc_mappings.push(EpcMapping {
            epc: format!("epc-gk-{:04}", i),
            sku_id: "sku-jsy-gk".to_string(),
            active_from: t0,
            active_to: None,
        });
    }
    dataset
}
