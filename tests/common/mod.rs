//! Shared builders for integration tests: a small two-shelf store with a
//! back-of-house warehouse and one external supplier.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use shelfsense::config::EngineConfig;
use shelfsense::engine::{InventoryEngine, LocationSeed, StoreDataset};
use shelfsense::models::{
    CatalogVariant, EpcMapping, ExternalLocation, LedgerBaseline, Sku, StaffMember, StaffRole,
    StockSource, ZoneScope,
};

pub fn t(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

pub fn zone(id: &str, is_sales: bool, sources: &[&str], antennas: &[&str]) -> LocationSeed {
    LocationSeed {
        id: id.to_string(),
        name: id.to_string(),
        polygon: Vec::new(),
        color: "#4477aa".to_string(),
        is_sales_location: is_sales,
        replenishment_sources: sources.iter().map(|s| s.to_string()).collect(),
        antennas: antennas.iter().map(|s| s.to_string()).collect(),
    }
}

pub fn sku(id: &str, source: StockSource) -> Sku {
    Sku {
        id: id.to_string(),
        name: id.to_string(),
        source,
    }
}

pub fn variant(sku_id: &str, title: &str, role: Option<&str>) -> CatalogVariant {
    CatalogVariant {
        sku_id: sku_id.to_string(),
        title: title.to_string(),
        role: role.map(String::from),
        ..Default::default()
    }
}

pub fn mapping(epc: &str, sku_id: &str, from: DateTime<Utc>) -> EpcMapping {
    EpcMapping {
        epc: epc.to_string(),
        sku_id: sku_id.to_string(),
        active_from: from,
        active_to: None,
    }
}

pub fn baseline(location_id: &str, sku_id: &str, qty: i64, at: DateTime<Utc>) -> LedgerBaseline {
    LedgerBaseline {
        location_id: location_id.to_string(),
        sku_id: sku_id.to_string(),
        qty,
        taken_at: at,
    }
}

pub fn associate(id: &str) -> StaffMember {
    StaffMember {
        id: id.to_string(),
        name: id.to_string(),
        role: StaffRole::Associate,
        on_shift: true,
        scope: ZoneScope::All,
    }
}

/// shelf-a (sales, fed by warehouse), shelf-b (sales, fed by warehouse),
/// warehouse (non-sales, fed by the external supplier). One RFID jersey SKU
/// and one ledger-tracked SKU, one associate on shift.
pub fn small_store() -> StoreDataset {
    StoreDataset {
        locations: vec![
            zone(
                "shelf-a",
                true,
                &["warehouse"],
                &["ant-shelf-a"],
            ),
            zone("shelf-b", true, &["warehouse"], &["ant-shelf-b"]),
            zone(
                "warehouse",
                false,
                &["external-supplier"],
                &["ant-warehouse"],
            ),
        ],
        externals: vec![ExternalLocation {
            id: "external-supplier".to_string(),
            name: "Supplier".to_string(),
        }],
        skus: vec![
            sku("sku-nr-1", StockSource::NonRfid),
            sku("sku-rfid-1", StockSource::Rfid),
        ],
        variants: vec![
            variant("sku-nr-1", "Crest Mug", Some("fan")),
            variant("sku-rfid-1", "Home JSY 24/25", Some("player")),
        ],
        epc_mappings: Vec::new(),
        baselines: vec![
            baseline("shelf-a", "sku-nr-1", 7, t(0)),
            baseline("warehouse", "sku-nr-1", 180, t(0)),
        ],
        staff: vec![associate("staff-ada")],
        templates: Vec::new(),
    }
}

pub fn engine_with(dataset: StoreDataset) -> InventoryEngine {
    InventoryEngine::new(dataset, EngineConfig::default())
}

pub fn small_engine() -> InventoryEngine {
    engine_with(small_store())
}
