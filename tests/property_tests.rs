//! Property-based tests over the engine's universal invariants: dedup
//! idempotence, cursor monotonicity, ledger conservation, projection
//! determinism and reservation safety.

mod common;

use common::*;
use proptest::prelude::*;
use shelfsense::engine::{InventoryEngine, SalesEventType};
use shelfsense::models::{StockSource, TemplateScope, TemplateSelector};

fn rfid_store(tag_count: usize) -> InventoryEngine {
    let mut dataset = small_store();
    for i in 0..tag_count {
        dataset
            .epc_mappings
            .push(mapping(&format!("epc-{:03}", i), "sku-rfid-1", t(0)));
    }
    engine_with(dataset)
}

fn shelf_qty(engine: &InventoryEngine, sku: &str, source: StockSource) -> i64 {
    engine
        .snapshots_for("shelf-a")
        .iter()
        .find(|s| s.sku_id == sku && s.source == source)
        .map(|s| s.qty)
        .unwrap_or(0)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Replaying a read inside the dedup window is a no-op: state equals a
    /// single replay.
    #[test]
    fn dedup_replay_is_idempotent(offset in 0i64..15) {
        let mut once = rfid_store(1);
        once.ingest_rfid_read("epc-000", "ant-shelf-a", "shelf-a", t(100), None).unwrap();

        let mut twice = rfid_store(1);
        twice.ingest_rfid_read("epc-000", "ant-shelf-a", "shelf-a", t(100), None).unwrap();
        twice.ingest_rfid_read("epc-000", "ant-shelf-a", "shelf-a", t(100 + offset), None).unwrap();

        prop_assert_eq!(once.cursor(), twice.cursor());
        prop_assert_eq!(
            shelf_qty(&once, "sku-rfid-1", StockSource::Rfid),
            shelf_qty(&twice, "sku-rfid-1", StockSource::Rfid)
        );
        prop_assert_eq!(
            once.presence_of("epc-000").unwrap().last_seen_at,
            twice.presence_of("epc-000").unwrap().last_seen_at
        );
    }

    /// The cursor never decreases, whatever order events arrive in.
    #[test]
    fn cursor_is_monotonic(stamps in prop::collection::vec(0i64..10_000, 1..30)) {
        let mut engine = small_engine();
        let mut last = engine.cursor();
        for (i, secs) in stamps.iter().enumerate() {
            let kind = if i % 2 == 0 { SalesEventType::Sale } else { SalesEventType::Return };
            engine.ingest_sales_event("sku-nr-1", "shelf-a", kind, 1, t(*secs)).unwrap();
            let cursor = engine.cursor();
            prop_assert!(cursor >= last, "cursor rewound: {} -> {}", last, cursor);
            prop_assert!(cursor >= t(*secs));
            last = cursor;
        }
    }

    /// NON_RFID quantity always equals max(0, baseline + signed deltas).
    #[test]
    fn ledger_conservation(moves in prop::collection::vec((prop::bool::ANY, 1i64..10), 0..25)) {
        let mut engine = small_engine();
        let mut expected: i64 = 7; // shelf-a baseline
        for (i, (is_sale, n)) in moves.iter().enumerate() {
            let kind = if *is_sale { SalesEventType::Sale } else { SalesEventType::Return };
            engine.ingest_sales_event("sku-nr-1", "shelf-a", kind, *n, t(10 + i as i64)).unwrap();
            expected += if *is_sale { -n } else { *n };
        }
        prop_assert_eq!(
            shelf_qty(&engine, "sku-nr-1", StockSource::NonRfid),
            expected.max(0)
        );
    }

    /// Reservation safety: an add succeeds iff qty fits in current−reserved,
    /// and a successful add shrinks availability by exactly qty.
    #[test]
    fn reservation_safety(adds in prop::collection::vec(1i64..5, 1..8)) {
        let mut engine = small_engine();
        let current = shelf_qty(&engine, "sku-nr-1", StockSource::NonRfid);
        let mut reserved: i64 = 0;
        for (i, qty) in adds.iter().enumerate() {
            let available = current - reserved;
            let result = engine.add_customer_item(
                &format!("cust-{}", i),
                "shelf-a",
                "sku-nr-1",
                *qty,
                t(10 + i as i64),
            );
            if *qty <= available {
                prop_assert!(result.is_ok());
                reserved += qty;
            } else {
                prop_assert!(result.is_err());
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Projecting the same template set twice yields the same effective rule
    /// set, ids included.
    #[test]
    fn rule_projection_is_deterministic(
        min in 0i64..5,
        span in 0i64..10,
        priority in -5i32..5,
        generic in prop::bool::ANY,
    ) {
        let build = || {
            let mut engine = small_engine();
            let input = shelfsense::engine::RuleTemplateInput {
                id: Some(uuid::Uuid::from_u128(7)),
                name: Some("prop-template".to_string()),
                scope: if generic { TemplateScope::Generic } else { TemplateScope::Location },
                zone_id: if generic { None } else { Some("shelf-a".to_string()) },
                selector: TemplateSelector::Sku { sku_id: "sku-nr-1".to_string() },
                min,
                max: min + span,
                priority,
                inbound_source_id: None,
            };
            engine.upsert_rule_template(input.clone()).unwrap();
            // Re-upserting the identical template is the second projection.
            engine.upsert_rule_template(input).unwrap();
            engine
        };
        let a = build();
        let b = build();
        let ids = |e: &InventoryEngine| {
            let mut v: Vec<(String, i64, i64)> = e
                .effective_rules()
                .iter()
                .map(|r| (r.id.clone(), r.min, r.max))
                .collect();
            v.sort();
            v
        };
        prop_assert_eq!(ids(&a), ids(&b));
    }
}

/// TTL purity: the RFID snapshot equals the count of live presence records
/// unless an immediate-deduction floor is active.
#[test]
fn ttl_purity_after_expiry() {
    let mut engine = rfid_store(4);
    for i in 0..4 {
        engine
            .ingest_rfid_read(&format!("epc-{:03}", i), "ant-shelf-a", "shelf-a", t(i), None)
            .unwrap();
    }
    assert_eq!(shelf_qty(&engine, "sku-rfid-1", StockSource::Rfid), 4);
    // Re-read only one tag much later; the rest expire.
    engine
        .ingest_rfid_read("epc-000", "ant-shelf-a", "shelf-a", t(500), None)
        .unwrap();
    assert_eq!(shelf_qty(&engine, "sku-rfid-1", StockSource::Rfid), 1);
}
