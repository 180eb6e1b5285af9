//! End-to-end derivation tests for the market analytics service
//!
//! Exercises the full request paths against the in-memory collaborators:
//! price synthesis, order book assembly, market info composition, and
//! asset history replay, including the determinism guarantee that a
//! repeated request over unchanged records yields identical output.

use market_data::asset_history::{asset_history, AssetChange};
use market_data::context::RequestContext;
use market_data::market_info::market_info;
use market_data::order_book::{build_order_book, FeePreference};
use market_data::price::market_price_summary;
use market_data::store::{AssetCache, MemoryLedger, MemoryRecordStore};
use proptest::prelude::*;
use rust_decimal::Decimal;
use types::asset::{AssetRecord, AssetSnapshot, CallbackEvent, ChangeType};
use types::errors::MarketError;
use types::order::OrderRecord;
use types::trade::TradeRecord;

const NOW: i64 = 1_700_000_000;
const BLOCK: u32 = 820_000;

fn ctx() -> RequestContext {
    RequestContext::new(NOW, BLOCK)
}

fn asset(name: &str, supply: u64) -> AssetRecord {
    AssetRecord {
        asset: name.to_string(),
        owner: "alice".to_string(),
        description: String::new(),
        divisible: true,
        locked: false,
        total_issued: supply * 100_000_000,
        total_issued_normalized: Decimal::from(supply),
        change_type: ChangeType::Created,
        at_block: 300_000,
        at_block_time: NOW - 200 * 86_400,
        history: Vec::new(),
    }
}

fn trade(base: &str, quote: &str, price: &str, block_index: u32, block_time: i64) -> TradeRecord {
    let unit_price = Decimal::from_str_exact(price).unwrap();
    TradeRecord {
        base_asset: base.to_string(),
        quote_asset: quote.to_string(),
        unit_price,
        base_quantity: 100_000_000,
        quote_quantity: 100_000_000,
        base_quantity_normalized: Decimal::ONE,
        quote_quantity_normalized: unit_price,
        block_index,
        block_time,
    }
}

fn order(give: &str, give_qty: u64, get: &str, get_qty: u64) -> OrderRecord {
    OrderRecord {
        give_asset: give.to_string(),
        give_quantity: give_qty,
        give_remaining: give_qty,
        get_asset: get.to_string(),
        get_quantity: get_qty,
        get_remaining: get_qty,
        fee_required: 0,
        fee_provided: 0,
        block_index: 810_000,
        expire_index: BLOCK + 1000,
    }
}

fn world() -> (MemoryRecordStore, MemoryLedger) {
    let mut store = MemoryRecordStore::new();
    store.insert_asset(asset("XCP", 2_600_000));
    store.insert_asset(asset("BTC", 0));
    store.insert_asset(asset("GOLD", 1_000));
    store.insert_block(810_000, NOW - 5000);

    // GOLD/XCP market: three trades inside the lookback, oldest first
    store.insert_trade(trade("XCP", "GOLD", "100", 810_001, NOW - 3 * 3600));
    store.insert_trade(trade("XCP", "GOLD", "110", 810_002, NOW - 2 * 3600));
    store.insert_trade(trade("XCP", "GOLD", "105", 810_003, NOW - 3600));

    // Reference cross
    store.insert_trade(trade("XCP", "BTC", "4", 810_004, NOW - 1800));

    let mut ledger = MemoryLedger::new();
    ledger.set_btc_supply(21_000_000 * 100_000_000);
    ledger.set_xcp_supply(2_600_000 * 100_000_000);
    (store, ledger)
}

#[test]
fn test_price_summary_symmetric_in_arguments() {
    let (store, _) = world();
    let mut cache = AssetCache::new();

    let forward = market_price_summary(&store, &mut cache, &ctx(), "GOLD", "XCP", 10).unwrap();
    let backward = market_price_summary(&store, &mut cache, &ctx(), "XCP", "GOLD", 10).unwrap();
    assert_eq!(forward, backward);
}

#[test]
fn test_weighted_price_scenario() {
    let (store, _) = world();
    let mut cache = AssetCache::new();

    let summary = market_price_summary(&store, &mut cache, &ctx(), "GOLD", "XCP", 0)
        .unwrap()
        .unwrap();

    // Prices [100, 110, 105] oldest-first against weights [1, .9, .72]
    let w1 = Decimal::ONE;
    let w2 = Decimal::new(9, 1);
    let w3 = Decimal::new(72, 2);
    let expected = (Decimal::from(100) * w1 + Decimal::from(110) * w2 + Decimal::from(105) * w3)
        / (w1 + w2 + w3);
    let expected = expected
        .round_dp_with_strategy(8, rust_decimal::RoundingStrategy::MidpointNearestEven);
    assert_eq!(summary.market_price, expected);
}

#[test]
fn test_no_data_is_distinct_from_zero() {
    let (mut store, _) = world();
    store.insert_asset(asset("SILVER", 10));
    let mut cache = AssetCache::new();

    let summary =
        market_price_summary(&store, &mut cache, &ctx(), "SILVER", "XCP", 0).unwrap();
    assert!(summary.is_none());

    let err =
        market_price_summary(&store, &mut cache, &ctx(), "GHOST", "XCP", 0).unwrap_err();
    assert_eq!(err, MarketError::invalid_asset("GHOST"));
}

#[test]
fn test_order_book_end_to_end() {
    let (store, mut ledger) = world();
    // Bids: 10 @ 0.5, 5 @ 0.4 (give GOLD, get XCP); ask: 8 @ 0.6
    ledger.insert_order(order("GOLD", 500_000_000, "XCP", 1_000_000_000));
    ledger.insert_order(order("GOLD", 200_000_000, "XCP", 500_000_000));
    ledger.insert_order(order("XCP", 800_000_000, "GOLD", 480_000_000));

    let mut cache = AssetCache::new();
    let book = build_order_book(
        &store,
        &ledger,
        &mut cache,
        &ctx(),
        "XCP",
        "GOLD",
        &FeePreference::default(),
    )
    .unwrap();

    assert_eq!(book.spread, Decimal::from_str_exact("0.1").unwrap());
    assert_eq!(book.bid_depth, Decimal::from(15));
    assert_eq!(book.ask_depth, Decimal::from(8));

    // Sides strictly monotonic, depth non-decreasing
    assert!(book
        .bid_levels
        .windows(2)
        .all(|w| w[0].unit_price > w[1].unit_price && w[0].depth <= w[1].depth));
    assert!(book
        .ask_levels
        .windows(2)
        .all(|w| w[0].unit_price < w[1].unit_price && w[0].depth <= w[1].depth));

    // Raw orders carry their placement block time
    assert!(book.raw_orders.iter().all(|o| o.block_time.is_some()));
}

#[test]
fn test_market_info_cap_price_relation() {
    let (store, ledger) = world();
    let infos = market_info(&store, &ledger, &ctx(), &["GOLD".to_string()]).unwrap();
    let gold = &infos["GOLD"];

    let price = gold.price_in_xcp.unwrap();
    let cap = gold.market_cap_in_xcp.unwrap();
    let supply = gold.total_supply;
    // cap * price == supply within rounding tolerance
    let diff = (cap * price - supply).abs();
    assert!(diff < Decimal::from_str_exact("0.0001").unwrap());
}

#[test]
fn test_market_info_is_deterministic() {
    let (store, ledger) = world();
    let assets = vec!["GOLD".to_string(), "XCP".to_string(), "BTC".to_string()];

    let first = market_info(&store, &ledger, &ctx(), &assets).unwrap();
    let second = market_info(&store, &ledger, &ctx(), &assets).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_asset_history_event_count_and_order() {
    let (mut store, mut ledger) = world();

    // Rebuild GOLD with a three-entry log: created -> locked -> transferred
    let t = |block: u32| NOW - 200 * 86_400 + block as i64;
    let snap = |change_type, at_block: u32, owner: &str, locked| AssetSnapshot {
        change_type,
        at_block,
        at_block_time: t(at_block),
        owner: owner.to_string(),
        description: String::new(),
        divisible: true,
        locked,
        total_issued: 100_000_000_000,
        total_issued_normalized: Decimal::from(1_000),
    };
    let mut gold = asset("GOLD", 1_000);
    gold.history = vec![
        snap(ChangeType::Created, 100, "alice", false),
        snap(ChangeType::Locked, 120, "alice", true),
    ];
    gold.owner = "bob".to_string();
    gold.locked = true;
    gold.change_type = ChangeType::Transferred;
    gold.at_block = 140;
    gold.at_block_time = t(140);
    store.insert_asset(gold);
    store.insert_block(130, t(130));

    // One callback between locked and transferred
    ledger.insert_callback(CallbackEvent {
        asset: "GOLD".to_string(),
        fraction: Decimal::from_str_exact("0.25").unwrap(),
        block_index: 130,
    });

    let events = asset_history(&store, &ledger, "GOLD", false).unwrap();

    // 3 snapshots + 1 callback = 4 events in strict block order
    assert_eq!(events.len(), 4);
    assert!(events.windows(2).all(|w| w[0].at_block < w[1].at_block));
    assert!(matches!(events[0].change, AssetChange::Created { .. }));
    assert!(matches!(events[1].change, AssetChange::Locked));
    assert!(matches!(events[2].change, AssetChange::CalledBack { .. }));
    assert!(matches!(events[3].change, AssetChange::Transferred { .. }));

    // Reversing the request reverses the same event set exactly
    let reversed = asset_history(&store, &ledger, "GOLD", true).unwrap();
    let mut expected = events.clone();
    expected.reverse();
    assert_eq!(reversed, expected);
}

proptest! {
    // Whatever mix of bids rests on the book, the levels stay strictly
    // descending and the depth curve never decreases.
    #[test]
    fn prop_bid_book_invariants(orders in prop::collection::vec((1u64..=200, 1u64..=50), 1..20)) {
        let (store, mut ledger) = world();
        for (price_cents, qty) in orders {
            // give GOLD, get XCP at qty units, price_cents/100 per unit
            ledger.insert_order(order(
                "GOLD",
                qty * price_cents * 1_000_000,
                "XCP",
                qty * 100_000_000,
            ));
        }

        let mut cache = AssetCache::new();
        let book = build_order_book(
            &store,
            &ledger,
            &mut cache,
            &ctx(),
            "XCP",
            "GOLD",
            &FeePreference::default(),
        )
        .unwrap();

        prop_assert!(!book.bid_levels.is_empty());
        prop_assert!(book
            .bid_levels
            .windows(2)
            .all(|w| w[0].unit_price > w[1].unit_price));
        prop_assert!(book
            .bid_levels
            .windows(2)
            .all(|w| w[0].depth <= w[1].depth));

        let total: Decimal = book.bid_levels.iter().map(|l| l.quantity).sum();
        prop_assert_eq!(book.bid_depth, total);
    }
}
