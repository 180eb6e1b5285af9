//! Fee-aware order book construction
//!
//! Builds a two-sided price-level book for a caller's intended
//! (buy_asset, sell_asset) from the ledger daemon's open orders:
//!
//! - bid side: orders offering quote for base
//! - ask side: orders offering base for quote
//!
//! Orders with nothing remaining or past expiration are excluded. When BTC
//! occupies the pair, the caller's fee preference narrows each side to the
//! competitive region (four cases, depending on which side BTC sits on and
//! whether the caller is buying or selling it).
//!
//! Levels are keyed by (base, quote, unit_price) with quantities
//! accumulated in base units; bids sort descending, asks ascending, both
//! best-price-first, with a running cumulative depth attached per level.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use types::errors::{MarketError, Result};
use types::numeric::{denormalize_quantity, normalize_quantity, round8};
use types::order::OrderRecord;
use types::pair::BTC;

use crate::context::RequestContext;
use crate::pair::{canonical_pair, PairInfo};
use crate::store::{AssetCache, LedgerClient, RecordStore};

/// The caller's BTC fee preference.
///
/// `provided` applies when the caller gives BTC (sells it); `required`
/// applies when the caller receives BTC (buys it). Both are normalized
/// BTC quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeePreference {
    pub provided: Option<Decimal>,
    pub required: Option<Decimal>,
}

/// One price level of an assembled book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price in quote units per base unit.
    pub unit_price: Decimal,
    /// Base quantity outstanding at this level.
    pub quantity: Decimal,
    /// Number of orders merged into this level.
    pub count: u32,
    /// Cumulative base quantity from the best level through this one.
    pub depth: Decimal,
}

/// A raw order annotated with its placement block time for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedOrder {
    #[serde(flatten)]
    pub order: OrderRecord,
    /// Block time of the order's placement block, if the store knows it.
    pub block_time: Option<DateTime<Utc>>,
}

/// A fully assembled order book for one canonical pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBook {
    pub base_asset: String,
    pub quote_asset: String,
    /// Bid levels, best (highest) price first.
    pub bid_levels: Vec<BookLevel>,
    /// Ask levels, best (lowest) price first.
    pub ask_levels: Vec<BookLevel>,
    /// Total base quantity across all bid levels.
    pub bid_depth: Decimal,
    /// Total base quantity across all ask levels.
    pub ask_depth: Decimal,
    /// best_ask - best_bid; zero when either side is empty.
    pub spread: Decimal,
    /// best_ask - spread / 2; zero when the ask side is empty.
    pub median: Decimal,
    /// Every order merged into the book, annotated with block time.
    pub raw_orders: Vec<AnnotatedOrder>,
    /// Open orders offering the caller's buy asset for their sell asset.
    pub open_counter_orders: Vec<AnnotatedOrder>,
}

/// Which side of the book a set of orders forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BookSide {
    Bid,
    Ask,
}

/// Assemble the order book for a caller intending to buy `buy_asset` with
/// `sell_asset`.
pub fn build_order_book(
    store: &dyn RecordStore,
    ledger: &dyn LedgerClient,
    cache: &mut AssetCache,
    ctx: &RequestContext,
    buy_asset: &str,
    sell_asset: &str,
    fees: &FeePreference,
) -> Result<OrderBook> {
    let pair = canonical_pair(store, cache, buy_asset, sell_asset)?;

    let open_counter_orders: Vec<OrderRecord> = ledger
        .open_orders(buy_asset, sell_asset)?
        .into_iter()
        .filter(|o| o.is_open(ctx.current_block))
        .collect();

    let mut bid_orders: Vec<OrderRecord> = ledger
        .open_orders(&pair.quote_asset, &pair.base_asset)?
        .into_iter()
        .filter(|o| o.is_open(ctx.current_block))
        .collect();
    let mut ask_orders: Vec<OrderRecord> = ledger
        .open_orders(&pair.base_asset, &pair.quote_asset)?
        .into_iter()
        .filter(|o| o.is_open(ctx.current_block))
        .collect();

    apply_fee_filters(&pair, buy_asset, fees, &mut bid_orders, &mut ask_orders)?;

    let mut bid_levels = make_book(&bid_orders, &pair, BookSide::Bid);
    let mut ask_levels = make_book(&ask_orders, &pair, BookSide::Ask);

    let spread = match (bid_levels.first(), ask_levels.first()) {
        (Some(bid), Some(ask)) => round8(ask.unit_price - bid.unit_price),
        _ => Decimal::ZERO,
    };
    let median = match ask_levels.first() {
        Some(ask) => round8(ask.unit_price - spread / Decimal::TWO),
        None => Decimal::ZERO,
    };

    let bid_depth = attach_depth(&mut bid_levels);
    let ask_depth = attach_depth(&mut ask_levels);

    let raw_orders = bid_orders
        .iter()
        .chain(ask_orders.iter())
        .map(|o| annotate(store, o))
        .collect::<Result<Vec<_>>>()?;
    let open_counter_orders = open_counter_orders
        .iter()
        .map(|o| annotate(store, o))
        .collect::<Result<Vec<_>>>()?;

    debug!(
        pair = %pair.pair_name,
        bids = bid_levels.len(),
        asks = ask_levels.len(),
        %spread,
        "assembled order book"
    );

    Ok(OrderBook {
        base_asset: pair.base_asset,
        quote_asset: pair.quote_asset,
        bid_levels,
        ask_levels,
        bid_depth,
        ask_depth,
        spread,
        median,
        raw_orders,
        open_counter_orders,
    })
}

/// Narrow both sides to the fee-competitive region when BTC is in the pair.
///
/// The filter compares raw fee quantities; the caller's normalized
/// preference is scaled up before comparison.
fn apply_fee_filters(
    pair: &PairInfo,
    buy_asset: &str,
    fees: &FeePreference,
    bid_orders: &mut Vec<OrderRecord>,
    ask_orders: &mut Vec<OrderRecord>,
) -> Result<()> {
    let raw_fee = |fee: Decimal, name: &'static str| -> Result<u64> {
        denormalize_quantity(fee).ok_or_else(|| MarketError::InvalidParameter {
            name,
            reason: format!("not a valid BTC quantity: {fee}"),
        })
    };
    let buying_btc = buy_asset == BTC;

    if pair.base_asset == BTC {
        if buying_btc {
            // Buying the base: competing with bids that require at least
            // our fee, matching against asks that provide at least it.
            if let Some(required) = fees.required {
                let required = raw_fee(required, "fee_required")?;
                bid_orders.retain(|o| o.fee_required >= required);
                ask_orders.retain(|o| o.fee_provided >= required);
            }
        } else if let Some(provided) = fees.provided {
            // Selling the base: match bids requiring no more than our
            // fee, compete with asks providing at least it.
            let provided = raw_fee(provided, "fee_provided")?;
            bid_orders.retain(|o| o.fee_required <= provided);
            ask_orders.retain(|o| o.fee_provided >= provided);
        }
    } else if pair.quote_asset == BTC {
        if buying_btc {
            // Buying the quote: we sit on the ask book; match bids that
            // provide at least our required fee, compete with asks that
            // require at least it.
            if let Some(required) = fees.required {
                let required = raw_fee(required, "fee_required")?;
                bid_orders.retain(|o| o.fee_provided >= required);
                ask_orders.retain(|o| o.fee_required >= required);
            }
        } else if let Some(provided) = fees.provided {
            // Selling the quote: we sit on the bid book; compete with
            // bids providing at least our fee, match asks requiring no
            // more than it.
            let provided = raw_fee(provided, "fee_provided")?;
            bid_orders.retain(|o| o.fee_provided >= provided);
            ask_orders.retain(|o| o.fee_required <= provided);
        }
    }
    Ok(())
}

/// Merge orders into price levels keyed by unit price.
///
/// Quantities accumulate in base units. Bids come out descending by
/// price, asks ascending, so the best price leads either way.
fn make_book(orders: &[OrderRecord], pair: &PairInfo, side: BookSide) -> Vec<BookLevel> {
    let mut levels: BTreeMap<Decimal, (Decimal, u32)> = BTreeMap::new();

    for order in orders {
        // Quote-per-base price and the order's base-side remainder
        let (unit_price, remaining) = if order.give_asset == pair.base_asset {
            let Some(price) =
                Decimal::from(order.get_quantity).checked_div(Decimal::from(order.give_quantity))
            else {
                warn!(block_index = order.block_index, "order with zero give quantity skipped");
                continue;
            };
            (
                round8(price),
                normalize_quantity(order.give_remaining, pair.base_divisible),
            )
        } else {
            let Some(price) =
                Decimal::from(order.give_quantity).checked_div(Decimal::from(order.get_quantity))
            else {
                warn!(block_index = order.block_index, "order with zero get quantity skipped");
                continue;
            };
            (
                round8(price),
                normalize_quantity(order.get_remaining, pair.base_divisible),
            )
        };

        let level = levels.entry(unit_price).or_insert((Decimal::ZERO, 0));
        level.0 += remaining;
        level.1 += 1;
    }

    let to_level = |(unit_price, (quantity, count)): (Decimal, (Decimal, u32))| BookLevel {
        unit_price,
        quantity: round8(quantity),
        count,
        depth: Decimal::ZERO,
    };

    match side {
        BookSide::Bid => levels.into_iter().rev().map(to_level).collect(),
        BookSide::Ask => levels.into_iter().map(to_level).collect(),
    }
}

/// Attach the running cumulative depth to each level, best price outward.
/// Returns the total depth of the side.
fn attach_depth(levels: &mut [BookLevel]) -> Decimal {
    let mut running = Decimal::ZERO;
    for level in levels.iter_mut() {
        running += level.quantity;
        level.depth = round8(running);
    }
    round8(running)
}

fn annotate(store: &dyn RecordStore, order: &OrderRecord) -> Result<AnnotatedOrder> {
    let block_time = store
        .block_time(order.block_index)?
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));
    Ok(AnnotatedOrder {
        order: order.clone(),
        block_time,
    })
}
