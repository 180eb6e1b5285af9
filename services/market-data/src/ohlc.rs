//! OHLC and volume aggregation
//!
//! Rolls trades of a canonical pair into time buckets:
//! - whole-window summaries (the 24h statistics),
//! - hour-grain history points (the rolling 7-day series),
//! - block-grain buckets (date-ranged market price history).
//!
//! Buckets are aligned the same way regardless of grain: open is the first
//! trade in (block_time, block_index) order, close the last, volume the sum
//! of normalized base quantities.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use types::errors::Result;
use types::numeric::{invert, round8};
use types::trade::TradeRecord;

use crate::context::RequestContext;
use crate::pair::canonical_pair;
use crate::store::{AssetCache, RecordStore, TimeWindow};

/// Seconds per hour-grain bucket.
const HOUR_SECS: i64 = 3600;

/// Default lookback for block-grain price history.
const PRICE_HISTORY_DEFAULT_DAYS: i64 = 30;

/// An open/high/low/close rollup of one bucket of trades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OhlcBucket {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    /// Total normalized base quantity traded.
    pub vol: Decimal,
    /// Number of trades in the bucket.
    pub count: u64,
}

/// One hour-grain history point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Start of the hour (Unix milliseconds).
    pub when_ms: i64,
    /// Mean unit price over the hour.
    pub price: Decimal,
    /// Total normalized base quantity traded in the hour.
    pub vol: Decimal,
}

/// One block-grain history bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceHistoryPoint {
    /// Block time (Unix milliseconds).
    pub block_time_ms: i64,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub vol: Decimal,
    pub count: u64,
    pub block_index: u32,
}

/// Combined traded volume for one asset across every market it appears in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSummary {
    pub vol: Decimal,
    pub count: u64,
}

/// Roll an ordered slice of trades into a single whole-window bucket.
///
/// Returns `None` for an empty slice; an empty bucket is absence of data,
/// not a zero bucket.
pub fn summarize(trades: &[TradeRecord]) -> Option<OhlcBucket> {
    let first = trades.first()?;
    let last = trades.last()?;

    let mut high = first.unit_price;
    let mut low = first.unit_price;
    let mut vol = Decimal::ZERO;
    for trade in trades {
        high = high.max(trade.unit_price);
        low = low.min(trade.unit_price);
        vol += trade.base_quantity_normalized;
    }

    Some(OhlcBucket {
        open: first.unit_price,
        high,
        low,
        close: last.unit_price,
        vol: round8(vol),
        count: trades.len() as u64,
    })
}

/// Group an ordered slice of trades into hour-grain history points.
///
/// Each point carries the arithmetic mean of unit prices in its hour and
/// the summed normalized base volume. Points come out oldest first.
pub fn hourly_history(trades: &[TradeRecord]) -> Vec<HistoryPoint> {
    let mut buckets: BTreeMap<i64, (Decimal, Decimal, u64)> = BTreeMap::new();

    for trade in trades {
        let hour_start = (trade.block_time / HOUR_SECS) * HOUR_SECS;
        let entry = buckets
            .entry(hour_start)
            .or_insert((Decimal::ZERO, Decimal::ZERO, 0));
        entry.0 += trade.unit_price;
        entry.1 += trade.base_quantity_normalized;
        entry.2 += 1;
    }

    buckets
        .into_iter()
        .map(|(hour_start, (price_sum, vol, count))| HistoryPoint {
            when_ms: hour_start * 1000,
            price: round8(
                price_sum
                    .checked_div(Decimal::from(count))
                    .unwrap_or(Decimal::ZERO),
            ),
            vol: round8(vol),
        })
        .collect()
}

/// Derive the non-canonical reverse direction of an hourly series by
/// inverting each point. Used only for the XCP/BTC reference cross, whose
/// reverse ordering never has trades of its own.
pub fn invert_history(points: &[HistoryPoint]) -> Vec<HistoryPoint> {
    points
        .iter()
        .map(|p| HistoryPoint {
            when_ms: p.when_ms,
            price: invert(p.price).unwrap_or(Decimal::ZERO),
            vol: invert(p.vol).unwrap_or(Decimal::ZERO),
        })
        .collect()
}

/// Total 24h traded volume of one asset, regardless of counter-asset.
///
/// Volumes and counts are accumulated independently for trades where the
/// asset took the base side and where it took the quote side, then
/// combined.
pub fn asset_volume_24h(
    store: &dyn RecordStore,
    ctx: &RequestContext,
    asset: &str,
) -> Result<VolumeSummary> {
    let window = TimeWindow::since(ctx.window_start(1));

    let mut vol = Decimal::ZERO;
    let mut count = 0u64;
    for trade in store.trades_as_base(asset, window)? {
        vol += trade.base_quantity_normalized;
        count += 1;
    }
    for trade in store.trades_as_quote(asset, window)? {
        vol += trade.quote_quantity_normalized;
        count += 1;
    }

    Ok(VolumeSummary { vol: round8(vol), count })
}

/// Block-grain market history for an arbitrary pair over a date range.
///
/// Defaults: `end_ts` is the request time, `start_ts` is 30 days before
/// `end_ts`. One bucket per block that saw trades, oldest first.
pub fn market_price_history(
    store: &dyn RecordStore,
    cache: &mut AssetCache,
    ctx: &RequestContext,
    asset1: &str,
    asset2: &str,
    start_ts: Option<i64>,
    end_ts: Option<i64>,
) -> Result<Vec<PriceHistoryPoint>> {
    let end = end_ts.unwrap_or(ctx.now);
    let start = start_ts.unwrap_or(end - PRICE_HISTORY_DEFAULT_DAYS * 86_400);

    let pair = canonical_pair(store, cache, asset1, asset2)?;
    let trades =
        store.trades_for_pair(&pair.base_asset, &pair.quote_asset, TimeWindow::between(start, end))?;

    // One bucket per (block_time, block_index); input order is already
    // ascending so open/close fall out of first/last per block.
    let mut points: Vec<PriceHistoryPoint> = Vec::new();
    for trade in &trades {
        match points.last_mut() {
            Some(point)
                if point.block_index == trade.block_index
                    && point.block_time_ms == trade.block_time * 1000 =>
            {
                point.high = point.high.max(trade.unit_price);
                point.low = point.low.min(trade.unit_price);
                point.close = trade.unit_price;
                point.vol = round8(point.vol + trade.base_quantity_normalized);
                point.count += 1;
            }
            _ => points.push(PriceHistoryPoint {
                block_time_ms: trade.block_time * 1000,
                open: trade.unit_price,
                high: trade.unit_price,
                low: trade.unit_price,
                close: trade.unit_price,
                vol: round8(trade.base_quantity_normalized),
                count: 1,
                block_index: trade.block_index,
            }),
        }
    }

    debug!(
        pair = %pair.pair_name,
        buckets = points.len(),
        "derived block-grain price history"
    );

    Ok(points)
}
