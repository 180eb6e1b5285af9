//! Trade history queries
//!
//! Raw trade listings for one canonical pair, newest first, with a hard
//! result cap enforced before touching the store.

use tracing::debug;

use types::errors::{MarketError, Result};
use types::trade::TradeRecord;

use crate::context::RequestContext;
use crate::pair::canonical_pair;
use crate::store::{AssetCache, RecordStore, TimeWindow};

/// Hard cap on trade history results.
const MAX_TRADE_HISTORY: usize = 500;

/// Default lookback for date-ranged history.
const HISTORY_DEFAULT_DAYS: i64 = 30;

fn check_limit(limit: usize) -> Result<()> {
    if limit > MAX_TRADE_HISTORY {
        return Err(MarketError::InvalidParameter {
            name: "limit",
            reason: format!("must be at most {MAX_TRADE_HISTORY}, got {limit}"),
        });
    }
    Ok(())
}

/// Most recent trades of a pair, newest first.
pub fn trade_history(
    store: &dyn RecordStore,
    cache: &mut AssetCache,
    asset1: &str,
    asset2: &str,
    limit: usize,
) -> Result<Vec<TradeRecord>> {
    check_limit(limit)?;
    let pair = canonical_pair(store, cache, asset1, asset2)?;

    let trades =
        store.trades_for_pair(&pair.base_asset, &pair.quote_asset, TimeWindow::unbounded())?;
    let recent: Vec<TradeRecord> = trades.into_iter().rev().take(limit).collect();

    debug!(pair = %pair.pair_name, trades = recent.len(), "fetched trade history");
    Ok(recent)
}

/// Trades of a pair within a date range, newest first, capped at `limit`.
///
/// Defaults: `end_ts` is the request time, `start_ts` is 30 days before
/// `end_ts`.
pub fn trade_history_within_dates(
    store: &dyn RecordStore,
    cache: &mut AssetCache,
    ctx: &RequestContext,
    asset1: &str,
    asset2: &str,
    start_ts: Option<i64>,
    end_ts: Option<i64>,
    limit: usize,
) -> Result<Vec<TradeRecord>> {
    check_limit(limit)?;
    let pair = canonical_pair(store, cache, asset1, asset2)?;

    let end = end_ts.unwrap_or(ctx.now);
    let start = start_ts.unwrap_or(end - HISTORY_DEFAULT_DAYS * 86_400);
    let trades = store.trades_for_pair(
        &pair.base_asset,
        &pair.quote_asset,
        TimeWindow::between(start, end),
    )?;

    Ok(trades.into_iter().rev().take(limit).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use rust_decimal::Decimal;
    use types::asset::{AssetRecord, ChangeType};

    const NOW: i64 = 1_700_000_000;

    fn asset(name: &str) -> AssetRecord {
        AssetRecord {
            asset: name.to_string(),
            owner: "addr1".to_string(),
            description: String::new(),
            divisible: true,
            locked: false,
            total_issued: 0,
            total_issued_normalized: Decimal::ZERO,
            change_type: ChangeType::Created,
            at_block: 1,
            at_block_time: 0,
            history: Vec::new(),
        }
    }

    fn trade(block_index: u32, block_time: i64) -> TradeRecord {
        TradeRecord {
            base_asset: "XCP".to_string(),
            quote_asset: "GOLD".to_string(),
            unit_price: Decimal::from(2),
            base_quantity: 0,
            quote_quantity: 0,
            base_quantity_normalized: Decimal::ONE,
            quote_quantity_normalized: Decimal::from(2),
            block_index,
            block_time,
        }
    }

    fn store_with_trades(count: u32) -> MemoryRecordStore {
        let mut store = MemoryRecordStore::new();
        store.insert_asset(asset("XCP"));
        store.insert_asset(asset("GOLD"));
        for i in 0..count {
            store.insert_trade(trade(810_000 + i, NOW - 86_400 + i as i64 * 60));
        }
        store
    }

    #[test]
    fn test_trade_history_newest_first() {
        let store = store_with_trades(5);
        let mut cache = AssetCache::new();
        let trades = trade_history(&store, &mut cache, "GOLD", "XCP", 3).unwrap();
        assert_eq!(trades.len(), 3);
        assert_eq!(trades[0].block_index, 810_004);
        assert_eq!(trades[2].block_index, 810_002);
    }

    #[test]
    fn test_trade_history_limit_enforced() {
        let store = store_with_trades(1);
        let mut cache = AssetCache::new();
        let err = trade_history(&store, &mut cache, "GOLD", "XCP", 501).unwrap_err();
        assert!(matches!(err, MarketError::InvalidParameter { .. }));
    }

    #[test]
    fn test_trade_history_within_dates() {
        let store = store_with_trades(5);
        let mut cache = AssetCache::new();
        let ctx = RequestContext::new(NOW, 820_000);

        // Window covering only the two most recent trades
        let trades = trade_history_within_dates(
            &store,
            &mut cache,
            &ctx,
            "GOLD",
            "XCP",
            Some(NOW - 86_400 + 3 * 60),
            None,
            50,
        )
        .unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].block_index, 810_004);
    }

    #[test]
    fn test_unknown_pair_rejected() {
        let store = store_with_trades(1);
        let mut cache = AssetCache::new();
        let err = trade_history(&store, &mut cache, "GOLD", "GHOST", 10).unwrap_err();
        assert_eq!(err, MarketError::invalid_asset("GHOST"));
    }
}
