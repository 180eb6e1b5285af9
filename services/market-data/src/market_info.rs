//! Per-asset market snapshots
//!
//! Composes the pair-based derivations into one snapshot per requested
//! asset: prices against both reference assets, aggregated prices, market
//! capitalization, 24h volume/OHLC/price-change, and the rolling 7-day
//! hourly history.
//!
//! The XCP/BTC cross rate is derived once per request and reused for every
//! asset. XCP and BTC themselves get their opposite-reference figures by
//! inverting that cross, since BTC/XCP is the one direction canonical
//! ordering never produces. Registry lookups are memoized per request in
//! an [`AssetCache`].

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use types::errors::Result;
use types::numeric::{invert, normalize_quantity, price_change, round8};
use types::pair::{BTC, XCP};

use crate::context::RequestContext;
use crate::ohlc::{
    self, asset_volume_24h, hourly_history, invert_history, HistoryPoint, OhlcBucket,
    VolumeSummary,
};
use crate::price::{market_price_summary, PriceSummary};
use crate::store::{AssetCache, LedgerClient, RecordStore, TimeWindow};

/// Trades fed into each price summary (and therefore into the 24h OHLC
/// gating below).
const SUMMARY_TRADE_COUNT: usize = 30;

/// Market snapshot for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketInfo {
    /// Price of the asset with XCP as base (XCP market units per asset).
    pub price_in_xcp: Option<Decimal>,
    /// Price of the asset with BTC as base.
    pub price_in_btc: Option<Decimal>,
    /// Price of the asset expressed as XCP (inverse of `price_in_xcp`).
    pub price_as_xcp: Option<Decimal>,
    /// Price of the asset expressed as BTC.
    pub price_as_btc: Option<Decimal>,
    /// Mean of the direct XCP price and the BTC price crossed through the
    /// XCP/BTC rate; present only when both operands are.
    pub aggregated_price_in_xcp: Option<Decimal>,
    pub aggregated_price_in_btc: Option<Decimal>,
    pub aggregated_price_as_xcp: Option<Decimal>,
    pub aggregated_price_as_btc: Option<Decimal>,
    /// Total supply, normalized. Reference assets report ledger-wide
    /// issuance, not their registry row.
    pub total_supply: Decimal,
    /// total_supply / price_in_xcp; absent when the price is.
    pub market_cap_in_xcp: Option<Decimal>,
    pub market_cap_in_btc: Option<Decimal>,
    /// Total traded quantity of the asset across all markets, last 24h.
    pub summary_24h: VolumeSummary,
    /// 24h OHLC of the asset's XCP market; absent without recent trades.
    pub ohlc_24h_in_xcp: Option<OhlcBucket>,
    pub ohlc_24h_in_btc: Option<OhlcBucket>,
    /// 100 * (close - open) / open over the 24h bucket.
    pub price_change_24h_in_xcp: Option<Decimal>,
    pub price_change_24h_in_btc: Option<Decimal>,
    /// Hour-grain price/volume points over the trailing 7 days.
    pub history_7d_in_xcp: Vec<HistoryPoint>,
    pub history_7d_in_btc: Vec<HistoryPoint>,
}

/// Compose market snapshots for a set of assets.
pub fn market_info(
    store: &dyn RecordStore,
    ledger: &dyn LedgerClient,
    ctx: &RequestContext,
    assets: &[String],
) -> Result<BTreeMap<String, MarketInfo>> {
    let mut cache = AssetCache::new();

    // The reference cross is derived once and reused for every asset
    let cross = market_price_summary(store, &mut cache, ctx, XCP, BTC, SUMMARY_TRADE_COUNT)?;
    let xcp_btc_price = cross.as_ref().map(|s| s.market_price);
    let btc_xcp_price = cross.as_ref().and_then(|s| invert(s.market_price));

    let mut result = BTreeMap::new();
    for asset in assets {
        let info = compose_one(
            store,
            ledger,
            &mut cache,
            ctx,
            asset,
            cross.as_ref(),
            xcp_btc_price,
            btc_xcp_price,
        )?;
        result.insert(asset.clone(), info);
    }

    debug!(assets = result.len(), "composed market info");
    Ok(result)
}

#[allow(clippy::too_many_arguments)]
fn compose_one(
    store: &dyn RecordStore,
    ledger: &dyn LedgerClient,
    cache: &mut AssetCache,
    ctx: &RequestContext,
    asset: &str,
    cross: Option<&PriceSummary>,
    xcp_btc_price: Option<Decimal>,
    btc_xcp_price: Option<Decimal>,
) -> Result<MarketInfo> {
    let record = cache.get(store, asset)?;
    let registry_supply = record.total_issued_normalized;

    // Reference assets report ledger-wide issuance, not their registry row
    let total_supply = match asset {
        BTC => normalize_quantity(ledger.btc_supply()?, true),
        XCP => normalize_quantity(ledger.xcp_supply()?, true),
        _ => registry_supply,
    };

    let is_reference = asset == XCP || asset == BTC;

    // Price summaries against both references
    let (summary_in_xcp, summary_in_btc) = if !is_reference {
        (
            market_price_summary(store, cache, ctx, asset, XCP, SUMMARY_TRADE_COUNT)?,
            market_price_summary(store, cache, ctx, asset, BTC, SUMMARY_TRADE_COUNT)?,
        )
    } else {
        // The BTC/XCP direction is the inversion of the canonical cross
        (cross.cloned(), cross.map(PriceSummary::inverted))
    };

    let (price_in_xcp, price_in_btc, aggregated_price_in_xcp, aggregated_price_in_btc) =
        if !is_reference {
            let price_in_xcp = summary_in_xcp.as_ref().map(|s| s.market_price);
            let price_in_btc = summary_in_btc.as_ref().map(|s| s.market_price);
            let aggregated_in_xcp = match (price_in_xcp, xcp_btc_price) {
                (Some(direct), Some(cross_rate)) => {
                    Some(round8((direct + cross_rate) / Decimal::TWO))
                }
                _ => None,
            };
            let aggregated_in_btc = match (price_in_btc, btc_xcp_price) {
                (Some(direct), Some(cross_rate)) => {
                    Some(round8((direct + cross_rate) / Decimal::TWO))
                }
                _ => None,
            };
            (price_in_xcp, price_in_btc, aggregated_in_xcp, aggregated_in_btc)
        } else if asset == XCP {
            (
                Some(Decimal::ONE),
                summary_in_btc.as_ref().map(|s| s.market_price),
                Some(Decimal::ONE),
                btc_xcp_price,
            )
        } else {
            (
                summary_in_xcp.as_ref().map(|s| s.market_price),
                Some(Decimal::ONE),
                xcp_btc_price,
                Some(Decimal::ONE),
            )
        };

    // 7-day hourly history per reference market
    let window_7d = TimeWindow::since(ctx.window_start(7));
    let (history_7d_in_xcp, history_7d_in_btc) = if !is_reference {
        let in_xcp = hourly_history(&store.trades_for_pair(XCP, asset, window_7d)?);
        let in_btc = hourly_history(&store.trades_for_pair(BTC, asset, window_7d)?);
        (in_xcp, in_btc)
    } else {
        let in_xcp = hourly_history(&store.trades_for_pair(XCP, BTC, window_7d)?);
        let in_btc = invert_history(&in_xcp);
        (in_xcp, in_btc)
    };

    // 24h statistics
    let summary_24h = asset_volume_24h(store, ctx, asset)?;
    let window_24h = TimeWindow::since(ctx.window_start(1));

    let has_trades = |summary: &Option<PriceSummary>| {
        summary
            .as_ref()
            .and_then(|s| s.last_trades.as_ref())
            .is_some_and(|trades| !trades.is_empty())
    };

    let ohlc_24h_in_xcp = if asset != XCP && has_trades(&summary_in_xcp) {
        ohlc::summarize(&store.trades_for_pair(XCP, asset, window_24h)?)
    } else {
        None
    };
    // No BTC/XCP ordering exists in the trade log, so XCP never gets a
    // BTC-market bucket
    let ohlc_24h_in_btc = if asset != BTC && asset != XCP && has_trades(&summary_in_btc) {
        ohlc::summarize(&store.trades_for_pair(BTC, asset, window_24h)?)
    } else {
        None
    };

    let price_change_24h_in_xcp = ohlc_24h_in_xcp
        .as_ref()
        .and_then(|b| price_change(b.open, b.close));
    let price_change_24h_in_btc = ohlc_24h_in_btc
        .as_ref()
        .and_then(|b| price_change(b.open, b.close));

    let cap = |price: Option<Decimal>| {
        price.and_then(|p| total_supply.checked_div(p)).map(round8)
    };

    Ok(MarketInfo {
        price_as_xcp: price_in_xcp.and_then(invert),
        price_as_btc: price_in_btc.and_then(invert),
        aggregated_price_as_xcp: aggregated_price_in_xcp.and_then(invert),
        aggregated_price_as_btc: aggregated_price_in_btc.and_then(invert),
        market_cap_in_xcp: cap(price_in_xcp),
        market_cap_in_btc: cap(price_in_btc),
        price_in_xcp,
        price_in_btc,
        aggregated_price_in_xcp,
        aggregated_price_in_btc,
        total_supply,
        summary_24h,
        ohlc_24h_in_xcp,
        ohlc_24h_in_btc,
        price_change_24h_in_xcp,
        price_change_24h_in_btc,
        history_7d_in_xcp,
        history_7d_in_btc,
    })
}
