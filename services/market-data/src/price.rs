//! Market price synthesis
//!
//! Derives a single "market price" for a pair from its most recent trades.
//! The most recent trades inside a 10-day lookback are fetched and walked
//! oldest-first against a fixed six-element weight table; the weighted
//! average of their unit prices, rounded to monetary scale, is the price.
//!
//! The weight table deliberately assigns its highest weight to the oldest
//! of the selected trades, matching the ledger's historical behavior.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use types::errors::{MarketError, Result};
use types::numeric::{invert, round8};
use types::trade::LastTrade;

use crate::context::RequestContext;
use crate::store::{AssetCache, RecordStore, TimeWindow};
use crate::pair::canonical_pair;

/// Number of trades the weighted average is derived over.
const DERIVE_NUM_LAST: usize = 6;

/// Days of lookback when selecting recent trades.
const DERIVE_WINDOW_DAYS: i64 = 10;

/// Upper bound on the `with_last_trades` request parameter.
const MAX_LAST_TRADES: usize = 30;

/// Weight applied to each trade, indexed by position in the oldest-first
/// selection. Position 0 (the oldest selected trade) weighs the most.
fn derive_weights() -> [Decimal; DERIVE_NUM_LAST] {
    [
        Decimal::ONE,
        Decimal::new(9, 1),
        Decimal::new(72, 2),
        Decimal::new(6, 1),
        Decimal::new(4, 1),
        Decimal::new(3, 1),
    ]
}

/// A synthesized market price for one canonical pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceSummary {
    /// Weighted market price (quote per base), rounded to monetary scale.
    pub market_price: Decimal,
    pub base_asset: String,
    pub quote_asset: String,
    /// The trades the price was derived over, oldest first. Present only
    /// when the caller asked for them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_trades: Option<Vec<LastTrade>>,
}

impl PriceSummary {
    /// Derive the non-canonical reverse direction of this summary: price
    /// inverted, pair sides swapped, per-trade prices inverted and
    /// quantity roles exchanged.
    ///
    /// Only meaningful for the XCP/BTC reference cross, the one pair
    /// whose reverse direction is ever reported.
    pub fn inverted(&self) -> PriceSummary {
        PriceSummary {
            market_price: invert(self.market_price).unwrap_or(Decimal::ZERO),
            base_asset: self.quote_asset.clone(),
            quote_asset: self.base_asset.clone(),
            last_trades: self.last_trades.as_ref().map(|trades| {
                trades
                    .iter()
                    .map(|t| {
                        LastTrade(
                            t.0,
                            invert(t.1).unwrap_or(Decimal::ZERO),
                            t.3,
                            t.2,
                            t.4,
                        )
                    })
                    .collect()
            }),
        }
    }
}

/// Synthesize the market price for an arbitrary asset pair.
///
/// Returns `Ok(None)` when the lookback window holds no trades at all;
/// absence of data is never reported as a zero price.
pub fn market_price_summary(
    store: &dyn RecordStore,
    cache: &mut AssetCache,
    ctx: &RequestContext,
    asset1: &str,
    asset2: &str,
    with_last_trades: usize,
) -> Result<Option<PriceSummary>> {
    if with_last_trades > MAX_LAST_TRADES {
        return Err(MarketError::InvalidParameter {
            name: "with_last_trades",
            reason: format!("must be at most {MAX_LAST_TRADES}, got {with_last_trades}"),
        });
    }

    let pair = canonical_pair(store, cache, asset1, asset2)?;

    let window = TimeWindow::since(ctx.window_start(DERIVE_WINDOW_DAYS));
    let trades = store.trades_for_pair(&pair.base_asset, &pair.quote_asset, window)?;
    if trades.is_empty() {
        return Ok(None);
    }

    // Keep the most recent max(6, requested) trades; the slice stays
    // oldest-first so weight 0 lands on the oldest selected trade.
    let keep = DERIVE_NUM_LAST.max(with_last_trades);
    let selected = &trades[trades.len().saturating_sub(keep)..];

    let weights = derive_weights();
    let mut weighted_sum = Decimal::ZERO;
    let mut weight_total = Decimal::ZERO;
    for (trade, &weight) in selected.iter().zip(weights.iter()) {
        weighted_sum += trade.unit_price * weight;
        weight_total += weight;
    }
    let market_price = round8(
        weighted_sum
            .checked_div(weight_total)
            .unwrap_or(Decimal::ZERO),
    );

    debug!(
        pair = %pair.pair_name,
        trades = selected.len(),
        price = %market_price,
        "synthesized market price"
    );

    Ok(Some(PriceSummary {
        market_price,
        base_asset: pair.base_asset,
        quote_asset: pair.quote_asset,
        last_trades: (with_last_trades > 0)
            .then(|| selected.iter().map(LastTrade::from).collect()),
    }))
}
