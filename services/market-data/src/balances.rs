//! Asset ownership and balance series
//!
//! Registry scans by owner address and per-address balance histories over
//! a date window, ready to plot as (time, balance) series.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use types::asset::AssetRecord;
use types::errors::{MarketError, Result};

use crate::context::RequestContext;
use crate::store::{RecordStore, TimeWindow};

/// Default lookback for balance history.
const HISTORY_DEFAULT_DAYS: i64 = 30;

/// One address's balance series for a single asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceHistory {
    /// The address the series belongs to.
    pub name: String,
    /// (block time in Unix milliseconds, balance) points, oldest first.
    pub data: Vec<(i64, Decimal)>,
}

/// Assets currently owned by any of the given addresses, ordered by
/// asset name.
pub fn owned_assets(
    store: &dyn RecordStore,
    addresses: &[String],
) -> Result<Vec<AssetRecord>> {
    if addresses.is_empty() {
        return Err(MarketError::InvalidParameter {
            name: "addresses",
            reason: "at least one address is required".to_string(),
        });
    }
    store.assets_owned_by(addresses)
}

/// Ordered balance history for each address against one asset.
///
/// Defaults: `end_ts` is the request time, `start_ts` is 30 days before
/// `end_ts`. With `normalized` unset, raw ledger quantities are returned.
pub fn balance_history(
    store: &dyn RecordStore,
    ctx: &RequestContext,
    asset: &str,
    addresses: &[String],
    normalized: bool,
    start_ts: Option<i64>,
    end_ts: Option<i64>,
) -> Result<Vec<BalanceHistory>> {
    if addresses.is_empty() {
        return Err(MarketError::InvalidParameter {
            name: "addresses",
            reason: "at least one address is required".to_string(),
        });
    }
    if store.asset(asset)?.is_none() {
        return Err(MarketError::invalid_asset(asset));
    }

    let end = end_ts.unwrap_or(ctx.now);
    let start = start_ts.unwrap_or(end - HISTORY_DEFAULT_DAYS * 86_400);
    let window = TimeWindow::between(start, end);

    let mut series = Vec::with_capacity(addresses.len());
    for address in addresses {
        let changes = store.balance_changes(address, asset, window)?;
        series.push(BalanceHistory {
            name: address.clone(),
            data: changes
                .iter()
                .map(|c| {
                    let balance = if normalized {
                        c.new_balance_normalized
                    } else {
                        Decimal::from(c.new_balance)
                    };
                    (c.block_time * 1000, balance)
                })
                .collect(),
        });
    }
    Ok(series)
}
