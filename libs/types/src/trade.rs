//! Recorded trade types
//!
//! A trade is immutable once recorded by the ledger follower. Quantities are
//! stored both raw and normalized; `unit_price` is quote-per-base under the
//! canonical pair ordering.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single recorded trade between two assets, canonically ordered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    /// Canonical base asset of the traded pair.
    pub base_asset: String,
    /// Canonical quote asset of the traded pair.
    pub quote_asset: String,
    /// Price in quote units per base unit (quote_quantity / base_quantity).
    pub unit_price: Decimal,
    /// Raw base quantity in ledger units.
    pub base_quantity: u64,
    /// Raw quote quantity in ledger units.
    pub quote_quantity: u64,
    /// Base quantity scaled for divisibility.
    pub base_quantity_normalized: Decimal,
    /// Quote quantity scaled for divisibility.
    pub quote_quantity_normalized: Decimal,
    /// Block at which the trade settled.
    pub block_index: u32,
    /// Block time (Unix seconds).
    pub block_time: i64,
}

/// Compact trade representation returned alongside a synthesized price:
/// `[block_time, unit_price, base_quantity_normalized,
/// quote_quantity_normalized, block_index]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastTrade(pub i64, pub Decimal, pub Decimal, pub Decimal, pub u32);

impl From<&TradeRecord> for LastTrade {
    fn from(t: &TradeRecord) -> Self {
        LastTrade(
            t.block_time,
            t.unit_price,
            t.base_quantity_normalized,
            t.quote_quantity_normalized,
            t.block_index,
        )
    }
}
