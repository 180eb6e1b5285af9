//! Fixed-precision decimal helpers
//!
//! Uses rust_decimal for deterministic arithmetic (no floating-point errors).
//! Every derived monetary value in the engine passes through [`round8`]
//! before being returned: 8 fractional digits, round-half-to-even.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of fractional digits carried by every derived monetary value.
pub const MONETARY_SCALE: u32 = 8;

/// Raw ledger units per whole unit of a divisible asset.
pub const DIVISIBLE_UNIT: u64 = 100_000_000;

/// Round a derived monetary value to 8 fractional digits, half-to-even.
///
/// This is the single rounding point for the engine: prices, quantities,
/// spreads, depths, caps and percentages are all quantized here.
pub fn round8(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONETARY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Invert a price (1 / value), rounded to monetary scale.
///
/// Returns `None` for zero, which has no meaningful inverse.
pub fn invert(value: Decimal) -> Option<Decimal> {
    Decimal::ONE.checked_div(value).map(round8)
}

/// Scale a raw ledger quantity down to a human-scale decimal.
///
/// Divisible assets carry quantities in 1/100_000_000 units; indivisible
/// assets are whole counts and pass through unchanged.
pub fn normalize_quantity(raw: u64, divisible: bool) -> Decimal {
    if divisible {
        Decimal::from_i128_with_scale(raw as i128, MONETARY_SCALE).normalize()
    } else {
        Decimal::from(raw)
    }
}

/// Scale a normalized quantity of a divisible asset back to raw ledger units.
///
/// Returns `None` if the quantity is negative or too large for a raw amount.
pub fn denormalize_quantity(normalized: Decimal) -> Option<u64> {
    (normalized * Decimal::from(DIVISIBLE_UNIT))
        .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
        .to_u64()
}

/// Signed percentage change from `open` to `close`: 100 * (close - open) / open.
///
/// Returns `None` when `open` is zero.
pub fn price_change(open: Decimal, close: Decimal) -> Option<Decimal> {
    (Decimal::ONE_HUNDRED * (close - open))
        .checked_div(open)
        .map(round8)
}
