//! Open order types
//!
//! An order offers `give_quantity` of `give_asset` for `get_quantity` of
//! `get_asset`. The remaining quantities decrease monotonically toward zero
//! as the order matches; an order with nothing remaining is inactive. Orders
//! involving BTC additionally carry fee requirements that govern matching
//! priority.

use serde::{Deserialize, Serialize};

/// An order as reported by the ledger daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    /// Asset offered by the order creator.
    pub give_asset: String,
    /// Total raw quantity offered.
    pub give_quantity: u64,
    /// Raw quantity still unmatched on the give side.
    pub give_remaining: u64,
    /// Asset the order creator wants in return.
    pub get_asset: String,
    /// Total raw quantity wanted.
    pub get_quantity: u64,
    /// Raw quantity still unmatched on the get side.
    pub get_remaining: u64,
    /// Raw BTC fee the counterparty must provide to match (0 if not applicable).
    pub fee_required: u64,
    /// Raw BTC fee the order creator has provided (0 if not applicable).
    pub fee_provided: u64,
    /// Block at which the order was placed.
    pub block_index: u32,
    /// Block at which the order expires.
    pub expire_index: u32,
}

impl OrderRecord {
    /// Whether the order is still matchable at the given block height.
    pub fn is_open(&self, current_block: u32) -> bool {
        self.give_remaining > 0 && self.expire_index > current_block
    }
}
