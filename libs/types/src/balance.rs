//! Balance change records
//!
//! The ledger follower records every balance movement per (address, asset)
//! as a new absolute balance at a block. The analytics engine only reads
//! these to assemble per-address balance series.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A recorded balance change for one address and asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    /// Address whose balance changed.
    pub address: String,
    /// Asset the balance is denominated in.
    pub asset: String,
    /// Block at which the change applied.
    pub block_index: u32,
    /// Block time (Unix seconds).
    pub block_time: i64,
    /// New absolute raw balance after the change.
    pub new_balance: u64,
    /// New absolute balance, scaled for divisibility.
    pub new_balance_normalized: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_roundtrip() {
        let change = BalanceChange {
            address: "1SomeAddress".to_string(),
            asset: "GOLD".to_string(),
            block_index: 310_000,
            block_time: 1_400_000_000,
            new_balance: 250_000_000,
            new_balance_normalized: Decimal::from_str_exact("2.5").unwrap(),
        };
        let json = serde_json::to_string(&change).unwrap();
        let deserialized: BalanceChange = serde_json::from_str(&json).unwrap();
        assert_eq!(change, deserialized);
    }
}
