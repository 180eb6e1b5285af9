//! Asset registry records
//!
//! Every tracked asset carries its current state plus an append-only,
//! block-ordered log of prior snapshots. Each snapshot is tagged with the
//! kind of change that produced it; the first snapshot of any asset is
//! always tagged `Created`. Callback events are recorded out-of-band by the
//! ledger daemon and are not part of the snapshot log.

use crate::numeric::normalize_quantity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The kind of change a snapshot records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Initial issuance of the asset.
    Created,
    /// Additional supply issued.
    IssuedMore,
    /// Description text changed.
    ChangedDescription,
    /// Issuance locked.
    Locked,
    /// Ownership transferred to a new address.
    Transferred,
}

/// One entry in an asset's change log: the full asset state as of a block,
/// tagged with the change that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    /// The change that produced this state.
    pub change_type: ChangeType,
    /// Block at which the change applied.
    pub at_block: u32,
    /// Block time (Unix seconds).
    pub at_block_time: i64,
    /// Owning address as of this snapshot.
    pub owner: String,
    /// Description text as of this snapshot.
    pub description: String,
    /// Whether quantities are fractional (1e8 raw units per whole unit).
    pub divisible: bool,
    /// Whether further issuance is locked.
    pub locked: bool,
    /// Total raw quantity issued as of this snapshot.
    pub total_issued: u64,
    /// Total issued, scaled for divisibility.
    pub total_issued_normalized: Decimal,
}

/// A tracked asset: current state plus its block-ordered snapshot history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    /// Unique asset name.
    pub asset: String,
    /// Current owning address.
    pub owner: String,
    /// Current description text.
    pub description: String,
    /// Whether quantities are fractional.
    pub divisible: bool,
    /// Whether further issuance is locked.
    pub locked: bool,
    /// Current total raw quantity issued.
    pub total_issued: u64,
    /// Current total issued, scaled for divisibility.
    pub total_issued_normalized: Decimal,
    /// The change that produced the current state.
    pub change_type: ChangeType,
    /// Block at which the current state applied.
    pub at_block: u32,
    /// Block time of the current state (Unix seconds).
    pub at_block_time: i64,
    /// Prior snapshots, oldest first. Empty for a freshly created asset.
    pub history: Vec<AssetSnapshot>,
}

impl AssetRecord {
    /// Project the current state as a snapshot, for appending to the
    /// history when replaying the full change log.
    pub fn current_snapshot(&self) -> AssetSnapshot {
        AssetSnapshot {
            change_type: self.change_type,
            at_block: self.at_block,
            at_block_time: self.at_block_time,
            owner: self.owner.clone(),
            description: self.description.clone(),
            divisible: self.divisible,
            locked: self.locked,
            total_issued: self.total_issued,
            total_issued_normalized: self.total_issued_normalized,
        }
    }

    /// Normalize a raw quantity of this asset.
    pub fn normalize(&self, raw: u64) -> Decimal {
        normalize_quantity(raw, self.divisible)
    }
}

/// An out-of-band proportional supply reduction reported by the ledger
/// daemon. `fraction` is in (0, 1].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEvent {
    /// Asset the callback applies to.
    pub asset: String,
    /// Fraction of outstanding supply called back.
    pub fraction: Decimal,
    /// Block at which the callback applied.
    pub block_index: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_asset() -> AssetRecord {
        AssetRecord {
            asset: "GOLD".to_string(),
            owner: "1OwnerAddress".to_string(),
            description: "Digital gold".to_string(),
            divisible: true,
            locked: false,
            total_issued: 1_000_000_000,
            total_issued_normalized: Decimal::from(10),
            change_type: ChangeType::Created,
            at_block: 300_000,
            at_block_time: 1_400_000_000,
            history: Vec::new(),
        }
    }

    #[test]
    fn test_current_snapshot_projection() {
        let asset = sample_asset();
        let snap = asset.current_snapshot();
        assert_eq!(snap.change_type, ChangeType::Created);
        assert_eq!(snap.owner, asset.owner);
        assert_eq!(snap.total_issued, asset.total_issued);
    }

    #[test]
    fn test_normalize_uses_divisibility() {
        let mut asset = sample_asset();
        assert_eq!(asset.normalize(150_000_000), Decimal::from_str_exact("1.5").unwrap());

        asset.divisible = false;
        assert_eq!(asset.normalize(150_000_000), Decimal::from(150_000_000));
    }

    #[test]
    fn test_change_type_serialization() {
        let json = serde_json::to_string(&ChangeType::IssuedMore).unwrap();
        assert_eq!(json, "\"issued_more\"");
        let json = serde_json::to_string(&ChangeType::ChangedDescription).unwrap();
        assert_eq!(json, "\"changed_description\"");
    }

    #[test]
    fn test_asset_serialization_roundtrip() {
        let asset = sample_asset();
        let json = serde_json::to_string(&asset).unwrap();
        let deserialized: AssetRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(asset, deserialized);
    }
}
