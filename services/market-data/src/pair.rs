//! Validated pair canonicalization
//!
//! Wraps the pure ordering rule from `types::pair` with asset registry
//! validation: both assets must exist and must differ.

use serde::{Deserialize, Serialize};

use types::errors::{MarketError, Result};
use types::pair::AssetPair;

use crate::store::{AssetCache, RecordStore};

/// The canonical assignment for a requested pair, with divisibility info
/// needed by the pair-based derivations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairInfo {
    pub base_asset: String,
    pub quote_asset: String,
    pub pair_name: String,
    pub base_divisible: bool,
    pub quote_divisible: bool,
}

/// Canonicalize two arbitrary asset names into a validated (base, quote)
/// assignment.
///
/// Fails with `InvalidPair` when both names are the same and with
/// `InvalidAsset` when either is unknown to the registry.
pub fn canonical_pair(
    store: &dyn RecordStore,
    cache: &mut AssetCache,
    asset1: &str,
    asset2: &str,
) -> Result<PairInfo> {
    if asset1 == asset2 {
        return Err(MarketError::InvalidPair {
            asset1: asset1.to_string(),
            asset2: asset2.to_string(),
        });
    }

    let pair = AssetPair::canonical(asset1, asset2);
    let base_divisible = cache.get(store, &pair.base_asset)?.divisible;
    let quote_divisible = cache.get(store, &pair.quote_asset)?.divisible;

    Ok(PairInfo {
        pair_name: pair.pair_name(),
        base_asset: pair.base_asset,
        quote_asset: pair.quote_asset,
        base_divisible,
        quote_divisible,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use rust_decimal::Decimal;
    use types::asset::{AssetRecord, ChangeType};

    fn asset(name: &str, divisible: bool) -> AssetRecord {
        AssetRecord {
            asset: name.to_string(),
            owner: "addr1".to_string(),
            description: String::new(),
            divisible,
            locked: false,
            total_issued: 1_000_000_000,
            total_issued_normalized: Decimal::from(10),
            change_type: ChangeType::Created,
            at_block: 300_000,
            at_block_time: 1_400_000_000,
            history: Vec::new(),
        }
    }

    fn store_with(names: &[(&str, bool)]) -> MemoryRecordStore {
        let mut store = MemoryRecordStore::new();
        for (name, divisible) in names {
            store.insert_asset(asset(name, *divisible));
        }
        store
    }

    #[test]
    fn test_canonical_pair_orders_and_names() {
        let store = store_with(&[("XCP", true), ("GOLD", false)]);
        let mut cache = AssetCache::new();

        let info = canonical_pair(&store, &mut cache, "GOLD", "XCP").unwrap();
        assert_eq!(info.base_asset, "XCP");
        assert_eq!(info.quote_asset, "GOLD");
        assert_eq!(info.pair_name, "XCP/GOLD");
        assert!(info.base_divisible);
        assert!(!info.quote_divisible);
    }

    #[test]
    fn test_symmetric_result() {
        let store = store_with(&[("ALPHA", true), ("ZULU", true)]);
        let mut cache = AssetCache::new();
        let a = canonical_pair(&store, &mut cache, "ALPHA", "ZULU").unwrap();
        let b = canonical_pair(&store, &mut cache, "ZULU", "ALPHA").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_asset_rejected() {
        let store = store_with(&[("XCP", true)]);
        let mut cache = AssetCache::new();
        let err = canonical_pair(&store, &mut cache, "XCP", "GHOST").unwrap_err();
        assert_eq!(err, MarketError::invalid_asset("GHOST"));
    }

    #[test]
    fn test_same_asset_rejected() {
        let store = store_with(&[("XCP", true)]);
        let mut cache = AssetCache::new();
        let err = canonical_pair(&store, &mut cache, "XCP", "XCP").unwrap_err();
        assert!(matches!(err, MarketError::InvalidPair { .. }));
    }
}
