//! Canonical asset pair ordering
//!
//! Every pair-based derivation keys its data on a single deterministic
//! (base, quote) assignment, so that trades between two assets land in one
//! market regardless of which side a caller names first.
//!
//! Priority rule: XCP always takes the base side, then BTC, and for all
//! other pairs the lexicographically smaller asset is the base. The rule is
//! symmetric by construction: `canonical(a, b) == canonical(b, a)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The protocol-native reference asset. Always the base of any pair it is in.
pub const XCP: &str = "XCP";

/// The chain-native reference asset. Base of any pair not involving XCP.
pub const BTC: &str = "BTC";

/// A canonically ordered (base, quote) asset pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetPair {
    pub base_asset: String,
    pub quote_asset: String,
}

impl AssetPair {
    /// Canonically order two assets into a (base, quote) pair.
    ///
    /// The assignment is independent of argument order.
    pub fn canonical(asset1: &str, asset2: &str) -> Self {
        let (base, quote) = if asset1 == XCP || asset2 == XCP {
            if asset1 == XCP {
                (asset1, asset2)
            } else {
                (asset2, asset1)
            }
        } else if asset1 == BTC || asset2 == BTC {
            if asset1 == BTC {
                (asset1, asset2)
            } else {
                (asset2, asset1)
            }
        } else if asset1 < asset2 {
            (asset1, asset2)
        } else {
            (asset2, asset1)
        };
        Self {
            base_asset: base.to_string(),
            quote_asset: quote.to_string(),
        }
    }

    /// Display name in `BASE/QUOTE` form.
    pub fn pair_name(&self) -> String {
        format!("{}/{}", self.base_asset, self.quote_asset)
    }

    /// Whether this is the XCP/BTC reference cross.
    ///
    /// BTC/XCP is the one ordering the canonical rule cannot produce; data
    /// for that direction is always derived by inverting this pair.
    pub fn is_reference_cross(&self) -> bool {
        self.base_asset == XCP && self.quote_asset == BTC
    }
}

impl fmt::Display for AssetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base_asset, self.quote_asset)
    }
}
