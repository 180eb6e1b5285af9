//! Error types for the market analytics engine
//!
//! One taxonomy shared by all derivation components. Valid absence of data
//! (e.g. no trades in a window) is expressed with `Option`/empty collections
//! by the components themselves and is never an error.

use std::fmt;

/// Top-level analytics error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    InvalidAsset { asset: String },

    InvalidPair { asset1: String, asset2: String },

    InvalidParameter { name: &'static str, reason: String },

    DataIntegrityFault {
        asset: String,
        at_block: u32,
        reason: String,
    },

    Upstream { source: &'static str, reason: String },
}

impl fmt::Display for MarketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketError::InvalidAsset { asset } => write!(f, "invalid asset: {asset}"),
            MarketError::InvalidPair { asset1, asset2 } => {
                write!(f, "invalid pair: {asset1}/{asset2}")
            }
            MarketError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter {name}: {reason}")
            }
            MarketError::DataIntegrityFault {
                asset,
                at_block,
                reason,
            } => write!(
                f,
                "data integrity fault for {asset} at block {at_block}: {reason}"
            ),
            MarketError::Upstream { source, reason } => {
                write!(f, "upstream {source} unavailable: {reason}")
            }
        }
    }
}

impl std::error::Error for MarketError {}

impl MarketError {
    /// Convenience constructor for unknown-asset failures.
    pub fn invalid_asset(asset: impl Into<String>) -> Self {
        MarketError::InvalidAsset { asset: asset.into() }
    }
}

/// Result alias used throughout the engine.
pub type Result<T> = std::result::Result<T, MarketError>;
