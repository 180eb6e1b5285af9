//! Market Analytics Service
//!
//! Derives read-only market views from replicated ledger records and the
//! live ledger daemon:
//! - Synthesized market prices from weighted recent trades
//! - OHLC/volume rollups (whole-window, hour-grain, block-grain)
//! - Fee-aware order books with per-level depth
//! - Per-asset market snapshots (price, cap, 24h change, 7d history)
//! - Typed asset lifecycle timelines replayed from snapshot logs
//! - Trade history and per-address balance series
//!
//! # Architecture
//!
//! ```text
//!        RecordStore / LedgerClient (traits)
//!                      │
//!              ┌───────▼───────┐
//!              │ pair (canon)  │
//!              └───────┬───────┘
//!          ┌───────────┼─────────────┐
//!          │           │             │
//!      ┌───▼───┐   ┌───▼───┐   ┌─────▼─────┐
//!      │ price │   │ ohlc  │   │order_book │
//!      └───┬───┘   └───┬───┘   └───────────┘
//!          │           │
//!      ┌───▼───────────▼───┐   ┌───────────────┐
//!      │    market_info    │   │ asset_history │
//!      └───────────────────┘   └───────────────┘
//! ```
//!
//! Every request runs synchronously, reads only, and carries an explicit
//! [`context::RequestContext`] instead of ambient process state.

pub mod asset_history;
pub mod balances;
pub mod context;
pub mod market_info;
pub mod ohlc;
pub mod order_book;
pub mod pair;
pub mod price;
pub mod store;
pub mod trades;

// Library version
pub const SERVICE_VERSION: &str = "0.1.0";
