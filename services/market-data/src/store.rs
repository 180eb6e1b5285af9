//! External data collaborators
//!
//! The engine derives everything from two read-only collaborators: the
//! record store (replicated trade/asset/block records) and the ledger
//! daemon (live orders, callbacks, reference-asset issuance). Both are
//! traits so requests can run against any backend; in-memory
//! implementations back the test suites.
//!
//! All query results are ordered ascending by (block_time, block_index);
//! callers slice for "newest N" views.

use std::collections::{btree_map, BTreeMap};

use types::asset::{AssetRecord, CallbackEvent};
use types::balance::BalanceChange;
use types::errors::{MarketError, Result};
use types::order::OrderRecord;
use types::trade::TradeRecord;

/// Half-open time window over block times (Unix seconds). `None` bounds are
/// unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    pub since: Option<i64>,
    pub until: Option<i64>,
}

impl TimeWindow {
    /// Everything at or after `ts`.
    pub fn since(ts: i64) -> Self {
        Self { since: Some(ts), until: None }
    }

    /// Everything between `start` and `end` inclusive.
    pub fn between(start: i64, end: i64) -> Self {
        Self { since: Some(start), until: Some(end) }
    }

    /// No bounds.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Whether `ts` falls inside the window.
    pub fn contains(&self, ts: i64) -> bool {
        self.since.map_or(true, |s| ts >= s) && self.until.map_or(true, |u| ts <= u)
    }
}

/// Read-only access to replicated ledger records.
pub trait RecordStore {
    /// Look up an asset registry entry by name.
    fn asset(&self, asset: &str) -> Result<Option<AssetRecord>>;

    /// All assets currently owned by any of the given addresses, ordered
    /// by asset name.
    fn assets_owned_by(&self, addresses: &[String]) -> Result<Vec<AssetRecord>>;

    /// Trades of a canonical pair within the window, ascending by
    /// (block_time, block_index).
    fn trades_for_pair(
        &self,
        base_asset: &str,
        quote_asset: &str,
        window: TimeWindow,
    ) -> Result<Vec<TradeRecord>>;

    /// Trades where the asset took the base side, regardless of quote.
    fn trades_as_base(&self, asset: &str, window: TimeWindow) -> Result<Vec<TradeRecord>>;

    /// Trades where the asset took the quote side, regardless of base.
    fn trades_as_quote(&self, asset: &str, window: TimeWindow) -> Result<Vec<TradeRecord>>;

    /// Block time (Unix seconds) of a processed block, if known.
    fn block_time(&self, block_index: u32) -> Result<Option<i64>>;

    /// Balance changes for one (address, asset) within the window,
    /// ascending by block time.
    fn balance_changes(
        &self,
        address: &str,
        asset: &str,
        window: TimeWindow,
    ) -> Result<Vec<BalanceChange>>;
}

/// Read-only access to the live ledger daemon.
pub trait LedgerClient {
    /// Open orders offering `give_asset` in return for `get_asset`,
    /// ascending by block_index. May still contain expired or fully
    /// matched orders; callers filter with [`OrderRecord::is_open`].
    fn open_orders(&self, give_asset: &str, get_asset: &str) -> Result<Vec<OrderRecord>>;

    /// Callback events recorded for an asset, ascending by block_index.
    fn callbacks(&self, asset: &str) -> Result<Vec<CallbackEvent>>;

    /// Total BTC coin supply at the current chain height (raw units).
    fn btc_supply(&self) -> Result<u64>;

    /// Total XCP issuance at the current chain height (raw units).
    fn xcp_supply(&self) -> Result<u64>;
}

/// Request-scoped memoization of asset registry lookups.
///
/// One cache lives for exactly one request; repeated lookups of the same
/// asset within that request hit the map instead of the store. Never
/// shared across requests.
#[derive(Debug, Default)]
pub struct AssetCache {
    entries: BTreeMap<String, AssetRecord>,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch an asset through the cache. Unknown assets fail with
    /// `InvalidAsset`.
    pub fn get(&mut self, store: &dyn RecordStore, asset: &str) -> Result<&AssetRecord> {
        match self.entries.entry(asset.to_string()) {
            btree_map::Entry::Occupied(entry) => Ok(entry.into_mut()),
            btree_map::Entry::Vacant(slot) => {
                let record = store
                    .asset(asset)?
                    .ok_or_else(|| MarketError::invalid_asset(asset))?;
                Ok(slot.insert(record))
            }
        }
    }

    /// Number of memoized entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn sort_by_block(trades: &mut [TradeRecord]) {
    trades.sort_by_key(|t| (t.block_time, t.block_index));
}

/// In-memory record store used by the test suites and reference setups.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    assets: BTreeMap<String, AssetRecord>,
    trades: Vec<TradeRecord>,
    block_times: BTreeMap<u32, i64>,
    balance_changes: Vec<BalanceChange>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_asset(&mut self, asset: AssetRecord) {
        self.assets.insert(asset.asset.clone(), asset);
    }

    pub fn insert_trade(&mut self, trade: TradeRecord) {
        self.block_times
            .entry(trade.block_index)
            .or_insert(trade.block_time);
        self.trades.push(trade);
    }

    pub fn insert_block(&mut self, block_index: u32, block_time: i64) {
        self.block_times.insert(block_index, block_time);
    }

    pub fn insert_balance_change(&mut self, change: BalanceChange) {
        self.block_times
            .entry(change.block_index)
            .or_insert(change.block_time);
        self.balance_changes.push(change);
    }
}

impl RecordStore for MemoryRecordStore {
    fn asset(&self, asset: &str) -> Result<Option<AssetRecord>> {
        Ok(self.assets.get(asset).cloned())
    }

    fn assets_owned_by(&self, addresses: &[String]) -> Result<Vec<AssetRecord>> {
        // BTreeMap iteration keeps the result ordered by asset name
        Ok(self
            .assets
            .values()
            .filter(|a| addresses.iter().any(|addr| addr == &a.owner))
            .cloned()
            .collect())
    }

    fn trades_for_pair(
        &self,
        base_asset: &str,
        quote_asset: &str,
        window: TimeWindow,
    ) -> Result<Vec<TradeRecord>> {
        let mut matched: Vec<TradeRecord> = self
            .trades
            .iter()
            .filter(|t| {
                t.base_asset == base_asset
                    && t.quote_asset == quote_asset
                    && window.contains(t.block_time)
            })
            .cloned()
            .collect();
        sort_by_block(&mut matched);
        Ok(matched)
    }

    fn trades_as_base(&self, asset: &str, window: TimeWindow) -> Result<Vec<TradeRecord>> {
        let mut matched: Vec<TradeRecord> = self
            .trades
            .iter()
            .filter(|t| t.base_asset == asset && window.contains(t.block_time))
            .cloned()
            .collect();
        sort_by_block(&mut matched);
        Ok(matched)
    }

    fn trades_as_quote(&self, asset: &str, window: TimeWindow) -> Result<Vec<TradeRecord>> {
        let mut matched: Vec<TradeRecord> = self
            .trades
            .iter()
            .filter(|t| t.quote_asset == asset && window.contains(t.block_time))
            .cloned()
            .collect();
        sort_by_block(&mut matched);
        Ok(matched)
    }

    fn block_time(&self, block_index: u32) -> Result<Option<i64>> {
        Ok(self.block_times.get(&block_index).copied())
    }

    fn balance_changes(
        &self,
        address: &str,
        asset: &str,
        window: TimeWindow,
    ) -> Result<Vec<BalanceChange>> {
        let mut matched: Vec<BalanceChange> = self
            .balance_changes
            .iter()
            .filter(|c| {
                c.address == address && c.asset == asset && window.contains(c.block_time)
            })
            .cloned()
            .collect();
        matched.sort_by_key(|c| (c.block_time, c.block_index));
        Ok(matched)
    }
}

/// In-memory ledger daemon used by the test suites.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    orders: Vec<OrderRecord>,
    callbacks: Vec<CallbackEvent>,
    btc_supply: u64,
    xcp_supply: u64,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_order(&mut self, order: OrderRecord) {
        self.orders.push(order);
    }

    pub fn insert_callback(&mut self, callback: CallbackEvent) {
        self.callbacks.push(callback);
    }

    pub fn set_btc_supply(&mut self, raw: u64) {
        self.btc_supply = raw;
    }

    pub fn set_xcp_supply(&mut self, raw: u64) {
        self.xcp_supply = raw;
    }
}

impl LedgerClient for MemoryLedger {
    fn open_orders(&self, give_asset: &str, get_asset: &str) -> Result<Vec<OrderRecord>> {
        let mut matched: Vec<OrderRecord> = self
            .orders
            .iter()
            .filter(|o| o.give_asset == give_asset && o.get_asset == get_asset)
            .cloned()
            .collect();
        matched.sort_by_key(|o| o.block_index);
        Ok(matched)
    }

    fn callbacks(&self, asset: &str) -> Result<Vec<CallbackEvent>> {
        let mut matched: Vec<CallbackEvent> = self
            .callbacks
            .iter()
            .filter(|c| c.asset == asset)
            .cloned()
            .collect();
        matched.sort_by_key(|c| c.block_index);
        Ok(matched)
    }

    fn btc_supply(&self) -> Result<u64> {
        Ok(self.btc_supply)
    }

    fn xcp_supply(&self) -> Result<u64> {
        Ok(self.xcp_supply)
    }
}
