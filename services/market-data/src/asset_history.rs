//! Asset lifecycle reconstruction
//!
//! Replays an asset's snapshot log into a typed, block-ordered event
//! timeline. Each snapshot after the first is diffed against its
//! predecessor and must agree with its declared change tag; any
//! disagreement is a data-integrity fault and aborts the reconstruction
//! rather than emitting a wrong event.
//!
//! Callback events live outside the snapshot log and are merged in by
//! block position during replay.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use types::asset::{AssetSnapshot, ChangeType};
use types::errors::{MarketError, Result};
use types::numeric::round8;

use crate::store::{LedgerClient, RecordStore};

/// The change one timeline event records, with the fields that change
/// carries and nothing else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetChange {
    Created {
        owner: String,
        description: String,
        divisible: bool,
        locked: bool,
        total_issued: u64,
        total_issued_normalized: Decimal,
    },
    IssuedMore {
        additional: u64,
        additional_normalized: Decimal,
        total_issued: u64,
        total_issued_normalized: Decimal,
    },
    ChangedDescription {
        prev_description: String,
        new_description: String,
    },
    Locked,
    Transferred {
        prev_owner: String,
        new_owner: String,
    },
    CalledBack {
        /// Percentage of outstanding supply called back (0, 100].
        percentage: Decimal,
    },
}

/// One event in an asset's reconstructed timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetEvent {
    /// Block at which the change took effect.
    pub at_block: u32,
    /// Block time of that block (Unix milliseconds).
    pub at_block_time_ms: i64,
    #[serde(flatten)]
    pub change: AssetChange,
}

/// Replay an asset's full change history, oldest to newest (or reversed
/// on request).
pub fn asset_history(
    store: &dyn RecordStore,
    ledger: &dyn LedgerClient,
    asset: &str,
    reverse: bool,
) -> Result<Vec<AssetEvent>> {
    let record = store
        .asset(asset)?
        .ok_or_else(|| MarketError::invalid_asset(asset))?;

    // The current state is the implicit final entry of the log
    let mut snapshots = record.history.clone();
    snapshots.push(record.current_snapshot());

    let mut events = Vec::with_capacity(snapshots.len());
    let mut prev: Option<&AssetSnapshot> = None;
    for snapshot in &snapshots {
        let event = match prev {
            None => creation_event(asset, snapshot)?,
            Some(prev) => diff_event(asset, prev, snapshot)?,
        };
        events.push(event);
        prev = Some(snapshot);
    }

    // Merge out-of-band callbacks by block position
    let callbacks = ledger.callbacks(asset)?;
    let mut timeline = Vec::with_capacity(events.len() + callbacks.len());
    let mut callbacks = callbacks.into_iter().peekable();
    for event in events {
        // Splice preceding callbacks in ahead of this event
        while let Some(callback) = callbacks.next_if(|c| c.block_index < event.at_block) {
            timeline.push(callback_event(store, &callback)?);
        }
        timeline.push(event);
    }
    for callback in callbacks {
        timeline.push(callback_event(store, &callback)?);
    }

    debug!(asset, events = timeline.len(), "reconstructed asset history");

    if reverse {
        timeline.reverse();
    }
    Ok(timeline)
}

fn creation_event(asset: &str, snapshot: &AssetSnapshot) -> Result<AssetEvent> {
    if snapshot.change_type != ChangeType::Created {
        return Err(MarketError::DataIntegrityFault {
            asset: asset.to_string(),
            at_block: snapshot.at_block,
            reason: "first snapshot is not tagged created".to_string(),
        });
    }
    Ok(AssetEvent {
        at_block: snapshot.at_block,
        at_block_time_ms: snapshot.at_block_time * 1000,
        change: AssetChange::Created {
            owner: snapshot.owner.clone(),
            description: snapshot.description.clone(),
            divisible: snapshot.divisible,
            locked: snapshot.locked,
            total_issued: snapshot.total_issued,
            total_issued_normalized: snapshot.total_issued_normalized,
        },
    })
}

/// Diff a snapshot against its predecessor and check the result against
/// the snapshot's declared tag.
fn diff_event(asset: &str, prev: &AssetSnapshot, cur: &AssetSnapshot) -> Result<AssetEvent> {
    let fault = |reason: String| MarketError::DataIntegrityFault {
        asset: asset.to_string(),
        at_block: cur.at_block,
        reason,
    };

    let change = match cur.change_type {
        ChangeType::Locked => {
            if prev.locked == cur.locked {
                return Err(fault("tagged locked but the locked flag did not change".into()));
            }
            AssetChange::Locked
        }
        ChangeType::Transferred => {
            if prev.owner == cur.owner {
                return Err(fault("tagged transferred but the owner did not change".into()));
            }
            AssetChange::Transferred {
                prev_owner: prev.owner.clone(),
                new_owner: cur.owner.clone(),
            }
        }
        ChangeType::ChangedDescription => {
            if prev.description == cur.description {
                return Err(fault(
                    "tagged changed_description but the description did not change".into(),
                ));
            }
            AssetChange::ChangedDescription {
                prev_description: prev.description.clone(),
                new_description: cur.description.clone(),
            }
        }
        ChangeType::IssuedMore => {
            if cur.total_issued <= prev.total_issued {
                return Err(fault(
                    "tagged issued_more but total issuance did not increase".into(),
                ));
            }
            AssetChange::IssuedMore {
                additional: cur.total_issued - prev.total_issued,
                additional_normalized: cur.total_issued_normalized
                    - prev.total_issued_normalized,
                total_issued: cur.total_issued,
                total_issued_normalized: cur.total_issued_normalized,
            }
        }
        ChangeType::Created => {
            return Err(fault("created snapshot after the first entry".into()));
        }
    };

    Ok(AssetEvent {
        at_block: cur.at_block,
        at_block_time_ms: cur.at_block_time * 1000,
        change,
    })
}

fn callback_event(
    store: &dyn RecordStore,
    callback: &types::asset::CallbackEvent,
) -> Result<AssetEvent> {
    let block_time = store.block_time(callback.block_index)?.ok_or_else(|| {
        MarketError::Upstream {
            source: "record store",
            reason: format!("no block time for block {}", callback.block_index),
        }
    })?;
    Ok(AssetEvent {
        at_block: callback.block_index,
        at_block_time_ms: block_time * 1000,
        change: AssetChange::CalledBack {
            percentage: round8(callback.fraction * Decimal::ONE_HUNDRED),
        },
    })
}
