//! The authoritative set of connected clients.

use std::collections::BTreeMap;

use parking_lot::Mutex;

use super::record::{ClientId, ClientRecord, ClientUpdate};

/// A single change to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delta {
    /// Insert or overwrite (last writer wins).
    Add(ClientRecord),
    Update(ClientId, ClientUpdate),
    Remove(ClientId),
    /// Drop everything, used when the upstream link goes away.
    ClearAll,
}

/// What applying a [`Delta`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaOutcome {
    Changed,
    Unchanged,
    /// An update addressed a `clid` the store doesn't hold.
    UnknownClient,
}

/// Clients keyed by `clid`.
///
/// Every delta runs under one lock, so readers either see the store before a
/// delta or after it, never half of one. A `BTreeMap` keeps iteration order a
/// function of the contents alone.
#[derive(Debug, Default)]
pub struct RosterStore {
    clients: Mutex<BTreeMap<ClientId, ClientRecord>>,
}

impl RosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_delta(&self, delta: Delta) -> DeltaOutcome {
        let mut clients = self.clients.lock();

        match delta {
            Delta::Add(mut record) => {
                record.strip_reserved();
                match clients.get(&record.clid) {
                    Some(existing) if *existing == record => DeltaOutcome::Unchanged,
                    _ => {
                        clients.insert(record.clid.clone(), record);
                        DeltaOutcome::Changed
                    }
                }
            }
            Delta::Update(clid, update) => match clients.get_mut(&clid) {
                Some(record) => {
                    if update.apply_to(record) {
                        DeltaOutcome::Changed
                    } else {
                        DeltaOutcome::Unchanged
                    }
                }
                None => {
                    tracing::warn!(%clid, "update for unknown client ignored");
                    DeltaOutcome::UnknownClient
                }
            },
            Delta::Remove(clid) => {
                if clients.remove(&clid).is_some() {
                    DeltaOutcome::Changed
                } else {
                    tracing::debug!(%clid, "remove for unknown client ignored");
                    DeltaOutcome::Unchanged
                }
            }
            Delta::ClearAll => {
                if clients.is_empty() {
                    DeltaOutcome::Unchanged
                } else {
                    let dropped = clients.len();
                    clients.clear();
                    tracing::info!(dropped, "roster cleared");
                    DeltaOutcome::Changed
                }
            }
        }
    }

    /// Point-in-time copy of every record, ordered by `clid`.
    pub fn current_records(&self) -> Vec<ClientRecord> {
        self.clients.lock().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.lock().is_empty()
    }
}
