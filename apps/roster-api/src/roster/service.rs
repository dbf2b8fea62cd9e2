//! The roster pipeline: store → normalizer → hub.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::gateway::hub::BroadcastHub;

use super::normalize::Normalizer;
use super::record::RosterSnapshot;
use super::store::{Delta, DeltaOutcome, RosterStore};

/// Owns the store and publishes a fresh snapshot whenever a delta changes
/// what viewers would see.
///
/// Constructed explicitly and shared through `AppState`; independent
/// instances don't share anything.
pub struct Roster {
    store: RosterStore,
    normalizer: Normalizer,
    hub: Arc<BroadcastHub>,
    /// Last published snapshot. Held across apply + publish so deltas are
    /// strictly serial.
    published: Mutex<RosterSnapshot>,
}

impl Roster {
    pub fn new(normalizer: Normalizer, hub: Arc<BroadcastHub>) -> Self {
        Self {
            store: RosterStore::new(),
            normalizer,
            hub,
            published: Mutex::new(RosterSnapshot::default()),
        }
    }

    pub fn apply(&self, delta: Delta) -> DeltaOutcome {
        let mut published = self.published.lock();

        let outcome = self.store.apply_delta(delta);
        if outcome != DeltaOutcome::Changed {
            return outcome;
        }

        let snapshot = self.normalizer.normalize(&self.store.current_records());
        if snapshot == *published {
            // e.g. a query client joined: store changed, view didn't.
            tracing::debug!("store changed without visible roster change");
            return outcome;
        }

        *published = snapshot.clone();
        let delivered = self.hub.on_roster_changed(snapshot);
        tracing::debug!(
            delivered,
            clients = published.len(),
            "roster change pushed"
        );
        outcome
    }

    /// Normalized view of the current store contents.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.normalizer.normalize(&self.store.current_records())
    }

    /// Raw records held, including hidden ones.
    pub fn store_len(&self) -> usize {
        self.store.len()
    }

    pub fn hub(&self) -> &Arc<BroadcastHub> {
        &self.hub
    }
}
