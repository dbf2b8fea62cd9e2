//! Broadcast hub for pushing roster and link state to connected viewers.
//!
//! Each session owns a bounded queue; the hub only enqueues. A session whose
//! queue is closed is dropped on the spot and the rest still get the push. A
//! session whose queue is full stays registered and catches up from the
//! latest state (see [`ViewerFeed::recv`](super::session::ViewerFeed::recv)).
//! Registration and fan-out run under one lock, so a new viewer always starts
//! from the latest state and never sees an older snapshot after a newer one.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::roster::RosterSnapshot;
use crate::upstream::LinkStatus;

use super::events::Dispatch;
use super::session::{PushError, ViewerSession};

/// Last state pushed, replayed to every new viewer.
struct Latest {
    snapshot: RosterSnapshot,
    link: LinkStatus,
}

pub struct BroadcastHub {
    sessions: DashMap<String, ViewerSession>,
    latest: Mutex<Latest>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            latest: Mutex::new(Latest {
                snapshot: RosterSnapshot::default(),
                link: LinkStatus::disconnected(),
            }),
        }
    }

    /// Register a viewer and push the current link state and roster to it
    /// alone. The session is not registered if those pushes fail.
    pub fn on_viewer_connect(&self, session: ViewerSession) -> Result<(), PushError> {
        let latest = self.latest.lock();

        session.push(&Arc::new(Dispatch::Link(latest.link.clone())))?;
        session.push(&Arc::new(Dispatch::Clients(latest.snapshot.clone())))?;

        let session_id = session.session_id.clone();
        self.sessions.insert(session_id.clone(), session);

        tracing::info!(
            %session_id,
            viewers = self.sessions.len(),
            clients = latest.snapshot.len(),
            "viewer registered"
        );
        Ok(())
    }

    /// Deregister a viewer. Returns whether it was still registered.
    pub fn on_viewer_disconnect(&self, session_id: &str) -> bool {
        let removed = self.sessions.remove(session_id).is_some();
        if removed {
            tracing::info!(%session_id, viewers = self.sessions.len(), "viewer deregistered");
        }
        removed
    }

    /// Push a new roster to every viewer. Returns how many accepted it.
    pub fn on_roster_changed(&self, snapshot: RosterSnapshot) -> usize {
        let mut latest = self.latest.lock();
        latest.snapshot = snapshot.clone();
        self.fan_out(Arc::new(Dispatch::Clients(snapshot)))
    }

    /// Push a new upstream link state to every viewer.
    pub fn on_link_state(&self, status: LinkStatus) -> usize {
        let mut latest = self.latest.lock();
        latest.link = status.clone();
        self.fan_out(Arc::new(Dispatch::Link(status)))
    }

    /// Callers hold `latest`.
    fn fan_out(&self, dispatch: Arc<Dispatch>) -> usize {
        let mut delivered = 0;
        let mut lagging = 0;
        let mut closed: Vec<String> = Vec::new();

        for entry in self.sessions.iter() {
            match entry.value().push(&dispatch) {
                Ok(()) => delivered += 1,
                Err(PushError::QueueFull) => lagging += 1,
                Err(PushError::Closed) => closed.push(entry.key().clone()),
            }
        }

        for session_id in closed {
            if self.sessions.remove(&session_id).is_some() {
                tracing::warn!(
                    %session_id,
                    event = dispatch.event_name(),
                    "push failed, viewer dropped"
                );
            }
        }

        if lagging > 0 {
            tracing::debug!(lagging, event = dispatch.event_name(), "viewers behind, push coalesced");
        }

        delivered
    }

    /// Run `f` against the latest link state and roster with fan-out paused.
    pub(crate) fn with_latest<R>(&self, f: impl FnOnce(&LinkStatus, &RosterSnapshot) -> R) -> R {
        let latest = self.latest.lock();
        f(&latest.link, &latest.snapshot)
    }

    pub fn viewer_count(&self) -> usize {
        self.sessions.len()
    }

    /// The roster most recently pushed.
    pub fn snapshot(&self) -> RosterSnapshot {
        self.latest.lock().snapshot.clone()
    }

    /// The link state most recently pushed.
    pub fn link_status(&self) -> LinkStatus {
        self.latest.lock().link.clone()
    }
}
