//! Per-connection viewer session state.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use roster_common::id::{self, prefix};
use tokio::sync::mpsc;

use super::events::Dispatch;
use super::hub::BroadcastHub;

/// Why a push to one viewer was not enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PushError {
    /// The viewer is not draining its queue fast enough. It stays registered
    /// and resyncs from the latest state once its writer catches up.
    #[error("outbound queue full")]
    QueueFull,
    /// The writer task is gone (socket closed or errored).
    #[error("session closed")]
    Closed,
}

/// A live subscriber on `/clients`.
///
/// Holds the sending half of the session's outbound queue. The receiving half
/// ([`ViewerFeed`]) is drained by a writer task (see
/// [`super::transport::drain`]), so pushing never waits on the network.
#[derive(Debug)]
pub struct ViewerSession {
    /// Unique session identifier (`vw_` prefixed ULID).
    pub session_id: String,
    pub connected_at: DateTime<Utc>,
    outbound: mpsc::Sender<Arc<Dispatch>>,
    lagged: Arc<AtomicBool>,
}

/// Receiving half of a session's queue.
#[derive(Debug)]
pub struct ViewerFeed {
    rx: mpsc::Receiver<Arc<Dispatch>>,
    lagged: Arc<AtomicBool>,
    pending: VecDeque<Arc<Dispatch>>,
}

impl ViewerSession {
    /// Create a session with a bounded outbound queue. The queue always has
    /// room for the link state and roster pushed on connect.
    pub fn open(capacity: usize) -> (Self, ViewerFeed) {
        let (outbound, rx) = mpsc::channel(capacity.max(2));
        let lagged = Arc::new(AtomicBool::new(false));
        let session = Self {
            session_id: id::prefixed_ulid(prefix::VIEWER),
            connected_at: Utc::now(),
            outbound,
            lagged: Arc::clone(&lagged),
        };
        let feed = ViewerFeed {
            rx,
            lagged,
            pending: VecDeque::new(),
        };
        (session, feed)
    }

    /// Enqueue a push without waiting. A full queue flags the session as
    /// lagging instead of dropping it.
    pub fn push(&self, dispatch: &Arc<Dispatch>) -> Result<(), PushError> {
        match self.outbound.try_send(Arc::clone(dispatch)) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => {
                if !self.lagged.swap(true, Ordering::AcqRel) {
                    tracing::debug!(session_id = %self.session_id, "viewer lagging, will resync");
                }
                Err(PushError::QueueFull)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(PushError::Closed),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }

    pub fn is_lagging(&self) -> bool {
        self.lagged.load(Ordering::Acquire)
    }
}

impl ViewerFeed {
    /// Next dispatch to write, or `None` once the hub dropped the session.
    ///
    /// After the queue overflowed, everything still queued is stale: it is
    /// discarded and the hub's latest link state and roster are delivered
    /// instead.
    pub async fn recv(&mut self, hub: &BroadcastHub) -> Option<Arc<Dispatch>> {
        loop {
            if let Some(dispatch) = self.pending.pop_front() {
                return Some(dispatch);
            }
            if self.lagged.load(Ordering::Acquire) {
                self.resync(hub);
                continue;
            }
            return self.rx.recv().await;
        }
    }

    fn resync(&mut self, hub: &BroadcastHub) {
        let (link, clients) = hub.with_latest(|link, snapshot| {
            // Fan-out holds the same lock, so nothing lands between the
            // purge and the read.
            let mut skipped = 0usize;
            while self.rx.try_recv().is_ok() {
                skipped += 1;
            }
            self.lagged.store(false, Ordering::Release);
            tracing::debug!(skipped, "viewer resynced to latest state");
            (link.clone(), snapshot.clone())
        });
        self.pending.push_back(Arc::new(Dispatch::Link(link)));
        self.pending.push_back(Arc::new(Dispatch::Clients(clients)));
    }

    #[cfg(test)]
    pub(crate) fn try_recv(&mut self) -> Result<Arc<Dispatch>, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }
}
