pub mod config;
pub mod error;
pub mod gateway;
pub mod roster;
pub mod routes;
pub mod upstream;

use std::sync::Arc;

use tokio::sync::mpsc;

use config::Config;
use gateway::hub::BroadcastHub;
use roster::{Normalizer, Roster};
use upstream::{UpstreamAdapter, UpstreamEvent, UpstreamHandle};

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub roster: Arc<Roster>,
    pub upstream: UpstreamHandle,
}

impl AppState {
    /// Wire a fresh roster pipeline.
    ///
    /// The returned adapter must be driven with [`UpstreamAdapter::run`] on the
    /// returned receiver for upstream events to reach viewers.
    pub fn new(config: Config) -> (Self, UpstreamAdapter, mpsc::Receiver<UpstreamEvent>) {
        let normalizer = Normalizer::new(config.collator()).with_admin_name(&config.admin_name);
        let roster = Arc::new(Roster::new(normalizer, Arc::new(BroadcastHub::new())));

        let (events_tx, events_rx) = mpsc::channel(config.upstream_queue_capacity);
        let adapter = UpstreamAdapter::new(Arc::clone(&roster));

        let state = AppState {
            config: Arc::new(config),
            roster,
            upstream: UpstreamHandle::new(events_tx),
        };
        (state, adapter, events_rx)
    }
}
