//! Translates upstream events into roster deltas and tracks the link state.
//!
//! ```text
//!  Disconnected ──link_up──▶ Connected ──link_down──▶ Disconnected
//!        ▲                       │
//!        │                   link_error
//!        └──link_down/up──── Errored ◀── (from any state)
//! ```
//!
//! Leaving `Connected` clears the roster so viewers see no data instead of
//! stale data. Presence events only count while `Connected`.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::roster::{Delta, DeltaOutcome, Roster};

use super::events::UpstreamEvent;
use super::link::{LinkStatus, UpstreamLinkState};

pub struct UpstreamAdapter {
    roster: Arc<Roster>,
    link: LinkStatus,
}

impl UpstreamAdapter {
    pub fn new(roster: Arc<Roster>) -> Self {
        Self {
            roster,
            link: LinkStatus::disconnected(),
        }
    }

    pub fn link(&self) -> &LinkStatus {
        &self.link
    }

    /// Process events one at a time, in arrival order, until every sender is
    /// gone.
    pub async fn run(mut self, mut events: mpsc::Receiver<UpstreamEvent>) {
        tracing::info!("upstream adapter started");
        while let Some(event) = events.recv().await {
            self.handle(event);
        }
        // No bridge can reach us any more.
        self.handle(UpstreamEvent::LinkDown);
        tracing::info!("upstream adapter stopped");
    }

    /// Apply one event. Returns the store outcome for presence events that
    /// were applied.
    pub fn handle(&mut self, event: UpstreamEvent) -> Option<DeltaOutcome> {
        match event {
            UpstreamEvent::LinkUp => {
                self.transition(UpstreamLinkState::Connected, None);
                None
            }
            UpstreamEvent::LinkDown => {
                self.transition(UpstreamLinkState::Disconnected, None);
                None
            }
            UpstreamEvent::LinkError { reason } => {
                self.transition(UpstreamLinkState::Errored, Some(reason));
                None
            }
            presence => {
                if !self.link.state.is_fresh() {
                    tracing::warn!(
                        state = ?self.link.state,
                        ?presence,
                        "presence event while link is not connected, dropped"
                    );
                    return None;
                }
                let delta = presence.into_delta()?;
                Some(self.roster.apply(delta))
            }
        }
    }

    fn transition(&mut self, next: UpstreamLinkState, reason: Option<String>) {
        let previous = self.link.state;
        if previous == next && self.link.reason == reason {
            tracing::debug!(state = ?next, "link state unchanged");
            return;
        }

        if previous == UpstreamLinkState::Connected && next != UpstreamLinkState::Connected {
            self.roster.apply(Delta::ClearAll);
        }

        self.link = LinkStatus::new(next, reason);
        match next {
            UpstreamLinkState::Connected => {
                tracing::info!(from = ?previous, "upstream link up");
            }
            UpstreamLinkState::Disconnected => {
                tracing::warn!(from = ?previous, "upstream link down");
            }
            UpstreamLinkState::Errored => {
                tracing::warn!(from = ?previous, reason = ?self.link.reason, "upstream link errored");
            }
        }
        self.roster.hub().on_link_state(self.link.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::events::Dispatch;
    use crate::gateway::hub::BroadcastHub;
    use crate::gateway::session::{ViewerFeed, ViewerSession};
    use crate::roster::{ClientRecord, ClientType, ClientUpdate, GermanCollator, Normalizer};

    fn adapter() -> UpstreamAdapter {
        let roster = Roster::new(
            Normalizer::new(Arc::new(GermanCollator)),
            Arc::new(BroadcastHub::new()),
        );
        UpstreamAdapter::new(Arc::new(roster))
    }

    fn joined(clid: &str, nickname: &str) -> UpstreamEvent {
        UpstreamEvent::ClientJoined {
            client: ClientRecord::new(clid, "1", clid, nickname),
        }
    }

    fn drain(rx: &mut ViewerFeed) -> Vec<Dispatch> {
        let mut out = Vec::new();
        while let Ok(d) = rx.try_recv() {
            out.push((*d).clone());
        }
        out
    }

    #[test]
    fn presence_before_link_up_is_dropped() {
        let mut adapter = adapter();
        assert_eq!(adapter.handle(joined("1", "Anna")), None);
        assert_eq!(adapter.roster.store_len(), 0);
    }

    #[test]
    fn events_apply_in_order_while_connected() {
        let mut adapter = adapter();
        adapter.handle(UpstreamEvent::LinkUp);

        adapter.handle(joined("1", "Anna"));
        adapter.handle(UpstreamEvent::ClientUpdated {
            clid: "1".into(),
            changes: ClientUpdate::nickname("Zora"),
        });
        adapter.handle(joined("2", "Berta"));
        adapter.handle(UpstreamEvent::ClientLeft { clid: "2".into() });

        assert_eq!(adapter.roster.snapshot().nicknames(), ["Zora"]);
    }

    #[test]
    fn update_for_unknown_client_is_reported() {
        let mut adapter = adapter();
        adapter.handle(UpstreamEvent::LinkUp);

        let outcome = adapter.handle(UpstreamEvent::ClientUpdated {
            clid: "404".into(),
            changes: ClientUpdate::nickname("Nobody"),
        });

        assert_eq!(outcome, Some(DeltaOutcome::UnknownClient));
    }

    #[test]
    fn link_down_clears_roster_and_signals_viewers() {
        let mut adapter = adapter();
        adapter.handle(UpstreamEvent::LinkUp);
        for (clid, name) in [("1", "Anna"), ("2", "Berta"), ("3", "Carla")] {
            adapter.handle(joined(clid, name));
        }

        let (session, mut rx) = ViewerSession::open(16);
        adapter.roster.hub().on_viewer_connect(session).unwrap();
        let on_connect = drain(&mut rx);
        assert!(matches!(&on_connect[1], Dispatch::Clients(s) if s.len() == 3));

        adapter.handle(UpstreamEvent::LinkDown);

        let pushed = drain(&mut rx);
        assert_eq!(pushed.len(), 2);
        assert!(matches!(&pushed[0], Dispatch::Clients(s) if s.is_empty()));
        assert!(matches!(
            &pushed[1],
            Dispatch::Link(l) if l.state == UpstreamLinkState::Disconnected
        ));
        assert_eq!(adapter.roster.store_len(), 0);
    }

    #[test]
    fn link_error_records_reason_and_clears() {
        let mut adapter = adapter();
        adapter.handle(UpstreamEvent::LinkUp);
        adapter.handle(joined("1", "Anna"));

        adapter.handle(UpstreamEvent::LinkError {
            reason: "query login rejected".into(),
        });

        assert_eq!(adapter.link().state, UpstreamLinkState::Errored);
        assert_eq!(adapter.link().reason.as_deref(), Some("query login rejected"));
        assert!(adapter.roster.snapshot().is_empty());
        assert_eq!(adapter.roster.hub().link_status().state, UpstreamLinkState::Errored);
    }

    #[test]
    fn relinking_starts_from_empty_roster() {
        let mut adapter = adapter();
        adapter.handle(UpstreamEvent::LinkUp);
        adapter.handle(joined("1", "Anna"));
        adapter.handle(UpstreamEvent::LinkDown);
        adapter.handle(UpstreamEvent::LinkUp);

        assert!(adapter.link().state.is_fresh());
        assert!(adapter.roster.snapshot().is_empty());

        adapter.handle(joined("2", "Berta"));
        assert_eq!(adapter.roster.snapshot().nicknames(), ["Berta"]);
    }

    #[test]
    fn repeated_link_up_is_ignored() {
        let mut adapter = adapter();
        adapter.handle(UpstreamEvent::LinkUp);
        adapter.handle(joined("1", "Anna"));
        let since = adapter.link().since;

        adapter.handle(UpstreamEvent::LinkUp);

        assert_eq!(adapter.link().since, since);
        assert_eq!(adapter.roster.snapshot().len(), 1);
    }

    #[test]
    fn service_clients_are_stored_but_hidden() {
        let mut adapter = adapter();
        adapter.handle(UpstreamEvent::LinkUp);
        adapter.handle(UpstreamEvent::ClientJoined {
            client: ClientRecord::new("7", "1", "7", "bridge").with_type(ClientType::Query),
        });

        assert_eq!(adapter.roster.store_len(), 1);
        assert!(adapter.roster.snapshot().is_empty());
    }

    #[tokio::test]
    async fn run_processes_queue_then_drops_link_when_senders_close() {
        let adapter = adapter();
        let roster = Arc::clone(&adapter.roster);
        let (tx, rx) = mpsc::channel(8);

        tx.send(UpstreamEvent::LinkUp).await.unwrap();
        tx.send(joined("1", "Anna")).await.unwrap();
        drop(tx);

        adapter.run(rx).await;

        assert_eq!(roster.hub().link_status().state, UpstreamLinkState::Disconnected);
        assert!(roster.snapshot().is_empty());
    }
}
