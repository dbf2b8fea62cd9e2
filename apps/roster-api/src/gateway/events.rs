//! Viewer-facing event names and wire-format messages.

use serde::Serialize;

use crate::roster::RosterSnapshot;
use crate::upstream::LinkStatus;

// ---------------------------------------------------------------------------
// Dispatch event types
// ---------------------------------------------------------------------------

/// Event names pushed to viewers.
pub struct EventName;

impl EventName {
    pub const CLIENTS: &'static str = "clients";
    pub const LINK: &'static str = "link";
}

/// One push queued for a viewer. Shared between all sessions via `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Dispatch {
    Clients(RosterSnapshot),
    Link(LinkStatus),
}

impl Dispatch {
    pub fn event_name(&self) -> &'static str {
        match self {
            Dispatch::Clients(_) => EventName::CLIENTS,
            Dispatch::Link(_) => EventName::LINK,
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Viewer message
// ---------------------------------------------------------------------------

/// A frame sent to a viewer: `{"t": event, "s": seq, "d": payload}`.
#[derive(Debug, Serialize)]
pub struct GatewayMessage<'a> {
    pub t: &'static str,
    pub s: u64,
    pub d: &'a Dispatch,
}

impl<'a> GatewayMessage<'a> {
    pub fn dispatch(dispatch: &'a Dispatch, seq: u64) -> Self {
        Self {
            t: dispatch.event_name(),
            s: seq,
            d: dispatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::{ClientRecord, GermanCollator, Normalizer};
    use crate::upstream::UpstreamLinkState;
    use std::sync::Arc;

    #[test]
    fn clients_frame_carries_array_payload() {
        let snapshot = Normalizer::new(Arc::new(GermanCollator))
            .normalize(&[ClientRecord::new("3", "1", "30", "Anna")]);
        let dispatch = Dispatch::Clients(snapshot);

        let json = serde_json::to_value(GatewayMessage::dispatch(&dispatch, 4)).unwrap();

        assert_eq!(json["t"], "clients");
        assert_eq!(json["s"], 4);
        assert_eq!(json["d"][0]["clid"], "3");
        assert_eq!(json["d"][0]["client_nickname"], "Anna");
        assert_eq!(json["d"][0]["client_type"], "0");
    }

    #[test]
    fn empty_roster_is_never_null() {
        let dispatch = Dispatch::Clients(RosterSnapshot::default());
        let json = serde_json::to_value(GatewayMessage::dispatch(&dispatch, 1)).unwrap();
        assert_eq!(json["d"], serde_json::json!([]));
    }

    #[test]
    fn link_frame_carries_state() {
        let dispatch = Dispatch::Link(LinkStatus::new(UpstreamLinkState::Errored, Some("timeout".into())));
        let json = serde_json::to_value(GatewayMessage::dispatch(&dispatch, 2)).unwrap();

        assert_eq!(json["t"], "link");
        assert_eq!(json["d"]["state"], "errored");
        assert_eq!(json["d"]["reason"], "timeout");
    }
}
