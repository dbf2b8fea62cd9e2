//! Presence events fed in by the voice-server bridge.

use serde::{Deserialize, Serialize};

use crate::roster::{ClientId, ClientRecord, ClientUpdate, Delta};

/// One upstream event, JSON-tagged by `event`:
///
/// ```json
/// {"event": "client_joined", "client": {"clid": "5", "cid": "1", ...}}
/// {"event": "client_updated", "clid": "5", "changes": {"client_nickname": "Anna"}}
/// {"event": "client_left", "clid": "5"}
/// {"event": "link_up"}
/// {"event": "link_down"}
/// {"event": "link_error", "reason": "query login rejected"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum UpstreamEvent {
    ClientJoined { client: ClientRecord },
    ClientUpdated { clid: ClientId, changes: ClientUpdate },
    ClientLeft { clid: ClientId },
    LinkUp,
    LinkDown,
    LinkError { reason: String },
}

impl UpstreamEvent {
    /// The store delta for a presence event; `None` for link signals.
    pub fn into_delta(self) -> Option<Delta> {
        match self {
            UpstreamEvent::ClientJoined { client } => Some(Delta::Add(client)),
            UpstreamEvent::ClientUpdated { clid, changes } => Some(Delta::Update(clid, changes)),
            UpstreamEvent::ClientLeft { clid } => Some(Delta::Remove(clid)),
            UpstreamEvent::LinkUp | UpstreamEvent::LinkDown | UpstreamEvent::LinkError { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_client_joined() {
        let event: UpstreamEvent = serde_json::from_str(
            r#"{"event":"client_joined","client":{"clid":"5","cid":"1","client_database_id":"9","client_nickname":"Anna","client_type":"0"}}"#,
        )
        .unwrap();

        match event.into_delta() {
            Some(Delta::Add(record)) => {
                assert_eq!(record.clid.as_str(), "5");
                assert_eq!(record.client_nickname, "Anna");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_client_updated_with_partial_fields() {
        let event: UpstreamEvent = serde_json::from_str(
            r#"{"event":"client_updated","clid":"5","changes":{"client_nickname":"Anne","client_away":"1"}}"#,
        )
        .unwrap();

        match event.into_delta() {
            Some(Delta::Update(clid, changes)) => {
                assert_eq!(clid.as_str(), "5");
                assert_eq!(changes.client_nickname.as_deref(), Some("Anne"));
                assert!(changes.cid.is_none());
                assert_eq!(changes.extra.get("client_away").map(String::as_str), Some("1"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn link_signals_have_no_delta() {
        for raw in [
            r#"{"event":"link_up"}"#,
            r#"{"event":"link_down"}"#,
            r#"{"event":"link_error","reason":"x"}"#,
        ] {
            let event: UpstreamEvent = serde_json::from_str(raw).unwrap();
            assert!(event.into_delta().is_none());
        }
    }

    #[test]
    fn unknown_event_is_rejected() {
        assert!(serde_json::from_str::<UpstreamEvent>(r#"{"event":"kick","clid":"1"}"#).is_err());
    }
}
