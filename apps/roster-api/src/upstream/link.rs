use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// State of the connection to the voice server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpstreamLinkState {
    Connected,
    Disconnected,
    Errored,
}

impl UpstreamLinkState {
    /// Store contents only reflect the voice server while connected.
    pub fn is_fresh(self) -> bool {
        matches!(self, UpstreamLinkState::Connected)
    }
}

/// Link state plus when it was entered, as pushed to viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStatus {
    pub state: UpstreamLinkState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub since: DateTime<Utc>,
}

impl LinkStatus {
    pub fn new(state: UpstreamLinkState, reason: Option<String>) -> Self {
        Self {
            state,
            reason,
            since: Utc::now(),
        }
    }

    pub fn disconnected() -> Self {
        Self::new(UpstreamLinkState::Disconnected, None)
    }
}
