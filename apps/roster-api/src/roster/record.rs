//! Client records as reported by the voice server, and the snapshot type
//! viewers receive.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Transient connection id (`clid`). Stable for the lifetime of one voice
/// connection; a reconnecting client gets a new one.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClientId(String);

impl ClientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClientId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The `client_type` flag. The voice server reports `"0"` for people and
/// `"1"` for ServerQuery connections (bots, bridges, admin tooling).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientType {
    #[default]
    #[serde(rename = "0")]
    Voice,
    #[serde(rename = "1")]
    Query,
}

impl ClientType {
    pub fn is_service(self) -> bool {
        matches!(self, ClientType::Query)
    }
}

/// Properties with a dedicated [`ClientRecord`] field. Never carried in
/// `extra`, or the serialized record would repeat the key.
const RESERVED_KEYS: &[&str] = &[
    "clid",
    "cid",
    "client_database_id",
    "client_nickname",
    "client_type",
];

pub(crate) fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// One connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub clid: ClientId,
    /// Channel the client currently sits in.
    pub cid: String,
    /// Persistent identity, survives reconnects unlike `clid`.
    pub client_database_id: String,
    pub client_nickname: String,
    #[serde(default)]
    pub client_type: ClientType,
    /// Any other string properties the voice server reports (away status,
    /// platform, ...). Passed through to viewers untouched.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ClientRecord {
    pub fn new(
        clid: impl Into<String>,
        cid: impl Into<String>,
        client_database_id: impl Into<String>,
        client_nickname: impl Into<String>,
    ) -> Self {
        Self {
            clid: ClientId::new(clid),
            cid: cid.into(),
            client_database_id: client_database_id.into(),
            client_nickname: client_nickname.into(),
            client_type: ClientType::Voice,
            extra: BTreeMap::new(),
        }
    }

    pub fn with_type(mut self, client_type: ClientType) -> Self {
        self.client_type = client_type;
        self
    }

    /// Drop `extra` entries that would shadow a real field.
    pub(crate) fn strip_reserved(&mut self) {
        let clid = &self.clid;
        self.extra.retain(|key, _| {
            let keep = !is_reserved_key(key);
            if !keep {
                tracing::warn!(%clid, %key, "reserved property in client record ignored");
            }
            keep
        });
    }
}

/// A partial change to an existing record. `clid` and `client_database_id`
/// are identities and cannot be changed; if they show up they land in `extra`
/// and are ignored by [`apply_to`](Self::apply_to).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_nickname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<ClientType>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl ClientUpdate {
    pub fn nickname(name: impl Into<String>) -> Self {
        Self {
            client_nickname: Some(name.into()),
            ..Self::default()
        }
    }

    /// Apply the set fields onto `record`. Returns whether anything changed.
    pub(crate) fn apply_to(&self, record: &mut ClientRecord) -> bool {
        let before = record.clone();

        if let Some(cid) = &self.cid {
            record.cid.clone_from(cid);
        }
        if let Some(nickname) = &self.client_nickname {
            record.client_nickname.clone_from(nickname);
        }
        if let Some(client_type) = self.client_type {
            record.client_type = client_type;
        }
        for (key, value) in &self.extra {
            if is_reserved_key(key) {
                tracing::warn!(clid = %record.clid, %key, "reserved property in client update ignored");
                continue;
            }
            record.extra.insert(key.clone(), value.clone());
        }

        *record != before
    }
}

/// The filtered, ordered roster as viewers see it. Serializes as a plain
/// JSON array, `[]` when nobody is connected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterSnapshot(Vec<ClientRecord>);

impl RosterSnapshot {
    pub(crate) fn from_sorted(records: Vec<ClientRecord>) -> Self {
        Self(records)
    }

    pub fn records(&self) -> &[ClientRecord] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClientRecord> {
        self.0.iter()
    }

    /// Nicknames in roster order.
    pub fn nicknames(&self) -> Vec<&str> {
        self.0.iter().map(|c| c.client_nickname.as_str()).collect()
    }
}
