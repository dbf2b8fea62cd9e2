//! Visibility and ordering policy for the roster viewers see.

use std::sync::Arc;

use super::collation::Collator;
use super::record::{ClientRecord, RosterSnapshot};

/// Reserved nickname of the voice server's built-in admin login.
pub const DEFAULT_ADMIN_NAME: &str = "serveradmin";

/// Turns raw store contents into a [`RosterSnapshot`].
///
/// Drops service connections and the admin pseudo-client, then sorts by
/// nickname with the injected collator. The sort is stable, so records whose
/// nicknames compare equal keep their input order. The snapshot is always
/// rebuilt in full: one rename can move every other entry.
#[derive(Debug, Clone)]
pub struct Normalizer {
    collator: Arc<dyn Collator>,
    admin_name: String,
}

impl Normalizer {
    pub fn new(collator: Arc<dyn Collator>) -> Self {
        Self {
            collator,
            admin_name: DEFAULT_ADMIN_NAME.to_string(),
        }
    }

    /// Override the reserved admin nickname (matched case-insensitively).
    pub fn with_admin_name(mut self, name: &str) -> Self {
        self.admin_name = name.to_lowercase();
        self
    }

    pub fn is_visible(&self, record: &ClientRecord) -> bool {
        !record.client_type.is_service() && record.client_nickname.to_lowercase() != self.admin_name
    }

    pub fn normalize(&self, records: &[ClientRecord]) -> RosterSnapshot {
        let mut visible: Vec<ClientRecord> = records
            .iter()
            .filter(|r| self.is_visible(r))
            .cloned()
            .collect();

        visible.sort_by(|a, b| self.collator.compare(&a.client_nickname, &b.client_nickname));

        RosterSnapshot::from_sorted(visible)
    }
}
