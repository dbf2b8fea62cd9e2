use std::str::FromStr;
use std::sync::Arc;

use crate::roster::collation::{self, Collator, GermanCollator};
use crate::roster::DEFAULT_ADMIN_NAME;

/// Roster API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Nickname hidden from the roster, compared case-insensitively.
    pub admin_name: String,
    /// Nickname ordering (`de` or `ordinal`).
    pub collation: String,
    /// Pushes buffered per viewer. A viewer that falls further behind skips
    /// to the latest state.
    pub viewer_queue_capacity: usize,
    /// Upstream events buffered between the bridge socket and the adapter.
    pub upstream_queue_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            admin_name: DEFAULT_ADMIN_NAME.to_string(),
            collation: "de".to_string(),
            viewer_queue_capacity: 32,
            upstream_queue_capacity: 1024,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional; unparseable values fall back to the default
    /// with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: parsed_var("PORT", defaults.port),
            admin_name: std::env::var("ROSTER_ADMIN_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.admin_name),
            collation: std::env::var("ROSTER_COLLATION").unwrap_or(defaults.collation),
            viewer_queue_capacity: parsed_var("VIEWER_QUEUE_CAPACITY", defaults.viewer_queue_capacity)
                .max(2),
            upstream_queue_capacity: parsed_var(
                "UPSTREAM_QUEUE_CAPACITY",
                defaults.upstream_queue_capacity,
            )
            .max(1),
        }
    }

    /// The configured collator, German if the name is unknown.
    pub fn collator(&self) -> Arc<dyn Collator> {
        collation::by_name(&self.collation).unwrap_or_else(|| {
            tracing::warn!(collation = %self.collation, "unknown collation, using de");
            Arc::new(GermanCollator)
        })
    }
}

fn parsed_var<T: FromStr + Copy + std::fmt::Display>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, %default, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn unknown_collation_falls_back_to_german() {
        let config = Config {
            collation: "tlh".into(),
            ..Config::default()
        };
        assert_eq!(config.collator().compare("Ärger", "Zoe"), Ordering::Less);
    }

    #[test]
    fn ordinal_collation_is_selectable() {
        let config = Config {
            collation: "ordinal".into(),
            ..Config::default()
        };
        assert_eq!(config.collator().compare("Ärger", "Zoe"), Ordering::Greater);
    }
}
