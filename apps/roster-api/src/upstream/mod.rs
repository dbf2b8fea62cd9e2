//! Everything between the voice server and the roster.

pub mod adapter;
pub mod events;
pub mod ingest;
pub mod link;

pub use adapter::UpstreamAdapter;
pub use events::UpstreamEvent;
pub use ingest::UpstreamHandle;
pub use link::{LinkStatus, UpstreamLinkState};
