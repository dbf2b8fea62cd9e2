//! Connected-client roster: storage, visibility policy and ordering.

pub mod collation;
pub mod normalize;
pub mod record;
pub mod service;
pub mod store;

pub use collation::{Collator, GermanCollator, OrdinalCollator};
pub use normalize::{Normalizer, DEFAULT_ADMIN_NAME};
pub use record::{ClientId, ClientRecord, ClientType, ClientUpdate, RosterSnapshot};
pub use service::Roster;
pub use store::{Delta, DeltaOutcome, RosterStore};
