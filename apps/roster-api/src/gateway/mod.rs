//! Viewer gateway: sessions, fan-out and the `/clients` socket.

pub mod events;
pub mod hub;
pub mod server;
pub mod session;
pub mod transport;

pub use events::{Dispatch, EventName, GatewayMessage};
pub use hub::BroadcastHub;
pub use session::{PushError, ViewerFeed, ViewerSession};
pub use transport::{SessionTransport, TransportError};
