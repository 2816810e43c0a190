//! Network module - message model, wire codec, seen cache, peer registry, broadcaster,
//! dialer, inbound connections and the FloodNode that ties them together.

pub mod codec;
pub mod message;
pub mod dedup;
pub mod registry;
pub mod broadcast;
pub mod events;
pub mod transport;
pub mod dialer;
pub mod connection;
pub mod manager;

pub use message::{IdGenerator, Message};
pub use dedup::SeenCache;
pub use registry::{PeerLease, PeerRegistry};
pub use broadcast::{BroadcastReport, Broadcaster};
pub use events::{NodeEvent, NodeEvents};
pub use dialer::{DialOutcome, Dialer};
pub use connection::serve_connection;
pub use manager::{FloodConfig, FloodNode, Relayed};
