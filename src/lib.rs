//! Murmur: flood-broadcast messaging over plain TCP links.
//!
//! Every node listens for inbound links, keeps at most one outbound link per known peer,
//! and forwards each message it has not seen before to all of its peers.

pub mod network;
pub mod node;
pub mod utils;

#[cfg(test)]
mod tests;

pub use network::{DialOutcome, FloodConfig, FloodNode, Message, NodeEvent, NodeEvents};
