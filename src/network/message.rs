//! Message model: one broadcast unit as it travels the flood network.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Immutable broadcast unit. Field names on the wire are `ID`, `Addr`, `Body`, `Timestamp`.
///
/// The id is fixed at creation and is the only thing dedup looks at, so two messages with
/// the same id are treated as the same message everywhere in the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "ID")]
    id: String,
    /// `host:port` of the node that created the message
    #[serde(rename = "Addr")]
    origin: String,
    #[serde(rename = "Body")]
    body: String,
    #[serde(rename = "Timestamp")]
    timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a fresh message originated by `origin`, drawing its id from `ids`.
    pub fn new(ids: &IdGenerator, origin: impl Into<String>, body: impl Into<String>) -> Self {
        let origin = origin.into();
        let timestamp = Utc::now();
        let id = ids.next_id(&origin, &timestamp);
        Self { id, origin, body: body.into(), timestamp }
    }

    /// Rebuild a message from already-known parts (e.g. a replayed or hand-crafted frame).
    pub fn from_parts(
        id: impl Into<String>,
        origin: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self { id: id.into(), origin: origin.into(), body: body.into(), timestamp }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.origin, self.body)
    }
}

/// Per-node id source.
///
/// id = hex(sha256(origin || counter || creation nanos || nonce)). The counter makes ids
/// unique within a process even when the clock does not move between two messages; the
/// random nonce separates restarts of the same node.
#[derive(Debug)]
pub struct IdGenerator {
    counter: AtomicU64,
    nonce: [u8; 8],
}

impl IdGenerator {
    pub fn new() -> Self {
        let mut nonce = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut nonce);
        Self { counter: AtomicU64::new(0), nonce }
    }

    pub fn next_id(&self, origin: &str, at: &DateTime<Utc>) -> String {
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        let nanos = at.timestamp_nanos_opt().unwrap_or_else(|| at.timestamp_micros() * 1_000);

        let mut h = Sha256::new();
        h.update(origin.as_bytes());
        h.update(seq.to_be_bytes());
        h.update(nanos.to_be_bytes());
        h.update(self.nonce);
        hex::encode(h.finalize())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
