//! Peer registry: addr -> outbound delivery channel, at most one live link per address.
//!
//! `add` is the single serialization point for "who owns the link to addr": first writer
//! wins, everyone else is told the peer is already connected.

use crate::network::message::Message;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Default per-peer channel capacity: one buffered slot.
pub const DEFAULT_PEER_QUEUE: usize = 1;

/// Send side of a peer link, as handed out by `snapshot`.
pub type PeerSender = mpsc::Sender<Message>;

struct PeerEntry {
    lease_id: u64,
    tx: PeerSender,
}

/// Ownership of one registry entry, returned by a successful `add`.
/// The holder drains `rx` and hands the lease back through `release` when done.
#[derive(Debug)]
pub struct PeerLease {
    pub addr: String,
    pub rx: mpsc::Receiver<Message>,
    lease_id: u64,
}

#[derive(Clone)]
pub struct PeerRegistry {
    inner: Arc<RwLock<HashMap<String, PeerEntry>>>,
    next_lease: Arc<AtomicU64>,
    queue_capacity: usize,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_PEER_QUEUE)
    }

    /// `capacity` is clamped to at least 1.
    pub fn with_queue_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            next_lease: Arc::new(AtomicU64::new(0)),
            queue_capacity: capacity.max(1),
        }
    }

    /// Claim `addr`. Returns `None` if another owner already holds it.
    pub fn add(&self, addr: &str) -> Option<PeerLease> {
        let mut map = self.inner.write();
        if map.contains_key(addr) {
            return None;
        }
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let lease_id = self.next_lease.fetch_add(1, Ordering::Relaxed);
        map.insert(addr.to_string(), PeerEntry { lease_id, tx });
        Some(PeerLease { addr: addr.to_string(), rx, lease_id })
    }

    /// Drop the entry for `addr` whoever owns it. Idempotent.
    /// The owner sees its channel close once in-flight snapshots are gone.
    pub fn remove(&self, addr: &str) {
        self.inner.write().remove(addr);
    }

    /// Drop the entry only if it still belongs to `lease`; a newer owner is left alone.
    pub fn release(&self, lease: &PeerLease) {
        let mut map = self.inner.write();
        if map.get(&lease.addr).map(|e| e.lease_id) == Some(lease.lease_id) {
            map.remove(&lease.addr);
        }
    }

    /// Copy out every current send handle; safe to use after the lock is gone.
    pub fn snapshot(&self) -> Vec<(String, PeerSender)> {
        let map = self.inner.read();
        map.iter().map(|(addr, e)| (addr.clone(), e.tx.clone())).collect()
    }

    pub fn contains(&self, addr: &str) -> bool {
        self.inner.read().contains_key(addr)
    }

    pub fn addrs(&self) -> Vec<String> {
        let mut v: Vec<String> = self.inner.read().keys().cloned().collect();
        v.sort();
        v
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
