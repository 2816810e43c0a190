use crate::network::message::Message;
use crate::network::registry::PeerRegistry;
use crate::utils::metrics::{self, MetricsRegistry};
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

/// Outcome of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// peers whose channel took the message
    pub enqueued: usize,
    /// peers skipped because their channel was full or already closed
    pub dropped: usize,
}

/// Flood fan-out over the peer registry.
///
/// Delivery is best-effort and never waits: a peer whose dialer is behind simply misses
/// the message. There is no retry and no queue beyond the per-peer channel slot.
#[derive(Clone)]
pub struct Broadcaster {
    registry: PeerRegistry,
    metrics: MetricsRegistry,
}

impl Broadcaster {
    pub fn new(registry: PeerRegistry, metrics: MetricsRegistry) -> Self {
        Self { registry, metrics }
    }

    pub fn broadcast(&self, msg: &Message) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for (addr, tx) in self.registry.snapshot() {
            match tx.try_send(msg.clone()) {
                Ok(()) => report.enqueued += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("peer {} saturated; dropped {}", addr, msg.id());
                    report.dropped += 1;
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("peer {} link closing; dropped {}", addr, msg.id());
                    report.dropped += 1;
                }
            }
        }
        self.metrics.add_counter(metrics::BROADCAST_ENQUEUED, report.enqueued as u64);
        self.metrics.add_counter(metrics::BROADCAST_DROPPED, report.dropped as u64);
        report
    }
}
