//! Outbound side: one task per peer address.
//!
//! The task owns the registry entry for its address from `add` until it exits, and drains
//! that entry's channel onto a single TCP connection. No retry: a dead link is dropped and
//! comes back only through another `dial`.

use crate::network::codec::MessageCodec;
use crate::network::events::{EventSender, NodeEvent};
use crate::network::registry::{PeerLease, PeerRegistry};
use crate::network::transport;
use crate::utils::metrics::{self, MetricsRegistry};
use futures::SinkExt;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio_util::codec::FramedWrite;
use tracing::{debug, info, warn};

/// Result of asking for a link to a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialOutcome {
    /// A new dial task now owns the address.
    Spawned,
    /// Some other task already owns it; nothing to do.
    AlreadyConnected,
    /// The address is this node's own.
    SelfDial,
}

#[derive(Clone)]
pub struct Dialer {
    local_addr: Arc<str>,
    registry: PeerRegistry,
    events: EventSender,
    metrics: MetricsRegistry,
    max_frame_len: usize,
}

impl Dialer {
    pub fn new(
        local_addr: impl Into<Arc<str>>,
        registry: PeerRegistry,
        events: EventSender,
        metrics: MetricsRegistry,
        max_frame_len: usize,
    ) -> Self {
        Self { local_addr: local_addr.into(), registry, events, metrics, max_frame_len }
    }

    /// Claim `addr` in the registry and spawn the task that connects and drains it.
    /// Must be called from within a tokio runtime.
    pub fn dial(&self, addr: &str) -> DialOutcome {
        if addr == &*self.local_addr {
            debug!("not dialing own address {}", addr);
            return DialOutcome::SelfDial;
        }
        let Some(lease) = self.registry.add(addr) else {
            debug!("already connected to {}", addr);
            return DialOutcome::AlreadyConnected;
        };
        self.metrics.set_gauge(metrics::PEERS, self.registry.len() as f64);

        let this = self.clone();
        tokio::spawn(async move { this.run(lease).await });
        DialOutcome::Spawned
    }

    async fn run(self, mut lease: PeerLease) {
        let addr = lease.addr.clone();
        info!("dialing {}", addr);
        let _ = self.events.send(NodeEvent::Dialing(addr.clone()));

        match transport::connect(&addr).await {
            Ok(stream) => {
                info!("connected to {}", addr);
                let _ = self.events.send(NodeEvent::Connected(addr.clone()));
                self.pump(&mut lease, stream).await;
                info!("closed connection to {}", addr);
                let _ = self.events.send(NodeEvent::Disconnected(addr.clone()));
            }
            Err(e) => {
                warn!("error dialing {}: {}", addr, e);
                self.metrics.inc_counter(metrics::DIAL_FAILURES);
                let _ = self.events.send(NodeEvent::DialFailed { addr: addr.clone(), reason: e.to_string() });
            }
        }

        self.registry.release(&lease);
        self.metrics.set_gauge(metrics::PEERS, self.registry.len() as f64);
    }

    /// Drain the lease channel onto the wire until the channel closes, a write fails or
    /// the remote end hangs up. The link is send-only, so anything read is discarded.
    async fn pump(&self, lease: &mut PeerLease, stream: TcpStream) {
        let (mut rd, wr) = stream.into_split();
        let mut writer = FramedWrite::new(wr, MessageCodec::with_max_frame_len(self.max_frame_len));
        let mut scratch = [0u8; 512];

        loop {
            tokio::select! {
                biased;
                maybe = lease.rx.recv() => {
                    match maybe {
                        Some(msg) => {
                            let id = msg.id().to_string();
                            if let Err(e) = writer.send(msg).await {
                                warn!("error encoding message {} to {}: {}", id, lease.addr, e);
                                break;
                            }
                        }
                        None => {
                            debug!("registry dropped link to {}", lease.addr);
                            break;
                        }
                    }
                }
                read = rd.read(&mut scratch) => {
                    match read {
                        Ok(0) => {
                            debug!("peer {} closed its end", lease.addr);
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            debug!("read error on link to {}: {}", lease.addr, e);
                            break;
                        }
                    }
                }
            }
        }

        let _ = writer.close().await;
    }
}
