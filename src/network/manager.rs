//! FloodNode: owns the peer registry, seen cache, broadcaster and dialer of one node, and
//! exposes the operations the application drives it with.
//!
//! Data flow:
//! - local input -> `submit_local_message` -> broadcaster -> registry channels -> dial tasks -> wire
//! - wire -> `serve_connection` -> `relay` -> seen cache -> (new) event + re-flood + connect-back

use crate::network::broadcast::{BroadcastReport, Broadcaster};
use crate::network::codec::DEFAULT_MAX_FRAME_LEN;
use crate::network::connection::serve_connection;
use crate::network::dedup::SeenCache;
use crate::network::dialer::{DialOutcome, Dialer};
use crate::network::events::{EventSender, NodeEvent, NodeEvents};
use crate::network::message::{IdGenerator, Message};
use crate::network::registry::{PeerRegistry, DEFAULT_PEER_QUEUE};
use crate::network::transport;
use crate::utils::errors::Result;
use crate::utils::metrics::{self, MetricsRegistry};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Runtime knobs for one node.
#[derive(Debug, Clone)]
pub struct FloodConfig {
    /// `host:port` other nodes reach us at; stamped on every message we originate
    pub local_addr: String,
    pub peer_queue_capacity: usize,
    /// `None` keeps every id forever
    pub dedup_capacity: Option<usize>,
    pub max_frame_len: usize,
}

impl FloodConfig {
    pub fn new(local_addr: impl Into<String>) -> Self {
        Self {
            local_addr: local_addr.into(),
            peer_queue_capacity: DEFAULT_PEER_QUEUE,
            dedup_capacity: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

/// What `relay` did with an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relayed {
    /// Already seen; dropped without display, re-flood or connect-back.
    Duplicate,
    /// First sighting: surfaced, re-flooded, and a link back to the origin requested.
    Fresh { report: BroadcastReport, dial: DialOutcome },
}

/// Handle to a running node. Cheap to clone; every clone drives the same state.
#[derive(Clone)]
pub struct FloodNode {
    local_addr: Arc<str>,
    max_frame_len: usize,
    registry: PeerRegistry,
    seen: Arc<SeenCache>,
    broadcaster: Broadcaster,
    dialer: Dialer,
    ids: Arc<IdGenerator>,
    events: EventSender,
    metrics: MetricsRegistry,
}

impl FloodNode {
    pub fn new(cfg: FloodConfig) -> (Self, NodeEvents) {
        let (events, rx) = NodeEvents::channel();
        let local_addr: Arc<str> = cfg.local_addr.into();
        let metrics = MetricsRegistry::new();
        let registry = PeerRegistry::with_queue_capacity(cfg.peer_queue_capacity);
        let broadcaster = Broadcaster::new(registry.clone(), metrics.clone());
        let dialer = Dialer::new(
            local_addr.clone(),
            registry.clone(),
            events.clone(),
            metrics.clone(),
            cfg.max_frame_len,
        );

        let node = Self {
            local_addr,
            max_frame_len: cfg.max_frame_len,
            registry,
            seen: Arc::new(SeenCache::with_capacity(cfg.dedup_capacity)),
            broadcaster,
            dialer,
            ids: Arc::new(IdGenerator::new()),
            events,
            metrics,
        };
        (node, rx)
    }

    pub fn local_addr(&self) -> &str {
        &self.local_addr
    }

    pub fn max_frame_len(&self) -> usize {
        self.max_frame_len
    }

    pub fn registry(&self) -> &PeerRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Addresses we currently hold an outbound link (or a dial in progress) for.
    pub fn peers(&self) -> Vec<String> {
        self.registry.addrs()
    }

    /// Originate a message from this node and flood it to every known peer.
    ///
    /// The id is recorded as seen first, so copies that come back around a cycle are
    /// dropped instead of being shown or forwarded again.
    pub fn submit_local_message(&self, body: impl Into<String>) -> Message {
        let msg = Message::new(&self.ids, self.local_addr.to_string(), body);
        self.seen.check_and_mark(msg.id());
        self.metrics.inc_counter(metrics::MESSAGES_ORIGINATED);
        let report = self.broadcaster.broadcast(&msg);
        debug!("originated {} -> {} peers ({} dropped)", msg.id(), report.enqueued, report.dropped);
        msg
    }

    /// Ask for an outbound link to `addr`. Never blocks; the connect runs in its own task.
    pub fn connect_to_peer(&self, addr: &str) -> DialOutcome {
        self.dialer.dial(addr)
    }

    /// Inbound pipeline for one decoded message.
    pub fn relay(&self, msg: Message) -> Relayed {
        if self.seen.check_and_mark(msg.id()) {
            debug!("duplicate {} from {}", msg.id(), msg.origin());
            self.metrics.inc_counter(metrics::DUPLICATES_DROPPED);
            return Relayed::Duplicate;
        }
        self.metrics.inc_counter(metrics::MESSAGES_RECEIVED);

        self.emit(NodeEvent::Received(msg.clone()));
        let report = self.broadcaster.broadcast(&msg);
        let dial = self.dialer.dial(msg.origin());
        Relayed::Fresh { report, dial }
    }

    pub(crate) fn emit(&self, ev: NodeEvent) {
        let _ = self.events.send(ev);
    }

    /// Bind the listening socket (all interfaces when given `0.0.0.0:port`).
    pub async fn listen(&self, bind_addr: &str) -> Result<TcpListener> {
        let listener = transport::bind(bind_addr).await?;
        info!("listening on {}", listener.local_addr()?);
        Ok(listener)
    }

    /// Accept connections until `shutdown` flips to true, one serve task per connection.
    /// Transient accept errors are logged and the loop keeps going.
    pub async fn serve(&self, listener: TcpListener, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("listener shutting down");
                        return Ok(());
                    }
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer_addr)) => {
                            info!("accepted connection from {}", peer_addr);
                            self.metrics.inc_counter(metrics::CONNECTIONS_ACCEPTED);
                            let node = self.clone();
                            tokio::spawn(serve_connection(node, stream, peer_addr.to_string()));
                        }
                        Err(e) => {
                            warn!("accept failed: {:?}", e);
                            sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
            }
        }
    }
}
