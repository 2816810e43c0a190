use std::collections::HashMap;
use std::sync::Arc;
use parking_lot::Mutex;

pub const MESSAGES_ORIGINATED: &str = "messages_originated";
pub const MESSAGES_RECEIVED: &str = "messages_received";
pub const DUPLICATES_DROPPED: &str = "duplicates_dropped";
pub const BROADCAST_ENQUEUED: &str = "broadcast_enqueued";
pub const BROADCAST_DROPPED: &str = "broadcast_dropped";
pub const DIAL_FAILURES: &str = "dial_failures";
pub const CONNECTIONS_ACCEPTED: &str = "connections_accepted";
pub const PEERS: &str = "peers";

/// Metrics registry (simple, Prometheus-style). Owned by a node and cloned into its tasks.
#[derive(Clone, Default)]
pub struct MetricsRegistry {
    counters: Arc<Mutex<HashMap<String, u64>>>,
    gauges: Arc<Mutex<HashMap<String, f64>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inc_counter(&self, name: &str) {
        self.add_counter(name, 1);
    }

    pub fn add_counter(&self, name: &str, n: u64) {
        if n == 0 {
            return;
        }
        let mut counters = self.counters.lock();
        *counters.entry(name.to_string()).or_insert(0) += n;
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.lock().get(name).copied().unwrap_or(0)
    }

    pub fn set_gauge(&self, name: &str, val: f64) {
        let mut gauges = self.gauges.lock();
        gauges.insert(name.to_string(), val);
    }

    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.lock().get(name).copied()
    }

    pub fn snapshot(&self) -> (HashMap<String, u64>, HashMap<String, f64>) {
        (self.counters.lock().clone(), self.gauges.lock().clone())
    }
}
