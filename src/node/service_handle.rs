//! Long-running node services (accept loop, console input, event printer) and the shutdown
//! signal they watch. Per-connection tasks are not tracked here; they end with their link.

use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error};

type ServiceTask = JoinHandle<anyhow::Result<()>>;

pub struct ServiceHandle {
    shutdown_tx: watch::Sender<bool>,
    services: Vec<(&'static str, ServiceTask)>,
}

impl ServiceHandle {
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx, services: vec![] }
    }

    /// Spawn a named service. `make` gets the shutdown receiver the service must watch.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, make: F)
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let task = tokio::spawn(make(self.shutdown_tx.subscribe()));
        self.services.push((name, task));
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Flip the shutdown flag and wait for every service in spawn order.
    /// Returns how many services ended with an error or panicked.
    pub async fn shutdown(self) -> usize {
        let _ = self.shutdown_tx.send(true);

        let mut failed = 0;
        for (name, task) in self.services {
            match task.await {
                Ok(Ok(())) => debug!("service {} stopped", name),
                Ok(Err(e)) => {
                    error!("service {} returned error: {:?}", name, e);
                    failed += 1;
                }
                Err(e) => {
                    error!("service {} join error: {:?}", name, e);
                    failed += 1;
                }
            }
        }
        failed
    }
}

impl Default for ServiceHandle {
    fn default() -> Self {
        Self::new()
    }
}
