use clap::Parser;
use anyhow::{Context, Result};
use std::path::PathBuf;
use crate::network::manager::FloodNode;
use crate::node::config::{parse_peers_csv, NodeConfig};
use crate::node::console::{self, bold, status_line};
use crate::node::local;
use crate::node::nicknames::NicknameBook;
use crate::node::service_handle::ServiceHandle;
use crate::utils::logging::init_logging;
use tracing::info;

/// Flood-broadcast chat node.
#[derive(Parser, Debug)]
#[clap(name = "murmur", version)]
pub struct Cli {
    /// Listen port
    #[clap(short = 'p', long = "port")]
    pub port: Option<String>,

    /// peer to dial at start (host:port); repeat the flag for more peers
    #[clap(long = "peer", value_name = "ADDR")]
    pub peers: Vec<String>,

    /// host other nodes should use to reach this one (default: resolve the hostname)
    #[clap(long)]
    pub advertise: Option<String>,

    /// TOML config file; flags given here override its values
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// per-peer outbound queue capacity
    #[clap(long)]
    pub queue_capacity: Option<usize>,

    /// bound the seen-message cache to this many ids (default: unbounded)
    #[clap(long)]
    pub dedup_capacity: Option<usize>,

    #[clap(long)]
    pub log_level: Option<String>,
}

impl Cli {
    /// File values first, then flags on top.
    pub fn into_config(self) -> Result<NodeConfig> {
        let mut cfg = match &self.config {
            Some(path) => NodeConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => NodeConfig::default(),
        };
        if let Some(p) = self.port {
            cfg.listen_port = p;
        }
        // each value may also be a comma separated list
        for p in &self.peers {
            cfg.peers.extend(parse_peers_csv(p));
        }
        if self.advertise.is_some() {
            cfg.advertise_host = self.advertise;
        }
        if let Some(n) = self.queue_capacity {
            cfg.peer_queue_capacity = n;
        }
        if self.dedup_capacity.is_some() {
            cfg.dedup_capacity = self.dedup_capacity;
        }
        if let Some(l) = self.log_level {
            cfg.log_level = l;
        }
        Ok(cfg)
    }
}

pub async fn run_cli() -> Result<()> {
    let cfg = Cli::parse().into_config()?;
    init_logging(&cfg.log_level);

    let port = cfg.validate()?;
    let local_addr = local::local_addr(cfg.advertise_host.as_deref(), port)
        .await
        .context("determining local address")?;

    println!("{}", bold("--- Murmur ---"));

    let (node, events) = FloodNode::new(cfg.flood_config(local_addr.clone()));
    let book = NicknameBook::new(local_addr.clone());
    let listener = node.listen(&cfg.bind_addr(port)).await.context("binding listener")?;

    println!("{}", status_line(&format!("Local address: {}", local_addr)));
    println!("{}", status_line(&format!("Listening on {}", listener.local_addr()?)));

    let mut svc = ServiceHandle::new();
    {
        let node = node.clone();
        svc.spawn("listener", move |rx| async move {
            node.serve(listener, rx).await.map_err(anyhow::Error::from)
        });
    }
    {
        let book = book.clone();
        svc.spawn("printer", move |rx| console::run_printer(events, book, rx));
    }
    {
        let node = node.clone();
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        svc.spawn("console", move |rx| console::run_input(node, book, stdin, rx));
    }

    for peer in &cfg.peers {
        node.connect_to_peer(peer);
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down node");
    let failed = svc.shutdown().await;
    if failed > 0 {
        anyhow::bail!("{} service(s) stopped with errors", failed);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_file_defaults() {
        let cli = Cli::parse_from([
            "murmur", "-p", "9000", "--peer", "10.0.0.2:9000", "--peer", "10.0.0.3:9000,10.0.0.4:9000",
            "--dedup-capacity", "10",
        ]);
        let cfg = cli.into_config().unwrap();
        assert_eq!(cfg.validate().unwrap(), 9000);
        assert_eq!(cfg.peers, vec!["10.0.0.2:9000", "10.0.0.3:9000", "10.0.0.4:9000"]);
        assert_eq!(cfg.dedup_capacity, Some(10));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_peer_flag_is_repeatable_not_csv_named() {
        let cfg = Cli::parse_from(["murmur", "-p", "9000", "--peer", "10.0.0.2:9000"])
            .into_config()
            .unwrap();
        assert_eq!(cfg.peers, vec!["10.0.0.2:9000"]);
        assert!(Cli::try_parse_from(["murmur", "--peers", "10.0.0.2:9000"]).is_err());
    }

    #[test]
    fn test_missing_port_fails_validation() {
        let cfg = Cli::parse_from(["murmur"]).into_config().unwrap();
        assert!(cfg.validate().is_err());
    }
}
