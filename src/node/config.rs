use crate::network::codec::DEFAULT_MAX_FRAME_LEN;
use crate::network::manager::FloodConfig;
use crate::network::registry::DEFAULT_PEER_QUEUE;
use crate::utils::errors::{NetError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Node configuration. Every field can come from a TOML file; CLI flags override.
///
/// ```toml
/// listen_port = "9000"
/// peers = ["10.0.0.2:9000"]
/// dedup_capacity = 100000
/// ```
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NodeConfig {
    pub listen_port: String,
    /// host other nodes should use to reach us; discovered from the hostname when unset
    pub advertise_host: Option<String>,
    /// bootstrap peers dialed at start
    pub peers: Vec<String>,
    pub peer_queue_capacity: usize,
    pub dedup_capacity: Option<usize>,
    pub max_frame_len: usize,
    pub log_level: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_port: String::new(),
            advertise_host: None,
            peers: vec![],
            peer_queue_capacity: DEFAULT_PEER_QUEUE,
            dedup_capacity: None,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
            log_level: "info".into(),
        }
    }
}

impl NodeConfig {
    /// Load config from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        let cfg: NodeConfig = toml::from_str(&data)?;
        Ok(cfg)
    }

    /// Check everything that must hold before the listener binds; returns the port.
    pub fn validate(&self) -> Result<u16> {
        let raw = self.listen_port.trim();
        if raw.len() < 4 {
            return Err(NetError::InvalidConfig(format!("invalid listen port ({})", raw)));
        }
        let port: u16 = raw
            .parse()
            .map_err(|_| NetError::InvalidConfig(format!("invalid listen port ({})", raw)))?;
        if port == 0 {
            return Err(NetError::InvalidConfig("listen port must not be 0".into()));
        }
        if self.peer_queue_capacity == 0 {
            return Err(NetError::InvalidConfig("peer_queue_capacity must be at least 1".into()));
        }
        if self.max_frame_len == 0 {
            return Err(NetError::InvalidConfig("max_frame_len must be at least 1".into()));
        }
        Ok(port)
    }

    /// Listener binds all interfaces.
    pub fn bind_addr(&self, port: u16) -> String {
        format!("0.0.0.0:{}", port)
    }

    pub fn flood_config(&self, local_addr: String) -> FloodConfig {
        FloodConfig {
            local_addr,
            peer_queue_capacity: self.peer_queue_capacity,
            dedup_capacity: self.dedup_capacity,
            max_frame_len: self.max_frame_len,
        }
    }
}

/// Parse a CSV list of peers into Vec<String>
pub fn parse_peers_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_port(p: &str) -> NodeConfig {
        NodeConfig { listen_port: p.into(), ..Default::default() }
    }

    #[test]
    fn test_port_validation() {
        assert_eq!(with_port("9000").validate().unwrap(), 9000);
        assert!(matches!(with_port("").validate(), Err(NetError::InvalidConfig(_))));
        assert!(matches!(with_port("900").validate(), Err(NetError::InvalidConfig(_))));
        assert!(matches!(with_port("99999").validate(), Err(NetError::InvalidConfig(_))));
        assert!(matches!(with_port("abcd").validate(), Err(NetError::InvalidConfig(_))));
        assert!(matches!(with_port("0000").validate(), Err(NetError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_queue_rejected() {
        let cfg = NodeConfig { peer_queue_capacity: 0, ..with_port("9000") };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_toml_defaults_fill_in() {
        let cfg: NodeConfig = toml::from_str(
            r#"
            listen_port = "9100"
            peers = ["10.0.0.2:9000"]
            dedup_capacity = 500
            "#,
        )
        .unwrap();
        assert_eq!(cfg.validate().unwrap(), 9100);
        assert_eq!(cfg.peers, vec!["10.0.0.2:9000".to_string()]);
        assert_eq!(cfg.dedup_capacity, Some(500));
        assert_eq!(cfg.peer_queue_capacity, DEFAULT_PEER_QUEUE);
        assert_eq!(cfg.log_level, "info");

        let flood = cfg.flood_config("10.0.0.1:9100".into());
        assert_eq!(flood.local_addr, "10.0.0.1:9100");
        assert_eq!(flood.dedup_capacity, Some(500));
    }

    #[test]
    fn test_parse_peers_csv() {
        assert_eq!(
            parse_peers_csv(" a:1, ,b:2,"),
            vec!["a:1".to_string(), "b:2".to_string()]
        );
    }
}
