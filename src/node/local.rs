//! Local address discovery: the `host:port` this node stamps on messages it originates.

use crate::utils::errors::{NetError, Result};
use std::net::{IpAddr, SocketAddr};

/// Resolve this machine's hostname and take the first address, IPv4 preferred.
pub async fn local_ip() -> Result<IpAddr> {
    let host = hostname::get()
        .map_err(|e| NetError::AddressResolution(format!("unable to get hostname: {}", e)))?
        .into_string()
        .map_err(|_| NetError::AddressResolution("hostname is not valid UTF-8".into()))?;

    let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host.as_str(), 0))
        .await
        .map_err(|e| NetError::AddressResolution(format!("unable to resolve {}: {}", host, e)))?
        .collect();

    addrs
        .iter()
        .find(|a| a.is_ipv4())
        .or_else(|| addrs.first())
        .map(|a| a.ip())
        .ok_or_else(|| NetError::AddressResolution(format!("no addresses for {}", host)))
}

/// `advertise` wins when given; otherwise the hostname is resolved.
pub async fn local_addr(advertise: Option<&str>, port: u16) -> Result<String> {
    match advertise {
        Some(host) => Ok(join_host_port(host, port)),
        None => Ok(SocketAddr::new(local_ip().await?, port).to_string()),
    }
}

fn join_host_port(host: &str, port: u16) -> String {
    match host.parse::<IpAddr>() {
        Ok(ip) => SocketAddr::new(ip, port).to_string(),
        Err(_) => format!("{}:{}", host, port),
    }
}
