use crate::utils::errors::Result;
use tokio::net::{TcpListener, TcpStream};

/// Start listening TCP on address and return the listener.
/// Consumer should `accept().await` and hand streams to `serve_connection`.
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let l = TcpListener::bind(addr).await?;
    Ok(l)
}

pub async fn connect(addr: &str) -> Result<TcpStream> {
    let s = TcpStream::connect(addr).await?;
    s.set_nodelay(true)?;
    Ok(s)
}
