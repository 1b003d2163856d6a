//! Outbound ports for peer admission.

use async_trait::async_trait;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;

/// Name resolution and reachability checks used by `addPeer`.
#[async_trait]
pub trait PeerProber: Send + Sync {
    /// Forward-resolve `host`.
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>>;

    /// Whether something accepts connections at `addr` within `timeout`.
    async fn is_reachable(&self, addr: SocketAddr, timeout: Duration) -> bool;
}

/// DNS through the system resolver, reachability through a TCP connect.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpPeerProber;

#[async_trait]
impl PeerProber for TcpPeerProber {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }

    async fn is_reachable(&self, addr: SocketAddr, timeout: Duration) -> bool {
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect(addr)).await,
            Ok(Ok(_))
        )
    }
}
