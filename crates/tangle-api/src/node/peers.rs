//! Neighbor registry behind `addPeer` and `getPeerAddresses`.
//!
//! A caller may only add itself: the URI host must name the caller's
//! observed address, and the caller must answer on the probe port.

use crate::domain::access::is_loopback;
use crate::domain::error::{ApiError, ApiResult};
use crate::domain::requests::PeerTransport;
use crate::ports::outbound::PeerProber;
use parking_lot::RwLock;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of `addPeer`, serialized as `addedPeers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddPeerOutcome {
    Added,
    AlreadyPresent,
    CapacityExceeded,
}

impl AddPeerOutcome {
    pub fn code(self) -> i32 {
        match self {
            Self::Added => 1,
            Self::AlreadyPresent => 0,
            Self::CapacityExceeded => -1,
        }
    }
}

/// A neighbor. Unique by endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub endpoint: SocketAddr,
    pub transport: PeerTransport,
    /// Grants milestones; hidden from `getPeerAddresses`.
    pub milestone_source: bool,
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.transport.scheme(), self.endpoint)
    }
}

/// Parsed `scheme://host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PeerUri {
    transport: PeerTransport,
    host: String,
    port: u16,
}

fn parse_uri(uri: &str) -> ApiResult<PeerUri> {
    let bad = || ApiError::peer_rejected(format!("malformed peer uri '{}'", uri));

    let (scheme, rest) = uri.split_once("://").ok_or_else(bad)?;
    let transport = match scheme {
        "tcp" => PeerTransport::Tcp,
        "udp" => PeerTransport::Udp,
        other => {
            return Err(ApiError::peer_rejected(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    };

    let (host, port) = match rest.strip_prefix('[') {
        Some(bracketed) => {
            let (host, tail) = bracketed.split_once(']').ok_or_else(bad)?;
            (host, tail.strip_prefix(':').ok_or_else(bad)?)
        }
        None => rest.rsplit_once(':').ok_or_else(bad)?,
    };
    let port = port.trim_end_matches('/').parse::<u16>().map_err(|_| bad())?;
    if host.is_empty() || port == 0 {
        return Err(bad());
    }

    Ok(PeerUri {
        transport,
        host: host.to_string(),
        port,
    })
}

pub struct PeerRegistry {
    peers: RwLock<Vec<Peer>>,
    prober: Arc<dyn PeerProber>,
    max_peers: usize,
    probe_port: u16,
    probe_timeout: Duration,
}

impl PeerRegistry {
    pub fn new(
        prober: Arc<dyn PeerProber>,
        max_peers: usize,
        probe_port: u16,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            peers: RwLock::new(Vec::new()),
            prober,
            max_peers,
            probe_port,
            probe_timeout,
        }
    }

    /// Register a milestone-granting neighbor from configuration.
    ///
    /// The host must be an IP literal; no ownership checks apply.
    pub fn add_milestone_source(&self, uri: &str) -> ApiResult<AddPeerOutcome> {
        let parsed = parse_uri(uri)?;
        let ip: IpAddr = parsed
            .host
            .parse()
            .map_err(|_| ApiError::peer_rejected(format!("'{}' is not an IP address", parsed.host)))?;
        let outcome = self.insert(Peer {
            endpoint: SocketAddr::new(ip, parsed.port),
            transport: parsed.transport,
            milestone_source: true,
        });
        info!(%uri, ?outcome, "milestone source registered");
        Ok(outcome)
    }

    /// Admit the caller at `origin` as a neighbor.
    pub async fn add_peer(
        &self,
        uri: &str,
        transport: Option<PeerTransport>,
        origin: IpAddr,
    ) -> ApiResult<AddPeerOutcome> {
        if is_loopback(origin) {
            return Err(ApiError::peer_rejected("loopback callers cannot be peers"));
        }

        let parsed = parse_uri(uri)?;
        if let Some(declared) = transport {
            if declared != parsed.transport {
                return Err(ApiError::peer_rejected(format!(
                    "type '{}' does not match uri scheme",
                    declared.scheme()
                )));
            }
        }

        if !self.host_matches(&parsed, origin).await {
            return Err(ApiError::peer_rejected(
                "you can only add your own node to peers",
            ));
        }

        let probe = SocketAddr::new(origin, self.probe_port);
        if !self.prober.is_reachable(probe, self.probe_timeout).await {
            return Err(ApiError::peer_rejected(format!("{} is not reachable", probe)));
        }

        let outcome = self.insert(Peer {
            endpoint: SocketAddr::new(origin, parsed.port),
            transport: parsed.transport,
            milestone_source: false,
        });
        info!(%uri, %origin, ?outcome, "addPeer");
        Ok(outcome)
    }

    async fn host_matches(&self, uri: &PeerUri, origin: IpAddr) -> bool {
        if let Ok(ip) = uri.host.parse::<IpAddr>() {
            return same_ip(ip, origin);
        }
        match self.prober.resolve(&uri.host, uri.port).await {
            Ok(ips) => ips.into_iter().any(|ip| same_ip(ip, origin)),
            Err(e) => {
                warn!(host = %uri.host, error = %e, "peer host did not resolve");
                false
            }
        }
    }

    fn insert(&self, peer: Peer) -> AddPeerOutcome {
        let mut peers = self.peers.write();
        if peers.iter().any(|p| p.endpoint == peer.endpoint) {
            return AddPeerOutcome::AlreadyPresent;
        }
        if peers.len() >= self.max_peers {
            return AddPeerOutcome::CapacityExceeded;
        }
        debug!(peer = %peer, "peer added");
        peers.push(peer);
        AddPeerOutcome::Added
    }

    /// URIs of every neighbor except milestone sources.
    pub fn addresses(&self) -> Vec<String> {
        self.peers
            .read()
            .iter()
            .filter(|p| !p.milestone_source)
            .map(ToString::to_string)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.peers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.read().is_empty()
    }
}

fn same_ip(a: IpAddr, b: IpAddr) -> bool {
    a.to_canonical() == b.to_canonical()
}
