//! Node configuration with validation.
//!
//! Loaded from an optional TOML file, then overridden from the environment.
//!
//! ```toml
//! [api]
//! host = "0.0.0.0"
//! port = 14265
//!
//! [access]
//! remote_allowed = ["ping", "addPeer", "getPeerAddresses", "getNodeInfo"]
//!
//! [pow]
//! threads = 4
//!
//! [snapshot.balances]
//! "ADDRESS999..." = 1000
//! ```

use crate::domain::commands::{names_with_access, Command, RemoteAccess};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

/// Hard cap on neighbors.
pub const MAX_PEERS: usize = 14;

/// Default API port. `addPeer` also probes callers on it.
pub const DEFAULT_API_PORT: u16 = 14265;

pub const ENV_API_HOST: &str = "TANGLE_API_HOST";
pub const ENV_API_PORT: &str = "TANGLE_API_PORT";
pub const ENV_CONFIG_PATH: &str = "TANGLE_CONFIG";
pub const ENV_REMOTE_LIMIT: &str = "TANGLE_REMOTE_LIMIT";

/// Main node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// HTTP API server
    pub api: ApiConfig,
    /// Remote command access lists
    pub access: AccessConfig,
    /// Neighbor management
    pub peers: PeersConfig,
    /// Proof-of-work engine
    pub pow: PowConfig,
    /// Initial balances
    pub snapshot: SnapshotConfig,
    /// Log output
    pub logging: LoggingConfig,
}

impl NodeConfig {
    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_API_HOST) {
            self.api.host = host.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_API_HOST,
                value: host,
            })?;
        }
        if let Some(port) = lookup(ENV_API_PORT) {
            self.api.port = port.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                var: ENV_API_PORT,
                value: port,
            })?;
        }
        if let Some(list) = lookup(ENV_REMOTE_LIMIT) {
            self.access.remote_restricted = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.api.max_body_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_body_size cannot be 0".into(),
            ));
        }

        if self.api.response_chunk_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "response_chunk_size cannot be 0".into(),
            ));
        }

        if self.api.cors_allowed_origin.trim().is_empty() {
            return Err(ConfigError::InvalidHeader("cors_allowed_origin".into()));
        }

        if self.api.keep_alive.trim().is_empty() {
            return Err(ConfigError::InvalidHeader("keep_alive".into()));
        }

        for name in self
            .access
            .remote_allowed
            .iter()
            .chain(&self.access.remote_restricted)
        {
            if Command::from_name(name).is_none() {
                return Err(ConfigError::UnknownCommand(name.clone()));
            }
        }

        if self.peers.max_peers > MAX_PEERS {
            return Err(ConfigError::TooManyPeers {
                configured: self.peers.max_peers,
                max: MAX_PEERS,
            });
        }

        if self.peers.broadcast_queue_capacity == 0 {
            return Err(ConfigError::InvalidLimit(
                "broadcast_queue_capacity cannot be 0".into(),
            ));
        }

        if self.pow.threads == 0 {
            return Err(ConfigError::InvalidLimit("pow threads cannot be 0".into()));
        }

        for address in self.snapshot.balances.keys() {
            if address.parse::<tangle_types::Hash>().is_err() {
                return Err(ConfigError::InvalidSnapshot(address.clone()));
            }
        }

        Ok(())
    }

    /// Get API server bind address
    pub fn api_addr(&self) -> SocketAddr {
        SocketAddr::new(self.api.host, self.api.port)
    }
}

/// HTTP API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 14265)
    pub port: u16,
    /// Max request body size in bytes (default: 1MB)
    pub max_body_size: usize,
    /// Bytes handed to the connection per write
    pub response_chunk_size: usize,
    /// Value of `Access-Control-Allow-Origin` on every response
    pub cors_allowed_origin: String,
    /// Value of `Keep-Alive` on every response
    pub keep_alive: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_API_PORT,
            max_body_size: 1024 * 1024, // 1MB
            response_chunk_size: 8 * 1024,
            cors_allowed_origin: "*".to_string(),
            keep_alive: "timeout=500, max=100".to_string(),
        }
    }
}

/// Remote access lists.
///
/// A command in `remote_restricted` and not in `remote_allowed` is refused
/// for every non-loopback caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessConfig {
    pub remote_allowed: Vec<String>,
    pub remote_restricted: Vec<String>,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            remote_allowed: names_with_access(RemoteAccess::Allowed),
            remote_restricted: names_with_access(RemoteAccess::Restricted),
        }
    }
}

/// Neighbor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeersConfig {
    /// Neighbor cap, at most 14
    pub max_peers: usize,
    /// Timeout for the reachability probe run by `addPeer`
    #[serde(with = "duration_serde")]
    pub probe_timeout: Duration,
    /// Port callers must answer on to be accepted as peers
    pub probe_port: u16,
    /// Neighbors that grant milestones; never listed by `getPeerAddresses`
    pub milestone_sources: Vec<String>,
    /// Outbound gossip queue length
    pub broadcast_queue_capacity: usize,
}

impl Default for PeersConfig {
    fn default() -> Self {
        Self {
            max_peers: MAX_PEERS,
            probe_timeout: Duration::from_secs(3),
            probe_port: DEFAULT_API_PORT,
            milestone_sources: Vec::new(),
            broadcast_queue_capacity: 1_000,
        }
    }
}

/// Proof-of-work configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PowConfig {
    /// Worker threads (default: logical cores)
    pub threads: usize,
    /// Nonces tried between cancellation checks
    pub check_interval: u64,
}

impl Default for PowConfig {
    fn default() -> Self {
        Self {
            threads: num_cpus::get(),
            check_interval: 10_000,
        }
    }
}

/// Initial balance table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapshotConfig {
    /// Address trytes to balance
    pub balances: HashMap<String, i64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
    /// Filter directive, overridden by `RUST_LOG`
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// API port is 0
    #[error("api port cannot be 0")]
    InvalidPort,
    /// Invalid size or count limit
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    /// Header value is empty or not representable
    #[error("invalid header value for {0}")]
    InvalidHeader(String),
    /// Access list names a command that does not exist
    #[error("unknown command in access list: {0}")]
    UnknownCommand(String),
    /// Peer cap above the hard limit
    #[error("max_peers {configured} exceeds limit {max}")]
    TooManyPeers { configured: usize, max: usize },
    /// Snapshot key is not an address
    #[error("invalid snapshot address: {0}")]
    InvalidSnapshot(String),
    /// Environment override could not be parsed
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },
    /// File I/O error
    #[error("failed to read {path}: {error}")]
    Io { path: String, error: String },
    /// TOML parsing error
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Duration serialization as `"3s"`, `"500ms"` or `"2m"`.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}ms", duration.as_millis()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub(super) fn parse_duration(s: &str) -> Result<Duration, &'static str> {
        let s = s.trim();
        if let Some(ms) = s.strip_suffix("ms") {
            ms.trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| "invalid milliseconds")
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid seconds")
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| "invalid minutes")
        } else {
            s.parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| "invalid duration format")
        }
    }
}
