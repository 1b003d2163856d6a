//! Remote access control.
//!
//! Loopback callers may run anything. Everyone else is refused a command
//! that sits in the restricted list without also sitting in the allowed
//! list.

use crate::domain::commands::Command;
use crate::domain::config::AccessConfig;
use std::collections::HashSet;
use std::net::IpAddr;

/// Compiled access lists.
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed: HashSet<Command>,
    restricted: HashSet<Command>,
}

impl AccessPolicy {
    /// Build from configuration. Names that match no command are skipped;
    /// configuration validation rejects them earlier.
    pub fn from_config(config: &AccessConfig) -> Self {
        let compile = |names: &[String]| -> HashSet<Command> {
            names.iter().filter_map(|n| Command::from_name(n)).collect()
        };
        Self {
            allowed: compile(&config.remote_allowed),
            restricted: compile(&config.remote_restricted),
        }
    }

    /// Whether `command` may run for a caller at `origin`.
    pub fn permits(&self, command: Command, origin: IpAddr) -> bool {
        is_loopback(origin)
            || !self.restricted.contains(&command)
            || self.allowed.contains(&command)
    }
}

/// Check if IP is localhost, including IPv4-mapped IPv6 loopback.
pub fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => ipv4.is_loopback(),
        IpAddr::V6(ipv6) => {
            ipv6.is_loopback() || ipv6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback())
        }
    }
}
