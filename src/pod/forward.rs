//! Port forward entries and their normalization

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Protocol applied when a forward entry does not name one
pub const DEFAULT_PROTOCOL: &str = "tcp";

/// Forward entry as it appears in the configuration source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPortForward {
    /// Protocol, `tcp` when omitted
    #[serde(default)]
    pub protocol: Option<String>,
    /// Port on the host
    pub host_port: i64,
    /// Port inside the pod
    pub container_port: i64,
}

/// A range-checked port forward
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortForward {
    pub protocol: String,
    pub host_port: u16,
    pub container_port: u16,
}

/// Protocol classification used by the firewall
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    /// Passed through uninterpreted
    Other(String),
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
            Protocol::Other(name) => write!(f, "{}", name),
        }
    }
}

impl PortForward {
    /// Create a forward entry and normalize it
    pub fn new(protocol: &str, host_port: u16, container_port: u16) -> Self {
        resolve(&Self {
            protocol: protocol.to_string(),
            host_port,
            container_port,
        })
    }

    /// Create a TCP forward entry
    pub fn tcp(host_port: u16, container_port: u16) -> Self {
        Self::new("tcp", host_port, container_port)
    }

    /// Create a UDP forward entry
    pub fn udp(host_port: u16, container_port: u16) -> Self {
        Self::new("udp", host_port, container_port)
    }

    /// Classify the protocol of an already-resolved entry
    pub fn protocol_kind(&self) -> Protocol {
        match self.protocol.as_str() {
            "tcp" => Protocol::Tcp,
            "udp" => Protocol::Udp,
            other => Protocol::Other(other.to_string()),
        }
    }

    /// Publish specification in `host:container/protocol` form
    pub fn publish_spec(&self) -> String {
        format!(
            "{}:{}/{}",
            self.host_port, self.container_port, self.protocol
        )
    }
}

/// Normalize a forward entry.
///
/// The protocol is trimmed and lowercased, and an empty protocol becomes
/// [`DEFAULT_PROTOCOL`]. Resolving an already-resolved entry returns it
/// unchanged.
pub fn resolve(forward: &PortForward) -> PortForward {
    let protocol = forward.protocol.trim().to_lowercase();
    PortForward {
        protocol: if protocol.is_empty() {
            DEFAULT_PROTOCOL.to_string()
        } else {
            protocol
        },
        host_port: forward.host_port,
        container_port: forward.container_port,
    }
}

/// Parse a `host:container/protocol` publish specification.
///
/// A missing `/protocol` suffix means TCP.
pub fn parse_publish_spec(spec: &str) -> Option<PortForward> {
    let (ports, protocol) = match spec.split_once('/') {
        Some((ports, protocol)) => (ports, protocol),
        None => (spec, DEFAULT_PROTOCOL),
    };
    let (host, container) = ports.split_once(':')?;
    let host_port: u16 = host.parse().ok()?;
    let container_port: u16 = container.parse().ok()?;
    if host_port == 0 || container_port == 0 {
        return None;
    }
    Some(PortForward::new(protocol, host_port, container_port))
}

/// Host ports of a forward list grouped by protocol, in first-seen order
pub fn ports_by_protocol(forwards: &[PortForward]) -> BTreeMap<String, Vec<u16>> {
    let mut buckets: BTreeMap<String, Vec<u16>> = BTreeMap::new();
    for forward in forwards.iter().map(resolve) {
        let ports = buckets.entry(forward.protocol).or_default();
        if !ports.contains(&forward.host_port) {
            ports.push(forward.host_port);
        }
    }
    buckets
}
