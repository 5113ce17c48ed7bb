//! Firewall allow-list aggregation
//!
//! Forwarded host ports of every pod that opts into `openPorts` are collected
//! into one TCP and one UDP allow-list. Rules are keyed by host port, so the
//! same port forwarded by several pods yields a single rule.

use crate::error::ConfigWarning;
use crate::pod::{PodRecord, Protocol};
use serde::Serialize;
use std::collections::BTreeSet;

/// Host ports to allow, per protocol
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FirewallRuleSet {
    #[serde(rename = "allowedTCPPorts")]
    pub tcp: BTreeSet<u16>,
    #[serde(rename = "allowedUDPPorts")]
    pub udp: BTreeSet<u16>,
}

impl FirewallRuleSet {
    /// TCP allow-list in ascending order
    pub fn tcp_ports(&self) -> Vec<u16> {
        self.tcp.iter().copied().collect()
    }

    /// UDP allow-list in ascending order
    pub fn udp_ports(&self) -> Vec<u16> {
        self.udp.iter().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tcp.is_empty() && self.udp.is_empty()
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirewallAggregate {
    pub rules: FirewallRuleSet,
    /// Entries left out of the rule set
    pub warnings: Vec<ConfigWarning>,
}

/// Aggregate the allow-lists of every pod.
///
/// Expects records that already passed validation. The result does not depend
/// on the order pods are supplied in; warnings are sorted by pod, protocol and
/// port so they are reproducible too.
pub fn aggregate<'a, I>(pods: I) -> FirewallAggregate
where
    I: IntoIterator<Item = &'a PodRecord>,
{
    let mut result = FirewallAggregate::default();

    for pod in pods {
        if !pod.open_ports {
            if !pod.forward_ports.is_empty() {
                tracing::debug!("Pod {} keeps its forwarded ports closed", pod.name);
            }
            continue;
        }

        for forward in &pod.forward_ports {
            match forward.protocol_kind() {
                Protocol::Tcp => {
                    result.rules.tcp.insert(forward.host_port);
                }
                Protocol::Udp => {
                    result.rules.udp.insert(forward.host_port);
                }
                Protocol::Other(protocol) => {
                    result.warnings.push(ConfigWarning::UnrecognizedProtocol {
                        pod: pod.name.clone(),
                        protocol,
                        host_port: forward.host_port,
                    });
                }
            }
        }
    }

    result.warnings.sort_by(|a, b| warning_key(a).cmp(&warning_key(b)));
    result.warnings.dedup();
    for warning in &result.warnings {
        tracing::warn!("{}", warning);
    }

    tracing::info!(
        "Firewall allows {} TCP and {} UDP ports",
        result.rules.tcp.len(),
        result.rules.udp.len()
    );

    result
}

fn warning_key(warning: &ConfigWarning) -> (&str, &str, u16) {
    match warning {
        ConfigWarning::UnrecognizedProtocol {
            pod,
            protocol,
            host_port,
        } => (pod.as_str(), protocol.as_str(), *host_port),
    }
}
