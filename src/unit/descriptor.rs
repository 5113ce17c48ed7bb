//! Service lifecycle descriptors

use crate::compose::PodArgs;
use crate::pod::PodRecord;
use serde::{Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// Backoff before the supervisor restarts a failed pod
pub const RESTART_DELAY: Duration = Duration::from_secs(30);

/// Upper bound for `down`; shorter than the restart backoff so a stop
/// finishes before a restart can begin
pub const STOP_TIMEOUT: Duration = Duration::from_secs(20);

/// Target pods are ordered after
pub const NETWORK_TARGET: &str = "network-online.target";

/// Target that pulls pods in at boot
pub const DEFAULT_TARGET: &str = "multi-user.target";

/// When the supervisor restarts a unit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartAction {
    /// Restart after a non-zero exit or timeout
    #[default]
    OnFailure,
}

impl std::fmt::Display for RestartAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RestartAction::OnFailure => write!(f, "on-failure"),
        }
    }
}

/// Restart policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RestartPolicy {
    pub action: RestartAction,
    /// Delay before a restart
    #[serde(serialize_with = "as_secs")]
    pub delay: Duration,
}

impl Default for RestartPolicy {
    fn default() -> Self {
        Self {
            action: RestartAction::OnFailure,
            delay: RESTART_DELAY,
        }
    }
}

/// Everything the supervisor needs to run one pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDescriptor {
    /// Service identifier, `pod-<name>`
    pub service_name: String,
    pub description: String,
    pub working_directory: PathBuf,
    pub restart: RestartPolicy,
    #[serde(serialize_with = "as_secs")]
    pub stop_timeout: Duration,
    /// `up -d` exits once containers are started
    pub remain_after_exit: bool,
    pub pre_start: Vec<String>,
    pub start: Vec<String>,
    pub stop: Vec<String>,
    pub after: Vec<String>,
    pub wants: Vec<String>,
    pub wanted_by: Vec<String>,
}

impl UnitDescriptor {
    /// File name the supervisor loads the unit from
    pub fn unit_file_name(&self) -> String {
        format!("{}.service", self.service_name)
    }
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}

/// Derive the lifecycle descriptor of a validated pod
pub fn generate(pod: &PodRecord, args: &PodArgs, compose_command: &str) -> UnitDescriptor {
    UnitDescriptor {
        service_name: pod.service_name(),
        description: format!("Compose pod {}", pod.name),
        working_directory: pod.working_directory.clone(),
        restart: RestartPolicy::default(),
        stop_timeout: STOP_TIMEOUT,
        remain_after_exit: true,
        pre_start: args.command(compose_command, &["pull"]),
        start: args.command(compose_command, &["up", "-d"]),
        stop: args.command(compose_command, &["down"]),
        after: vec![NETWORK_TARGET.to_string()],
        wants: vec![NETWORK_TARGET.to_string()],
        wanted_by: vec![DEFAULT_TARGET.to_string()],
    }
}
