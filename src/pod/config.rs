//! Pod definitions and their validated form

use super::forward::{resolve, PortForward, RawPortForward};
use crate::error::ConfigError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Compose file looked up when a pod does not name one
pub const DEFAULT_COMPOSE_FILE: &str = "docker-compose.yml";

/// Names end up in unit names, container names and shell arguments
const POD_NAME_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9_.-]*$";

/// Partially-specified pod as supplied by the configuration source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPod {
    /// Compose file, relative to `directory` or absolute
    #[serde(default)]
    pub compose_file: Option<String>,
    /// Directory containing the compose file
    #[serde(default, alias = "workingDirectory")]
    pub directory: Option<String>,
    /// Network to attach the pod to; `Some(None)` records an explicit null
    #[serde(
        default,
        deserialize_with = "explicit_null",
        skip_serializing_if = "Option::is_none"
    )]
    pub network: Option<Option<String>>,
    /// Whether forwarded host ports are opened in the firewall
    #[serde(default = "default_open_ports")]
    pub open_ports: bool,
    /// Port forwards, in publish order
    #[serde(default)]
    pub forward_ports: Vec<RawPortForward>,
}

impl Default for RawPod {
    fn default() -> Self {
        Self {
            compose_file: None,
            directory: None,
            network: None,
            open_ports: true,
            forward_ports: Vec::new(),
        }
    }
}

fn default_open_ports() -> bool {
    true
}

/// Keeps `network: null` distinguishable from an absent key
fn explicit_null<'de, D>(deserializer: D) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl RawPod {
    /// Create a pod definition rooted at a directory
    pub fn new(directory: &str) -> Self {
        Self {
            directory: Some(directory.to_string()),
            ..Self::default()
        }
    }

    /// Set compose file
    pub fn compose_file(mut self, compose_file: &str) -> Self {
        self.compose_file = Some(compose_file.to_string());
        self
    }

    /// Set network
    pub fn network(mut self, network: &str) -> Self {
        self.network = Some(Some(network.to_string()));
        self
    }

    /// Set firewall policy
    pub fn open_ports(mut self, open_ports: bool) -> Self {
        self.open_ports = open_ports;
        self
    }

    /// Add a forward entry
    pub fn forward(mut self, protocol: &str, host_port: i64, container_port: i64) -> Self {
        self.forward_ports.push(RawPortForward {
            protocol: Some(protocol.to_string()),
            host_port,
            container_port,
        });
        self
    }
}

/// Fully-defaulted, validated pod
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodRecord {
    /// Pod name, also the compose project name
    pub name: String,
    /// Absolute path of the compose file, inside `working_directory`
    pub compose_file: PathBuf,
    /// Absolute directory the compose executable runs in
    pub working_directory: PathBuf,
    /// Network to attach; empty means no network flag
    pub network: String,
    pub open_ports: bool,
    /// Resolved, duplicate-free forwards in configuration order
    pub forward_ports: Vec<PortForward>,
}

impl PodRecord {
    /// Validate and default one pod definition
    pub fn from_raw(name: &str, raw: &RawPod) -> Result<Self, ConfigError> {
        validate_name(name)?;

        let (compose_file, working_directory) = locate_compose_file(name, raw)?;

        let network = match &raw.network {
            None => String::new(),
            Some(None) => {
                return Err(ConfigError::invalid(
                    name,
                    "network",
                    "null is not accepted, use an empty string to omit the network",
                ))
            }
            Some(Some(network)) => network.clone(),
        };

        let forward_ports = resolve_forwards(name, &raw.forward_ports)?;

        Ok(Self {
            name: name.to_string(),
            compose_file,
            working_directory,
            network,
            open_ports: raw.open_ports,
            forward_ports,
        })
    }

    /// Service identifier handed to the supervisor
    pub fn service_name(&self) -> String {
        format!("pod-{}", self.name)
    }

    /// Name of the pod's infra container
    pub fn infra_name(&self) -> String {
        format!("{}_infra", self.name)
    }
}

/// Validate every pod before anything is derived from them.
///
/// Fails on the first invalid pod (in name order for ordered maps) so that
/// no partial set of records is ever returned. Names must be unique.
pub fn validate_all<'a, I, K>(pods: I) -> Result<BTreeMap<String, PodRecord>, ConfigError>
where
    I: IntoIterator<Item = (K, &'a RawPod)>,
    K: AsRef<str>,
{
    let mut records = BTreeMap::new();
    for (name, raw) in pods {
        let record = PodRecord::from_raw(name.as_ref(), raw)?;
        tracing::debug!(
            "Validated pod {} ({} forwards, openPorts={})",
            record.name,
            record.forward_ports.len(),
            record.open_ports
        );
        if records.insert(record.name.clone(), record).is_some() {
            return Err(ConfigError::invalid(
                name.as_ref(),
                "name",
                "duplicate pod name",
            ));
        }
    }
    Ok(records)
}

fn validate_name(name: &str) -> Result<(), ConfigError> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern =
        PATTERN.get_or_init(|| Regex::new(POD_NAME_PATTERN).expect("pod name pattern is valid"));

    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            name,
            "name",
            format!("'{}' must match {}", name, POD_NAME_PATTERN),
        ))
    }
}

/// Resolve the compose file and working directory of a pod
fn locate_compose_file(name: &str, raw: &RawPod) -> Result<(PathBuf, PathBuf), ConfigError> {
    let directory = raw.directory.as_deref().unwrap_or_default();
    let compose_file = raw.compose_file.as_deref().unwrap_or(DEFAULT_COMPOSE_FILE);

    if compose_file.is_empty() && directory.is_empty() {
        return Err(ConfigError::MissingComposeFile {
            pod: name.to_string(),
        });
    }

    let compose_file = if compose_file.is_empty() {
        Path::new(DEFAULT_COMPOSE_FILE)
    } else {
        Path::new(compose_file)
    };

    let working_directory = if directory.is_empty() {
        if !compose_file.is_absolute() {
            return Err(ConfigError::invalid(
                name,
                "directory",
                format!(
                    "required because compose file '{}' is relative",
                    compose_file.display()
                ),
            ));
        }
        match normalize(compose_file).parent() {
            Some(parent) => parent.to_path_buf(),
            None => {
                return Err(ConfigError::invalid(
                    name,
                    "composeFile",
                    format!("'{}' has no parent directory", compose_file.display()),
                ))
            }
        }
    } else {
        let directory = Path::new(directory);
        if !directory.is_absolute() {
            return Err(ConfigError::invalid(
                name,
                "directory",
                format!("'{}' must be an absolute path", directory.display()),
            ));
        }
        normalize(directory)
    };

    let resolved = normalize(&working_directory.join(compose_file));
    if resolved == working_directory || !resolved.starts_with(&working_directory) {
        return Err(ConfigError::invalid(
            name,
            "composeFile",
            format!(
                "'{}' does not resolve inside '{}'",
                compose_file.display(),
                working_directory.display()
            ),
        ));
    }

    Ok((resolved, working_directory))
}

/// Lexically remove `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

fn check_port(pod: &str, field: &'static str, value: i64) -> Result<u16, ConfigError> {
    match u16::try_from(value) {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(ConfigError::PortOutOfRange {
            pod: pod.to_string(),
            field,
            value,
        }),
    }
}

/// Range-check, normalize and deduplicate a pod's forward entries
fn resolve_forwards(pod: &str, raw: &[RawPortForward]) -> Result<Vec<PortForward>, ConfigError> {
    let mut forwards: Vec<PortForward> = Vec::with_capacity(raw.len());

    for entry in raw {
        let forward = resolve(&PortForward {
            protocol: entry.protocol.clone().unwrap_or_default(),
            host_port: check_port(pod, "hostPort", entry.host_port)?,
            container_port: check_port(pod, "containerPort", entry.container_port)?,
        });

        let existing = forwards
            .iter()
            .find(|f| f.protocol == forward.protocol && f.host_port == forward.host_port);

        match existing {
            Some(existing) if existing.container_port == forward.container_port => {
                tracing::debug!(
                    "Pod {}: dropping duplicate forward {}",
                    pod,
                    forward.publish_spec()
                );
            }
            Some(existing) => {
                return Err(ConfigError::ConflictingForward {
                    pod: pod.to_string(),
                    protocol: forward.protocol,
                    host_port: forward.host_port,
                    first: existing.container_port,
                    second: forward.container_port,
                });
            }
            None => forwards.push(forward),
        }
    }

    Ok(forwards)
}
