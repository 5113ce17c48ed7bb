//! Error types for Podwright

use thiserror::Error;

/// Result type for Podwright operations
pub type Result<T> = std::result::Result<T, PodwrightError>;

/// Podwright error types
#[derive(Error, Debug)]
pub enum PodwrightError {
    #[error("Invalid pod configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Config file not found: {0}")]
    ConfigNotFound(String),

    #[error("Config file parse error: {0}")]
    ConfigParse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fatal validation failures, always attributed to a pod and one of its fields
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pod '{pod}': {field} {value} is outside 1-65535")]
    PortOutOfRange {
        pod: String,
        field: &'static str,
        value: i64,
    },

    #[error("pod '{pod}': no compose file location (composeFile and directory are both empty)")]
    MissingComposeFile { pod: String },

    #[error(
        "pod '{pod}': {protocol} host port {host_port} is forwarded to both container port {first} and {second}"
    )]
    ConflictingForward {
        pod: String,
        protocol: String,
        host_port: u16,
        first: u16,
        second: u16,
    },

    #[error("pod '{pod}': invalid {field}: {message}")]
    InvalidValue {
        pod: String,
        field: &'static str,
        message: String,
    },
}

impl ConfigError {
    /// Name of the pod the error is attributed to
    pub fn pod(&self) -> &str {
        match self {
            ConfigError::PortOutOfRange { pod, .. }
            | ConfigError::MissingComposeFile { pod }
            | ConfigError::ConflictingForward { pod, .. }
            | ConfigError::InvalidValue { pod, .. } => pod,
        }
    }

    /// Field the error is attributed to
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::PortOutOfRange { field, .. } | ConfigError::InvalidValue { field, .. } => {
                *field
            }
            ConfigError::MissingComposeFile { .. } => "composeFile",
            ConfigError::ConflictingForward { .. } => "forwardPorts",
        }
    }

    pub(crate) fn invalid(pod: &str, field: &'static str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            pod: pod.to_string(),
            field,
            message: message.into(),
        }
    }
}

/// Non-fatal findings reported alongside a successful generation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A forward entry uses a protocol the firewall has no allow-list for
    UnrecognizedProtocol {
        pod: String,
        protocol: String,
        host_port: u16,
    },
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigWarning::UnrecognizedProtocol {
                pod,
                protocol,
                host_port,
            } => write!(
                f,
                "pod '{}': host port {} uses unrecognized protocol '{}', not opened in firewall",
                pod, host_port, protocol
            ),
        }
    }
}
