//! Pod configuration file loader

use crate::compose::DEFAULT_COMPOSE_COMMAND;
use crate::error::{PodwrightError, Result};
use crate::pod::RawPod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default config file names
pub const DEFAULT_CONFIG_FILES: &[&str] = &["pods.yaml", "pods.yml"];

/// Config directory name under the user's config dir
pub const CONFIG_DIR: &str = "podwright";

/// System-wide configuration directory
pub const SYSTEM_CONFIG_DIR: &str = "/etc/podwright";

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodsConfig {
    /// Compose executable invoked by the generated units
    #[serde(default = "default_compose_command")]
    pub compose_command: String,
    /// Pod definitions by name
    #[serde(default)]
    pub pods: BTreeMap<String, RawPod>,
}

impl Default for PodsConfig {
    fn default() -> Self {
        Self {
            compose_command: default_compose_command(),
            pods: BTreeMap::new(),
        }
    }
}

fn default_compose_command() -> String {
    DEFAULT_COMPOSE_COMMAND.to_string()
}

/// Pod configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Find config file in directory
    pub fn find_config_file(dir: &Path) -> Option<PathBuf> {
        DEFAULT_CONFIG_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
    }

    /// Locate the config file when none is given explicitly.
    ///
    /// Looks in the current directory, then the user config directory, then
    /// the system config directory.
    pub fn discover() -> Option<PathBuf> {
        let mut candidates = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd);
        }
        if let Some(dir) = dirs::config_dir() {
            candidates.push(dir.join(CONFIG_DIR));
        }
        candidates.push(PathBuf::from(SYSTEM_CONFIG_DIR));

        candidates
            .iter()
            .find_map(|dir| Self::find_config_file(dir))
    }

    /// Parse config file from path
    pub fn parse_file(path: &Path) -> Result<PodsConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                PodwrightError::ConfigNotFound(path.display().to_string())
            } else {
                PodwrightError::Io(e)
            }
        })?;

        tracing::debug!("Loaded config from {}", path.display());
        Self::parse_str(&content)
    }

    /// Parse config from string
    pub fn parse_str(content: &str) -> Result<PodsConfig> {
        if content.trim().is_empty() {
            return Ok(PodsConfig::default());
        }

        serde_yaml::from_str(content)
            .map_err(|e| PodwrightError::ConfigParse(format!("Failed to parse YAML: {}", e)))
    }
}
