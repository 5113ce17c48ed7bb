//! Compose invocation building
//!
//! This module assembles the arguments handed to the external compose
//! executable. Nothing here runs the executable.

pub mod args;
pub mod shell;

pub use args::{build, PodArgs, SHARED_NAMESPACES};

/// Compose executable used when the configuration does not name one
pub const DEFAULT_COMPOSE_COMMAND: &str = "podman-compose";
