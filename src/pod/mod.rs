//! Pod definitions
//!
//! This module turns partially-specified pod definitions into validated,
//! fully-defaulted records and normalizes their port forwards.

pub mod config;
pub mod forward;

pub use config::{validate_all, PodRecord, RawPod, DEFAULT_COMPOSE_FILE};
pub use forward::{parse_publish_spec, resolve, PortForward, Protocol, RawPortForward};
