//! Pod configuration loading
//!
//! The configuration source is a YAML file mapping pod names to their
//! definitions. Loading stops at parsing; validation belongs to
//! [`crate::pod`].

pub mod loader;

pub use loader::{ConfigLoader, PodsConfig, DEFAULT_CONFIG_FILES};
