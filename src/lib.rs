//! Podwright - service units and firewall rules for compose pods
//!
//! Podwright turns a declarative mapping of named pods, each pointing at a
//! compose file, into:
//!
//! - One service descriptor per pod whose lifecycle delegates to an external
//!   compose executable (pull, `up -d`, `down`)
//! - A single firewall allow-list aggregated across every pod
//!
//! Running containers, supervising services and enforcing the firewall are
//! left to the tools the generated artifacts are handed to.

pub mod compose;
pub mod config;
pub mod error;
pub mod firewall;
pub mod generate;
pub mod output;
pub mod pod;
pub mod unit;

pub use error::{ConfigError, ConfigWarning, PodwrightError, Result};
