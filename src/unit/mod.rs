//! Service unit generation
//!
//! Each pod becomes one service descriptor for the external supervisor.
//! The descriptor is static; running and restarting pods is left to the
//! supervisor.

pub mod descriptor;
pub mod render;

pub use descriptor::{
    generate, RestartAction, RestartPolicy, UnitDescriptor, RESTART_DELAY, STOP_TIMEOUT,
};
pub use render::{render_unit, SystemdUnit};
