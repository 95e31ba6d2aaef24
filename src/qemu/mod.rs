pub mod argmap;
pub mod hardware;
pub mod launch;
pub mod topology;
pub mod verify;

pub use argmap::{ArgMap, ArgValue};
pub use hardware::{base_hardware, Firmware, HardwareConfig};
pub use launch::LaunchConfig;
pub use topology::{build_topology, PcieTopology};
