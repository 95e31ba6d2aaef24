pub mod cli;
pub mod commands;
pub mod error;
pub mod network;
pub mod paths;
pub mod qemu;
pub mod qmp;
pub mod state;
pub mod storage;

// Re-export core types for convenience
pub use error::{Error, Result};
pub use qemu::argmap::ArgMap;
pub use qemu::launch::LaunchConfig;
pub use qemu::topology::PcieTopology;
