pub mod curate;
pub mod namespace;
pub mod types;

pub use curate::curate_interfaces;
pub use types::{InterfaceConfig, InterfaceSpec, NamespaceRequest};
