use std::path::PathBuf;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error taxonomy for provisioning and lifecycle control.
///
/// Malformed input is never retried; missing resources are surfaced so the
/// caller can decide whether to create them; protocol errors carry the final
/// session state back to the caller. Garbled individual QMP messages are not
/// errors at all (they are logged and skipped inside the session).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed user input: unit-less sizes, half a UEFI pflash pair,
    /// auto-namespace with no global fallback source, etc.
    #[error("invalid specification: {0}")]
    InvalidSpec(String),

    /// A referenced external resource (optical image, netns, bridge) does
    /// not exist and will not be auto-created.
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    /// Backing image creation was attempted and failed.
    #[error("could not create image {path}: {reason}")]
    ResourceCreation { path: PathBuf, reason: String },

    /// An interface requested namespace auto-resolution but no machine-wide
    /// namespace was available to substitute.
    #[error("could not determine a namespace for interface {0}")]
    NamespaceResolution(String),

    /// The control socket dropped or errored mid-session.
    #[error("control socket connection lost: {0}")]
    ConnectionLost(#[source] std::io::Error),

    /// The machine never confirmed shutdown within grace + quit-grace.
    #[error("machine did not shut down within {0:?}")]
    ProtocolTimeout(std::time::Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
