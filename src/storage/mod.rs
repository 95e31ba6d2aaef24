pub mod image;

pub use image::{validate_size, ImageCreator, QemuImg};

use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default size for auto-created disk images when the spec omits one
pub const DEFAULT_DISK_SIZE: &str = "20G";

/// What kind of storage resource a spec describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Disk,
    Optical,
}

/// A declarative storage resource: backing file path, creation size for
/// disks, and the device kind. Immutable once topology building starts.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StorageSpec {
    pub path: PathBuf,
    pub size: Option<String>,
    pub kind: StorageKind,
}

impl StorageSpec {
    /// Parse a disk spec of the form `PATH[:SIZE]`, e.g. `/a.qcow2:10G`.
    ///
    /// A missing size defaults to [`DEFAULT_DISK_SIZE`]; a size without a
    /// unit suffix is rejected outright rather than silently defaulted.
    pub fn parse_disk(s: &str) -> Result<Self> {
        let (path, size) = match s.split_once(':') {
            Some((path, size)) => (path, size),
            None => (s, DEFAULT_DISK_SIZE),
        };
        if path.is_empty() {
            return Err(Error::InvalidSpec(format!("empty disk path in '{}'", s)));
        }
        validate_size(size)?;
        Ok(Self {
            path: PathBuf::from(path),
            size: Some(size.to_string()),
            kind: StorageKind::Disk,
        })
    }

    /// An optical (cdrom) spec is a bare path; the media must already exist.
    pub fn optical(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size: None,
            kind: StorageKind::Optical,
        }
    }

    /// Image format inferred from the file extension (`.qcow2` -> qcow2,
    /// `.raw` -> raw). Optical media is always raw.
    pub fn format(&self) -> Result<String> {
        match self.kind {
            StorageKind::Optical => Ok("raw".to_string()),
            StorageKind::Disk => self
                .path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_string())
                .ok_or_else(|| {
                    Error::InvalidSpec(format!(
                        "cannot infer image format for {} (no file extension)",
                        self.path.display()
                    ))
                }),
        }
    }

    /// Absolute form of the backing path (relative paths resolve against the
    /// current directory without touching the filesystem).
    pub fn absolute_path(&self) -> PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(&self.path))
                .unwrap_or_else(|_| self.path.clone())
        }
    }
}
