use std::path::Path;

use async_trait::async_trait;
use tracing::info;

use crate::error::{Error, Result};

/// Validate a size string like "10G" or "512M".
///
/// The unit suffix is mandatory: a bare number would silently mean bytes to
/// qemu-img, which is never what a machine spec intends.
pub fn validate_size(s: &str) -> Result<()> {
    let s = s.trim();
    let Some(last) = s.chars().last() else {
        return Err(Error::InvalidSpec("empty size string".to_string()));
    };
    if !matches!(last, 'K' | 'k' | 'M' | 'm' | 'G' | 'g' | 'T' | 't') {
        return Err(Error::InvalidSpec(format!(
            "size '{}' has no unit suffix (expected K/M/G/T)",
            s
        )));
    }
    let num = &s[..s.len() - 1];
    if num.is_empty() || num.parse::<u64>().is_err() {
        return Err(Error::InvalidSpec(format!("invalid size number in '{}'", s)));
    }
    Ok(())
}

/// Collaborator that creates backing images on demand.
///
/// The topology builder only cares that an image can be brought into
/// existence; tests substitute an in-memory implementation.
#[async_trait]
pub trait ImageCreator: Send + Sync {
    async fn create_image(&self, path: &Path, format: &str, size: &str) -> Result<()>;
}

/// Real image creation via `qemu-img create`
#[derive(Debug, Clone, Default)]
pub struct QemuImg;

#[async_trait]
impl ImageCreator for QemuImg {
    async fn create_image(&self, path: &Path, format: &str, size: &str) -> Result<()> {
        info!(image = %path.display(), format, size, "creating backing image");

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::ResourceCreation {
                    path: path.to_path_buf(),
                    reason: format!("creating parent directory: {}", e),
                }
            })?;
        }

        let output = tokio::process::Command::new("qemu-img")
            .arg("create")
            .arg("-f")
            .arg(format)
            .arg(path)
            .arg(size)
            .output()
            .await
            .map_err(|e| Error::ResourceCreation {
                path: path.to_path_buf(),
                reason: format!("executing qemu-img: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ResourceCreation {
                path: path.to_path_buf(),
                reason: stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}
