use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::fs;

use crate::paths;
use crate::qemu::launch::LaunchConfig;

/// Persists machine launch configurations as `{name}.cfg` JSON files
pub struct ConfigStore {
    config_dir: PathBuf,
}

impl ConfigStore {
    pub fn new(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    /// Initialize the config directory
    pub async fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir)
            .await
            .context("creating config directory")?;
        Ok(())
    }

    pub fn path_for(&self, name: &str) -> PathBuf {
        paths::machine_config_path(&self.config_dir, name)
    }

    /// Save a launch config. Refuses to overwrite an existing machine unless
    /// `force` is set.
    pub async fn save(&self, config: &LaunchConfig, force: bool) -> Result<PathBuf> {
        self.init().await?;
        let path = self.path_for(&config.name);
        if path.exists() && !force {
            anyhow::bail!(
                "a configuration for machine {} already exists: {} (use --force to replace)",
                config.name,
                path.display()
            );
        }
        let json = serde_json::to_string_pretty(config)?;
        fs::write(&path, json)
            .await
            .context("writing machine configuration")?;
        Ok(path)
    }

    pub async fn load(&self, name: &str) -> Result<LaunchConfig> {
        let path = self.path_for(name);
        let json = fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading machine configuration {}", path.display()))?;
        let config = serde_json::from_str(&json).context("parsing machine configuration")?;
        Ok(config)
    }

    pub async fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name);
        if path.exists() {
            fs::remove_file(&path)
                .await
                .context("deleting machine configuration")?;
        }
        Ok(())
    }

    /// List all persisted machine configs, unparsable files skipped
    pub async fn list(&self) -> Result<Vec<LaunchConfig>> {
        let mut configs = Vec::new();

        if !self.config_dir.exists() {
            return Ok(configs);
        }

        let mut entries = fs::read_dir(&self.config_dir)
            .await
            .context("reading config directory")?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("cfg") {
                if let Ok(json) = fs::read_to_string(&path).await {
                    if let Ok(config) = serde_json::from_str::<LaunchConfig>(&json) {
                        configs.push(config);
                    }
                }
            }
        }

        configs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(configs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qemu::argmap::ArgMap;
    use crate::qemu::topology::PcieTopology;

    fn sample(name: &str) -> LaunchConfig {
        LaunchConfig::new(name, None, ArgMap::new(), PcieTopology::default(), Vec::new())
    }

    #[tokio::test]
    async fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        store.save(&sample("vm0"), false).await.unwrap();
        let loaded = store.load("vm0").await.unwrap();
        assert_eq!(loaded.name, "vm0");
    }

    #[tokio::test]
    async fn test_save_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        store.save(&sample("vm0"), false).await.unwrap();
        assert!(store.save(&sample("vm0"), false).await.is_err());
        store.save(&sample("vm0"), true).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_sorted_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().to_path_buf());

        store.save(&sample("beta"), false).await.unwrap();
        store.save(&sample("alpha"), false).await.unwrap();
        std::fs::write(dir.path().join("junk.cfg"), "not json").unwrap();

        let names: Vec<_> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }
}
