use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};
use crate::qemu::argmap::ArgValue;
use crate::qemu::launch::LaunchConfig;

/// Validates that every external resource a launch config references
/// actually exists before a launch is attempted: the machine and interface
/// namespaces, any bridges, and every slave-device backing file.
///
/// Root directories are injectable so tests can point at temp dirs.
#[derive(Debug, Clone)]
pub struct ResourceVerifier {
    netns_dir: PathBuf,
    netdev_dir: PathBuf,
}

impl Default for ResourceVerifier {
    fn default() -> Self {
        Self {
            netns_dir: PathBuf::from(crate::network::namespace::NETNS_DIR),
            netdev_dir: PathBuf::from(crate::network::namespace::NETDEV_DIR),
        }
    }
}

impl ResourceVerifier {
    pub fn with_roots(netns_dir: PathBuf, netdev_dir: PathBuf) -> Self {
        Self {
            netns_dir,
            netdev_dir,
        }
    }

    pub fn verify(&self, config: &LaunchConfig) -> Result<()> {
        if let Some(ns) = &config.namespace {
            self.check_namespace(ns)?;
        }

        for iface in &config.interfaces {
            if let Some(ns) = &iface.namespace {
                self.check_namespace(ns)?;
            }
            if let Some(bridge) = &iface.bridge {
                if !crate::network::namespace::bridge_exists_in(&self.netdev_dir, bridge) {
                    return Err(Error::ResourceNotFound(format!(
                        "bridge {} (interface {})",
                        bridge, iface.name
                    )));
                }
            }
        }

        for (_, value) in config.topology.slave_devices.iter() {
            let ArgValue::Value(value) = value else {
                continue;
            };
            if let Some(file) = backing_file(value) {
                if !Path::new(file).exists() {
                    return Err(Error::ResourceNotFound(format!("backing image {}", file)));
                }
                debug!(file, "verified backing image");
            }
        }

        Ok(())
    }

    fn check_namespace(&self, ns: &str) -> Result<()> {
        if crate::network::namespace::namespace_exists_in(&self.netns_dir, ns) {
            Ok(())
        } else {
            Err(Error::ResourceNotFound(format!(
                "network namespace {}",
                ns
            )))
        }
    }
}

/// Pull the `file=` component out of a `-drive` value string
fn backing_file(value: &str) -> Option<&str> {
    value
        .split(',')
        .find_map(|part| part.strip_prefix("file="))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qemu::argmap::ArgMap;
    use crate::qemu::topology::PcieTopology;

    fn config_with_drive(file: &str) -> LaunchConfig {
        let mut topology = PcieTopology::default();
        topology
            .slave_devices
            .append("drive", format!("file={},if=none,format=raw,id=hdd0", file));
        LaunchConfig::new("vm0", None, ArgMap::new(), topology, Vec::new())
    }

    #[test]
    fn test_backing_file_extraction() {
        assert_eq!(
            backing_file("file=/a.qcow2,if=none,format=qcow2,id=hdd0"),
            Some("/a.qcow2")
        );
        assert_eq!(backing_file("if=none,id=hdd0"), None);
    }

    #[test]
    fn test_missing_backing_image_fails() {
        let dir = tempfile::tempdir().unwrap();
        let verifier =
            ResourceVerifier::with_roots(dir.path().to_path_buf(), dir.path().to_path_buf());
        let err = verifier
            .verify(&config_with_drive("/nope/missing.raw"))
            .unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(_)));
    }

    #[test]
    fn test_existing_resources_pass() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("disk.raw");
        std::fs::write(&image, b"").unwrap();

        let netns = dir.path().join("netns");
        let netdev = dir.path().join("netdev");
        std::fs::create_dir_all(netns.join("ns1")).unwrap();
        std::fs::create_dir_all(netdev.join("br0")).unwrap();

        let mut config = config_with_drive(&image.display().to_string());
        config.namespace = Some("ns1".to_string());
        config.interfaces.push(crate::network::InterfaceConfig {
            name: "eth0".to_string(),
            namespace: Some("ns1".to_string()),
            bridge: Some("br0".to_string()),
        });

        ResourceVerifier::with_roots(netns, netdev)
            .verify(&config)
            .unwrap();
    }

    #[test]
    fn test_missing_namespace_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("disk.raw");
        std::fs::write(&image, b"").unwrap();

        let mut config = config_with_drive(&image.display().to_string());
        config.namespace = Some("ghost".to_string());

        let err = ResourceVerifier::with_roots(
            dir.path().join("netns"),
            dir.path().join("netdev"),
        )
        .verify(&config)
        .unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound(msg) if msg.contains("ghost")));
    }
}
