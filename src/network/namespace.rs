use std::path::{Path, PathBuf};

/// Directory where `ip netns` registers named namespaces
pub const NETNS_DIR: &str = "/var/run/netns";

/// Checks if a named network namespace exists
pub fn namespace_exists(ns_name: &str) -> bool {
    namespace_exists_in(Path::new(NETNS_DIR), ns_name)
}

/// Same check against an arbitrary netns directory (injectable for tests)
pub fn namespace_exists_in(netns_dir: &Path, ns_name: &str) -> bool {
    netns_dir.join(ns_name).exists()
}

/// Directory where the kernel exposes network devices
pub const NETDEV_DIR: &str = "/sys/class/net";

/// Checks if a bridge (or any network device) with this name exists
pub fn bridge_exists(bridge: &str) -> bool {
    bridge_exists_in(Path::new(NETDEV_DIR), bridge)
}

/// Same check against an arbitrary sysfs-style directory
pub fn bridge_exists_in(netdev_dir: &Path, bridge: &str) -> bool {
    netdev_dir.join(bridge).exists()
}

/// Path a namespace would live at, for error messages
pub fn namespace_path(ns_name: &str) -> PathBuf {
    Path::new(NETNS_DIR).join(ns_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_exists_in_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!namespace_exists_in(dir.path(), "ns1"));
        std::fs::write(dir.path().join("ns1"), b"").unwrap();
        assert!(namespace_exists_in(dir.path(), "ns1"));
    }

    #[test]
    fn test_bridge_exists_in_tempdir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!bridge_exists_in(dir.path(), "br0"));
        std::fs::create_dir(dir.path().join("br0")).unwrap();
        assert!(bridge_exists_in(dir.path(), "br0"));
    }
}
