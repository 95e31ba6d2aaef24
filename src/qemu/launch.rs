use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::network::InterfaceConfig;
use crate::paths;
use crate::qemu::argmap::ArgMap;
use crate::qemu::topology::PcieTopology;

/// The terminal provisioning artifact: base hardware, PCIe topology and
/// resolved network interfaces for one machine.
///
/// This is what the external launcher consumes. Flattening preserves entry
/// order and duplicate flags; nothing here spawns the machine process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub base_hardware: ArgMap,
    #[serde(flatten)]
    pub topology: PcieTopology,
    #[serde(default)]
    pub interfaces: Vec<InterfaceConfig>,
    #[serde(default)]
    pub graphics: bool,
    pub created_at: DateTime<Utc>,
}

impl LaunchConfig {
    pub fn new(
        name: impl Into<String>,
        namespace: Option<String>,
        base_hardware: ArgMap,
        topology: PcieTopology,
        interfaces: Vec<InterfaceConfig>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace,
            base_hardware,
            topology,
            interfaces,
            graphics: false,
            created_at: Utc::now(),
        }
    }

    /// Flatten into the full launch argv, `ip netns exec` wrapper included
    /// when the machine lives in a namespace.
    pub fn command_line(&self) -> Vec<String> {
        let mut argv = Vec::new();

        if let Some(ns) = &self.namespace {
            argv.extend(["ip", "netns", "exec"].map(String::from));
            argv.push(ns.clone());
        }

        argv.push("qemu-system-x86_64".to_string());
        argv.push("-name".to_string());
        argv.push(self.name.clone());
        argv.push("-pidfile".to_string());
        argv.push(paths::pidfile_path(&self.name).display().to_string());

        if !self.graphics {
            argv.extend(["-display", "none", "-nographic"].map(String::from));
        }

        // Out-of-band control sockets, created server-side by qemu.
        argv.push("-qmp".to_string());
        argv.push(format!(
            "unix:{},server,nowait",
            paths::qmp_socket_path(&self.name).display()
        ));
        argv.push("-monitor".to_string());
        argv.push(format!(
            "unix:{},server,nowait",
            paths::monitor_socket_path(&self.name).display()
        ));

        argv.extend(self.base_hardware.to_args());
        argv.extend(self.topology.buses.to_args());
        argv.extend(self.topology.root_ports.to_args());
        argv.extend(self.topology.slave_buses.to_args());
        argv.extend(self.topology.slave_devices.to_args());

        for (index, iface) in self.interfaces.iter().enumerate() {
            argv.push("-netdev".to_string());
            argv.push(format!("tap,id=net{},ifname={}", index, iface.name));
            argv.push("-device".to_string());
            argv.push(format!("virtio-net-pci,netdev=net{}", index));
        }

        argv
    }
}
