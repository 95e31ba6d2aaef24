use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::qemu::argmap::ArgMap;
use crate::storage::{ImageCreator, StorageKind, StorageSpec};

/// PCIe bus/controller/device hierarchy for one machine.
///
/// Each storage resource gets a dedicated virtio-scsi controller (root
/// port), one slave-bus entry binding the guest device to that controller
/// with its boot priority, and one slave-device entry naming the backing
/// file. Controller ids are dense 0..N-1 in creation order; boot indices are
/// strictly increasing across disks and optical media alike.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcieTopology {
    /// Extra top-level buses. Intentionally empty in the base design: qemu
    /// already provides the default pcie.0 bus.
    pub buses: ArgMap,
    pub root_ports: ArgMap,
    pub slave_buses: ArgMap,
    pub slave_devices: ArgMap,
}

impl PcieTopology {
    pub fn is_empty(&self) -> bool {
        self.buses.is_empty()
            && self.root_ports.is_empty()
            && self.slave_buses.is_empty()
            && self.slave_devices.is_empty()
    }
}

/// Convert an ordered sequence of storage specs into a PCIe topology,
/// creating missing disk images through `images` as it goes.
///
/// Disks that do not exist yet are created at their requested size; optical
/// media must already exist and is never auto-created. An empty spec list is
/// fine and yields an empty topology (a machine may have no storage).
pub async fn build_topology(
    specs: &[StorageSpec],
    images: &impl ImageCreator,
) -> Result<PcieTopology> {
    let mut topology = PcieTopology::default();

    // Local accumulators, threaded through the loop: controller and boot
    // indices advance together, one step per resource, regardless of kind.
    let mut controller_index: usize = 0;
    let mut boot_index: usize = 0;
    let mut disk_index: usize = 0;
    let mut optical_index: usize = 0;

    for spec in specs {
        let format = spec.format()?;
        let path = spec.absolute_path();

        match spec.kind {
            StorageKind::Disk => {
                if !path.exists() {
                    let size = spec.size.as_deref().ok_or_else(|| {
                        Error::InvalidSpec(format!(
                            "disk {} does not exist and no size was given",
                            path.display()
                        ))
                    })?;
                    images.create_image(&path, &format, size).await?;
                }
            }
            StorageKind::Optical => {
                if !path.exists() {
                    return Err(Error::ResourceNotFound(format!(
                        "optical image {}",
                        path.display()
                    )));
                }
            }
        }

        topology.root_ports.append(
            "device",
            format!("virtio-scsi-pci,bus=pcie.0,id=scsi{}", controller_index),
        );

        match spec.kind {
            StorageKind::Disk => {
                topology.slave_buses.append(
                    "device",
                    format!(
                        "scsi-hd,drive=hdd{drive},bus=scsi{ctl}.0,id=scsi{ctl}.0,bootindex={boot}",
                        drive = disk_index,
                        ctl = controller_index,
                        boot = boot_index
                    ),
                );
                topology.slave_devices.append(
                    "drive",
                    format!(
                        "file={},if=none,format={},discard=unmap,aio=native,cache=none,id=hdd{}",
                        path.display(),
                        format,
                        disk_index
                    ),
                );
                disk_index += 1;
            }
            StorageKind::Optical => {
                topology.slave_buses.append(
                    "device",
                    format!(
                        "scsi-cd,drive=cdrom{drive},bus=scsi{ctl}.0,id=scsi{ctl}.0,bootindex={boot}",
                        drive = optical_index,
                        ctl = controller_index,
                        boot = boot_index
                    ),
                );
                topology.slave_devices.append(
                    "drive",
                    format!(
                        "file={},media=cdrom,if=none,format=raw,cache=none,id=cdrom{}",
                        path.display(),
                        optical_index
                    ),
                );
                optical_index += 1;
            }
        }

        debug!(
            controller = controller_index,
            boot = boot_index,
            path = %path.display(),
            kind = ?spec.kind,
            "attached storage resource"
        );

        controller_index += 1;
        boot_index += 1;
    }

    info!(
        controllers = controller_index,
        disks = disk_index,
        optical = optical_index,
        "built PCIe topology"
    );

    Ok(topology)
}
