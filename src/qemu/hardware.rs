use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::qemu::argmap::ArgMap;

/// Firmware the machine boots with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "mode")]
pub enum Firmware {
    Bios,
    Uefi { code: PathBuf, vars: PathBuf },
}

impl Firmware {
    /// Build UEFI firmware from the CLI's two optional paths. Supplying only
    /// one half of the code/vars pair is a specification error.
    pub fn from_options(code: Option<PathBuf>, vars: Option<PathBuf>) -> Result<Self> {
        match (code, vars) {
            (None, None) => Ok(Firmware::Bios),
            (Some(code), Some(vars)) => Ok(Firmware::Uefi { code, vars }),
            (Some(_), None) => Err(Error::InvalidSpec(
                "--uefi-code given without --uefi-vars".to_string(),
            )),
            (None, Some(_)) => Err(Error::InvalidSpec(
                "--uefi-vars given without --uefi-code".to_string(),
            )),
        }
    }
}

/// Machine-wide hardware options, independent of storage topology
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareConfig {
    /// CPU model string passed to `-cpu` (e.g. "host")
    pub cpu: String,
    /// Memory size passed to `-m` (e.g. "4G")
    pub memory: String,
    pub firmware: Firmware,
    /// Base path for the serial multiplexer socket; `.serial` and
    /// `.serial.log` suffixes are derived from it
    pub serial: Option<PathBuf>,
}

/// Derived serial socket paths for a base path. Deterministic: the same base
/// always yields the same pair.
pub fn serial_paths(base: &Path) -> (PathBuf, PathBuf) {
    let mut socket = base.as_os_str().to_os_string();
    socket.push(".serial");
    let mut log = socket.clone();
    log.push(".log");
    (PathBuf::from(socket), PathBuf::from(log))
}

/// Assemble the base hardware descriptor: CPU, memory, chipset, firmware and
/// the optional muxed serial chardev.
pub fn base_hardware(config: &HardwareConfig) -> ArgMap {
    let mut hardware = ArgMap::new();
    hardware.append("cpu", &config.cpu);
    hardware.append_flag("enable-kvm");
    hardware.append("machine", "q35,accel=kvm");
    hardware.append("device", "intel-iommu");
    hardware.append("m", &config.memory);

    if let Firmware::Uefi { code, vars } = &config.firmware {
        hardware.append(
            "drive",
            format!(
                "if=pflash,format=raw,readonly=on,file={}",
                code.display()
            ),
        );
        // The vars image holds NVRAM state and must stay writable.
        hardware.append(
            "drive",
            format!("if=pflash,format=raw,file={}", vars.display()),
        );
    }

    if let Some(base) = &config.serial {
        let (socket, log) = serial_paths(base);
        hardware.append(
            "chardev",
            format!(
                "socket,path={},server=on,wait=off,id=char0,mux=on,logfile={},signal=off",
                socket.display(),
                log.display()
            ),
        );
        hardware.append("serial", "chardev:char0");
        hardware.append("mon", "chardev=char0");
    }

    hardware
}
