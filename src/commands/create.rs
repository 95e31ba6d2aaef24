use anyhow::{Context, Result};
use tracing::info;

use crate::cli::CreateArgs;
use crate::network;
use crate::paths;
use crate::qemu::hardware::{base_hardware, Firmware, HardwareConfig};
use crate::qemu::launch::LaunchConfig;
use crate::qemu::topology::build_topology;
use crate::qemu::verify::ResourceVerifier;
use crate::state::ConfigStore;
use crate::storage::{QemuImg, StorageSpec};

pub async fn cmd_create(args: CreateArgs) -> Result<()> {
    let name = paths::sanitize_name(&args.name);
    anyhow::ensure!(!name.is_empty(), "machine name must not be empty");

    // Machine namespace: explicit, or the machine name unless opted out.
    let namespace = if args.no_namespace {
        None
    } else {
        Some(args.namespace.clone().unwrap_or_else(|| name.clone()))
    };

    let firmware = Firmware::from_options(args.uefi_code.clone(), args.uefi_vars.clone())?;
    let hardware = base_hardware(&HardwareConfig {
        cpu: args.cpu.clone(),
        memory: args.mem.clone(),
        firmware,
        serial: args.serial.clone(),
    });

    let mut specs: Vec<StorageSpec> = Vec::new();
    for drive in &args.harddrives {
        specs.push(StorageSpec::parse_disk(drive)?);
    }
    for cdrom in &args.cdroms {
        specs.push(StorageSpec::optical(cdrom));
    }

    let topology = build_topology(&specs, &QemuImg)
        .await
        .context("building storage topology")?;

    let interface_specs = match &args.network {
        Some(json) => network::types::parse_interface_specs(json).context("parsing --network")?,
        None => Vec::new(),
    };
    let interfaces = network::curate_interfaces(&interface_specs, namespace.as_deref())?;

    let config = LaunchConfig::new(&name, namespace, hardware, topology, interfaces);

    if !args.no_verify {
        ResourceVerifier::default()
            .verify(&config)
            .context("verifying machine resources")?;
    }

    let store = ConfigStore::new(
        args.config_dir
            .clone()
            .unwrap_or_else(paths::default_config_dir),
    );
    let path = store.save(&config, args.force).await?;

    info!(machine = %name, config = %path.display(), "machine created");

    if args.print_cmdline {
        println!("{}", config.command_line().join(" "));
    }

    Ok(())
}
