use anyhow::Result;

use crate::cli::LsArgs;
use crate::paths;
use crate::state::ConfigStore;

pub async fn cmd_ls(args: LsArgs) -> Result<()> {
    let store = ConfigStore::new(
        args.config_dir
            .clone()
            .unwrap_or_else(paths::default_config_dir),
    );
    let configs = store.list().await?;

    if configs.is_empty() {
        println!("no machines configured");
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:>8} {:>7} {:<20}",
        "NAME", "NAMESPACE", "STORAGE", "NICS", "CREATED"
    );
    for config in configs {
        println!(
            "{:<20} {:<12} {:>8} {:>7} {:<20}",
            config.name,
            config.namespace.as_deref().unwrap_or("-"),
            config.topology.root_ports.len(),
            config.interfaces.len(),
            config.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    Ok(())
}
