use anyhow::Result;

use crate::cli::CmdlineArgs;
use crate::paths;
use crate::state::ConfigStore;

pub async fn cmd_cmdline(args: CmdlineArgs) -> Result<()> {
    let store = ConfigStore::new(
        args.config_dir
            .clone()
            .unwrap_or_else(paths::default_config_dir),
    );
    let config = store.load(&args.name).await?;
    println!("{}", config.command_line().join(" "));
    Ok(())
}
