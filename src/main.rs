use anyhow::Result;
use clap::Parser;
use qvm::cli::{Cli, Commands};
use qvm::commands;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only use colors when stdout is a TTY (not when piped to a file).
    let use_color = atty::is(atty::Stream::Stdout);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_target(false)
        .with_ansi(use_color)
        .init();

    let result = match cli.cmd {
        Commands::Create(args) => commands::cmd_create(args).await,
        Commands::Cmdline(args) => commands::cmd_cmdline(args).await,
        Commands::Stop(args) => commands::cmd_stop(args).await,
        Commands::Ls(args) => commands::cmd_ls(args).await,
    };

    if let Err(e) = &result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }

    result
}
