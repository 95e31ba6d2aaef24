use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "qvm", version, about = "QEMU machine provisioning and lifecycle control")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Provision a machine: build its hardware topology and store the config
    Create(CreateArgs),
    /// Print the launch command line for a stored machine
    Cmdline(CmdlineArgs),
    /// Shut a running machine down via its control socket
    Stop(StopArgs),
    /// List stored machine configurations
    Ls(LsArgs),
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Machine name
    pub name: String,

    /// CPU model
    #[arg(long, default_value = "host")]
    pub cpu: String,

    /// Memory size (e.g. 4G)
    #[arg(long, default_value = "4G")]
    pub mem: String,

    /// Disk image spec(s): PATH[:SIZE], created on demand
    #[arg(long, num_args = 0.., value_delimiter = ',')]
    pub harddrives: Vec<String>,

    /// Optical image path(s); must already exist
    #[arg(long, num_args = 0.., value_delimiter = ',')]
    pub cdroms: Vec<String>,

    /// UEFI firmware code image (requires --uefi-vars)
    #[arg(long)]
    pub uefi_code: Option<PathBuf>,

    /// UEFI firmware vars image (requires --uefi-code)
    #[arg(long)]
    pub uefi_vars: Option<PathBuf>,

    /// Base path for the muxed serial socket (.serial / .serial.log derived)
    #[arg(long)]
    pub serial: Option<PathBuf>,

    /// Network namespace for the machine (defaults to the machine name)
    #[arg(long)]
    pub namespace: Option<String>,

    /// Run without any network namespace
    #[arg(long)]
    pub no_namespace: bool,

    /// Network interfaces as a JSON array
    /// (e.g. '[{"name": "eth0", "namespace": true}]')
    #[arg(long)]
    pub network: Option<String>,

    /// Where machine configs are stored
    #[arg(long)]
    pub config_dir: Option<PathBuf>,

    /// Replace an existing machine config
    #[arg(long)]
    pub force: bool,

    /// Skip the pre-launch resource verification (namespaces, bridges)
    #[arg(long)]
    pub no_verify: bool,

    /// Also print the launch command line
    #[arg(long)]
    pub print_cmdline: bool,
}

#[derive(Args, Debug)]
pub struct CmdlineArgs {
    /// Machine name
    pub name: String,

    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Machine name
    pub name: String,

    /// Seconds to wait for a polite power-down before escalating
    #[arg(long, default_value_t = 30)]
    pub graceful_shutdown: u64,

    /// Extra seconds to wait after a forced quit before giving up
    #[arg(long, default_value_t = 5)]
    pub quit_grace: u64,

    /// Control socket path (defaults to the machine's derived path)
    #[arg(long)]
    pub socket: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct LsArgs {
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}
