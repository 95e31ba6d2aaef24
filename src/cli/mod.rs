pub mod args;

pub use args::{Cli, CmdlineArgs, Commands, CreateArgs, LsArgs, StopArgs};
