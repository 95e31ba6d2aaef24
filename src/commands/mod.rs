pub mod cmdline;
pub mod create;
pub mod ls;
pub mod stop;

// Re-export command functions
pub use cmdline::cmd_cmdline;
pub use create::cmd_create;
pub use ls::cmd_ls;
pub use stop::cmd_stop;
