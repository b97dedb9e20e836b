//! CLI module for the TPOps console
//!
//! # Commands
//!
//! - `connect` - Open the console against a backend
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Open the console against the default backend
//! tpops connect
//!
//! # Point at another backend, session not persisted
//! tpops connect --server http://tpops.internal:9000 --ephemeral
//!
//! # Generate shell completions
//! tpops completions bash > ~/.bash_completion.d/tpops
//! ```

pub mod completions;
pub mod config;
pub mod connect;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// TPOps Console - middleware domain monitoring
#[derive(Parser, Debug)]
#[command(
    name = "tpops",
    version,
    about = "Operator console for transaction-processing middleware domains"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the console
    Connect(ConnectArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args, Debug)]
pub struct ConnectArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "tpops.toml")]
    pub config: PathBuf,

    /// Override the backend base URL
    #[arg(short, long, env = "TPOPS_SERVER_URL")]
    pub server: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TPOPS_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Do not persist the session across restarts
    #[arg(long)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a starter configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output path
    #[arg(short, long, default_value = "tpops.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: Shell,
}
