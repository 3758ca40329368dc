//! CLI module for Pulse
//!
//! Command-line interface definitions and handlers for the service monitor.
//!
//! # Commands
//!
//! - `watch` - Live status view of the master and tenant services
//! - `check` - One-shot probe of both services
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Watch with the default streaming strategy
//! pulse watch
//!
//! # Poll instead, against a custom master
//! pulse watch --strategy poll --master-url http://10.0.0.5:3000/master-ser
//!
//! # Scriptable health probe
//! pulse check --json
//! ```

pub mod check;
pub mod completions;
pub mod config;
pub mod output;
pub mod watch;

pub use completions::handle_completions;
pub use config::handle_config_init;

use crate::config::PulseConfig;
use crate::monitor::Strategy;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Pulse - live health monitor for the master and tenant services
#[derive(Parser, Debug)]
#[command(
    name = "pulse",
    version,
    about = "Live connectivity and latency monitor for the master and tenant services"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch live service status until interrupted
    Watch(WatchArgs),
    /// Probe both services once and report
    Check(CheckArgs),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by commands that talk to the services.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "pulse.toml")]
    pub config: PathBuf,

    /// Override the master service root URL
    #[arg(long, env = "PULSE_MASTER_URL")]
    pub master_url: Option<String>,

    /// Override the tenant service root URL
    #[arg(long, env = "PULSE_TENANT_URL")]
    pub tenant_url: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "PULSE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

impl ConnectionArgs {
    /// Load configuration with CLI overrides
    pub fn load_config(&self) -> Result<PulseConfig, Box<dyn std::error::Error>> {
        // Load from file if it exists, otherwise use defaults
        let mut config = if self.config.exists() {
            PulseConfig::load(Some(&self.config))?
        } else {
            tracing::debug!("Config file not found, using defaults");
            PulseConfig::default()
        };

        // Apply environment variable overrides
        config = config.with_env_overrides();

        // Apply CLI overrides (highest priority)
        if let Some(ref url) = self.master_url {
            config.services.master.url = url.clone();
        }
        if let Some(ref url) = self.tenant_url {
            config.services.tenant.url = url.clone();
        }
        if let Some(ref log_level) = self.log_level {
            config.logging.level = log_level.clone();
        }

        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Monitoring strategy (stream, poll)
    #[arg(short, long, env = "PULSE_STRATEGY")]
    pub strategy: Option<Strategy>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "pulse.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}
