//! roompulse CLI
//!
//! Validates retention configuration files and drives a simulated room so
//! the two-tier status history can be observed end to end.

mod cmd_config;
mod cmd_simulate;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use roompulse_core::config::{Config, LogFormat};
use roompulse_core::error::format_error_with_remediation;
use roompulse_core::logging::{LogConfig, LogLevel, init_logging};

#[derive(Parser)]
#[command(
    name = "roompulse",
    version,
    about = "Live participant status recording with two-tier retention"
)]
struct Cli {
    /// Log level (overrides the config file; RUST_LOG overrides both)
    #[arg(long, global = true, env = "ROOMPULSE_LOG_LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format: pretty or json
    #[arg(long, global = true, env = "ROOMPULSE_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Inspect and validate configuration
    Config {
        #[command(subcommand)]
        cmd: cmd_config::ConfigCmd,
    },
    /// Simulate a room of participants changing status
    Simulate(cmd_simulate::SimulateArgs),
}

impl Command {
    /// Config file the command reads, if any.
    fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Config { cmd } => cmd.config_path(),
            Self::Simulate(args) => args.config.as_ref(),
        }
    }
}

/// Logging settings from the config file (when it loads), overridden by flags.
fn log_config(cli: &Cli) -> LogConfig {
    let mut config = cli
        .cmd
        .config_path()
        .and_then(|path| Config::load_from(path).ok())
        .map(|config| config.logging)
        .unwrap_or_default();
    if let Some(level) = cli.log_level {
        config.level = level.as_str().to_string();
    }
    if let Some(format) = cli.log_format {
        config.format = format;
    }
    config
}

fn run(cli: Cli) -> anyhow::Result<()> {
    init_logging(&log_config(&cli)).map_err(roompulse_core::Error::from)?;
    tracing::debug!(version = roompulse_core::VERSION, "roompulse starting");

    match cli.cmd {
        Command::Config { cmd } => cmd_config::run(cmd),
        Command::Simulate(args) => cmd_simulate::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<roompulse_core::Error>() {
                Some(core) => eprintln!("{}", format_error_with_remediation(core)),
                None => eprintln!("Error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}
