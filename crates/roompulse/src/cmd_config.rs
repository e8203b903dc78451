use std::path::{Path, PathBuf};

use clap::Subcommand;
use roompulse_core::config::Config;
use roompulse_core::error::Error;

// ── CLI Schema ──

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Load a TOML file and report every invalid setting
    Check {
        /// Path to the configuration file
        path: PathBuf,
    },
    /// Print the effective configuration as TOML
    Show {
        /// Configuration file to load (defaults are shown when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

impl ConfigCmd {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Self::Check { path } => Some(path),
            Self::Show { config } => config.as_ref(),
        }
    }
}

// ── Dispatch ──

pub fn run(cmd: ConfigCmd) -> anyhow::Result<()> {
    match cmd {
        ConfigCmd::Check { path } => check(&path),
        ConfigCmd::Show { config } => show(config.as_deref()),
    }
}

// ── Command Implementations ──

/// `roompulse config check <path>`
fn check(path: &Path) -> anyhow::Result<()> {
    let config = Config::load_from(path).map_err(Error::from)?;
    let retention = &config.retention;
    tracing::info!(path = %path.display(), "configuration valid");
    println!("OK: {}", path.display());
    println!(
        "  dense: every {}s for the last {}s",
        retention.dense_snapshot_interval_secs, retention.dense_interval_window_secs
    );
    println!(
        "  sparse: every {}s, at most {} snapshots in total",
        retention.sparse_snapshot_interval_secs, retention.max_snapshot_count
    );
    Ok(())
}

/// `roompulse config show [--config <path>]`
fn show(path: Option<&Path>) -> anyhow::Result<()> {
    let config = match path {
        Some(path) => Config::load_from(path).map_err(Error::from)?,
        None => Config::default(),
    };
    print!("{}", config.to_toml_string().map_err(Error::from)?);
    Ok(())
}
