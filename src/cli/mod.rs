//! cli
//!
//! Command-line interface layer for whawty-groups.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and merge it with the flags
//! - Build the logging dispatcher handed to the store
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers call [`crate::Store`] for every state
//! change and only format the results.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context as _, Result};
use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::store::Store;
use crate::ui::output::Verbosity;

/// Environment variable enabling debug logging.
pub const DEBUG_ENV: &str = "WHAWTY_GROUPS_DEBUG";

/// Everything a command handler needs.
#[derive(Debug, Clone)]
pub struct Context {
    /// Store root, from `--store` or the config file.
    pub store_root: Option<PathBuf>,
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Logging sink for store operations.
    pub dispatch: Dispatch,
    /// Staging garbage age threshold.
    pub gc_max_age: Duration,
}

impl Context {
    /// Store handle for the configured root, without checking it.
    pub fn store(&self) -> Result<Store> {
        let root = self.store_root.as_ref().context(
            "no store configured: pass --store <path> or set `store` in the config file",
        )?;
        Ok(Store::with_logger(root, self.dispatch.clone()))
    }

    /// Store handle for the configured root, after checking its layout.
    pub fn open_store(&self) -> Result<Store> {
        let store = self.store()?;
        store
            .check()
            .with_context(|| format!("cannot open store '{}'", store.root().display()))?;
        Ok(store)
    }

    pub fn quiet(&self) -> bool {
        self.verbosity == Verbosity::Quiet
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config =
        Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    // CLI flags take precedence over the config file.
    let debug = cli.debug || debug_from_env() || config.debug();
    let ctx = Context {
        store_root: cli.store.clone().or_else(|| config.store().map(Path::to_path_buf)),
        verbosity: Verbosity::from_flags(cli.quiet, debug),
        dispatch: log_dispatch(debug),
        gc_max_age: config.gc_max_age(),
    };
    if let Some(path) = config.loaded_from() {
        tracing::dispatcher::with_default(&ctx.dispatch, || {
            tracing::debug!(path = %path.display(), "loaded configuration");
        });
    }

    commands::dispatch(cli.command, &ctx)
}

fn debug_from_env() -> bool {
    std::env::var(DEBUG_ENV)
        .map(|v| !matches!(v.trim(), "" | "0" | "false" | "no"))
        .unwrap_or(false)
}

/// Logging sink: a stderr formatter when debugging, nothing otherwise.
///
/// `RUST_LOG` refines the filter; without it everything from this crate
/// at debug level and above is shown.
pub fn log_dispatch(debug: bool) -> Dispatch {
    if !debug {
        return Dispatch::none();
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("whawty_groups=debug"));
    let subscriber = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .finish();
    Dispatch::new(subscriber)
}
