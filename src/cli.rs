//! Command-line interface.
//!
//! ```text
//! caching-proxy run <URL> [--port N] [--host ADDR] [--cache-dir DIR]
//!                         [--no-cache PATTERN...] [--timeout SECS] [--config FILE]
//! caching-proxy clear-cache [--cache-dir DIR] [--config FILE]
//! caching-proxy --version | -v | -V
//! ```
//!
//! Flags override values from `--config`; `--no-cache` patterns are appended
//! to the file's list.

use std::path::{Path, PathBuf};

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::cache::ResponseCache;
use crate::config::{read_config, validate_config, ConfigError, ProxyConfig};
use crate::error::{AppError, EXIT_USAGE};
use crate::lifecycle::startup;
use crate::observability::logging;

#[derive(Debug, Parser)]
#[command(name = "caching-proxy", version, disable_version_flag = true)]
#[command(about = "Cache HTTP requests and serve from cache when possible.", long_about = None)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', short_alias = 'V', long, action = ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the caching proxy server
    Run(RunArgs),
    /// Remove every cached response
    ClearCache(ClearCacheArgs),
}

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Target URL to proxy requests to
    pub url: String,

    /// Port to run the proxy server on [default: 8000]
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<String>,

    /// Directory to store cached responses [default: .cache]
    #[arg(short, long)]
    pub cache_dir: Option<PathBuf>,

    /// Path patterns that should never be cached (e.g. "/realtime/*")
    #[arg(long = "no-cache", value_name = "PATTERN", num_args = 1..)]
    pub no_cache: Vec<String>,

    /// Upstream timeout in seconds [default: 30]
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    /// Layer these flags over the config file (or defaults) and validate.
    pub fn to_config(&self) -> Result<ProxyConfig, ConfigError> {
        let mut config = base_config(self.config.as_deref())?;

        config.upstream.url = self.url.clone();
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(dir) = &self.cache_dir {
            config.cache.dir = dir.clone();
        }
        if let Some(timeout) = self.timeout {
            config.timeouts.request_secs = timeout;
        }
        config.cache.no_cache.extend(self.no_cache.iter().cloned());

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[derive(Debug, Args)]
pub struct ClearCacheArgs {
    /// Directory to store cached responses [default: .cache]
    #[arg(short, long)]
    pub cache_dir: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl ClearCacheArgs {
    /// Cache directory from the flag, the config file, or the default.
    pub fn resolve_cache_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        Ok(base_config(self.config.as_deref())?.cache.dir)
    }
}

fn base_config(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    match path {
        Some(path) => read_config(path),
        None => Ok(ProxyConfig::default()),
    }
}

/// Exit code for an argument parsing failure; help and version exit cleanly.
pub fn parse_error_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        EXIT_USAGE
    } else {
        0
    }
}

/// Execute a parsed command.
pub async fn execute(cli: Cli) -> Result<(), AppError> {
    match cli.command {
        Command::Run(args) => {
            let config = args.to_config()?;
            logging::init_logging(&config.observability.log_level);
            tracing::info!(
                upstream = %config.upstream.url,
                port = config.listener.port,
                "Starting caching proxy"
            );
            startup::run(config).await
        }
        Command::ClearCache(args) => {
            logging::init_logging("info");
            let dir = args.resolve_cache_dir()?;
            let cache = ResponseCache::open(&dir).await?;
            cache.clear().await?;
            println!("Cache cleared: {}", dir.display());
            Ok(())
        }
    }
}
