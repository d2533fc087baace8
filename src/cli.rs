//! Command-line interface parsing for the character mirror
//!
//! Every flag can also be set from the environment, which is how the service
//! is usually configured when deployed in a container.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::data::fetcher::{DEFAULT_BASE_URL, DEFAULT_MAX_PAGES};
use crate::service::{FailurePolicy, DEFAULT_ENDPOINT};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The upstream base URL is not an absolute http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an absolute http or https URL")]
    InvalidBaseUrl(String),

    /// The page ceiling must allow at least one page
    #[error("Invalid max pages: {0}. Must be at least 1")]
    InvalidMaxPages(usize),

    /// A zero timeout would fail every upstream request
    #[error("Invalid upstream timeout: {0}s. Must be at least 1")]
    InvalidTimeout(u64),
}

/// Rick and Morty mirror - serves a cached projection of the character API
#[derive(Parser, Debug)]
#[command(name = "rickandmorty-mirror")]
#[command(about = "Serve a cached, filtered view of the Rick and Morty character API")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "RM_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "RM_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Base URL of the upstream API
    #[arg(long, env = "RM_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Upstream collection to mirror
    #[arg(long, env = "RM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Directory holding the cache blob (defaults to the XDG cache directory)
    #[arg(long, env = "RM_CACHE_DIR", value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Maximum number of upstream pages to follow
    #[arg(long, env = "RM_MAX_PAGES", default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Per-request timeout for upstream calls, in seconds
    #[arg(long, env = "RM_UPSTREAM_TIMEOUT_SECS", value_name = "SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// Answer 502 instead of serving partial data when the upstream fails
    #[arg(long, env = "RM_STRICT")]
    pub strict: bool,
}

/// Validated configuration for running the service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub base_url: Url,
    pub endpoint: String,
    pub cache_dir: Option<PathBuf>,
    pub max_pages: usize,
    pub upstream_timeout: Option<Duration>,
    pub policy: FailurePolicy,
}

/// Parses and checks the upstream base URL
pub fn parse_base_url(s: &str) -> Result<Url, CliError> {
    let url = Url::parse(s).map_err(|_| CliError::InvalidBaseUrl(s.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(CliError::InvalidBaseUrl(s.to_string())),
    }
}

impl ServiceConfig {
    /// Creates a ServiceConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ServiceConfig)` with validated settings
    /// * `Err(CliError)` if a value is out of range
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let base_url = parse_base_url(&cli.base_url)?;

        if cli.max_pages == 0 {
            return Err(CliError::InvalidMaxPages(cli.max_pages));
        }

        let upstream_timeout = match cli.upstream_timeout_secs {
            Some(0) => return Err(CliError::InvalidTimeout(0)),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        let policy = if cli.strict {
            FailurePolicy::Strict
        } else {
            FailurePolicy::BestEffort
        };

        Ok(ServiceConfig {
            host: cli.host.clone(),
            port: cli.port,
            base_url,
            endpoint: cli.endpoint.clone(),
            cache_dir: cli.cache_dir.clone(),
            max_pages: cli.max_pages,
            upstream_timeout,
            policy,
        })
    }
}
