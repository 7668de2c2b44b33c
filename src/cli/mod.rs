//! CLI command implementations

pub mod commands;
pub mod error;
pub mod output;

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{ClientConfig, API_KEY_ENV, BASE_URL_ENV, TIMEOUT_ENV};
use crate::generator::DEFAULT_BATCH_SIZE;

pub use error::CliError;
pub use output::{Output, OutputFormat, TextRecord};

/// SlugKit command-line interface
#[derive(Debug, Parser)]
#[command(name = "slugkit")]
#[command(about = "Generate human-readable unique identifiers with SlugKit", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Base URL of the SlugKit API
    #[arg(long, global = true, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    /// API key sent in the x-api-key header
    #[arg(long, global = true, env = API_KEY_ENV, hide_env_values = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(short = 'o', long, global = true, value_enum, default_value = "text")]
    pub output_format: OutputFormat,

    /// Attempts per call for rate-limited or failed connections (1-20)
    #[arg(long, global = true, default_value = "5", value_parser = clap::value_parser!(u32).range(1..=20))]
    pub max_retries: u32,

    /// Request timeout in seconds
    #[arg(long, global = true, env = TIMEOUT_ENV)]
    pub timeout: Option<f64>,

    /// Serve Prometheus metrics on this address, e.g. 127.0.0.1:9090
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Cli {
    /// Client configuration from the global options
    pub fn client_config(&self) -> Result<ClientConfig, CliError> {
        let base_url = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                CliError::ConfigurationError(format!(
                    "--base-url or {BASE_URL_ENV} is required"
                ))
            })?;

        let mut config = ClientConfig::new(base_url);
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            config = config.with_api_key(key);
        }
        if let Some(secs) = self.timeout {
            let timeout = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|t| !t.is_zero())
                .ok_or_else(|| {
                    CliError::InvalidArgument(format!(
                        "--timeout must be a positive number of seconds, got {secs}"
                    ))
                })?;
            config = config.with_timeout(timeout);
        }
        let retry = config.retry.with_max_attempts(self.max_retries);
        Ok(config.with_retry_policy(retry))
    }
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check that the API is reachable
    Ping,

    /// Show information about the API key
    KeyInfo,

    /// Show the subscription limits
    Limits,

    /// Show capacity and complexity of a pattern
    PatternInfo {
        /// Pattern to inspect
        pattern: String,
    },

    /// Validate a pattern
    Validate {
        /// Pattern to validate
        pattern: String,
    },

    /// Generate identifiers from an ad-hoc pattern
    Forge(ForgeArgs),

    /// Generate the next identifiers of a series, advancing its counter
    Mint(MintArgs),

    /// Preview identifiers of a series from a given sequence number
    Slice(SliceArgs),

    /// Show usage statistics
    Stats(SeriesArg),

    /// Show series metadata
    SeriesInfo(SeriesArg),

    /// List the series available to the key
    SeriesList,

    /// Register a new series
    SeriesCreate {
        /// Display name
        name: String,
        /// Generation pattern
        pattern: String,
    },

    /// Change the name or pattern of a series
    SeriesUpdate {
        /// Display name
        name: String,
        /// Generation pattern
        pattern: String,
        #[command(flatten)]
        series: SeriesArg,
    },

    /// Delete a series
    SeriesDelete(SeriesArg),

    /// Reset a series counter
    Reset(SeriesArg),

    /// Show dictionary sizes
    DictionaryInfo,

    /// List the tags of a dictionary
    DictionaryTags {
        /// Dictionary kind, e.g. noun
        kind: String,
        /// Page size
        #[arg(long, default_value_t = crate::client::DEFAULT_TAGS_LIMIT)]
        limit: u32,
        /// Page offset
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
}

/// Series selection; defaults to the series bound to the API key
#[derive(Debug, Clone, Default, Args)]
pub struct SeriesArg {
    /// Series slug
    #[arg(short, long)]
    pub series: Option<String>,
}

/// Options shared by streaming generation commands
#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Identifiers requested per call
    #[arg(short, long, default_value_t = DEFAULT_BATCH_SIZE, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: u64,

    #[command(flatten)]
    pub series: SeriesArg,

    /// Show a progress bar on stderr
    #[arg(long, default_value_t = false)]
    pub progress: bool,

    /// Write identifiers to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

/// Arguments of `mint`
#[derive(Debug, Clone, Args)]
pub struct MintArgs {
    /// Number of identifiers to generate
    #[arg(default_value_t = 1)]
    pub count: u64,

    #[command(flatten)]
    pub generate: GenerateArgs,
}

/// Arguments of `slice`
#[derive(Debug, Clone, Args)]
pub struct SliceArgs {
    /// Sequence number to start from
    #[arg(default_value_t = 0)]
    pub sequence: u64,

    /// Number of identifiers to generate
    #[arg(default_value_t = 1)]
    pub count: u64,

    #[command(flatten)]
    pub generate: GenerateArgs,
}

/// Arguments of `forge`
#[derive(Debug, Clone, Args)]
pub struct ForgeArgs {
    /// Pattern to generate from
    pub pattern: String,

    /// Seed for reproducible output; random when omitted
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Sequence number within the seeded sequence
    #[arg(short = 'n', long)]
    pub sequence: Option<u64>,

    /// Number of identifiers to generate
    #[arg(short, long, default_value_t = 1)]
    pub count: u64,

    /// Write identifiers to this file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}
