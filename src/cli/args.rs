//! Command line argument parsing

use crate::core::{ExtractOptions, Strategy};
use crate::platform::agents::{ShuffleMode, DEFAULT_AGENT_COUNT};
use crate::platform::client::{DEFAULT_API_SERVER, DEFAULT_ORIGIN};
use clap::builder::TypedValueParser;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// Fetch direct download links from ctfile.
///
/// Feed the result to a download tool, e.g. `aria2c -i urllist.txt`.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Share URL, e.g. https://abc.400gb.com/i/123/f/XYZ
    pub url: String,

    /// Number of user agents to try (the built-in pool holds 19; 16 or fewer recommended)
    #[arg(
        short = 'n',
        long = "num-user-agent",
        value_name = "N",
        default_value_t = DEFAULT_AGENT_COUNT,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    pub num_user_agents: usize,

    /// Output file (defaults to stdout)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// How to resolve the file parameters
    #[arg(long, value_enum, default_value = "api")]
    pub strategy: StrategyArg,

    /// Metadata API server (getfile.php)
    #[arg(long, value_name = "URL", default_value = DEFAULT_API_SERVER)]
    pub api_server: String,

    /// Origin header sent to the API
    #[arg(long, value_name = "URL", default_value = DEFAULT_ORIGIN)]
    pub origin: String,

    /// Keep the built-in user agent order instead of shuffling
    #[arg(long)]
    pub no_shuffle: bool,

    /// HTTP timeout per request (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "30s")]
    pub timeout: humantime::Duration,

    /// Proxy URL (http/https/socks)
    #[arg(long, value_name = "URL")]
    pub proxy: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Resolution strategy
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StrategyArg {
    /// Scrape `userid` and `free_down(...)` from the share page
    Page,
    /// Query the getfile.php metadata API
    Api,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Page => Strategy::PageScrape,
            StrategyArg::Api => Strategy::MetadataApi,
        }
    }
}

impl Args {
    /// Get HTTP timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Shuffle mode for the agent pool
    pub fn shuffle_mode(&self) -> ShuffleMode {
        if self.no_shuffle {
            ShuffleMode::Fixed
        } else {
            ShuffleMode::Shuffled
        }
    }

    /// Options for the link extractor
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            strategy: self.strategy.into(),
            agent_count: self.num_user_agents,
            shuffle: self.shuffle_mode(),
            api_server: self.api_server.clone(),
            origin: self.origin.clone(),
            timeout: self.timeout_duration(),
            proxy_url: self.proxy.clone(),
        }
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

impl VerbosityLevel {
    /// Default tracing filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        match self {
            VerbosityLevel::Quiet => "error",
            VerbosityLevel::Normal => "warn",
            VerbosityLevel::Verbose => "debug",
        }
    }
}
