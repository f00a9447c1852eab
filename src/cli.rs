//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use std::path::PathBuf;

/// Fleetwarden - AI-driven repository fleet analysis and remediation
///
/// Analyzes every repository in a configured fleet through independent
/// intelligence backends, consolidates the results into one plan, and
/// opens remediation pull requests autonomously.
///
/// Examples:
///   fleetwarden --config fleet.toml
///   fleetwarden --port 9000 --owner example-org
///   fleetwarden --oneshot analyze
///   fleetwarden --oneshot remediate
///   fleetwarden --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .fleetwarden.toml in the current directory.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Bind address for the HTTP server
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Listen port for the HTTP server
    #[arg(short, long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Owner/organization holding the fleet
    #[arg(long, value_name = "NAME")]
    pub owner: Option<String>,

    /// Version-control host API token
    #[arg(long, value_name = "TOKEN", env = "FLEETWARDEN_HOST_TOKEN")]
    pub host_token: Option<String>,

    /// Bearer credential for the analysis backends
    #[arg(long, value_name = "KEY", env = "FLEETWARDEN_BACKEND_KEY")]
    pub backend_key: Option<String>,

    /// Per-request backend timeout in seconds
    ///
    /// Bounds every backend call so one slow service cannot stall a run.
    #[arg(long, value_name = "SECS")]
    pub backend_timeout: Option<u64>,

    /// Run one pipeline stage and exit instead of serving HTTP
    ///
    /// `analyze` runs fleet analysis + consolidation; `remediate` runs
    /// analysis followed by remediation. The JSON result is printed to stdout.
    #[arg(long, value_name = "MODE")]
    pub oneshot: Option<RunMode>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .fleetwarden.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Pipeline stage for --oneshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RunMode {
    /// Fleet analysis and consolidation plan
    Analyze,
    /// Analysis followed by autonomous remediation
    Remediate,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(0) = self.port {
            return Err("Port must be at least 1".to_string());
        }

        if let Some(0) = self.backend_timeout {
            return Err("Backend timeout must be at least 1 second".to_string());
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
