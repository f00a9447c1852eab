//! Fleetwarden - AI-driven repository fleet intelligence
//!
//! A service that analyzes a fleet of repositories through independent
//! intelligence backends (architecture, security, community), consolidates
//! the partial results into one plan, and autonomously opens remediation
//! pull requests across the fleet.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, bind, pipeline failure)

mod analysis;
mod backend;
mod cli;
mod config;
mod error;
mod host;
mod models;
mod remediation;
mod server;
mod store;

use anyhow::{Context, Result};
use cli::{Args, RunMode};
use config::Config;
use remediation::remediate_fleet;
use server::AppState;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("Fleetwarden v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("Fleetwarden failed: {}", e);
            eprintln!("\nError: {}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .fleetwarden.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(".fleetwarden.toml");

    if path.exists() {
        eprintln!(".fleetwarden.toml already exists. Remove it first or edit it manually.");
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).context("Failed to write .fleetwarden.toml")?;

    println!("Created .fleetwarden.toml with default settings.");
    println!("Edit it to register your fleet and backend endpoints.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let level = args.log_level();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Load configuration, build the shared state, and serve or run one-shot.
async fn run(args: Args) -> Result<()> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    if config.fleet.is_empty() {
        warn!("Fleet registry is empty; analysis runs will cover zero repositories");
    } else {
        info!("Fleet registry: {} repositories", config.fleet.len());
    }

    let state = AppState::new(config)?;

    match args.oneshot {
        Some(mode) => run_oneshot(state, mode).await,
        None => server::serve(state).await,
    }
}

/// Run one pipeline stage, print the JSON result to stdout, and exit.
async fn run_oneshot(state: AppState, mode: RunMode) -> Result<()> {
    let run_id = Uuid::new_v4();
    info!("One-shot {} run {}", mode_name(mode), run_id);

    let (analysis, plan) = server::handlers::run_analysis(&state, run_id).await;

    let output = match mode {
        RunMode::Analyze => serde_json::json!({
            "run_id": run_id,
            "analyzed": analysis.successful.len(),
            "failed": analysis.failed.len(),
            "plan": plan,
            "results": analysis.successful,
            "failures": analysis.failed,
        }),
        RunMode::Remediate => {
            let report = remediate_fleet(&state.host, &analysis, &run_id).await;
            serde_json::json!({
                "run_id": run_id,
                "opened": report.applied.len(),
                "failed": report.failed.len(),
                "applied": report.applied,
                "failures": report.failed,
            })
        }
    };

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize run output")?
    );

    Ok(())
}

fn mode_name(mode: RunMode) -> &'static str {
    match mode {
        RunMode::Analyze => "analyze",
        RunMode::Remediate => "remediate",
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from .fleetwarden.toml");
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
