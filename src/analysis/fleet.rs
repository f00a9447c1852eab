//! Fleet-level analysis orchestration.
//!
//! Every repository is analyzed concurrently with all-settled semantics:
//! each branch runs to completion independently and one repository's total
//! failure never cancels or delays another's. The output is an explicit
//! success/failure partition, not a single aggregate flag.

use crate::analysis::analyze_repository;
use crate::backend::BackendClient;
use crate::config::BackendsConfig;
use crate::host::HostClient;
use crate::models::{FleetAnalysis, RepoFailure, RepositoryDescriptor};
use futures::future::join_all;
use tracing::{info, warn};

/// Analyze the whole fleet, partitioning into successes and failures.
///
/// Holds the invariant `successful.len() + failed.len() == fleet.len()`:
/// every repository lands in exactly one side of the partition.
pub async fn analyze_fleet(
    host: &HostClient,
    backends: &BackendClient,
    cfg: &BackendsConfig,
    fleet: &[RepositoryDescriptor],
) -> FleetAnalysis {
    info!("Analyzing fleet of {} repositories", fleet.len());

    let tasks = fleet.iter().map(|repo| async move {
        match analyze_repository(host, backends, cfg, repo).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("Analysis failed for {}: {}", repo.name, e);
                Err(RepoFailure {
                    name: repo.name.clone(),
                    error: e.to_string(),
                })
            }
        }
    });

    let mut analysis = FleetAnalysis::default();
    for outcome in join_all(tasks).await {
        match outcome {
            Ok(result) => analysis.successful.push(result),
            Err(failure) => analysis.failed.push(failure),
        }
    }

    info!(
        "Fleet analysis complete: {} succeeded, {} failed",
        analysis.successful.len(),
        analysis.failed.len()
    );

    analysis
}
