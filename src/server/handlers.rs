//! Route handlers.
//!
//! Every response carries successes and failures explicitly; partial
//! failure is never an exception-shaped payload.

use crate::analysis::{analyze_fleet, synthesize};
use crate::models::{
    ConsolidationPlan, FleetAnalysis, FleetRunSummary, PullRequestRecord, RemediationFailure,
    RepoFailure,
};
use crate::remediation::remediate_fleet;
use crate::server::AppState;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// Response of the `analyze` route: the partition, the plan, and counts.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub run_id: Uuid,
    pub analyzed: usize,
    pub failed: usize,
    pub plan: ConsolidationPlan,
    pub results: Vec<crate::models::AnalysisResult>,
    pub failures: Vec<RepoFailure>,
}

/// Response of the `optimize`/`remediate` routes.
///
/// The counts and the lists use distinct keys (`failed` vs `failures`)
/// so the object never carries a duplicate key; the one-shot CLI output
/// mirrors this shape.
#[derive(Debug, Serialize)]
pub struct OptimizeResponse {
    pub run_id: Uuid,
    pub opened: usize,
    pub failed: usize,
    pub applied: Vec<PullRequestRecord>,
    pub failures: Vec<RemediationFailure>,
}

#[derive(Debug, Deserialize)]
pub struct RunParams {
    /// Optional externally-supplied run identifier, letting a caller
    /// retry a run under the same idempotency key.
    pub run_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub fleet_size: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert a query-extraction rejection into the JSON error shape every
/// other response uses.
fn bad_request(rejection: QueryRejection) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: rejection.body_text(),
        }),
    )
}

/// Run fleet analysis and consolidation, cache the result, persist the
/// summary best-effort, and return the full partition.
pub async fn analyze(
    State(state): State<AppState>,
    params: Result<Query<RunParams>, QueryRejection>,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Query(params) = params.map_err(bad_request)?;
    let run_id = params.run_id.unwrap_or_else(Uuid::new_v4);
    let (analysis, plan) = run_analysis(&state, run_id).await;

    Ok(Json(AnalyzeResponse {
        run_id,
        analyzed: analysis.successful.len(),
        failed: analysis.failed.len(),
        results: analysis.successful,
        failures: analysis.failed,
        plan,
    }))
}

/// Apply remediation across the fleet using the cached analysis, running
/// a fresh one first when none exists.
pub async fn optimize(
    State(state): State<AppState>,
    params: Result<Query<RunParams>, QueryRejection>,
) -> Result<Json<OptimizeResponse>, (StatusCode, Json<ErrorResponse>)> {
    let Query(params) = params.map_err(bad_request)?;
    let run_id = params.run_id.unwrap_or_else(Uuid::new_v4);

    let cached = state.latest_analysis.read().await.clone();
    let analysis = match cached {
        Some(analysis) => analysis,
        None => {
            info!("No cached analysis; running a fresh one before remediation");
            run_analysis(&state, run_id).await.0
        }
    };

    let report = remediate_fleet(&state.host, &analysis, &run_id).await;

    Ok(Json(OptimizeResponse {
        run_id,
        opened: report.applied.len(),
        failed: report.failed.len(),
        applied: report.applied,
        failures: report.failed,
    }))
}

/// Liveness probe.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        fleet_size: state.config.fleet.len(),
    })
}

/// JSON 404 for unknown routes.
pub async fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_string(),
        }),
    )
}

/// Shared analysis flow: fan out, synthesize, cache, persist.
pub async fn run_analysis(state: &AppState, run_id: Uuid) -> (FleetAnalysis, ConsolidationPlan) {
    let analysis = analyze_fleet(
        &state.host,
        &state.backends,
        &state.config.backends,
        &state.config.fleet,
    )
    .await;

    let plan = synthesize(
        &state.backends,
        &state.config.backends.synthesis,
        &analysis.successful,
    )
    .await;

    *state.latest_analysis.write().await = Some(analysis.clone());

    // Fire-and-forget persistence: a store failure is logged, never
    // surfaced to the caller.
    state
        .store
        .store(&FleetRunSummary {
            run_id,
            analyzed: analysis.successful.len(),
            failed: analysis.failed.len(),
            plan: plan.clone(),
            timestamp: Utc::now(),
        })
        .await;

    (analysis, plan)
}
