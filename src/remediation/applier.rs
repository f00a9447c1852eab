//! Change application.
//!
//! Materializes one (repository, opportunity) pair as a branch, a small
//! generated file set, a pull request, and labels. Steps are strictly
//! sequential within one application (the branch must exist before files
//! are written, files before the pull request references them); across
//! repositories applications run concurrently with no shared state.
//!
//! Idempotence: the branch name is derived from the opportunity kind and
//! the run identifier, and each generated file is looked up on the branch
//! before writing — found files are updated with their identity token,
//! missing files are created. Re-applying the same opportunity converges
//! on the same content instead of duplicating files.

use crate::error::HostError;
use crate::host::HostClient;
use crate::models::{
    AnalysisResult, FleetAnalysis, Opportunity, PullRequestRecord, RemediationFailure,
    RemediationReport,
};
use crate::remediation::selector::select_opportunities;
use crate::remediation::templates::{generate_files, labels, pr_body, pr_title};
use futures::future::join_all;
use tracing::{info, warn};
use uuid::Uuid;

/// Deterministic branch name for one application.
///
/// The run identifier makes retries of the same run share a branch (and
/// fail loudly on the ref collision) while distinct runs stay apart.
pub fn branch_name(kind: crate::models::OpportunityKind, run_id: &Uuid) -> String {
    format!("fleetwarden/{}-{}", kind, run_id.simple())
}

/// Apply one opportunity to one repository.
pub async fn apply_opportunity(
    host: &HostClient,
    analysis: &AnalysisResult,
    opportunity: &Opportunity,
    run_id: &Uuid,
) -> Result<PullRequestRecord, HostError> {
    let repo = &analysis.name;

    // Step 1: resolve the default branch and its tip (read-only).
    let metadata = host.get_repository(repo).await?;
    let base = &metadata.default_branch;
    let tip = host.get_branch_head(repo, base).await?;

    // Step 2: create the remediation branch. A collision is fatal for
    // this opportunity and reported, never retried silently.
    let branch = branch_name(opportunity.kind, run_id);
    host.create_ref(repo, &branch, &tip).await?;

    // Steps 3-4: generate the file set, then create or update each file.
    for file in generate_files(opportunity.kind, repo) {
        let existing = host.get_file(repo, &file.path, &branch).await?;
        let message = format!("chore: {} ({})", opportunity.kind, file.path);
        host.put_file(
            repo,
            &file.path,
            &branch,
            &message,
            &file.content,
            existing.as_ref().map(|f| f.sha.as_str()),
        )
        .await?;
    }

    // Step 5: open the pull request.
    let title = pr_title(opportunity.kind);
    let body = pr_body(opportunity, analysis);
    let pull_request = host
        .create_pull_request(repo, title, &body, &branch, base)
        .await?;

    // Step 6: attach the fixed label set.
    host.add_labels(repo, pull_request.number, &labels(opportunity))
        .await?;

    info!(
        "Opened {} pull request #{} on {}",
        opportunity.kind, pull_request.number, repo
    );

    Ok(PullRequestRecord {
        number: pull_request.number,
        url: pull_request.html_url,
        title: title.to_string(),
        kind: opportunity.kind,
    })
}

/// Run remediation across every successfully analyzed repository.
///
/// Repositories are processed concurrently; each repository's (at most
/// two) opportunities are applied sequentially, and every failure is
/// recorded without aborting the rest of the run.
pub async fn remediate_fleet(
    host: &HostClient,
    analysis: &FleetAnalysis,
    run_id: &Uuid,
) -> RemediationReport {
    info!(
        "Remediating {} analyzed repositories (run {})",
        analysis.successful.len(),
        run_id
    );

    let tasks = analysis.successful.iter().map(|result| async move {
        let mut applied = Vec::new();
        let mut failed = Vec::new();

        for opportunity in select_opportunities(result) {
            match apply_opportunity(host, result, &opportunity, run_id).await {
                Ok(record) => applied.push(record),
                Err(e) => {
                    warn!(
                        "Remediation {} failed on {}: {}",
                        opportunity.kind, result.name, e
                    );
                    failed.push(RemediationFailure {
                        repository: result.name.clone(),
                        kind: opportunity.kind,
                        error: e.to_string(),
                    });
                }
            }
        }

        (applied, failed)
    });

    let mut report = RemediationReport::default();
    for (applied, failed) in join_all(tasks).await {
        report.applied.extend(applied);
        report.failed.extend(failed);
    }

    info!(
        "Remediation complete: {} pull requests opened, {} failures",
        report.applied.len(),
        report.failed.len()
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OpportunityKind;

    #[test]
    fn test_branch_name_is_deterministic_per_run() {
        let run_id = Uuid::new_v4();
        let first = branch_name(OpportunityKind::SecurityHardening, &run_id);
        let second = branch_name(OpportunityKind::SecurityHardening, &run_id);
        assert_eq!(first, second);
        assert!(first.starts_with("fleetwarden/security-hardening-"));
    }

    #[test]
    fn test_branch_name_differs_across_runs() {
        let kind = OpportunityKind::CiEnhancement;
        let first = branch_name(kind, &Uuid::new_v4());
        let second = branch_name(kind, &Uuid::new_v4());
        assert_ne!(first, second);
    }

    use crate::config::HostConfig;
    use crate::models::{HostMetadata, Opportunity, Priority};
    use chrono::Utc;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_host(uri: &str) -> HostClient {
        HostClient::new(&HostConfig {
            api_url: uri.to_string(),
            owner: "example-org".to_string(),
            token: "t".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn make_analysis(name: &str) -> AnalysisResult {
        AnalysisResult {
            name: name.to_string(),
            host: HostMetadata::default(),
            architecture: None,
            security: None,
            community: None,
            timestamp: Utc::now(),
        }
    }

    fn ci_opportunity() -> Opportunity {
        Opportunity {
            kind: OpportunityKind::CiEnhancement,
            priority: Priority::Low,
            impact: "Standardizes the fleet CI baseline".to_string(),
        }
    }

    /// Mount the read-only resolution mocks (metadata + branch head).
    async fn mount_repo_resolution(server: &MockServer, repo: &str) {
        Mock::given(method("GET"))
            .and(path(format!("/repos/example-org/{}", repo)))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"default_branch": "main"})),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!(
                "/repos/example-org/{}/git/ref/heads/main",
                repo
            )))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"object": {"sha": "tip123"}})),
            )
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_apply_creates_missing_files_and_opens_pr() {
        let server = MockServer::start().await;
        mount_repo_resolution(&server, "payments-api").await;

        Mock::given(method("POST"))
            .and(path("/repos/example-org/payments-api/git/refs"))
            .and(body_partial_json(json!({"sha": "tip123"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        // The file does not exist yet: the create path is taken.
        Mock::given(method("GET"))
            .and(path(
                "/repos/example-org/payments-api/contents/.github/workflows/fleet-ci.yml",
            ))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(
                "/repos/example-org/payments-api/contents/.github/workflows/fleet-ci.yml",
            ))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/example-org/payments-api/pulls"))
            .and(body_partial_json(json!({"base": "main"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 7,
                "html_url": "https://host.example/payments-api/pull/7"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/example-org/payments-api/issues/7/labels"))
            .and(body_partial_json(
                json!({"labels": ["intelligence", "automation", "ci-enhancement", "priority:low"]}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let host = make_host(&server.uri());
        let record = apply_opportunity(
            &host,
            &make_analysis("payments-api"),
            &ci_opportunity(),
            &Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert_eq!(record.number, 7);
        assert_eq!(record.kind, OpportunityKind::CiEnhancement);
    }

    #[tokio::test]
    async fn test_reapplying_updates_the_existing_file_with_its_token() {
        let server = MockServer::start().await;
        mount_repo_resolution(&server, "payments-api").await;

        Mock::given(method("POST"))
            .and(path("/repos/example-org/payments-api/git/refs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .mount(&server)
            .await;

        // The file already exists on the branch point: the update path
        // must carry its identity token.
        Mock::given(method("GET"))
            .and(path(
                "/repos/example-org/payments-api/contents/.github/workflows/fleet-ci.yml",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "sha": "prior-sha"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path(
                "/repos/example-org/payments-api/contents/.github/workflows/fleet-ci.yml",
            ))
            .and(body_partial_json(json!({"sha": "prior-sha"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/example-org/payments-api/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 8,
                "html_url": "https://host.example/payments-api/pull/8"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/example-org/payments-api/issues/8/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let host = make_host(&server.uri());
        let record = apply_opportunity(
            &host,
            &make_analysis("payments-api"),
            &ci_opportunity(),
            &Uuid::new_v4(),
        )
        .await
        .unwrap();

        assert_eq!(record.number, 8);
    }

    #[tokio::test]
    async fn test_branch_collision_is_fatal_for_the_opportunity() {
        let server = MockServer::start().await;
        mount_repo_resolution(&server, "payments-api").await;

        Mock::given(method("POST"))
            .and(path("/repos/example-org/payments-api/git/refs"))
            .respond_with(
                ResponseTemplate::new(422).set_body_string("Reference already exists"),
            )
            .mount(&server)
            .await;

        let host = make_host(&server.uri());
        let err = apply_opportunity(
            &host,
            &make_analysis("payments-api"),
            &ci_opportunity(),
            &Uuid::new_v4(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("422"));
    }

    #[tokio::test]
    async fn test_one_repository_failure_never_aborts_the_run() {
        let server = MockServer::start().await;

        // "api" fails its metadata resolution during application;
        // "worker" succeeds end to end.
        Mock::given(method("GET"))
            .and(path("/repos/example-org/api"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        mount_repo_resolution(&server, "worker").await;
        Mock::given(method("POST"))
            .and(path("/repos/example-org/worker/git/refs"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(
                "/repos/example-org/worker/contents/.github/workflows/fleet-ci.yml",
            ))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/example-org/worker/pulls"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "number": 9,
                "html_url": "https://host.example/worker/pull/9"
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/example-org/worker/issues/9/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let host = make_host(&server.uri());
        let analysis = FleetAnalysis {
            successful: vec![make_analysis("api"), make_analysis("worker")],
            failed: vec![],
        };

        let report = remediate_fleet(&host, &analysis, &Uuid::new_v4()).await;

        // Quiet findings select two opportunities per repository; all of
        // "api"'s fail, "worker"'s intelligence-integration files reuse
        // the mocked PUT/GET and succeed.
        assert_eq!(report.applied.len() + report.failed.len(), 4);
        assert!(report.failed.iter().all(|f| f.repository == "api"));
        assert_eq!(report.failed.len(), 2);
        assert!(report.applied.iter().all(|r| r.number == 9));
    }
}
