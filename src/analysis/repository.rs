//! Per-repository analysis.
//!
//! Host metadata is fetched first; its failure is fatal for the repository
//! and reported by the fleet orchestrator. Given metadata, the three
//! sub-analyses (architecture, security, community) run concurrently, and
//! each failure is caught locally and converted into a null finding so a
//! single bad backend never suppresses the other two findings.

use crate::analysis::{number_field, string_field, string_seq};
use crate::backend::{BackendClient, BackendReply};
use crate::config::{BackendConfig, BackendsConfig};
use crate::error::HostError;
use crate::host::HostClient;
use crate::models::{
    AnalysisResult, ArchitectureFinding, CommunityFinding, DuplicationRisk, HostMetadata,
    RepositoryDescriptor, SecurityFinding,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, warn};

/// Analyze one repository: metadata first, then three concurrent sub-analyses.
///
/// No retries are performed here; the adapter's timeout is the only bound
/// on each sub-analysis.
pub async fn analyze_repository(
    host: &HostClient,
    backends: &BackendClient,
    cfg: &BackendsConfig,
    repo: &RepositoryDescriptor,
) -> Result<AnalysisResult, HostError> {
    let metadata = host.get_repository(&repo.name).await?;
    debug!("Fetched metadata for {}", repo.name);

    let (architecture, security, community) = tokio::join!(
        analyze_architecture(backends, &cfg.architecture, repo, &metadata),
        analyze_security(backends, &cfg.security, repo, &metadata),
        analyze_community(backends, &cfg.community, repo, &metadata),
    );

    Ok(AnalysisResult {
        name: repo.name.clone(),
        host: metadata,
        architecture,
        security,
        community,
        timestamp: Utc::now(),
    })
}

/// Shared context block embedded in every sub-analysis prompt.
fn repo_context(repo: &RepositoryDescriptor, metadata: &HostMetadata) -> String {
    format!(
        "Repository: {}\nKind: {}\nPrimary language: {}\nVisibility: {}\nDescription: {}\nTopics: {}\n",
        repo.name,
        repo.kind,
        repo.primary_language,
        repo.visibility,
        metadata.description.as_deref().unwrap_or("(none)"),
        metadata.topics.join(", "),
    )
}

async fn analyze_architecture(
    backends: &BackendClient,
    backend: &BackendConfig,
    repo: &RepositoryDescriptor,
    metadata: &HostMetadata,
) -> Option<ArchitectureFinding> {
    let prompt = format!(
        "{}\n{}\n{}",
        ARCHITECTURE_PROMPT,
        repo_context(repo, metadata),
        r#"Respond with JSON: {"patterns": [], "iac_approach": "", "integrations": [], "optimizations": [], "duplication_risk": "low|medium|high"}"#,
    );

    match backends.invoke(backend, &prompt).await {
        Ok(reply) => Some(architecture_from_reply(&reply)),
        Err(e) => {
            warn!("Architecture analysis failed for {}: {}", repo.name, e);
            None
        }
    }
}

async fn analyze_security(
    backends: &BackendClient,
    backend: &BackendConfig,
    repo: &RepositoryDescriptor,
    metadata: &HostMetadata,
) -> Option<SecurityFinding> {
    let prompt = format!(
        "{}\n{}\n{}",
        SECURITY_PROMPT,
        repo_context(repo, metadata),
        r#"Respond with JSON: {"secrets_management": "", "access_control": "", "vulnerabilities": [], "compliance_score": 0, "recommendations": []}"#,
    );

    match backends.invoke(backend, &prompt).await {
        Ok(reply) => Some(security_from_reply(&reply)),
        Err(e) => {
            warn!("Security analysis failed for {}: {}", repo.name, e);
            None
        }
    }
}

async fn analyze_community(
    backends: &BackendClient,
    backend: &BackendConfig,
    repo: &RepositoryDescriptor,
    metadata: &HostMetadata,
) -> Option<CommunityFinding> {
    let prompt = format!(
        "{}\n{}\n{}",
        COMMUNITY_PROMPT,
        repo_context(repo, metadata),
        r#"Respond with JSON: {"trends": [], "discussions": [], "similar_projects": [], "recommendations": []}"#,
    );

    match backends.invoke(backend, &prompt).await {
        Ok(reply) => Some(community_from_reply(&reply)),
        Err(e) => {
            warn!("Community analysis failed for {}: {}", repo.name, e);
            None
        }
    }
}

/// Map a backend reply into an architecture finding.
///
/// Fields are pulled individually so partial or mistyped output still
/// yields a well-formed finding; a raw-text reply yields the default.
fn architecture_from_reply(reply: &BackendReply) -> ArchitectureFinding {
    let Some(value) = reply.as_structured() else {
        return ArchitectureFinding::default();
    };

    ArchitectureFinding {
        patterns: string_seq(value, "patterns"),
        iac_approach: string_field(value, "iac_approach"),
        integrations: string_seq(value, "integrations"),
        optimizations: string_seq(value, "optimizations"),
        duplication_risk: risk_field(value, "duplication_risk"),
    }
}

fn security_from_reply(reply: &BackendReply) -> SecurityFinding {
    let Some(value) = reply.as_structured() else {
        return SecurityFinding::default();
    };

    SecurityFinding {
        secrets_management: string_field(value, "secrets_management"),
        access_control: string_field(value, "access_control"),
        vulnerabilities: string_seq(value, "vulnerabilities"),
        compliance_score: number_field(value, "compliance_score"),
        recommendations: string_seq(value, "recommendations"),
    }
}

fn community_from_reply(reply: &BackendReply) -> CommunityFinding {
    let Some(value) = reply.as_structured() else {
        return CommunityFinding::default();
    };

    CommunityFinding {
        trends: string_seq(value, "trends"),
        discussions: string_seq(value, "discussions"),
        similar_projects: string_seq(value, "similar_projects"),
        recommendations: string_seq(value, "recommendations"),
    }
}

fn risk_field(value: &Value, key: &str) -> DuplicationRisk {
    match value.get(key).and_then(|v| v.as_str()) {
        Some("high") => DuplicationRisk::High,
        Some("medium") => DuplicationRisk::Medium,
        _ => DuplicationRisk::Low,
    }
}

const ARCHITECTURE_PROMPT: &str = "You are an infrastructure architect. Review the repository \
described below and assess its architectural patterns, infrastructure-as-code approach, external \
integrations, optimization opportunities, and the risk that its logic duplicates other fleet \
repositories.";

const SECURITY_PROMPT: &str = "You are a security auditor. Review the repository described below \
and assess its secrets management, access control posture, known vulnerability exposure, \
compliance score (0-100), and remediation recommendations.";

const COMMUNITY_PROMPT: &str = "You are a developer-community researcher. For the repository \
described below, summarize relevant ecosystem trends, notable public discussions, similar \
open-source projects, and adoption recommendations.";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_architecture_mapping_with_partial_fields() {
        let reply = BackendReply::Structured(json!({
            "patterns": ["hexagonal"],
            "duplication_risk": "high"
        }));
        let finding = architecture_from_reply(&reply);
        assert_eq!(finding.patterns, vec!["hexagonal"]);
        assert_eq!(finding.duplication_risk, DuplicationRisk::High);
        // Unsupplied fields are well-formed defaults, never missing.
        assert!(finding.integrations.is_empty());
        assert!(finding.iac_approach.is_empty());
    }

    #[test]
    fn test_security_mapping_raw_text_degrades_to_default() {
        let reply = BackendReply::RawText("looks fine to me".to_string());
        let finding = security_from_reply(&reply);
        assert!(finding.vulnerabilities.is_empty());
        assert_eq!(finding.compliance_score, 0.0);
    }

    #[test]
    fn test_risk_field_unknown_defaults_to_low() {
        let value = json!({"duplication_risk": "catastrophic"});
        assert_eq!(risk_field(&value, "duplication_risk"), DuplicationRisk::Low);
    }

    #[test]
    fn test_community_mapping() {
        let reply = BackendReply::Structured(json!({
            "trends": ["edge compute"],
            "similar_projects": ["acme/edge-kit"]
        }));
        let finding = community_from_reply(&reply);
        assert_eq!(finding.trends, vec!["edge compute"]);
        assert_eq!(finding.similar_projects, vec!["acme/edge-kit"]);
        assert!(finding.discussions.is_empty());
    }

    use crate::config::HostConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn make_backends_cfg(uri: &str) -> BackendsConfig {
        let mut cfg = BackendsConfig {
            timeout_seconds: 5,
            api_key: "key".to_string(),
            ..Default::default()
        };
        cfg.architecture.endpoint = format!("{}/arch", uri);
        cfg.security.endpoint = format!("{}/sec", uri);
        cfg.community.endpoint = format!("{}/comm", uri);
        cfg
    }

    fn make_host(uri: &str) -> HostClient {
        HostClient::new(&HostConfig {
            api_url: uri.to_string(),
            owner: "example-org".to_string(),
            token: "t".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    fn structured(body: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200)
            .set_body_json(json!({ "output": serde_json::to_string(&body).unwrap() }))
    }

    #[tokio::test]
    async fn test_one_failing_sub_analysis_never_suppresses_the_others() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/example-org/payments-api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "default_branch": "main",
                "description": "Payment processing"
            })))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/arch"))
            .respond_with(structured(json!({"patterns": ["layered"]})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/sec"))
            .respond_with(structured(json!({"vulnerabilities": ["CVE-2024-0001"]})))
            .mount(&server)
            .await;
        // Community backend is down for this run.
        Mock::given(method("POST"))
            .and(path("/comm"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let host = make_host(&server.uri());
        let cfg = make_backends_cfg(&server.uri());
        let backends = BackendClient::new(&cfg).unwrap();

        let repo = RepositoryDescriptor {
            name: "payments-api".to_string(),
            kind: crate::models::RepoKind::Service,
            primary_language: "TypeScript".to_string(),
            visibility: "private".to_string(),
        };

        let result = analyze_repository(&host, &backends, &cfg, &repo)
            .await
            .unwrap();

        assert_eq!(
            result.architecture.as_ref().unwrap().patterns,
            vec!["layered"]
        );
        assert_eq!(
            result.security.as_ref().unwrap().vulnerabilities,
            vec!["CVE-2024-0001"]
        );
        assert!(result.community.is_none());
    }

    #[tokio::test]
    async fn test_metadata_failure_is_fatal_for_the_repository() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/example-org/legacy"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let host = make_host(&server.uri());
        let cfg = make_backends_cfg(&server.uri());
        let backends = BackendClient::new(&cfg).unwrap();

        let repo = RepositoryDescriptor {
            name: "legacy".to_string(),
            kind: crate::models::RepoKind::Service,
            primary_language: "Perl".to_string(),
            visibility: "private".to_string(),
        };

        assert!(analyze_repository(&host, &backends, &cfg, &repo)
            .await
            .is_err());
    }

    #[test]
    fn test_repo_context_includes_descriptor() {
        let repo = RepositoryDescriptor {
            name: "payments-api".to_string(),
            kind: crate::models::RepoKind::Service,
            primary_language: "TypeScript".to_string(),
            visibility: "private".to_string(),
        };
        let metadata = HostMetadata {
            description: Some("Payment processing".to_string()),
            ..Default::default()
        };
        let context = repo_context(&repo, &metadata);
        assert!(context.contains("payments-api"));
        assert!(context.contains("service"));
        assert!(context.contains("Payment processing"));
    }
}
