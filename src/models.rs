//! Data models for the fleet intelligence pipeline.
//!
//! This module contains all the core data structures used throughout
//! the application for representing repositories, findings, plans,
//! and remediation results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a managed repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    Service,
    Library,
    Infrastructure,
    Documentation,
    #[serde(other)]
    Tooling,
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoKind::Service => write!(f, "service"),
            RepoKind::Library => write!(f, "library"),
            RepoKind::Infrastructure => write!(f, "infrastructure"),
            RepoKind::Documentation => write!(f, "documentation"),
            RepoKind::Tooling => write!(f, "tooling"),
        }
    }
}

/// One repository in the managed fleet.
///
/// Sourced from the fleet registry in configuration; never mutated at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    /// Repository name (unique within the fleet).
    pub name: String,
    /// Kind of repository.
    pub kind: RepoKind,
    /// Primary implementation language.
    pub primary_language: String,
    /// Visibility (`public` or `private`).
    pub visibility: String,
}

/// Host-side repository metadata embedded in every analysis result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostMetadata {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_branch_name")]
    pub default_branch: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub open_issues_count: u64,
}

fn default_branch_name() -> String {
    "main".to_string()
}

/// Estimated risk of code duplication across the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicationRisk {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for DuplicationRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicationRisk::Low => write!(f, "low"),
            DuplicationRisk::Medium => write!(f, "medium"),
            DuplicationRisk::High => write!(f, "high"),
        }
    }
}

/// Architecture analysis finding for one repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchitectureFinding {
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub iac_approach: String,
    #[serde(default)]
    pub integrations: Vec<String>,
    #[serde(default)]
    pub optimizations: Vec<String>,
    #[serde(default)]
    pub duplication_risk: DuplicationRisk,
}

/// Security analysis finding for one repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityFinding {
    #[serde(default)]
    pub secrets_management: String,
    #[serde(default)]
    pub access_control: String,
    #[serde(default)]
    pub vulnerabilities: Vec<String>,
    #[serde(default)]
    pub compliance_score: f64,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Community trend finding for one repository.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommunityFinding {
    #[serde(default)]
    pub trends: Vec<String>,
    #[serde(default)]
    pub discussions: Vec<String>,
    #[serde(default)]
    pub similar_projects: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// The complete analysis of one repository.
///
/// Produced whenever the host metadata fetch succeeds. Any of the three
/// findings may be `None` if its sub-analysis failed; the record itself
/// is never dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub name: String,
    pub host: HostMetadata,
    pub architecture: Option<ArchitectureFinding>,
    pub security: Option<SecurityFinding>,
    pub community: Option<CommunityFinding>,
    pub timestamp: DateTime<Utc>,
}

/// A repository whose analysis failed entirely (host metadata fetch).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFailure {
    pub name: String,
    pub error: String,
}

/// Partition of a fleet run into successes and failures.
///
/// Invariant: `successful.len() + failed.len()` equals the fleet size.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetAnalysis {
    pub successful: Vec<AnalysisResult>,
    pub failed: Vec<RepoFailure>,
}

impl FleetAnalysis {
    /// Total number of repositories covered by this run.
    pub fn total(&self) -> usize {
        self.successful.len() + self.failed.len()
    }
}

/// Fleet-wide consolidation recommendations.
///
/// Fields are never absent — a failed synthesis call yields the default
/// (all-empty) plan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsolidationPlan {
    #[serde(default)]
    pub duplications: Vec<String>,
    #[serde(default)]
    pub consolidations: Vec<String>,
    #[serde(default)]
    pub migrations: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    #[serde(default)]
    pub priorities: Vec<String>,
    #[serde(default)]
    pub optimizations: Vec<String>,
}

impl ConsolidationPlan {
    /// True when the synthesis produced nothing actionable.
    pub fn is_empty(&self) -> bool {
        self.duplications.is_empty()
            && self.consolidations.is_empty()
            && self.migrations.is_empty()
            && self.risks.is_empty()
            && self.priorities.is_empty()
            && self.optimizations.is_empty()
    }
}

/// Kind of remediation opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpportunityKind {
    SecurityHardening,
    DuplicationRemoval,
    PerformanceOptimization,
    CiEnhancement,
    IntelligenceIntegration,
}

impl OpportunityKind {
    /// Stable identifier used in branch names and labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityKind::SecurityHardening => "security-hardening",
            OpportunityKind::DuplicationRemoval => "duplication-removal",
            OpportunityKind::PerformanceOptimization => "performance-optimization",
            OpportunityKind::CiEnhancement => "ci-enhancement",
            OpportunityKind::IntelligenceIntegration => "intelligence-integration",
        }
    }
}

impl fmt::Display for OpportunityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Priority of a remediation opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// A candidate remediation action derived from one repository's findings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub kind: OpportunityKind,
    pub priority: Priority,
    pub impact: String,
}

/// A file to be created or updated as part of a remediation change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub path: String,
    pub content: String,
}

/// Result of a successfully opened remediation pull request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequestRecord {
    pub number: u64,
    pub url: String,
    pub title: String,
    pub kind: OpportunityKind,
}

/// A (repository, opportunity) application that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemediationFailure {
    pub repository: String,
    pub kind: OpportunityKind,
    pub error: String,
}

/// Outcome of a remediation run across the fleet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemediationReport {
    pub applied: Vec<PullRequestRecord>,
    pub failed: Vec<RemediationFailure>,
}

/// Serialized summary of one fleet run, persisted to the result store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetRunSummary {
    pub run_id: uuid::Uuid,
    pub analyzed: usize,
    pub failed: usize,
    pub plan: ConsolidationPlan,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplication_risk_ordering() {
        assert!(DuplicationRisk::Low < DuplicationRisk::Medium);
        assert!(DuplicationRisk::Medium < DuplicationRisk::High);
    }

    #[test]
    fn test_duplication_risk_default_is_low() {
        assert_eq!(DuplicationRisk::default(), DuplicationRisk::Low);
    }

    #[test]
    fn test_opportunity_kind_wire_format() {
        let json = serde_json::to_string(&OpportunityKind::SecurityHardening).unwrap();
        assert_eq!(json, "\"security-hardening\"");

        let kind: OpportunityKind = serde_json::from_str("\"ci-enhancement\"").unwrap();
        assert_eq!(kind, OpportunityKind::CiEnhancement);
    }

    #[test]
    fn test_consolidation_plan_default_is_empty() {
        let plan = ConsolidationPlan::default();
        assert!(plan.is_empty());
        assert!(plan.duplications.is_empty());
        assert!(plan.priorities.is_empty());
    }

    #[test]
    fn test_consolidation_plan_partial_json() {
        // A backend that returns only some fields still maps to a full plan.
        let plan: ConsolidationPlan =
            serde_json::from_str(r#"{"risks": ["shared auth logic"]}"#).unwrap();
        assert_eq!(plan.risks, vec!["shared auth logic".to_string()]);
        assert!(plan.duplications.is_empty());
        assert!(plan.optimizations.is_empty());
    }

    #[test]
    fn test_fleet_analysis_total() {
        let analysis = FleetAnalysis {
            successful: vec![AnalysisResult {
                name: "api".to_string(),
                host: HostMetadata::default(),
                architecture: None,
                security: None,
                community: None,
                timestamp: Utc::now(),
            }],
            failed: vec![RepoFailure {
                name: "legacy".to_string(),
                error: "metadata fetch failed".to_string(),
            }],
        };
        assert_eq!(analysis.total(), 2);
    }

    #[test]
    fn test_repo_kind_unknown_deserializes_as_tooling() {
        let kind: RepoKind = serde_json::from_str("\"experiment\"").unwrap();
        assert_eq!(kind, RepoKind::Tooling);
    }

    #[test]
    fn test_finding_partial_json_defaults() {
        let finding: ArchitectureFinding =
            serde_json::from_str(r#"{"patterns": ["event-driven"]}"#).unwrap();
        assert_eq!(finding.patterns, vec!["event-driven".to_string()]);
        assert_eq!(finding.duplication_risk, DuplicationRisk::Low);
        assert!(finding.optimizations.is_empty());
    }
}
