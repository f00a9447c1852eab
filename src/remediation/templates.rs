//! Remediation content templating.
//!
//! Pure templating for the file sets, pull-request titles/bodies, and
//! label sets attached to each opportunity kind. No external calls.

use crate::models::{AnalysisResult, GeneratedFile, Opportunity, OpportunityKind};

/// Fixed mapping from opportunity kind to pull-request title.
const PR_TITLES: &[(OpportunityKind, &str)] = &[
    (
        OpportunityKind::SecurityHardening,
        "Harden security posture with automated scanning",
    ),
    (
        OpportunityKind::DuplicationRemoval,
        "Plan removal of fleet-duplicated logic",
    ),
    (
        OpportunityKind::PerformanceOptimization,
        "Apply identified performance optimizations",
    ),
    (
        OpportunityKind::CiEnhancement,
        "Standardize the fleet CI baseline",
    ),
    (
        OpportunityKind::IntelligenceIntegration,
        "Integrate fleet intelligence reporting",
    ),
];

const GENERIC_PR_TITLE: &str = "Automated fleet remediation";

/// Resolve the pull-request title for a kind, with a generic fallback.
pub fn pr_title(kind: OpportunityKind) -> &'static str {
    PR_TITLES
        .iter()
        .find(|(k, _)| *k == kind)
        .map(|(_, title)| *title)
        .unwrap_or(GENERIC_PR_TITLE)
}

/// Generate the fixed file set for an opportunity kind.
///
/// Paths are unique within one application; re-applying the same kind
/// produces the same paths so the applier converges on updates.
pub fn generate_files(kind: OpportunityKind, repo: &str) -> Vec<GeneratedFile> {
    match kind {
        OpportunityKind::SecurityHardening => vec![
            GeneratedFile {
                path: ".github/workflows/security-scan.yml".to_string(),
                content: security_workflow(repo),
            },
            GeneratedFile {
                path: "docs/security-remediation.md".to_string(),
                content: format!(
                    "# Security Remediation\n\nTracked remediation work for `{}`, opened \
                     automatically from the latest fleet security analysis.\n",
                    repo
                ),
            },
        ],
        OpportunityKind::DuplicationRemoval => vec![GeneratedFile {
            path: "docs/consolidation-plan.md".to_string(),
            content: format!(
                "# Consolidation Plan\n\n`{}` was flagged with high duplication risk. This \
                 document tracks extraction of the shared logic into a fleet library.\n",
                repo
            ),
        }],
        OpportunityKind::PerformanceOptimization => vec![GeneratedFile {
            path: ".github/workflows/performance-check.yml".to_string(),
            content: performance_workflow(repo),
        }],
        OpportunityKind::CiEnhancement => vec![GeneratedFile {
            path: ".github/workflows/fleet-ci.yml".to_string(),
            content: ci_workflow(repo),
        }],
        OpportunityKind::IntelligenceIntegration => vec![
            GeneratedFile {
                path: ".fleetwarden/intelligence.yml".to_string(),
                content: format!(
                    "# Fleet intelligence manifest\nrepository: {}\nreporting: enabled\n",
                    repo
                ),
            },
            GeneratedFile {
                path: ".github/workflows/intelligence-report.yml".to_string(),
                content: intelligence_workflow(repo),
            },
        ],
    }
}

/// Render the pull-request body, embedding the analysis context relevant
/// to the opportunity kind.
pub fn pr_body(opportunity: &Opportunity, analysis: &AnalysisResult) -> String {
    let mut body = String::new();

    body.push_str(&format!(
        "Automated remediation for `{}` ({} priority).\n\n{}\n\n## Analysis context\n\n",
        analysis.name, opportunity.priority, opportunity.impact
    ));

    match opportunity.kind {
        OpportunityKind::SecurityHardening => {
            if let Some(security) = &analysis.security {
                body.push_str(&format!(
                    "- Vulnerability findings: {}\n- Compliance score: {:.0}\n",
                    security.vulnerabilities.len(),
                    security.compliance_score
                ));
                for vulnerability in &security.vulnerabilities {
                    body.push_str(&format!("  - {}\n", vulnerability));
                }
            }
        }
        OpportunityKind::DuplicationRemoval => {
            if let Some(architecture) = &analysis.architecture {
                body.push_str(&format!(
                    "- Duplication risk: {}\n- Observed patterns: {}\n",
                    architecture.duplication_risk,
                    architecture.patterns.join(", ")
                ));
            }
        }
        OpportunityKind::PerformanceOptimization => {
            if let Some(architecture) = &analysis.architecture {
                body.push_str("- Identified optimizations:\n");
                for optimization in &architecture.optimizations {
                    body.push_str(&format!("  - {}\n", optimization));
                }
            }
        }
        OpportunityKind::CiEnhancement | OpportunityKind::IntelligenceIntegration => {
            if let Some(community) = &analysis.community {
                if !community.trends.is_empty() {
                    body.push_str(&format!(
                        "- Ecosystem trends: {}\n",
                        community.trends.join(", ")
                    ));
                }
            }
        }
    }

    body.push_str("\nOpened by fleetwarden from the latest fleet analysis.\n");
    body
}

/// Fixed label set: provenance labels, the kind, and a priority label.
pub fn labels(opportunity: &Opportunity) -> Vec<String> {
    vec![
        "intelligence".to_string(),
        "automation".to_string(),
        opportunity.kind.to_string(),
        format!("priority:{}", opportunity.priority),
    ]
}

fn security_workflow(repo: &str) -> String {
    format!(
        "name: Security Scan\n\non:\n  push:\n    branches: [main]\n  schedule:\n    - cron: '0 6 * * 1'\n\njobs:\n  scan:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n      - name: Dependency audit ({repo})\n        run: echo 'audit placeholder'\n"
    )
}

fn performance_workflow(repo: &str) -> String {
    format!(
        "name: Performance Check\n\non:\n  pull_request:\n\njobs:\n  bench:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n      - name: Benchmark {repo}\n        run: echo 'benchmark placeholder'\n"
    )
}

fn ci_workflow(repo: &str) -> String {
    format!(
        "name: Fleet CI\n\non:\n  push:\n  pull_request:\n\njobs:\n  checks:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n      - name: Fleet baseline checks ({repo})\n        run: echo 'lint, test, build'\n"
    )
}

fn intelligence_workflow(repo: &str) -> String {
    format!(
        "name: Intelligence Report\n\non:\n  schedule:\n    - cron: '0 7 * * *'\n\njobs:\n  report:\n    runs-on: ubuntu-latest\n    steps:\n      - uses: actions/checkout@v4\n      - name: Report {repo} to fleet intelligence\n        run: echo 'report placeholder'\n"
    )
}
