//! Opportunity selection.
//!
//! A pure, deterministic mapping from one repository's analysis to a
//! ranked, capped list of remediation opportunities. Rules are evaluated
//! in a fixed order and at most the first two matches are kept — a
//! deliberate rate limit on remediation volume per repository per run.

use crate::models::{AnalysisResult, DuplicationRisk, Opportunity, OpportunityKind, Priority};

/// Cap on opportunities per repository per run.
pub const MAX_OPPORTUNITIES: usize = 2;

/// Derive the capped, ordered opportunity list for one repository.
pub fn select_opportunities(analysis: &AnalysisResult) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();

    // Rule 1: known vulnerabilities demand hardening.
    if let Some(security) = &analysis.security {
        if !security.vulnerabilities.is_empty() {
            opportunities.push(Opportunity {
                kind: OpportunityKind::SecurityHardening,
                priority: Priority::High,
                impact: format!(
                    "Addresses {} known vulnerability finding(s)",
                    security.vulnerabilities.len()
                ),
            });
        }
    }

    if let Some(architecture) = &analysis.architecture {
        // Rule 2: high duplication risk.
        if architecture.duplication_risk == DuplicationRisk::High {
            opportunities.push(Opportunity {
                kind: OpportunityKind::DuplicationRemoval,
                priority: Priority::Medium,
                impact: "Removes high-risk duplicated logic shared with the fleet".to_string(),
            });
        }

        // Rule 3: backend-identified optimizations.
        if !architecture.optimizations.is_empty() {
            opportunities.push(Opportunity {
                kind: OpportunityKind::PerformanceOptimization,
                priority: Priority::Medium,
                impact: format!(
                    "Applies {} identified optimization(s)",
                    architecture.optimizations.len()
                ),
            });
        }
    }

    // Rules 4 and 5 always match; they only surface when earlier rules
    // left room under the cap.
    opportunities.push(Opportunity {
        kind: OpportunityKind::CiEnhancement,
        priority: Priority::Low,
        impact: "Standardizes the fleet CI baseline".to_string(),
    });
    opportunities.push(Opportunity {
        kind: OpportunityKind::IntelligenceIntegration,
        priority: Priority::High,
        impact: "Wires the repository into fleet intelligence reporting".to_string(),
    });

    opportunities.truncate(MAX_OPPORTUNITIES);
    opportunities
}
