//! Fleet-wide consolidation synthesis.
//!
//! One aggregate backend call turns the successful analyses into a
//! consolidation plan. The synthesizer never fails the pipeline: any
//! backend failure or unusable reply degrades to the empty plan, which
//! is an acceptable terminal outcome, not an error.

use crate::analysis::string_seq;
use crate::backend::{BackendClient, BackendReply};
use crate::config::BackendConfig;
use crate::models::{AnalysisResult, ConsolidationPlan};
use tracing::{info, warn};

/// Synthesize a consolidation plan from the successful analyses.
pub async fn synthesize(
    backends: &BackendClient,
    backend: &BackendConfig,
    analyses: &[AnalysisResult],
) -> ConsolidationPlan {
    if analyses.is_empty() {
        info!("No successful analyses; skipping consolidation synthesis");
        return ConsolidationPlan::default();
    }

    let prompt = build_prompt(analyses);

    match backends.invoke(backend, &prompt).await {
        Ok(reply) => plan_from_reply(&reply),
        Err(e) => {
            warn!("Consolidation synthesis failed, using empty plan: {}", e);
            ConsolidationPlan::default()
        }
    }
}

fn build_prompt(analyses: &[AnalysisResult]) -> String {
    let mut prompt = String::from(SYNTHESIS_PROMPT);
    prompt.push_str("\n\nRepositories:\n");

    for analysis in analyses {
        prompt.push_str(&format!(
            "- {} ({}): {}\n",
            analysis.name,
            analysis
                .host
                .language
                .as_deref()
                .unwrap_or("unknown language"),
            analysis.host.description.as_deref().unwrap_or("(none)"),
        ));
    }

    prompt.push_str(
        "\nRespond with JSON: {\"duplications\": [], \"consolidations\": [], \
         \"migrations\": [], \"risks\": [], \"priorities\": [], \"optimizations\": []}",
    );
    prompt
}

/// Map a backend reply into a plan, defaulting missing fields to empty.
fn plan_from_reply(reply: &BackendReply) -> ConsolidationPlan {
    let Some(value) = reply.as_structured() else {
        warn!("Consolidation reply was unstructured, using empty plan");
        return ConsolidationPlan::default();
    };

    ConsolidationPlan {
        duplications: string_seq(value, "duplications"),
        consolidations: string_seq(value, "consolidations"),
        migrations: string_seq(value, "migrations"),
        risks: string_seq(value, "risks"),
        priorities: string_seq(value, "priorities"),
        optimizations: string_seq(value, "optimizations"),
    }
}

const SYNTHESIS_PROMPT: &str = "You are a platform architect reviewing an entire repository \
fleet. Identify duplicated capabilities, consolidation candidates, migration paths, cross-fleet \
risks, priority work items, and optimization opportunities.";
