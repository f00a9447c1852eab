//! Remediation modules.
//!
//! `selector` derives opportunities from findings, `templates` renders the
//! generated file sets and pull-request text, and `applier` materializes
//! each opportunity as a branch, files, a pull request, and labels.

pub mod applier;
pub mod selector;
pub mod templates;

pub use applier::{apply_opportunity, remediate_fleet};
pub use selector::select_opportunities;
