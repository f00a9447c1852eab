//! Fleet analysis modules.
//!
//! `repository` analyzes one repository, `fleet` fans that out over the
//! whole registry, and `consolidation` folds the successes into one plan.

pub mod consolidation;
pub mod fleet;
pub mod repository;

pub use consolidation::synthesize;
pub use fleet::analyze_fleet;
pub use repository::analyze_repository;

use serde_json::Value;

/// Extract a string field, defaulting to empty when absent or mistyped.
pub(crate) fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

/// Extract a sequence of strings, dropping non-string entries.
pub(crate) fn string_seq(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Extract a numeric field, defaulting to zero.
pub(crate) fn number_field(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(|v| v.as_f64()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_seq_drops_non_strings() {
        let value = json!({"items": ["a", 1, "b", null]});
        assert_eq!(string_seq(&value, "items"), vec!["a", "b"]);
    }

    #[test]
    fn test_field_helpers_default_on_absence() {
        let value = json!({});
        assert_eq!(string_field(&value, "missing"), "");
        assert!(string_seq(&value, "missing").is_empty());
        assert_eq!(number_field(&value, "missing"), 0.0);
    }
}
