//! Specialist payload ingestion
//!
//! Model output is an untrusted data source with a nominal schema.
//! Structural problems fail the whole payload; content problems drop
//! single items.
//!
//! Structural (whole payload rejected):
//! - not JSON, or not a JSON array
//! - an element missing `category`/`original`/`corrected`/`explanation`
//! - a field of the wrong type
//!
//! Content (item dropped):
//! - category outside the closed set, or outside the specialist's assignment
//! - empty `original`, `corrected` or `explanation`
//! - "no errors" sentinel rows

use crate::types::{Category, FeedbackItem, Severity, SpecialistError};
use serde::Deserialize;
use tracing::debug;

/// `original` values specialists use to say "nothing found"
const SENTINEL_ORIGINALS: &[&str] = &["empty", "no errors found"];

/// Explanation fragments that mark a "nothing found" row
const SENTINEL_EXPLANATIONS: &[&str] = &["no se encontraron errores", "no errors found"];

/// Raw element as emitted by the model
///
/// Accepts the legacy single-analyzer field names
/// (`mistake`, `suggestion`, `issue`).
#[derive(Debug, Deserialize)]
struct RawFeedbackItem {
    category: String,
    #[serde(alias = "mistake")]
    original: String,
    #[serde(alias = "suggestion")]
    corrected: String,
    #[serde(default, alias = "issue")]
    issue_type: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    explanation: String,
    #[serde(default)]
    learning_tip: Option<String>,
    #[serde(default)]
    examples: Option<Vec<String>>,
}

/// Remove surrounding whitespace and a markdown code fence, if any
pub fn strip_code_fence(raw: &str) -> &str {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string ("json") up to the first newline
        body = match rest.find('\n') {
            Some(idx) => &rest[idx + 1..],
            None => rest.trim_start_matches("json"),
        };
        body = body.trim_end();
        if let Some(inner) = body.strip_suffix("```") {
            body = inner;
        }
    }
    body.trim()
}

/// Parse and validate a specialist's raw output
///
/// # Arguments
/// * `raw` - model output text
/// * `allowed` - categories the specialist is assigned
///
/// # Errors
/// `SpecialistError::MalformedPayload` on any structural failure.
pub fn parse_candidates(
    raw: &str,
    allowed: &[Category],
) -> Result<Vec<FeedbackItem>, SpecialistError> {
    let body = strip_code_fence(raw);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let raw_items: Vec<RawFeedbackItem> = serde_json::from_str(body)
        .map_err(|e| SpecialistError::MalformedPayload(e.to_string()))?;

    let total = raw_items.len();
    let items: Vec<FeedbackItem> = raw_items
        .into_iter()
        .filter_map(|raw| validate_item(raw, allowed))
        .collect();

    if items.len() < total {
        debug!(
            accepted = items.len(),
            dropped = total - items.len(),
            "Dropped invalid candidate items at ingestion"
        );
    }

    Ok(items)
}

fn validate_item(raw: RawFeedbackItem, allowed: &[Category]) -> Option<FeedbackItem> {
    let category = match raw.category.parse::<Category>() {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Dropping item with unknown category");
            return None;
        }
    };

    if !allowed.contains(&category) {
        debug!(category = %category, "Dropping item outside specialist assignment");
        return None;
    }

    let original = raw.original.trim();
    let corrected = raw.corrected.trim();
    let explanation = raw.explanation.trim();
    if original.is_empty() || corrected.is_empty() || explanation.is_empty() {
        return None;
    }

    if is_sentinel(original, explanation) {
        return None;
    }

    Some(FeedbackItem {
        category,
        original: original.to_string(),
        corrected: corrected.to_string(),
        issue_type: raw.issue_type.unwrap_or_default().trim().to_string(),
        severity: raw.severity.as_deref().and_then(Severity::parse),
        explanation: explanation.to_string(),
        learning_tip: raw.learning_tip.unwrap_or_default().trim().to_string(),
        examples: raw
            .examples
            .unwrap_or_default()
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect(),
    })
}

fn is_sentinel(original: &str, explanation: &str) -> bool {
    let original = original.to_lowercase();
    let explanation = explanation.to_lowercase();
    SENTINEL_ORIGINALS.contains(&original.as_str())
        || SENTINEL_EXPLANATIONS.iter().any(|s| explanation.contains(s))
}
