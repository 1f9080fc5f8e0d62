//! Severity classification
//!
//! Assigns every surviving item its effective severity and partitions the
//! list into buckets. Total: never fails, never drops.

use crate::types::{FeedbackItem, SeverityBuckets};

/// Partition items by effective severity, preserving arrival order per bucket
///
/// A declared severity wins; otherwise the category default applies. Each
/// output item carries its effective severity.
pub fn classify(items: Vec<FeedbackItem>) -> SeverityBuckets {
    let mut buckets = SeverityBuckets::default();
    for mut item in items {
        let severity = item.effective_severity();
        item.severity = Some(severity);
        buckets.push(severity, item);
    }
    buckets
}
