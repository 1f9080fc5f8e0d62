//! Span Deduplicator - Category-Priority Conflict Resolution
//!
//! Specialists are independently instructed and may flag the same phrase
//! from different angles. At most one suggestion survives per span.
//!
//! # Algorithm
//! 1. Key each item by its normalized `original` (trim + lowercase)
//! 2. Group items sharing a key (groups keep first-appearance order)
//! 3. Singleton groups pass through unchanged
//! 4. Larger groups keep the first item of the highest-priority category
//!    present; if none matches the priority list, the group's first item

use crate::types::{Category, FeedbackItem};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Default tie-break order for items sharing a span
pub const DEFAULT_CATEGORY_PRIORITY: [Category; 6] = [
    Category::Grammar,
    Category::Vocabulary,
    Category::Expression,
    Category::Collocation,
    Category::PhrasalVerb,
    Category::ContextAppropriateness,
];

/// Record of one resolved span conflict
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanConflict {
    /// Normalized span
    pub span: String,
    /// Category of the surviving item
    pub kept: Category,
    /// Categories of the discarded items, in arrival order
    pub discarded: Vec<Category>,
}

/// Deduplication output
#[derive(Debug, Clone, Default)]
pub struct DedupOutcome {
    /// One item per distinct span
    pub items: Vec<FeedbackItem>,
    /// Conflicts that were resolved
    pub conflicts: Vec<SpanConflict>,
}

/// Span deduplicator with a configurable priority order
#[derive(Debug, Clone)]
pub struct Deduplicator {
    priority: Vec<Category>,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new(DEFAULT_CATEGORY_PRIORITY.to_vec())
    }
}

impl Deduplicator {
    pub fn new(priority: Vec<Category>) -> Self {
        Self { priority }
    }

    /// Keep exactly one item per normalized span
    pub fn deduplicate(&self, items: Vec<FeedbackItem>) -> DedupOutcome {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<FeedbackItem>)> = Vec::new();

        for item in items {
            let key = item.span_key();
            match index.get(&key) {
                Some(&slot) => groups[slot].1.push(item),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push((key, vec![item]));
                }
            }
        }

        let mut outcome = DedupOutcome::default();
        for (span, mut group) in groups {
            if group.len() == 1 {
                outcome.items.extend(group);
                continue;
            }

            let winner = self.select(&group);
            let kept = group.remove(winner);
            let conflict = SpanConflict {
                span,
                kept: kept.category,
                discarded: group.iter().map(|i| i.category).collect(),
            };

            debug!(
                span = %conflict.span,
                kept = %conflict.kept,
                discarded = ?conflict.discarded,
                "Resolved span conflict"
            );

            outcome.conflicts.push(conflict);
            outcome.items.push(kept);
        }

        outcome
    }

    /// Index of the item to keep within a multi-item group
    fn select(&self, group: &[FeedbackItem]) -> usize {
        self.priority
            .iter()
            .find_map(|category| group.iter().position(|i| i.category == *category))
            .unwrap_or(0)
    }
}
