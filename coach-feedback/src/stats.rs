//! Conversation statistics
//!
//! Aggregates the feedback persisted over a conversation into a score and
//! the learner's main improvement areas.

use crate::types::{Category, FeedbackItem};
use crate::workflow::DEFAULT_CATEGORY_PRIORITY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Score floor; a long conversation never scores below this
const MIN_SCORE: u32 = 50;

/// Points deducted per error
const PENALTY_PER_ERROR: u32 = 3;

/// Improvement areas reported
const MAX_IMPROVEMENT_AREAS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationStats {
    pub total_errors: usize,
    pub by_category: BTreeMap<Category, usize>,
    /// 100 for a clean conversation, never below 50
    pub overall_score: u32,
    /// Most frequent categories, most frequent first
    pub improvement_areas: Vec<Category>,
}

impl ConversationStats {
    pub fn from_items(items: &[FeedbackItem]) -> Self {
        let mut by_category: BTreeMap<Category, usize> = BTreeMap::new();
        for item in items {
            *by_category.entry(item.category).or_insert(0) += 1;
        }

        let total_errors = items.len();
        let penalty = u32::try_from(total_errors)
            .unwrap_or(u32::MAX)
            .saturating_mul(PENALTY_PER_ERROR);
        let overall_score = 100u32.saturating_sub(penalty).max(MIN_SCORE);

        let mut ranked: Vec<(Category, usize)> = by_category.iter().map(|(c, n)| (*c, *n)).collect();
        ranked.sort_by_key(|(category, count)| (std::cmp::Reverse(*count), priority_rank(*category)));

        Self {
            total_errors,
            by_category,
            overall_score,
            improvement_areas: ranked
                .into_iter()
                .take(MAX_IMPROVEMENT_AREAS)
                .map(|(c, _)| c)
                .collect(),
        }
    }
}

fn priority_rank(category: Category) -> usize {
    DEFAULT_CATEGORY_PRIORITY
        .iter()
        .position(|c| *c == category)
        .unwrap_or(DEFAULT_CATEGORY_PRIORITY.len())
}
