//! Specialists - per-category correction proposers
//!
//! Each specialist covers one linguistic category and is invoked
//! concurrently with every other specialist against the same turn.
//!
//! # Specialists
//! 1. **grammar** - tenses, agreement, auxiliaries, prepositions, articles
//! 2. **vocabulary** - wrong or unnatural word choice, false friends
//! 3. **phrasal_verb** - malformed or missed phrasal verbs
//! 4. **collocation** - unnatural word combinations
//! 5. **expression** - literal translations, robotic phrasing
//! 6. **context_appropriateness** - register mismatch for the scenario
//!
//! Failed specialists do not block the others or fail the analysis.

pub mod chat_completion;
pub mod payload;

pub use chat_completion::{ChatClient, ChatCompletionSpecialist};

use crate::types::{AnalysisRequest, Category, SpecialistInput};

/// Category plus its analysis instructions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialistProfile {
    pub category: Category,
    pub instructions: String,
}

impl SpecialistProfile {
    /// Profile with the built-in instructions for `category`
    pub fn for_category(category: Category) -> Self {
        Self {
            category,
            instructions: default_instructions(category).to_string(),
        }
    }

    /// One profile per category
    pub fn default_roster() -> Vec<Self> {
        Category::ALL.iter().map(|c| Self::for_category(*c)).collect()
    }

    /// Build the specialist input for one request
    ///
    /// Only the register specialist sees the scenario context.
    pub fn build_input(&self, request: &AnalysisRequest) -> SpecialistInput {
        let context_instructions = match self.category {
            Category::ContextAppropriateness => format!(
                "CURRENT SCENARIO: {}\n\
                 Judge whether the learner's register and formality fit this situation. \
                 Only report a clear register mismatch.",
                request.scenario_context.trim()
            ),
            _ => String::new(),
        };

        SpecialistInput {
            category_instructions: self.instructions.clone(),
            context_instructions,
            prior_turn: request.prior_turn.clone(),
            learner_turn: request.learner_turn.clone(),
        }
    }
}

fn default_instructions(category: Category) -> &'static str {
    match category {
        Category::Grammar => {
            "Analyze grammar errors that affect spoken communication: wrong verb tenses, \
             subject-verb agreement, misused auxiliaries (do/does/did), wrong prepositions, \
             misused articles (a/an/the). Severity: high = blocks comprehension, \
             medium = noticeable but understandable, low = minor polish."
        }
        Category::Vocabulary => {
            "Analyze vocabulary for natural conversation: wrong or non-existent words, \
             more natural alternatives, words that sound odd in context, false friends. \
             Prioritize suggestions that make the speaker sound more natural."
        }
        Category::PhrasalVerb => {
            "Analyze phrasal verb usage: incorrect or malformed phrasal verbs, opportunities \
             for a more natural phrasal verb, wrong particle placement. Only suggest when it \
             clearly improves spoken English."
        }
        Category::Collocation => {
            "Analyze word combinations: incorrect collocations (make a decision, not do a \
             decision), combinations that sound unnatural, better verb + noun pairings. \
             Only suggest when the collocation is clearly wrong."
        }
        Category::Expression => {
            "Analyze expressions and naturalness: robotic or unnatural phrasing, literal \
             translations from the learner's native language, more fluent ways to express \
             the idea, more natural connectors."
        }
        Category::ContextAppropriateness => {
            "Analyze register and contextual appropriateness of spoken English: formal \
             greetings among friends, slang in professional settings, overly technical \
             vocabulary in casual chat."
        }
    }
}

// ============================================================================
// Mock Specialist for Testing
// ============================================================================

#[cfg(test)]
pub mod mock {
    use crate::types::{
        Category, FeedbackItem, Specialist, SpecialistError, SpecialistInput,
    };
    use async_trait::async_trait;
    use std::time::Duration;

    /// Mock specialist for testing
    pub struct MockSpecialist {
        pub name: String,
        pub categories: Vec<Category>,
        pub items: Vec<FeedbackItem>,
        pub delay: Option<Duration>,
        pub should_fail: bool,
    }

    impl MockSpecialist {
        pub fn returning(category: Category, items: Vec<FeedbackItem>) -> Self {
            Self {
                name: category.as_str().to_string(),
                categories: vec![category],
                items,
                delay: None,
                should_fail: false,
            }
        }

        pub fn failing(category: Category) -> Self {
            Self {
                should_fail: true,
                ..Self::returning(category, vec![])
            }
        }

        pub fn slow(category: Category, items: Vec<FeedbackItem>, delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Self::returning(category, items)
            }
        }
    }

    #[async_trait]
    impl Specialist for MockSpecialist {
        fn name(&self) -> &str {
            &self.name
        }

        fn categories(&self) -> &[Category] {
            &self.categories
        }

        async fn propose(
            &self,
            _input: &SpecialistInput,
        ) -> Result<Vec<FeedbackItem>, SpecialistError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.should_fail {
                Err(SpecialistError::Internal("Mock failure".to_string()))
            } else {
                Ok(self.items.clone())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
