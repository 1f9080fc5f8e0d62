//! Core Types and Trait Definitions for the feedback pipeline
//!
//! Defines the data model shared by every stage:
//! - **Feedback items:** category, severity, correction payload
//! - **Requests/results:** the immutable analysis input and the ranked output
//! - **Specialist trait:** the per-category external capability
//!
//! # Architecture
//! Per-turn stateless pipeline:
//! heuristic → fan-out (specialists) → filter → dedup → severity → cap/summary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Categories and Severity
// ============================================================================

/// Linguistic category of a correction (closed set)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Grammar,
    Vocabulary,
    PhrasalVerb,
    Collocation,
    Expression,
    ContextAppropriateness,
}

impl Category {
    /// Every category, in declaration order
    pub const ALL: [Category; 6] = [
        Category::Grammar,
        Category::Vocabulary,
        Category::PhrasalVerb,
        Category::Collocation,
        Category::Expression,
        Category::ContextAppropriateness,
    ];

    /// Wire name (snake_case)
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Grammar => "grammar",
            Category::Vocabulary => "vocabulary",
            Category::PhrasalVerb => "phrasal_verb",
            Category::Collocation => "collocation",
            Category::Expression => "expression",
            Category::ContextAppropriateness => "context_appropriateness",
        }
    }

    /// Severity assumed when a specialist does not declare one
    pub fn default_severity(&self) -> Severity {
        match self {
            Category::Grammar | Category::Vocabulary => Severity::High,
            Category::Collocation | Category::PhrasalVerb => Severity::Medium,
            Category::Expression => Severity::Low,
            Category::ContextAppropriateness => Severity::Medium,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category name outside the closed set (including the "none" sentinel)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown feedback category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// How much a correction matters for communication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks or distorts comprehension
    High,
    /// Noticeable but understandable
    Medium,
    /// Optional polish
    Low,
}

impl Severity {
    /// Lenient parse: anything outside {high, medium, low} counts as undeclared
    pub fn parse(s: &str) -> Option<Severity> {
        match s.trim().to_lowercase().as_str() {
            "high" => Some(Severity::High),
            "medium" => Some(Severity::Medium),
            "low" => Some(Severity::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Feedback Items
// ============================================================================

/// One candidate or finalized correction
///
/// Created by a specialist, possibly dropped by the transcription filter or
/// the deduplicator, annotated with its effective severity by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub category: Category,
    /// Exact substring of the learner's turn containing the issue
    pub original: String,
    /// Suggested replacement
    pub corrected: String,
    /// Short machine tag for the specific error
    #[serde(default)]
    pub issue_type: String,
    /// Declared (candidate) or effective (finalized) severity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Rationale in the learner's native language
    pub explanation: String,
    /// Short mnemonic, distinct from the explanation
    #[serde(default)]
    pub learning_tip: String,
    /// Example correct usages
    #[serde(default)]
    pub examples: Vec<String>,
}

impl FeedbackItem {
    pub fn new(
        category: Category,
        original: impl Into<String>,
        corrected: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            category,
            original: original.into(),
            corrected: corrected.into(),
            issue_type: String::new(),
            severity: None,
            explanation: explanation.into(),
            learning_tip: String::new(),
            examples: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_issue_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = issue_type.into();
        self
    }

    pub fn with_learning_tip(mut self, tip: impl Into<String>) -> Self {
        self.learning_tip = tip.into();
        self
    }

    /// Deduplication key: trimmed, lowercased `original`
    pub fn span_key(&self) -> String {
        self.original.trim().to_lowercase()
    }

    /// Declared severity if present, otherwise the category default
    pub fn effective_severity(&self) -> Severity {
        self.severity
            .unwrap_or_else(|| self.category.default_severity())
    }
}

// ============================================================================
// Requests and Results
// ============================================================================

/// Immutable analysis input for one conversational turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Scenario system context (role-play situation)
    #[serde(default)]
    pub scenario_context: String,
    /// Assistant's most recent message
    #[serde(default)]
    pub prior_turn: String,
    /// Learner's new message
    pub learner_turn: String,
}

impl AnalysisRequest {
    pub fn new(
        scenario_context: impl Into<String>,
        prior_turn: impl Into<String>,
        learner_turn: impl Into<String>,
    ) -> Self {
        Self {
            scenario_context: scenario_context.into(),
            prior_turn: prior_turn.into(),
            learner_turn: learner_turn.into(),
        }
    }
}

/// Feedback items partitioned by severity, each bucket in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBuckets {
    pub high: Vec<FeedbackItem>,
    pub medium: Vec<FeedbackItem>,
    pub low: Vec<FeedbackItem>,
}

impl SeverityBuckets {
    pub fn push(&mut self, severity: Severity, item: FeedbackItem) {
        match severity {
            Severity::High => self.high.push(item),
            Severity::Medium => self.medium.push(item),
            Severity::Low => self.low.push(item),
        }
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items in high → medium → low order
    pub fn ranked(&self) -> impl Iterator<Item = &FeedbackItem> {
        self.high.iter().chain(self.medium.iter()).chain(self.low.iter())
    }
}

/// Output aggregate of one analysis
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Final ranked and capped corrections (the only list worth persisting)
    pub feedback: Vec<FeedbackItem>,
    /// Full bucketed view before truncation
    pub prioritized: SeverityBuckets,
    /// Whether the learner turn looked voice-transcribed
    pub is_transcribed: bool,
    /// Surviving issues after filtering and deduplication, before the cap
    pub total_issues: usize,
    /// Short encouraging summary
    pub summary: String,
}

// ============================================================================
// Specialist Trait
// ============================================================================

/// Input handed to one specialist invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecialistInput {
    /// Category-specific analysis instructions
    pub category_instructions: String,
    /// Category-specific context (embeds the scenario for register checks)
    pub context_instructions: String,
    /// Assistant's prior turn
    pub prior_turn: String,
    /// Learner's turn under analysis
    pub learner_turn: String,
}

/// Per-category correction proposer (external capability)
///
/// Stateless: every call receives the full input. Returning `Err` is
/// equivalent to returning an empty list from the pipeline's point of view.
///
/// # Example
/// ```rust,ignore
/// use coach_feedback::types::{Category, FeedbackItem, Specialist, SpecialistError, SpecialistInput};
///
/// struct AlwaysGrammar;
///
/// #[async_trait::async_trait]
/// impl Specialist for AlwaysGrammar {
///     fn name(&self) -> &str { "grammar" }
///     fn categories(&self) -> &[Category] { &[Category::Grammar] }
///
///     async fn propose(&self, input: &SpecialistInput) -> Result<Vec<FeedbackItem>, SpecialistError> {
///         Ok(vec![])
///     }
/// }
/// ```
#[async_trait::async_trait]
pub trait Specialist: Send + Sync {
    /// Specialist name for logging and provenance
    fn name(&self) -> &str;

    /// Categories this specialist is allowed to emit
    fn categories(&self) -> &[Category];

    /// Build this specialist's input from the shared request
    ///
    /// Default: no instructions, turns copied verbatim.
    fn prepare(&self, request: &AnalysisRequest) -> SpecialistInput {
        SpecialistInput {
            category_instructions: String::new(),
            context_instructions: String::new(),
            prior_turn: request.prior_turn.clone(),
            learner_turn: request.learner_turn.clone(),
        }
    }

    /// Propose candidate corrections for the learner turn
    ///
    /// # Errors
    /// Any failure (transport, API, malformed payload); the coordinator maps
    /// it to an empty contribution.
    async fn propose(&self, input: &SpecialistInput) -> Result<Vec<FeedbackItem>, SpecialistError>;
}

/// Specialist failure
#[derive(Debug, Error)]
pub enum SpecialistError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Remote API returned an error status
    #[error("API error: {0}")]
    Api(String),

    /// Output failed the ingestion schema
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Internal processing error
    #[error("Internal error: {0}")]
    Internal(String),
}

// ============================================================================
// Tests
// ============================================================================
