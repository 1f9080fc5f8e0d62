//! Feedback Pipeline Orchestrator
//!
//! Turns one conversational exchange into a bounded, deduplicated,
//! severity-ranked list of corrections.
//!
//! # Stages
//! 1. Empty learner turn short-circuits (no specialist invoked)
//! 2. Transcription heuristic (computed once)
//! 3. Specialist fan-out
//! 4. Transcription noise filter
//! 5. Span deduplication
//! 6. Severity classification
//! 7. Cap + summary
//!
//! # Error Handling
//! - Specialist failures are recovered inside the fan-out and only logged
//! - Total specialist dropout yields an empty, well-formed result
//! - Only a misconfigured roster and cancellation propagate
//!
//! # Example
//! ```rust,ignore
//! let pipeline = FeedbackPipeline::new(specialists, PipelineConfig::default())?;
//! let result = pipeline.analyze(&AnalysisRequest::new(scenario, prior, turn)).await?;
//! ```

use super::capper::{cap_ranked, congratulations, summarize, CapPolicy, Locale};
use super::dedup::{Deduplicator, SpanConflict, DEFAULT_CATEGORY_PRIORITY};
use super::fanout::{FanOutConfig, FanOutCoordinator, FanOutReport};
use super::plan::Plan;
use super::severity::classify;
use super::transcription::{filter_transcription_noise, looks_transcribed};
use crate::types::{AnalysisRequest, AnalysisResult, Category, SeverityBuckets, Specialist};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

/// Errors that escape the pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The pipeline was built with an empty roster
    #[error("No specialists configured")]
    NoSpecialists,

    /// The caller cancelled the analysis
    #[error("Analysis cancelled")]
    Cancelled,
}

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub fanout: FanOutConfig,
    /// Plan used by `analyze`
    pub plan: Plan,
    /// Overrides the plan's transcribed-input cap
    pub max_suggestions_transcribed: Option<usize>,
    /// Overrides the plan's typed-input cap
    pub max_suggestions_typed: Option<usize>,
    /// Tie-break order for items sharing a span
    pub category_priority: Vec<Category>,
    /// Summary language
    pub locale: Locale,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            fanout: FanOutConfig::default(),
            plan: Plan::default(),
            max_suggestions_transcribed: None,
            max_suggestions_typed: None,
            category_priority: DEFAULT_CATEGORY_PRIORITY.to_vec(),
            locale: Locale::default(),
        }
    }
}

impl PipelineConfig {
    /// Effective caps for `plan` after overrides
    pub fn cap_policy(&self, plan: Plan) -> CapPolicy {
        plan.cap_policy()
            .with_overrides(self.max_suggestions_transcribed, self.max_suggestions_typed)
    }
}

/// Full analysis output: the result plus how it was produced
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub request_id: Uuid,
    pub result: AnalysisResult,
    /// Per-specialist outcomes (empty when the turn short-circuited)
    pub fanout: FanOutReport,
    /// Span conflicts resolved by the deduplicator
    pub conflicts: Vec<SpanConflict>,
}

/// Stateless per-turn feedback pipeline
pub struct FeedbackPipeline {
    fanout: FanOutCoordinator,
    deduplicator: Deduplicator,
    config: PipelineConfig,
}

impl FeedbackPipeline {
    /// Build a pipeline over `specialists`
    ///
    /// # Errors
    /// `PipelineError::NoSpecialists` if the roster is empty.
    pub fn new(
        specialists: Vec<Arc<dyn Specialist>>,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        if specialists.is_empty() {
            return Err(PipelineError::NoSpecialists);
        }

        Ok(Self {
            fanout: FanOutCoordinator::new(specialists, config.fanout),
            deduplicator: Deduplicator::new(config.category_priority.clone()),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn specialist_count(&self) -> usize {
        self.fanout.specialist_count()
    }

    /// Analyze one turn with the configured plan
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, PipelineError> {
        self.analyze_with_cancel(request, self.config.plan, CancellationToken::new())
            .await
    }

    /// Analyze one turn with an explicit plan and cancellation token
    ///
    /// # Errors
    /// `PipelineError::Cancelled` if `cancel` fires during the fan-out.
    pub async fn analyze_with_cancel(
        &self,
        request: &AnalysisRequest,
        plan: Plan,
        cancel: CancellationToken,
    ) -> Result<AnalysisResult, PipelineError> {
        self.run(request, plan, cancel).await.map(|report| report.result)
    }

    /// Analyze one turn and keep the per-stage diagnostics
    pub async fn run(
        &self,
        request: &AnalysisRequest,
        plan: Plan,
        cancel: CancellationToken,
    ) -> Result<AnalysisReport, PipelineError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("analysis", request_id = %request_id, plan = %plan);
        self.run_inner(request_id, request, plan, cancel)
            .instrument(span)
            .await
    }

    async fn run_inner(
        &self,
        request_id: Uuid,
        request: &AnalysisRequest,
        plan: Plan,
        cancel: CancellationToken,
    ) -> Result<AnalysisReport, PipelineError> {
        if request.learner_turn.trim().is_empty() {
            debug!("Empty learner turn, skipping analysis");
            let result = AnalysisResult {
                feedback: Vec::new(),
                prioritized: SeverityBuckets::default(),
                is_transcribed: false,
                total_issues: 0,
                summary: congratulations(self.config.locale),
            };
            return Ok(AnalysisReport {
                request_id,
                result,
                fanout: FanOutReport::default(),
                conflicts: Vec::new(),
            });
        }

        let is_transcribed = looks_transcribed(&request.learner_turn);

        let fanout = self.fanout.run(Arc::new(request.clone()), &cancel).await?;

        let candidates = fanout.items();
        let candidate_count = candidates.len();

        let filtered = filter_transcription_noise(candidates, is_transcribed);
        let filtered_count = filtered.len();

        let dedup = self.deduplicator.deduplicate(filtered);
        let prioritized = classify(dedup.items);

        let policy = self.config.cap_policy(plan);
        let feedback = cap_ranked(&prioritized, is_transcribed, policy);
        let summary = summarize(&prioritized, self.config.locale);
        let total_issues = prioritized.len();

        info!(
            is_transcribed,
            candidates = candidate_count,
            after_filter = filtered_count,
            total_issues,
            high = prioritized.high.len(),
            medium = prioritized.medium.len(),
            low = prioritized.low.len(),
            shown = feedback.len(),
            failed_specialists = fanout.failed_count(),
            "Analysis complete"
        );

        Ok(AnalysisReport {
            request_id,
            result: AnalysisResult {
                feedback,
                prioritized,
                is_transcribed,
                total_issues,
                summary,
            },
            fanout,
            conflicts: dedup.conflicts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialists::mock::MockSpecialist;
    use crate::types::{FeedbackItem, Severity};
    use std::time::Duration;

    fn roster(specialists: Vec<MockSpecialist>) -> Vec<Arc<dyn Specialist>> {
        specialists
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn Specialist>)
            .collect()
    }

    fn pipeline(specialists: Vec<MockSpecialist>) -> FeedbackPipeline {
        FeedbackPipeline::new(roster(specialists), PipelineConfig::default()).unwrap()
    }

    fn item(category: Category, original: &str) -> FeedbackItem {
        FeedbackItem::new(category, original, "fixed", "why")
    }

    #[test]
    fn test_empty_roster_rejected() {
        let result = FeedbackPipeline::new(Vec::new(), PipelineConfig::default());
        assert!(matches!(result, Err(PipelineError::NoSpecialists)));
    }

    #[tokio::test]
    async fn test_empty_turn_short_circuits() {
        let p = pipeline(vec![MockSpecialist::returning(
            Category::Grammar,
            vec![item(Category::Grammar, "never")],
        )]);

        let report = p
            .run(&AnalysisRequest::new("", "Hi", "   "), Plan::Premium, CancellationToken::new())
            .await
            .unwrap();

        assert!(report.result.feedback.is_empty());
        assert_eq!(report.result.total_issues, 0);
        assert!(!report.result.is_transcribed);
        assert_eq!(report.result.summary, congratulations(Locale::Es));
        assert!(report.fanout.reports.is_empty());
    }

    #[tokio::test]
    async fn test_typed_turn_with_conflict() {
        // "She don't like pizza." typed: grammar wins over expression on the same span
        let p = pipeline(vec![
            MockSpecialist::returning(
                Category::Grammar,
                vec![item(Category::Grammar, "She don't like pizza")
                    .with_severity(Severity::High)],
            ),
            MockSpecialist::returning(
                Category::Expression,
                vec![item(Category::Expression, "she don't like pizza")],
            ),
        ]);

        let report = p
            .run(
                &AnalysisRequest::new("", "What food do you like?", "She don't like pizza."),
                Plan::Premium,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        let result = report.result;
        assert!(!result.is_transcribed);
        assert_eq!(result.total_issues, 1);
        assert_eq!(result.feedback.len(), 1);
        assert_eq!(result.feedback[0].category, Category::Grammar);
        assert_eq!(result.prioritized.high.len(), 1);
        assert_eq!(report.conflicts.len(), 1);
    }

    #[tokio::test]
    async fn test_total_issues_counts_pre_cap() {
        let items: Vec<FeedbackItem> = (0..7)
            .map(|n| item(Category::Grammar, &format!("span {}", n)))
            .collect();
        let p = pipeline(vec![MockSpecialist::returning(Category::Grammar, items)]);

        let result = p
            .analyze_with_cancel(
                &AnalysisRequest::new("", "", "I has seven problem here, truly."),
                Plan::Basic,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.total_issues, 7);
        assert_eq!(result.prioritized.len(), 7);
        assert_eq!(result.feedback.len(), 3);
    }

    #[tokio::test]
    async fn test_cap_overrides_apply() {
        let items: Vec<FeedbackItem> = (0..4)
            .map(|n| item(Category::Grammar, &format!("span {}", n)))
            .collect();
        let config = PipelineConfig {
            max_suggestions_typed: Some(1),
            ..PipelineConfig::default()
        };
        let p = FeedbackPipeline::new(
            roster(vec![MockSpecialist::returning(Category::Grammar, items)]),
            config,
        )
        .unwrap();

        let result = p
            .analyze(&AnalysisRequest::new("", "", "I has a problem."))
            .await
            .unwrap();
        assert_eq!(result.feedback.len(), 1);
        assert_eq!(result.total_issues, 4);
    }

    #[tokio::test]
    async fn test_all_specialists_fail_yields_empty_result() {
        let p = pipeline(vec![
            MockSpecialist::failing(Category::Grammar),
            MockSpecialist::failing(Category::Vocabulary),
        ]);

        let result = p
            .analyze(&AnalysisRequest::new("", "", "I goed to school."))
            .await
            .unwrap();

        assert!(result.feedback.is_empty());
        assert_eq!(result.total_issues, 0);
        assert_eq!(result.summary, congratulations(Locale::Es));
    }

    #[tokio::test]
    async fn test_cancelled_token_propagates() {
        let p = pipeline(vec![MockSpecialist::slow(
            Category::Grammar,
            vec![],
            Duration::from_millis(50),
        )]);
        let token = CancellationToken::new();
        token.cancel();

        let result = p
            .analyze_with_cancel(&AnalysisRequest::new("", "", "Hello there."), Plan::Premium, token)
            .await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }
}
