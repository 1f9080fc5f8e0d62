//! Specialist Fan-Out Coordinator
//!
//! Runs every specialist concurrently against the same request.
//!
//! # Guarantees
//! - One task per specialist; tasks share a read-only `Arc` of the request
//!   and each reports into its own slot
//! - Items outside the specialist's categories, or with a blank
//!   `original`/`corrected`, are dropped before they reach a slot
//! - Per-specialist timeout; a specialist that times out or fails
//!   contributes nothing and never affects the others
//! - Global ceiling: tasks still running at the deadline are aborted
//! - Cancellation aborts every in-flight task
//! - Dropping the future drops the `JoinSet`, which aborts the tasks
//! - No retries

use super::pipeline::PipelineError;
use crate::types::{AnalysisRequest, Category, FeedbackItem, Specialist};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{timeout, timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn, Instrument, Span};

/// Fan-out time budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanOutConfig {
    /// Budget for each specialist call
    pub specialist_timeout: Duration,
    /// Ceiling for the whole join
    pub global_timeout: Duration,
}

impl Default for FanOutConfig {
    fn default() -> Self {
        Self {
            specialist_timeout: Duration::from_secs(12),
            global_timeout: Duration::from_secs(20),
        }
    }
}

/// What one specialist contributed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialistOutcome {
    Completed { items: Vec<FeedbackItem> },
    Failed { reason: String },
    /// Exceeded the per-specialist timeout
    TimedOut,
    /// Still running at the global ceiling
    Abandoned,
}

impl SpecialistOutcome {
    pub fn items(&self) -> &[FeedbackItem] {
        match self {
            SpecialistOutcome::Completed { items } => items,
            _ => &[],
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, SpecialistOutcome::Completed { .. })
    }
}

/// Per-specialist record
#[derive(Debug, Clone)]
pub struct SpecialistReport {
    pub specialist: String,
    pub outcome: SpecialistOutcome,
    /// Wall time until the outcome was known (None if abandoned)
    pub elapsed: Option<Duration>,
}

/// Fan-out result, one report per roster entry in roster order
#[derive(Debug, Clone, Default)]
pub struct FanOutReport {
    pub reports: Vec<SpecialistReport>,
}

impl FanOutReport {
    /// Concatenation of every completed specialist's items, in roster order
    pub fn items(&self) -> Vec<FeedbackItem> {
        self.reports
            .iter()
            .flat_map(|r| r.outcome.items().iter().cloned())
            .collect()
    }

    pub fn into_items(self) -> Vec<FeedbackItem> {
        self.reports
            .into_iter()
            .flat_map(|r| match r.outcome {
                SpecialistOutcome::Completed { items } => items,
                _ => Vec::new(),
            })
            .collect()
    }

    pub fn completed_count(&self) -> usize {
        self.reports.iter().filter(|r| r.outcome.is_completed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.reports.len() - self.completed_count()
    }
}

/// Concurrent specialist invoker
pub struct FanOutCoordinator {
    specialists: Vec<Arc<dyn Specialist>>,
    config: FanOutConfig,
}

impl FanOutCoordinator {
    pub fn new(specialists: Vec<Arc<dyn Specialist>>, config: FanOutConfig) -> Self {
        Self { specialists, config }
    }

    pub fn specialist_count(&self) -> usize {
        self.specialists.len()
    }

    /// Invoke every specialist and collect their contributions
    ///
    /// # Errors
    /// `PipelineError::Cancelled` if `cancel` fires before the join completes.
    /// Specialist failures never produce an error.
    pub async fn run(
        &self,
        request: Arc<AnalysisRequest>,
        cancel: &CancellationToken,
    ) -> Result<FanOutReport, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let deadline = Instant::now() + self.config.global_timeout;
        let per_specialist = self.config.specialist_timeout;

        let mut tasks = JoinSet::new();
        for (slot, specialist) in self.specialists.iter().enumerate() {
            let specialist = Arc::clone(specialist);
            let request = Arc::clone(&request);

            tasks.spawn(
                async move {
                    let started = Instant::now();
                    let input = specialist.prepare(&request);
                    let outcome = match timeout(per_specialist, specialist.propose(&input)).await {
                        Ok(Ok(items)) => SpecialistOutcome::Completed {
                            items: admit(specialist.name(), specialist.categories(), items),
                        },
                        Ok(Err(e)) => SpecialistOutcome::Failed {
                            reason: e.to_string(),
                        },
                        Err(_) => SpecialistOutcome::TimedOut,
                    };
                    (slot, outcome, started.elapsed())
                }
                .instrument(Span::current()),
            );
        }

        let mut slots: Vec<Option<(SpecialistOutcome, Duration)>> =
            (0..self.specialists.len()).map(|_| None).collect();
        let mut ceiling_hit = false;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tasks.abort_all();
                    debug!(in_flight = tasks.len(), "Fan-out cancelled, aborting specialists");
                    return Err(PipelineError::Cancelled);
                }

                joined = timeout_at(deadline, tasks.join_next()) => match joined {
                    Ok(Some(Ok((slot, outcome, elapsed)))) => {
                        slots[slot] = Some((outcome, elapsed));
                    }
                    Ok(Some(Err(e))) => {
                        warn!(error = %e, "Specialist task terminated abnormally");
                    }
                    Ok(None) => break,
                    Err(_) => {
                        tasks.abort_all();
                        ceiling_hit = true;
                        break;
                    }
                }
            }
        }

        let reports: Vec<SpecialistReport> = self
            .specialists
            .iter()
            .zip(slots)
            .map(|(specialist, slot)| {
                let (outcome, elapsed) = match slot {
                    Some((outcome, elapsed)) => (outcome, Some(elapsed)),
                    None if ceiling_hit => (SpecialistOutcome::Abandoned, None),
                    None => (
                        SpecialistOutcome::Failed {
                            reason: "task panicked".to_string(),
                        },
                        None,
                    ),
                };
                log_outcome(specialist.name(), &outcome, elapsed, &self.config);
                SpecialistReport {
                    specialist: specialist.name().to_string(),
                    outcome,
                    elapsed,
                }
            })
            .collect();

        Ok(FanOutReport { reports })
    }
}

/// Keep only items the specialist is allowed to contribute
fn admit(specialist: &str, allowed: &[Category], items: Vec<FeedbackItem>) -> Vec<FeedbackItem> {
    let total = items.len();
    let admitted: Vec<FeedbackItem> = items
        .into_iter()
        .filter(|item| {
            if !allowed.contains(&item.category) {
                debug!(
                    specialist,
                    category = %item.category,
                    "Dropping item outside specialist assignment"
                );
                return false;
            }
            !item.original.trim().is_empty() && !item.corrected.trim().is_empty()
        })
        .collect();

    if admitted.len() < total {
        debug!(
            specialist,
            accepted = admitted.len(),
            dropped = total - admitted.len(),
            "Dropped invalid items from specialist"
        );
    }

    admitted
}

fn log_outcome(
    specialist: &str,
    outcome: &SpecialistOutcome,
    elapsed: Option<Duration>,
    config: &FanOutConfig,
) {
    let elapsed_ms = elapsed.map(|d| d.as_millis() as u64);
    match outcome {
        SpecialistOutcome::Completed { items } => debug!(
            specialist,
            items = items.len(),
            elapsed_ms,
            "Specialist completed"
        ),
        SpecialistOutcome::Failed { reason } => warn!(
            specialist,
            error = %reason,
            elapsed_ms,
            "Specialist failed, contributing nothing"
        ),
        SpecialistOutcome::TimedOut => warn!(
            specialist,
            timeout_ms = config.specialist_timeout.as_millis() as u64,
            "Specialist timed out, contributing nothing"
        ),
        SpecialistOutcome::Abandoned => warn!(
            specialist,
            ceiling_ms = config.global_timeout.as_millis() as u64,
            "Specialist still running at global ceiling, aborted"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::specialists::mock::MockSpecialist;

    fn item(category: Category, original: &str) -> FeedbackItem {
        FeedbackItem::new(category, original, "fixed", "why")
    }

    fn request() -> Arc<AnalysisRequest> {
        Arc::new(AnalysisRequest::new("", "Hi!", "I goed home"))
    }

    fn coordinator(specialists: Vec<MockSpecialist>, config: FanOutConfig) -> FanOutCoordinator {
        FanOutCoordinator::new(
            specialists
                .into_iter()
                .map(|s| Arc::new(s) as Arc<dyn Specialist>)
                .collect(),
            config,
        )
    }

    #[tokio::test]
    async fn test_concatenates_in_roster_order() {
        let fanout = coordinator(
            vec![
                MockSpecialist::slow(
                    Category::Grammar,
                    vec![item(Category::Grammar, "g")],
                    Duration::from_millis(30),
                ),
                MockSpecialist::returning(Category::Expression, vec![item(Category::Expression, "e")]),
            ],
            FanOutConfig::default(),
        );

        let report = fanout.run(request(), &CancellationToken::new()).await.unwrap();
        let order: Vec<String> = report.items().into_iter().map(|i| i.original).collect();
        assert_eq!(order, vec!["g", "e"]);
        assert_eq!(report.completed_count(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_isolated() {
        let fanout = coordinator(
            vec![
                MockSpecialist::failing(Category::Grammar),
                MockSpecialist::returning(Category::Vocabulary, vec![item(Category::Vocabulary, "v")]),
            ],
            FanOutConfig::default(),
        );

        let report = fanout.run(request(), &CancellationToken::new()).await.unwrap();
        assert_eq!(report.items().len(), 1);
        assert!(matches!(report.reports[0].outcome, SpecialistOutcome::Failed { .. }));
        assert_eq!(report.failed_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_specialist_timeout() {
        let config = FanOutConfig {
            specialist_timeout: Duration::from_millis(100),
            global_timeout: Duration::from_secs(5),
        };
        let fanout = coordinator(
            vec![
                MockSpecialist::slow(
                    Category::Grammar,
                    vec![item(Category::Grammar, "late")],
                    Duration::from_secs(1),
                ),
                MockSpecialist::returning(Category::Expression, vec![item(Category::Expression, "e")]),
            ],
            config,
        );

        let report = fanout.run(request(), &CancellationToken::new()).await.unwrap();
        assert_eq!(report.reports[0].outcome, SpecialistOutcome::TimedOut);
        assert_eq!(report.into_items().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_global_ceiling_abandons_stragglers() {
        let config = FanOutConfig {
            specialist_timeout: Duration::from_secs(10),
            global_timeout: Duration::from_millis(200),
        };
        let fanout = coordinator(
            vec![
                MockSpecialist::slow(
                    Category::Grammar,
                    vec![item(Category::Grammar, "late")],
                    Duration::from_secs(3),
                ),
                MockSpecialist::returning(Category::Expression, vec![item(Category::Expression, "e")]),
            ],
            config,
        );

        let report = fanout.run(request(), &CancellationToken::new()).await.unwrap();
        assert_eq!(report.reports[0].outcome, SpecialistOutcome::Abandoned);
        assert!(report.reports[0].elapsed.is_none());
        assert!(report.reports[1].outcome.is_completed());
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let fanout = coordinator(
            vec![MockSpecialist::returning(Category::Grammar, vec![])],
            FanOutConfig::default(),
        );
        let token = CancellationToken::new();
        token.cancel();

        let result = fanout.run(request(), &token).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_flight() {
        let fanout = coordinator(
            vec![MockSpecialist::slow(Category::Grammar, vec![], Duration::from_secs(5))],
            FanOutConfig::default(),
        );
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = fanout.run(request(), &token).await;
        assert!(matches!(result, Err(PipelineError::Cancelled)));
    }

    #[tokio::test]
    async fn test_empty_roster_yields_empty_report() {
        let fanout = coordinator(vec![], FanOutConfig::default());
        let report = fanout.run(request(), &CancellationToken::new()).await.unwrap();
        assert!(report.reports.is_empty());
        assert!(report.items().is_empty());
    }

    #[tokio::test]
    async fn test_drops_items_outside_assignment_or_blank() {
        let fanout = coordinator(
            vec![MockSpecialist::returning(
                Category::Grammar,
                vec![
                    item(Category::Vocabulary, "big house"),
                    FeedbackItem::new(Category::Grammar, "", "", "why"),
                    FeedbackItem::new(Category::Grammar, "I goed", "  ", "why"),
                    item(Category::Grammar, "I goed"),
                ],
            )],
            FanOutConfig::default(),
        );

        let report = fanout.run(request(), &CancellationToken::new()).await.unwrap();
        let items = report.into_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, Category::Grammar);
        assert_eq!(items[0].original, "I goed");
    }
}
