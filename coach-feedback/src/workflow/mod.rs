//! Per-turn feedback workflow
//!
//! Stages, in data-flow order:
//! 1. **transcription**: speech-to-text heuristic and noise filter
//! 2. **fanout**: concurrent specialist invocation
//! 3. **dedup**: one suggestion per span, resolved by category priority
//! 4. **severity**: effective severity and buckets
//! 5. **capper**: plan cap and summary
//!
//! `pipeline` wires the stages together.

pub mod capper;
pub mod dedup;
pub mod fanout;
pub mod pipeline;
pub mod plan;
pub mod severity;
pub mod transcription;

pub use capper::{CapPolicy, Locale};
pub use dedup::{Deduplicator, DEFAULT_CATEGORY_PRIORITY};
pub use fanout::{FanOutConfig, FanOutCoordinator, FanOutReport, SpecialistOutcome};
pub use pipeline::{AnalysisReport, FeedbackPipeline, PipelineConfig, PipelineError};
pub use plan::Plan;
