//! coach-feedback library interface
//!
//! Exposes the feedback pipeline and HTTP router for the binary and for
//! integration testing.

pub mod api;
pub mod config;
pub mod error;
pub mod specialists;
pub mod stats;
pub mod types;
pub mod workflow;

pub use crate::error::{ApiError, ApiResult};
pub use crate::workflow::pipeline;
pub use crate::workflow::{FeedbackPipeline, PipelineConfig, PipelineError, Plan};

use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;

/// Margin on top of the fan-out ceiling before a request is answered with 503
pub const REQUEST_TIMEOUT_MARGIN: Duration = Duration::from_secs(2);

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<FeedbackPipeline>,
    /// Server-side deadline for one analysis
    pub request_timeout: Duration,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Last analysis error for diagnostic purposes
    pub last_error: Arc<RwLock<Option<String>>>,
}

impl AppState {
    pub fn new(pipeline: Arc<FeedbackPipeline>) -> Self {
        let request_timeout = pipeline.config().fanout.global_timeout + REQUEST_TIMEOUT_MARGIN;
        Self {
            pipeline,
            request_timeout,
            startup_time: Utc::now(),
            last_error: Arc::new(RwLock::new(None)),
        }
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::analyze_routes())
        .merge(api::stats_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
