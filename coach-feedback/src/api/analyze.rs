//! Turn analysis endpoint
//!
//! POST /api/analyze runs the feedback pipeline for one learner turn.
//! A client disconnect drops the handler future; the drop guard then
//! cancels the fan-out and aborts in-flight specialists.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::error::{ApiError, ApiResult};
use crate::types::{AnalysisRequest, AnalysisResult};
use crate::workflow::Plan;
use crate::AppState;

/// Longest learner turn accepted, in characters
pub const MAX_TURN_CHARS: usize = 4_000;

/// POST /api/analyze request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(flatten)]
    pub request: AnalysisRequest,
    /// Plan tier; the configured default when omitted
    #[serde(default)]
    pub plan: Option<Plan>,
}

/// POST /api/analyze
pub async fn analyze_turn(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> ApiResult<Json<AnalysisResult>> {
    let turn_chars = body.request.learner_turn.chars().count();
    if turn_chars > MAX_TURN_CHARS {
        return Err(ApiError::BadRequest(format!(
            "learner_turn is {} characters (max {})",
            turn_chars, MAX_TURN_CHARS
        )));
    }

    let plan = body.plan.unwrap_or(state.pipeline.config().plan);
    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let analysis = state
        .pipeline
        .analyze_with_cancel(&body.request, plan, cancel.clone());

    match tokio::time::timeout(state.request_timeout, analysis).await {
        Ok(Ok(result)) => Ok(Json(result)),
        Ok(Err(e)) => {
            *state.last_error.write().await = Some(e.to_string());
            Err(e.into())
        }
        Err(_) => {
            cancel.cancel();
            let message = format!(
                "analysis exceeded {} ms",
                state.request_timeout.as_millis()
            );
            warn!(%message, "Request deadline reached");
            *state.last_error.write().await = Some(message.clone());
            Err(ApiError::Unavailable(message))
        }
    }
}

/// Build analysis routes
pub fn analyze_routes() -> Router<AppState> {
    Router::new().route("/api/analyze", post(analyze_turn))
}
