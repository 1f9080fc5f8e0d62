//! Conversation statistics endpoint

use axum::{routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::stats::ConversationStats;
use crate::types::FeedbackItem;
use crate::AppState;

/// POST /api/stats request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsRequest {
    /// Feedback persisted over the conversation
    #[serde(default)]
    pub items: Vec<FeedbackItem>,
}

/// POST /api/stats
pub async fn conversation_stats(Json(body): Json<StatsRequest>) -> Json<ConversationStats> {
    Json(ConversationStats::from_items(&body.items))
}

/// Build statistics routes
pub fn stats_routes() -> Router<AppState> {
    Router::new().route("/api/stats", post(conversation_stats))
}
