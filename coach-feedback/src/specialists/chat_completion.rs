//! Chat-completion specialist
//!
//! Backs a `SpecialistProfile` with an OpenAI-compatible chat completions
//! endpoint. All specialists share one `ChatClient`, which owns the HTTP
//! connection pool and the request budget.
//!
//! # Message layout
//! - system: category instructions + context instructions + response format
//! - assistant: the prior turn
//! - user: the learner turn

use super::payload::parse_candidates;
use super::SpecialistProfile;
use crate::types::{
    AnalysisRequest, Category, FeedbackItem, Specialist, SpecialistError, SpecialistInput,
};
use async_trait::async_trait;
use coach_common::config::SpecialistSettings;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// User-Agent header for completion requests
const USER_AGENT: &str = concat!("coach-feedback/", env!("CARGO_PKG_VERSION"));

/// Sampling temperature; corrections should be repeatable
const TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Shared chat completions client
pub struct ChatClient {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    feedback_language: String,
    rate_limiter: DefaultDirectRateLimiter,
}

impl ChatClient {
    /// Create client from specialist settings and a resolved API key
    pub fn new(settings: &SpecialistSettings, api_key: String) -> Result<Self, SpecialistError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(settings.request_timeout_ms))
            .build()
            .map_err(|e| SpecialistError::Internal(format!("HTTP client build failed: {}", e)))?;

        let per_second = NonZeroU32::new(settings.requests_per_second).unwrap_or(NonZeroU32::MIN);

        Ok(Self {
            http_client,
            endpoint: settings.endpoint.clone(),
            model: settings.model.clone(),
            api_key,
            feedback_language: settings.feedback_language.clone(),
            rate_limiter: RateLimiter::direct(Quota::per_second(per_second)),
        })
    }

    /// Language explanations must be written in
    pub fn feedback_language(&self) -> &str {
        &self.feedback_language
    }

    /// Run one completion and return the assistant content
    async fn complete(
        &self,
        system: &str,
        prior_turn: &str,
        learner_turn: &str,
    ) -> Result<String, SpecialistError> {
        self.rate_limiter.until_ready().await;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: system },
                ChatMessage { role: "assistant", content: prior_turn },
                ChatMessage { role: "user", content: learner_turn },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| SpecialistError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpecialistError::Api(format!(
                "completion endpoint returned {}: {}",
                status, body
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| SpecialistError::MalformedPayload(format!("completion envelope: {}", e)))?;

        Ok(extract_content(body))
    }
}

fn extract_content(response: ChatResponse) -> String {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .unwrap_or_default()
}

/// Specialist backed by the shared chat client
pub struct ChatCompletionSpecialist {
    profile: SpecialistProfile,
    categories: [Category; 1],
    client: Arc<ChatClient>,
}

impl ChatCompletionSpecialist {
    pub fn new(profile: SpecialistProfile, client: Arc<ChatClient>) -> Self {
        Self {
            categories: [profile.category],
            profile,
            client,
        }
    }

    /// One specialist per profile, all sharing `client`
    pub fn roster(profiles: Vec<SpecialistProfile>, client: Arc<ChatClient>) -> Vec<Arc<dyn Specialist>> {
        profiles
            .into_iter()
            .map(|p| Arc::new(Self::new(p, Arc::clone(&client))) as Arc<dyn Specialist>)
            .collect()
    }

    fn system_prompt(&self, input: &SpecialistInput) -> String {
        compose_system_prompt(self.profile.category, input, self.client.feedback_language())
    }
}

/// Full system message for one specialist call
pub fn compose_system_prompt(
    category: Category,
    input: &SpecialistInput,
    feedback_language: &str,
) -> String {
    let mut prompt = format!(
        "You are a {category} specialist coaching English learners in spoken conversation.\n\n{}\n",
        input.category_instructions
    );

    if !input.context_instructions.is_empty() {
        prompt.push('\n');
        prompt.push_str(&input.context_instructions);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        "\nThe learner is speaking, not writing. Never report missing punctuation, \
         capitalization or speech-to-text artifacts.\n\
         Report only issues in the \"{category}\" category.\n\
         Write `explanation` and `learning_tip` in {feedback_language}.\n\n\
         Respond with ONLY a JSON array (no markdown). Each element:\n\
         {{\"category\": \"{category}\", \"original\": \"exact text with the issue\", \
         \"corrected\": \"corrected text\", \"issue_type\": \"specific_error_tag\", \
         \"severity\": \"high|medium|low\", \"explanation\": \"...\", \
         \"learning_tip\": \"...\", \"examples\": [\"...\"]}}\n\
         If there is nothing relevant to correct, respond with []."
    ));

    prompt
}

#[async_trait]
impl Specialist for ChatCompletionSpecialist {
    fn name(&self) -> &str {
        self.profile.category.as_str()
    }

    fn categories(&self) -> &[Category] {
        &self.categories
    }

    fn prepare(&self, request: &AnalysisRequest) -> SpecialistInput {
        self.profile.build_input(request)
    }

    async fn propose(&self, input: &SpecialistInput) -> Result<Vec<FeedbackItem>, SpecialistError> {
        let system = self.system_prompt(input);
        let content = self
            .client
            .complete(&system, &input.prior_turn, &input.learner_turn)
            .await?;

        debug!(
            specialist = self.name(),
            content_len = content.len(),
            "Completion received"
        );

        parse_candidates(&content, &self.categories)
    }
}
