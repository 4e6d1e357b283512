//! Learning-profile description generation via a chat-completion provider.
//!
//! This path is pure prompt-assembly glue around an external chat model: it
//! serializes a learner's quiz-style answers into a prompt, issues a single
//! completion request, and returns the trimmed reply. There is no retry and
//! no fallback model; failures are logged with context and propagated.

mod prompts;

use crate::config::get_config;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

pub use prompts::PROFILE_SYSTEM_PROMPT;

/// Sampling temperature used for every profile description request.
pub const PROFILE_TEMPERATURE: f32 = 0.5;

/// Errors surfaced while generating a profile description.
#[derive(Debug, Error)]
pub enum ChatClientError {
    /// Provider was unreachable.
    #[error("Chat provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// A learner's numeric rating for one questionnaire item.
#[derive(Debug, Clone, Serialize)]
pub struct RatingAnswer {
    /// Question text shown to the learner.
    pub question: String,
    /// Rating the learner selected.
    pub answer: u8,
}

/// A learner's choice for one multiple-choice questionnaire item.
#[derive(Debug, Clone, Serialize)]
pub struct McqAnswer {
    /// Question text shown to the learner.
    pub question: String,
    /// Option the learner selected.
    pub answer: String,
}

/// Request payload passed to the chat provider.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// System prompt fixing the assistant's role.
    pub system_prompt: String,
    /// Assembled user prompt.
    pub user_prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Interface implemented by chat-completion providers.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Issue one completion request and return the trimmed reply text.
    async fn complete(&self, request: ChatRequest) -> Result<String, ChatClientError>;
}

/// Chat client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiChatClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

impl OpenAiChatClient {
    /// Construct a client for the given endpoint, model, and timeout.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .user_agent("mcq-ingest/profile")
            .timeout(timeout)
            .build()
            .expect("Failed to construct reqwest::Client for chat completions");
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn complete(&self, request: ChatRequest) -> Result<String, ChatClientError> {
        let payload = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "temperature": request.temperature,
        });

        let mut http_request = self.http.post(self.endpoint()).json(&payload);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|error| {
            ChatClientError::ProviderUnavailable(format!(
                "failed to reach chat provider at {}: {error}",
                self.base_url
            ))
        })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ChatClientError::ProviderUnavailable(format!(
                "chat endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChatClientError::GenerationFailed(format!(
                "chat provider returned {status}: {body}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            ChatClientError::InvalidResponse(format!("failed to decode chat response: {error}"))
        })?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatClientError::InvalidResponse("response contained no choices".into()))?;

        Ok(choice.message.content.trim().to_string())
    }
}

/// Build a chat client from the loaded configuration.
pub fn get_chat_client() -> Box<dyn ChatClient + Send + Sync> {
    let config = get_config();
    let base_url = config
        .chat_url
        .clone()
        .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
    Box::new(OpenAiChatClient::new(
        base_url,
        config.chat_api_key.clone(),
        config.chat_model.clone(),
        Duration::from_secs(config.request_timeout_secs),
    ))
}

/// Generate a natural-language description of a learner's style.
///
/// Maps each multiple-choice question to its answer, serializes the full
/// answer set with the precomputed average scores and dominant style label,
/// and issues a single completion at temperature 0.5. Failures are logged
/// with their context and re-raised unchanged.
pub async fn generate_profile_description(
    client: &dyn ChatClient,
    ratings: &[RatingAnswer],
    mcqs: &[McqAnswer],
    avg_scores: &BTreeMap<String, f64>,
    primary_style: &str,
) -> Result<String, ChatClientError> {
    let behavioral: BTreeMap<&str, &str> = mcqs
        .iter()
        .map(|item| (item.question.as_str(), item.answer.as_str()))
        .collect();

    let user_prompt =
        prompts::build_profile_prompt(ratings, mcqs, avg_scores, primary_style, &behavioral);

    let request = ChatRequest {
        system_prompt: PROFILE_SYSTEM_PROMPT.to_string(),
        user_prompt,
        temperature: PROFILE_TEMPERATURE,
    };

    match client.complete(request).await {
        Ok(description) => Ok(description),
        Err(error) => {
            tracing::error!(
                error = %error,
                ratings = ratings.len(),
                mcqs = mcqs.len(),
                primary_style,
                "Failed to generate learning profile description"
            );
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn sample_answers() -> (Vec<RatingAnswer>, Vec<McqAnswer>, BTreeMap<String, f64>) {
        let ratings = vec![RatingAnswer {
            question: "I remember diagrams easily".to_string(),
            answer: 4,
        }];
        let mcqs = vec![McqAnswer {
            question: "When learning something new, I prefer".to_string(),
            answer: "watching a demonstration".to_string(),
        }];
        let mut scores = BTreeMap::new();
        scores.insert("visual".to_string(), 4.2);
        scores.insert("reading".to_string(), 2.1);
        (ratings, mcqs, scores)
    }

    #[tokio::test]
    async fn chat_client_returns_trimmed_content() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "  You learn best visually.  " } }
                    ]
                }));
            })
            .await;

        let client = OpenAiChatClient::new(
            server.base_url(),
            None,
            "llama-3.3-70b-versatile".into(),
            Duration::from_secs(5),
        );
        let reply = client
            .complete(ChatRequest {
                system_prompt: PROFILE_SYSTEM_PROMPT.to_string(),
                user_prompt: "describe".to_string(),
                temperature: PROFILE_TEMPERATURE,
            })
            .await
            .expect("completion");

        mock.assert();
        assert_eq!(reply, "You learn best visually.");
    }

    #[tokio::test]
    async fn chat_client_surfaces_error_statuses() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(500).body("boom");
            })
            .await;

        let client = OpenAiChatClient::new(
            server.base_url(),
            None,
            "llama-3.3-70b-versatile".into(),
            Duration::from_secs(5),
        );
        let error = client
            .complete(ChatRequest {
                system_prompt: String::new(),
                user_prompt: String::new(),
                temperature: PROFILE_TEMPERATURE,
            })
            .await
            .expect_err("error response");
        assert!(
            matches!(error, ChatClientError::GenerationFailed(message) if message.contains("500"))
        );
    }

    #[tokio::test]
    async fn generator_sends_answers_and_propagates_failures() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .body_contains("I remember diagrams easily")
                    .body_contains("watching a demonstration")
                    .body_contains("visual");
                then.status(200).json_body(json!({
                    "choices": [
                        { "message": { "role": "assistant", "content": "A visual learner." } }
                    ]
                }));
            })
            .await;

        let client = OpenAiChatClient::new(
            server.base_url(),
            None,
            "llama-3.3-70b-versatile".into(),
            Duration::from_secs(5),
        );
        let (ratings, mcqs, scores) = sample_answers();
        let description =
            generate_profile_description(&client, &ratings, &mcqs, &scores, "visual")
                .await
                .expect("description");

        mock.assert();
        assert_eq!(description, "A visual learner.");

        let failing_server = MockServer::start_async().await;
        failing_server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(503).body("down");
            })
            .await;
        let failing_client = OpenAiChatClient::new(
            failing_server.base_url(),
            None,
            "llama-3.3-70b-versatile".into(),
            Duration::from_secs(5),
        );
        let error = generate_profile_description(&failing_client, &ratings, &mcqs, &scores, "visual")
            .await
            .expect_err("propagated failure");
        assert!(matches!(error, ChatClientError::GenerationFailed(_)));
    }
}
