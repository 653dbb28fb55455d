//! Generative-text provider boundary.
//!
//! One free-text prompt in, one free-text reply out. The reply is
//! untrusted; callers parse it defensively.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AiConfig;
use crate::error::ServiceError;

/// A text generation backend.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` and return the model's reply text.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Ai`] on transport failure, non-success
    /// status or a reply without text.
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError>;

    /// Whether this backend can be called at all.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Always fails; selects the single-query and seeds-only fallbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, ServiceError> {
        Err(ServiceError::Ai("text generation is disabled".into()))
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// OpenAI-compatible `/v1/chat/completions` client (non-streaming).
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl ChatCompletionsClient {
    /// # Errors
    ///
    /// Returns [`ServiceError::Ai`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Ai(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, prompt: &str) -> Result<String, ServiceError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.3,
            "stream": false,
        });

        let mut request = self.client.post(self.endpoint()).json(&body);
        if !self.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Ai(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Ai(format!("provider returned {status}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Ai(format!("invalid response body: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ServiceError::Ai("response contained no text".into()))
    }
}

/// Build the generator described by `config`.
///
/// Falls back to [`DisabledGenerator`] when AI is switched off, the key
/// variable is unset, or the client cannot be built.
pub fn generator_from_config(config: &AiConfig) -> Box<dyn TextGenerator> {
    if !config.enabled {
        return Box::new(DisabledGenerator);
    }
    let Some(api_key) = config.api_key() else {
        tracing::info!(env = %config.api_key_env, "AI key not set; query expansion disabled");
        return Box::new(DisabledGenerator);
    };
    match ChatCompletionsClient::new(
        config.base_url.clone(),
        config.model.clone(),
        api_key,
        Duration::from_secs(config.timeout_seconds),
    ) {
        Ok(client) => Box::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "AI client unavailable");
            Box::new(DisabledGenerator)
        }
    }
}
