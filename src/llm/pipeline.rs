//! LLM request pipeline with bounded retry and endpoint fallback.
//!
//! ```text
//! chat endpoint    : attempt 1 .. retries+1  (fixed delay between attempts)
//!        │ all failed
//!        ▼
//! generate endpoint: attempt 1 .. retries+1
//!        │ all failed
//!        ▼
//! LLM_ERROR_SENTINEL
//! ```
//!
//! An attempt fails on a transport error, a non-success status, or a body
//! that matches no known response shape.

use crate::config::LlmConfig;
use crate::error::{Result, SparkError};
use crate::llm::model::ChatModel;
use crate::llm::response::parse_body;
use crate::llm::transport::{HttpTransport, LlmTransport};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Returned in place of an answer when every endpoint is exhausted
pub const LLM_ERROR_SENTINEL: &str = "[LLM ERROR] no valid response from the model after all retries";

/// Check whether an answer is the pipeline's failure sentinel
pub fn is_error_sentinel(text: &str) -> bool {
    text.starts_with("[LLM ERROR]")
}

/// Endpoint shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Multi-turn chat with role-tagged messages
    Chat,
    /// Single flattened prompt
    Generate,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Chat => write!(f, "chat"),
            Endpoint::Generate => write!(f, "generate"),
        }
    }
}

/// Request parameters shared by both endpoint shapes
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub chat_url: String,
    pub generate_url: String,
    /// Extra attempts per endpoint after the first
    pub retries: u32,
    pub retry_delay: Duration,
    pub temperature: f32,
    pub top_p: f32,
    pub max_tokens: u32,
}

impl From<&LlmConfig> for PipelineSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            chat_url: config.chat_url(),
            generate_url: config.generate_url(),
            retries: config.retries,
            retry_delay: config.retry_delay(),
            temperature: config.temperature,
            top_p: config.top_p,
            max_tokens: config.max_tokens,
        }
    }
}

/// Normalized chat pipeline over an [`LlmTransport`]
pub struct LlmPipeline {
    transport: Arc<dyn LlmTransport>,
    settings: PipelineSettings,
}

impl LlmPipeline {
    pub fn new(transport: Arc<dyn LlmTransport>, settings: PipelineSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Build a pipeline backed by a real HTTP client
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let transport = HttpTransport::new(config.timeout(), config.api_key.clone())?;
        Ok(Self::new(Arc::new(transport), PipelineSettings::from(config)))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Send the prompt, retrying and falling back as needed. Never fails.
    pub async fn ask(&self, system_prompt: &str, prompt: &str) -> String {
        info!(
            model = %self.settings.model,
            prompt_chars = prompt.len(),
            "Sending request to model"
        );

        let chat = self.chat_payload(system_prompt, prompt);
        if let Some(answer) = self.run_endpoint(Endpoint::Chat, &chat).await {
            return answer;
        }

        warn!("Chat endpoint exhausted, falling back to generate endpoint");

        let generate = self.generate_payload(system_prompt, prompt);
        if let Some(answer) = self.run_endpoint(Endpoint::Generate, &generate).await {
            return answer;
        }

        warn!("No valid response from any model endpoint");
        LLM_ERROR_SENTINEL.to_string()
    }

    fn url(&self, endpoint: Endpoint) -> &str {
        match endpoint {
            Endpoint::Chat => &self.settings.chat_url,
            Endpoint::Generate => &self.settings.generate_url,
        }
    }

    fn options(&self) -> Value {
        json!({
            "temperature": self.settings.temperature,
            "top_p": self.settings.top_p,
            "num_predict": self.settings.max_tokens,
        })
    }

    fn chat_payload(&self, system_prompt: &str, prompt: &str) -> Value {
        json!({
            "model": self.settings.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": prompt},
            ],
            "stream": false,
            "options": self.options(),
        })
    }

    fn generate_payload(&self, system_prompt: &str, prompt: &str) -> Value {
        json!({
            "model": self.settings.model,
            "prompt": format!("{}\n\nUser: {}\nAssistant:", system_prompt, prompt),
            "stream": false,
            "options": self.options(),
        })
    }

    /// Up to `retries + 1` attempts against one endpoint
    async fn run_endpoint(&self, endpoint: Endpoint, payload: &Value) -> Option<String> {
        let url = self.url(endpoint);
        let max_attempts = self.settings.retries + 1;

        for attempt in 1..=max_attempts {
            debug!(%endpoint, attempt, max_attempts, "LLM attempt");

            match self.attempt(url, payload).await {
                Ok(answer) => {
                    info!(%endpoint, attempt, "Received model response");
                    return Some(answer);
                }
                Err(e) => {
                    warn!(%endpoint, attempt, error = %e, "LLM attempt failed");
                }
            }

            if attempt < max_attempts && !self.settings.retry_delay.is_zero() {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        None
    }

    async fn attempt(&self, url: &str, payload: &Value) -> Result<String> {
        let response = self.transport.post_json(url, payload).await?;

        if !response.is_success() {
            let snippet: String = response.body.chars().take(300).collect();
            return Err(SparkError::Transport(format!(
                "HTTP {} from {}: {}",
                response.status, url, snippet
            )));
        }

        let (shape, text) = parse_body(&response.body).ok_or_else(|| {
            SparkError::Transport(format!("empty or unrecognized response from {}", url))
        })?;

        debug!(%shape, chars = text.len(), "Normalized model response");
        Ok(text)
    }
}

#[async_trait]
impl ChatModel for LlmPipeline {
    async fn ask(&self, system_prompt: &str, prompt: &str) -> String {
        LlmPipeline::ask(self, system_prompt, prompt).await
    }

    fn endpoints(&self) -> Vec<String> {
        vec![
            self.settings.chat_url.clone(),
            self.settings.generate_url.clone(),
        ]
    }
}
