//! LLM client: the single point of entry for all text-generation calls in SmartHire.
//!
//! ARCHITECTURAL RULE: No other module may call the generation backend directly.
//! Every request goes through `LlmClient::call`, which throttles through the shared
//! `RateLimiter` and retries on quota signals.
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod gemini;
pub mod json_repair;
pub mod prompts;
pub mod rate_limiter;

pub use rate_limiter::RateLimiter;

/// Attempts per logical call before giving up with `RetriesExhausted`.
pub const MAX_ATTEMPTS: u32 = 3;
/// Cooldown after a quota signal, on top of the limiter's own wait.
pub const QUOTA_COOLDOWN: Duration = Duration::from_secs(35);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to get response after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },
}

/// Sampling settings sent with a generation request. `None` leaves the
/// backend default in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    /// Settings for job-posting generation.
    pub fn job_posting() -> Self {
        Self {
            temperature: Some(0.7),
            top_p: Some(0.8),
            top_k: Some(40),
            max_output_tokens: Some(2048),
        }
    }

    /// Settings for one resume-chunk extraction attempt at `temperature`.
    pub fn resume_chunk(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            top_p: Some(0.9),
            top_k: Some(40),
            max_output_tokens: Some(2048),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// A text-generation backend. Implementations report quota exhaustion as
/// `LlmError::QuotaExceeded` so the envelope can cool down and retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError>;

    /// Backend label for logs.
    fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub quota_cooldown: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            quota_cooldown: QUOTA_COOLDOWN,
        }
    }
}

/// The single LLM client used by all services in SmartHire.
/// Wraps a `TextGenerator` with rate limiting, quota retries and JSON helpers.
#[derive(Clone)]
pub struct LlmClient {
    backend: Arc<dyn TextGenerator>,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
}

impl LlmClient {
    pub fn new(backend: Arc<dyn TextGenerator>, limiter: Arc<RateLimiter>) -> Self {
        Self {
            backend,
            limiter,
            retry: RetryPolicy::default(),
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Makes one logical generation call and returns the raw text.
    ///
    /// Every attempt first waits on the rate limiter. A quota signal sleeps for
    /// the cooldown and retries; an empty body also consumes an attempt; any other
    /// error is returned immediately.
    pub async fn call(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LlmError> {
        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            self.limiter.acquire().await;

            match self.backend.generate(prompt, config).await {
                Ok(text) if !text.trim().is_empty() => {
                    debug!(
                        "LLM call succeeded on attempt {attempt}/{max_attempts} ({} chars)",
                        text.len()
                    );
                    return Ok(text);
                }
                Ok(_) => {
                    warn!("Empty response from {} (attempt {attempt}/{max_attempts})", self.backend.name());
                }
                Err(LlmError::QuotaExceeded(message)) => {
                    warn!("Rate limit exceeded, retry {attempt}/{max_attempts}: {message}");
                    if attempt < max_attempts {
                        tokio::time::sleep(self.retry.quota_cooldown).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }

        Err(LlmError::RetriesExhausted {
            attempts: max_attempts,
        })
    }

    /// Convenience method that calls the LLM and deserializes the text response as JSON,
    /// running the repair heuristics in `json_repair` when the raw text does not parse.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<T, LlmError> {
        let text = self.call(prompt, config).await?;
        json_repair::parse_lenient(&text)
    }
}
