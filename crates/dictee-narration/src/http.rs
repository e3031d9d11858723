//! Reqwest implementation of the [`NarrationBackend`] port.
//!
//! Talks to the narration server:
//!
//! - `POST /api/tts` with `{ "text", "speed" }` → encoded audio body
//! - `GET /api/health` → [`BackendHealth`]
//!
//! Transient failures (5xx, transport errors) are retried with exponential
//! backoff. Timeouts and 4xx responses fail immediately.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use dictee_core::{BackendHealth, NarrationBackend, NarrationError};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::NarrationClientConfig;
use crate::error::{HttpError, HttpResult, error_message};

const TTS_PATH: &str = "/api/tts";
const HEALTH_PATH: &str = "/api/health";

#[derive(Debug, Serialize)]
struct SynthesizeRequest<'a> {
    text: &'a str,
    speed: f32,
}

/// Production narration backend using reqwest with retry logic.
pub struct HttpNarrationBackend {
    client: reqwest::Client,
    config: NarrationClientConfig,
}

impl HttpNarrationBackend {
    /// Create a backend for the given configuration.
    pub fn new(config: NarrationClientConfig) -> Result<Self, NarrationError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| NarrationError::Unavailable(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    #[must_use]
    pub const fn config(&self) -> &NarrationClientConfig {
        &self.config
    }

    /// Send a request with automatic retry for transient errors.
    ///
    /// `build` is called once per attempt since a `RequestBuilder` is
    /// consumed by `send`.
    async fn send_with_retry<F>(&self, build: F) -> HttpResult<reqwest::Response>
    where
        F: Fn() -> reqwest::RequestBuilder + Send + Sync,
    {
        let mut attempt: u8 = 0;
        loop {
            if attempt > 0 {
                let delay = backoff_delay(self.config.retry_base_delay, attempt);
                debug!(attempt, delay_ms = delay.as_millis(), "Retrying narration request");
                tokio::time::sleep(delay).await;
            }

            let err = match build().send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status().as_u16();
                    let body = response.bytes().await.unwrap_or_default();
                    HttpError::Status {
                        status,
                        message: error_message(&body),
                    }
                }
                Err(e) => HttpError::from_reqwest(e, self.config.timeout),
            };

            if err.is_retryable() && attempt < self.config.max_retries {
                warn!(attempt, error = %err, "Transient narration failure");
                attempt += 1;
            } else {
                return Err(err);
            }
        }
    }
}

/// `base * 2^(attempt - 1)`
fn backoff_delay(base: Duration, attempt: u8) -> Duration {
    base.saturating_mul(2u32.saturating_pow(u32::from(attempt.saturating_sub(1))))
}

#[async_trait]
impl NarrationBackend for HttpNarrationBackend {
    async fn synthesize(&self, text: &str, speed: f32) -> Result<Bytes, NarrationError> {
        let url = self.config.endpoint(TTS_PATH);
        let body = SynthesizeRequest { text, speed };

        let response = self
            .send_with_retry(|| self.client.post(&url).json(&body))
            .await?;

        let audio = response
            .bytes()
            .await
            .map_err(|e| HttpError::from_reqwest(e, self.config.timeout))?;
        if audio.is_empty() {
            return Err(HttpError::EmptyBody.into());
        }

        debug!(chars = text.len(), bytes = audio.len(), "Narration synthesized");
        Ok(audio)
    }

    async fn health(&self) -> Result<BackendHealth, NarrationError> {
        let url = self.config.endpoint(HEALTH_PATH);
        let response = self.send_with_retry(|| self.client.get(&url)).await?;

        response
            .json::<BackendHealth>()
            .await
            .map_err(|e| NarrationError::Unavailable(format!("invalid health payload: {e}")))
    }
}
