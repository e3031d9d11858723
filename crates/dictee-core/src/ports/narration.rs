//! Narration backend port: text in, encoded audio out.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::NarrationError;

/// A playable narration: the encoded audio container returned by the
/// backend (WAV in practice).
///
/// Cloning is cheap; the payload is reference-counted and released when the
/// last clone (cache entry or in-flight playback) is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrationAudio {
    bytes: Bytes,
}

impl NarrationAudio {
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Health report of the narration backend (`GET /api/health`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendHealth {
    #[serde(default)]
    pub status: Option<String>,
    /// Whether the synthesis engine behind the backend answers.
    pub tts_reachable: bool,
    #[serde(default)]
    pub tts_server: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub cache_size: Option<u64>,
}

/// Backend-agnostic text-to-speech service.
///
/// Implementations must be `Send + Sync` so the narration service can hold
/// them behind an `Arc` across `.await` points.
#[async_trait]
pub trait NarrationBackend: Send + Sync {
    /// Synthesize `text` at `speed` and return the encoded audio.
    async fn synthesize(&self, text: &str, speed: f32) -> Result<Bytes, NarrationError>;

    /// Query backend health.
    async fn health(&self) -> Result<BackendHealth, NarrationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_parses_minimal_payload() {
        let health: BackendHealth = serde_json::from_str(r#"{"ttsReachable": true}"#).unwrap();
        assert!(health.tts_reachable);
        assert_eq!(health.model, None);
    }

    #[test]
    fn health_parses_full_payload() {
        let health: BackendHealth = serde_json::from_str(
            r#"{"status":"ok","ttsServer":"http://host:8000","ttsReachable":false,
                "model":"Kokoro-82M","cacheSize":12}"#,
        )
        .unwrap();
        assert!(!health.tts_reachable);
        assert_eq!(health.cache_size, Some(12));
    }
}
