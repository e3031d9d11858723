//! Cached narration service.
//!
//! Wraps a [`NarrationBackend`] with a `(text, speed)` cache shared by the
//! pre-generation pipeline and the live run. Keys are exact: `0.85` and
//! `0.850001` are different entries.
//!
//! Concurrent misses on the same key both reach the backend; the last write
//! wins and both callers get a valid handle.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dictee_core::{BackendHealth, NarrationAudio, NarrationBackend, NarrationError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    speed_bits: u32,
}

impl CacheKey {
    fn new(text: &str, speed: f32) -> Self {
        Self {
            text: text.to_string(),
            speed_bits: speed.to_bits(),
        }
    }
}

/// Counters since the service was created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NarrationStats {
    /// Calls to [`NarrationService::fetch`].
    pub requests: u64,
    pub cache_hits: u64,
    /// Outbound requests actually sent to the backend.
    pub backend_calls: u64,
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    cache_hits: AtomicU64,
    backend_calls: AtomicU64,
}

/// Text-to-audio service with caching and cancellation.
pub struct NarrationService {
    backend: Arc<dyn NarrationBackend>,
    cache: RwLock<HashMap<CacheKey, NarrationAudio>>,
    counters: Counters,
}

impl NarrationService {
    pub fn new(backend: Arc<dyn NarrationBackend>) -> Self {
        Self {
            backend,
            cache: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Narrate `text` at `speed`.
    ///
    /// Returns the cached handle when present. Otherwise sends exactly one
    /// backend request, racing it against `cancel`: when the token fires
    /// first the request is dropped and [`NarrationError::Aborted`] returned.
    pub async fn fetch(
        &self,
        text: &str,
        speed: f32,
        cancel: &CancellationToken,
    ) -> Result<NarrationAudio, NarrationError> {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        if cancel.is_cancelled() {
            return Err(NarrationError::Aborted);
        }

        let key = CacheKey::new(text, speed);
        if let Some(audio) = self.lookup(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(chars = text.len(), speed, "Narration cache hit");
            return Ok(audio);
        }

        self.counters.backend_calls.fetch_add(1, Ordering::Relaxed);
        debug!(chars = text.len(), speed, "Narration cache miss, calling backend");

        let bytes = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(NarrationError::Aborted),
            result = self.backend.synthesize(text, speed) => result?,
        };

        let audio = NarrationAudio::new(bytes);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, audio.clone());

        Ok(audio)
    }

    /// Query backend health.
    pub async fn health(&self) -> Result<BackendHealth, NarrationError> {
        self.backend.health().await
    }

    /// Whether a handle for `(text, speed)` is cached.
    pub fn is_cached(&self, text: &str, speed: f32) -> bool {
        self.lookup(&CacheKey::new(text, speed)).is_some()
    }

    pub fn cache_len(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop every cached handle and return how many were released.
    ///
    /// Handles still held by a playback stay valid until that playback
    /// drops them.
    pub fn clear_cache(&self) -> usize {
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        let released = cache.len();
        cache.clear();
        drop(cache);

        if released > 0 {
            debug!(released, "Narration cache cleared");
        }
        released
    }

    pub fn stats(&self) -> NarrationStats {
        NarrationStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            backend_calls: self.counters.backend_calls.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, key: &CacheKey) -> Option<NarrationAudio> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}
