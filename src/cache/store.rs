//! Durable synthesis cache.
//!
//! One audio file per `(role, index, profile)`. A key whose file exists and
//! decodes is never synthesized again, so an interrupted run resumes where it
//! stopped without extra service calls.

use crate::audio::{AudioClip, AudioCodec};
use crate::cache::key::{AudioLayout, CacheKey, Role};
use crate::cache::lock::KeyedLocks;
use crate::cache::persist::{Persisted, write_atomic};
use crate::defaults::MAX_CONCURRENT_SYNTHESIS;
use crate::error::{LexvoxError, Result, SynthesisError};
use crate::tts::{Synthesizer, VoiceProfile};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

/// Get-or-synthesize store over an [`AudioLayout`].
///
/// Lookups for the same key are serialized through a per-key lock, and
/// service calls across all keys are bounded by a semaphore. A clip stays in
/// memory in front of its file until the caller [releases](Self::release) it.
pub struct SynthesisCache {
    synthesizer: Arc<dyn Synthesizer>,
    codec: Arc<dyn AudioCodec>,
    layout: AudioLayout,
    locks: KeyedLocks<CacheKey>,
    memo: Mutex<HashMap<CacheKey, AudioClip>>,
    permits: Semaphore,
}

impl SynthesisCache {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        codec: Arc<dyn AudioCodec>,
        layout: AudioLayout,
    ) -> Self {
        Self {
            synthesizer,
            codec,
            layout,
            locks: KeyedLocks::new(),
            memo: Mutex::new(HashMap::new()),
            permits: Semaphore::new(MAX_CONCURRENT_SYNTHESIS),
        }
    }

    /// Bound the number of in-flight service calls (minimum 1).
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.permits = Semaphore::new(max_concurrent.max(1));
        self
    }

    pub fn layout(&self) -> &AudioLayout {
        &self.layout
    }

    pub fn codec(&self) -> &Arc<dyn AudioCodec> {
        &self.codec
    }

    /// File path backing `(role, index, profile)`.
    pub fn path_for(&self, role: Role, index: usize, profile: &str) -> PathBuf {
        self.layout.item_path(&CacheKey::new(role, index, profile))
    }

    /// Return the clip for `(role, index, profile)`, synthesizing and
    /// persisting it only if no readable cached file exists.
    ///
    /// `text` is only consulted on a miss. Empty or whitespace-only text is
    /// a synthesis error and never reaches the service.
    pub async fn get_or_synthesize(
        &self,
        role: Role,
        index: usize,
        profile: &VoiceProfile,
        text: &str,
    ) -> std::result::Result<AudioClip, SynthesisError> {
        let key = CacheKey::new(role, index, &profile.name);
        let fail = |cause: String| SynthesisError::new(role, index, &profile.name, cause);

        if let Some(clip) = self.memoized(&key) {
            return Ok(clip);
        }

        let _guard = self.locks.lock(&key).await;
        if let Some(clip) = self.memoized(&key) {
            return Ok(clip);
        }

        let path = self.layout.item_path(&key);
        let mut replace = false;
        match load_file(self.codec.clone(), path.clone()).await {
            Ok(None) => {}
            Ok(Some(clip)) => {
                tracing::debug!(path = %path.display(), "cache hit");
                self.remember(key, &clip);
                return Ok(clip);
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "unreadable cached audio, synthesizing again"
                );
                replace = true;
            }
        }

        if text.trim().is_empty() {
            return Err(fail("empty text".to_string()));
        }

        let bytes = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| fail(format!("synthesis slots closed: {e}")))?;
            tracing::debug!(%role, index, profile = %profile.name, "synthesizing");
            self.synthesizer
                .synthesize(text, &profile.voice)
                .await
                .map_err(|e| fail(e.to_string()))?
        };

        let (mut clip, encoded) = transcode(self.codec.clone(), bytes)
            .await
            .map_err(|e| fail(e.to_string()))?;

        match persist(path.clone(), encoded, replace).await {
            Ok(Persisted::Written) => {
                tracing::info!(path = %path.display(), "synthesized");
            }
            Ok(Persisted::AlreadyPresent) => {
                tracing::debug!(path = %path.display(), "another writer cached this key first");
                if let Ok(Some(existing)) = load_file(self.codec.clone(), path.clone()).await {
                    clip = existing;
                }
            }
            Err(e) => {
                return Err(fail(format!("failed to write {}: {e}", path.display())));
            }
        }

        self.remember(key, &clip);
        Ok(clip)
    }

    /// Whether a cached file exists for the key, without decoding it.
    pub fn is_cached(&self, role: Role, index: usize, profile: &str) -> bool {
        self.path_for(role, index, profile).exists()
    }

    /// Drop the in-memory copy of a clip once the caller has consumed it.
    ///
    /// Later lookups of the key read the cached file again.
    pub fn release(&self, role: Role, index: usize, profile: &str) {
        if let Ok(mut memo) = self.memo.lock() {
            memo.remove(&CacheKey::new(role, index, profile));
        }
    }

    /// Number of clips currently held in memory.
    pub fn retained(&self) -> usize {
        self.memo.lock().map(|memo| memo.len()).unwrap_or(0)
    }

    fn memoized(&self, key: &CacheKey) -> Option<AudioClip> {
        self.memo.lock().ok()?.get(key).cloned()
    }

    fn remember(&self, key: CacheKey, clip: &AudioClip) {
        if let Ok(mut memo) = self.memo.lock() {
            memo.insert(key, clip.clone());
        }
    }
}

impl std::fmt::Debug for SynthesisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisCache")
            .field("synthesizer", &self.synthesizer.name())
            .field("extension", &self.codec.extension())
            .field("layout", &self.layout)
            .finish()
    }
}

async fn persist(path: PathBuf, bytes: Vec<u8>, replace: bool) -> std::io::Result<Persisted> {
    tokio::task::spawn_blocking(move || write_atomic(&path, &bytes, replace))
        .await
        .map_err(std::io::Error::other)?
}

/// Read and decode a cached file off the runtime threads. `None` when the
/// file does not exist.
async fn load_file(codec: Arc<dyn AudioCodec>, path: PathBuf) -> Result<Option<AudioClip>> {
    tokio::task::spawn_blocking(move || {
        if !path.exists() {
            return Ok(None);
        }
        codec.load(&path).map(Some)
    })
    .await
    .map_err(|e| LexvoxError::Io(std::io::Error::other(e)))?
}

/// Decode service bytes and re-encode them in the cache format.
async fn transcode(codec: Arc<dyn AudioCodec>, bytes: Vec<u8>) -> Result<(AudioClip, Vec<u8>)> {
    tokio::task::spawn_blocking(move || {
        let clip = codec.decode(&bytes)?;
        let encoded = codec.encode(&clip)?;
        Ok((clip, encoded))
    })
    .await
    .map_err(|e| LexvoxError::Io(std::io::Error::other(e)))?
}
