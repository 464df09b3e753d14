use crate::audio::{AudioClip, AudioCodec, WavCodec};
use crate::defaults::SAMPLE_RATE;
use crate::error::{LexvoxError, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Trait for text-to-speech synthesis.
///
/// This trait allows swapping implementations (cloud voice API vs mock).
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Synthesize `text` with the service voice `voice`.
    ///
    /// # Returns
    /// Encoded audio bytes (in the format the cache codec decodes) or error
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>>;

    /// Return the name of this synthesizer for logging.
    fn name(&self) -> &str;
}

/// Implement Synthesizer for Arc<T> to allow sharing across batch jobs.
#[async_trait]
impl<T: Synthesizer + ?Sized> Synthesizer for Arc<T> {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        (**self).synthesize(text, voice).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock synthesizer for testing and dry runs.
///
/// Produces a constant-amplitude WAV tone whose length is proportional to the
/// number of characters in the text, and records every call it receives.
#[derive(Debug)]
pub struct MockSynthesizer {
    sample_rate: u32,
    samples_per_char: usize,
    amplitude: i16,
    failing_texts: HashSet<String>,
    succeed_times: Option<usize>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, String)>>,
}

impl MockSynthesizer {
    /// Create a mock producing 10 ms of audio per character.
    pub fn new() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            samples_per_char: SAMPLE_RATE as usize / 100,
            amplitude: 1000,
            failing_texts: HashSet::new(),
            succeed_times: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Configure the output sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Configure the mock to fail whenever asked to synthesize `text`.
    pub fn failing_on(mut self, text: &str) -> Self {
        self.failing_texts.insert(text.to_string());
        self
    }

    /// Configure the mock to succeed `times` times, then fail every call.
    pub fn succeeding_times(mut self, times: usize) -> Self {
        self.succeed_times = Some(times);
        self
    }

    /// Configure the mock to fail on every call.
    pub fn with_failure(self) -> Self {
        self.succeeding_times(0)
    }

    /// Number of synthesize calls received so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(text, voice)` of every call received so far, in arrival order.
    pub fn requests(&self) -> Vec<(String, String)> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Samples the mock produces for `text`.
    pub fn samples_for(&self, text: &str) -> usize {
        text.chars().count() * self.samples_per_char
    }
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, text: &str, voice: &str) -> Result<Vec<u8>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((text.to_string(), voice.to_string()));
        }

        if self.succeed_times.is_some_and(|times| call >= times)
            || self.failing_texts.contains(text)
        {
            return Err(LexvoxError::SynthesisService {
                message: "mock synthesis failure".to_string(),
            });
        }

        let clip = AudioClip::new(
            vec![self.amplitude; self.samples_for(text)],
            self.sample_rate,
        );
        WavCodec::new(self.sample_rate).encode(&clip)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
