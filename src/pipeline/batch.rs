//! Batch partitioning and assembly of combined per-batch tracks.

use crate::audio::AudioClip;
use crate::cache::{BatchKey, KeyedLocks, Persisted, Role, SynthesisCache, write_atomic};
use crate::defaults::{EXAMPLE_GAP_MS, SAMPLE_RATE, WORD_GAP_MS};
use crate::error::{LexvoxError, Result, SynthesisError};
use crate::lexicon::LexicalRecord;
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::tts::VoiceProfile;
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Contiguous run of records sharing a batch index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 1-based batch number.
    pub index: usize,
    pub records: Vec<LexicalRecord>,
}

/// Batch a record index belongs to: `floor((index - 1) / batch_size) + 1`.
pub fn batch_index_for(index: usize, batch_size: usize) -> usize {
    index.saturating_sub(1) / batch_size.max(1) + 1
}

/// Group records into batches by [`batch_index_for`].
///
/// Records must be in ascending index order. The last batch may be shorter.
pub fn partition(records: &[LexicalRecord], batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(LexvoxError::ConfigInvalidValue {
            key: "audio.batch_size".to_string(),
            message: "must be at least 1".to_string(),
        });
    }

    let mut batches: Vec<Batch> = Vec::new();
    for record in records {
        let index = batch_index_for(record.index, batch_size);
        match batches.last_mut() {
            Some(batch) if batch.index == index => batch.records.push(record.clone()),
            _ => batches.push(Batch {
                index,
                records: vec![record.clone()],
            }),
        }
    }
    Ok(batches)
}

/// What to do with a batch in which no record produced audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyBatchPolicy {
    /// Write a zero-length track so the batch counts as done on later runs.
    #[default]
    WriteMarker,
    /// Write nothing; the batch is attempted again on the next run.
    Skip,
}

/// Result of assembling one `(profile, batch)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    /// A track was written with `items` records of audio.
    Produced {
        path: PathBuf,
        failures: Vec<SynthesisError>,
        items: usize,
    },
    /// The batch file already existed; nothing was synthesized.
    Skipped { path: PathBuf },
    /// No record produced audio. `path` is the marker file, if one was written.
    Empty {
        path: Option<PathBuf>,
        failures: Vec<SynthesisError>,
    },
}

impl BatchOutcome {
    pub fn failures(&self) -> &[SynthesisError] {
        match self {
            BatchOutcome::Produced { failures, .. } | BatchOutcome::Empty { failures, .. } => {
                failures
            }
            BatchOutcome::Skipped { .. } => &[],
        }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            BatchOutcome::Produced { path, .. } | BatchOutcome::Skipped { path } => Some(path),
            BatchOutcome::Empty { path, .. } => path.as_ref(),
        }
    }
}

/// Builds the combined track for a batch from cached or freshly synthesized
/// word and example clips.
///
/// Track layout per record, in ascending index order:
/// word, word gap, example, example gap.
pub struct BatchAssembler {
    cache: Arc<SynthesisCache>,
    reporter: Arc<dyn ErrorReporter>,
    locks: KeyedLocks<BatchKey>,
    policy: EmptyBatchPolicy,
    sample_rate: u32,
    word_gap_ms: u32,
    example_gap_ms: u32,
}

impl BatchAssembler {
    pub fn new(cache: Arc<SynthesisCache>) -> Self {
        Self {
            cache,
            reporter: Arc::new(LogReporter),
            locks: KeyedLocks::new(),
            policy: EmptyBatchPolicy::default(),
            sample_rate: SAMPLE_RATE,
            word_gap_ms: WORD_GAP_MS,
            example_gap_ms: EXAMPLE_GAP_MS,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_policy(mut self, policy: EmptyBatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sample rate of the combined track.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_gaps(mut self, word_gap_ms: u32, example_gap_ms: u32) -> Self {
        self.word_gap_ms = word_gap_ms;
        self.example_gap_ms = example_gap_ms;
        self
    }

    /// Produce the track for `batch` spoken by `profile`.
    ///
    /// An existing batch file is terminal: it is returned as skipped without
    /// touching the cache. Item failures leave their record out of the track.
    /// The file is written only after every record has been handled.
    pub async fn assemble(&self, batch: &Batch, profile: &VoiceProfile) -> Result<BatchOutcome> {
        let key = BatchKey::new(&profile.name, batch.index);
        let path = self.cache.layout().batch_path(&key);

        let _guard = self.locks.lock(&key).await;
        if path.exists() {
            tracing::info!(path = %path.display(), "batch already exists, skipping");
            return Ok(BatchOutcome::Skipped { path });
        }

        let rendered = join_all(
            batch
                .records
                .iter()
                .map(|record| self.record_audio(record, profile)),
        )
        .await;

        let mut track = AudioClip::empty(self.sample_rate);
        let mut failures = Vec::new();
        let mut items = 0;
        for (record, result) in batch.records.iter().zip(rendered) {
            self.cache.release(Role::Word, record.index, &profile.name);
            self.cache.release(Role::Example, record.index, &profile.name);
            match result {
                Ok((word, example)) => {
                    track.append(&word);
                    track.append_silence(self.word_gap_ms);
                    track.append(&example);
                    track.append_silence(self.example_gap_ms);
                    items += 1;
                }
                Err(errors) => {
                    for error in errors {
                        self.reporter.report(&key, &error);
                        failures.push(error);
                    }
                }
            }
        }

        if items == 0 && self.policy == EmptyBatchPolicy::Skip {
            tracing::warn!(%key, "no audio produced, leaving batch for the next run");
            return Ok(BatchOutcome::Empty {
                path: None,
                failures,
            });
        }

        let duration = std::time::Duration::from_millis(track.duration_ms());
        let written = self.export(track, &path).await?;
        if written == Persisted::AlreadyPresent {
            tracing::info!(path = %path.display(), "batch written by another process");
            return Ok(BatchOutcome::Skipped { path });
        }

        if items == 0 {
            tracing::warn!(path = %path.display(), "no audio produced, wrote empty batch marker");
            return Ok(BatchOutcome::Empty {
                path: Some(path),
                failures,
            });
        }

        tracing::info!(
            path = %path.display(),
            items,
            failed = failures.len(),
            duration = ?duration,
            "batch exported"
        );
        Ok(BatchOutcome::Produced {
            path,
            failures,
            items,
        })
    }

    /// Word and example clips for one record, synthesized concurrently.
    async fn record_audio(
        &self,
        record: &LexicalRecord,
        profile: &VoiceProfile,
    ) -> std::result::Result<(AudioClip, AudioClip), Vec<SynthesisError>> {
        let (word, example) = tokio::join!(
            self.cache
                .get_or_synthesize(Role::Word, record.index, profile, &record.word),
            self.cache.get_or_synthesize(
                Role::Example,
                record.index,
                profile,
                &record.example_source_text
            ),
        );

        match (word, example) {
            (Ok(word), Ok(example)) => Ok((word, example)),
            (word, example) => Err([word.err(), example.err()].into_iter().flatten().collect()),
        }
    }

    async fn export(&self, track: AudioClip, path: &std::path::Path) -> Result<Persisted> {
        let codec = self.cache.codec().clone();
        let target = path.to_path_buf();
        let export_err = |message: String| LexvoxError::AudioExport {
            path: path.display().to_string(),
            message,
        };
        tokio::task::spawn_blocking(move || {
            let bytes = codec.encode(&track)?;
            write_atomic(&target, &bytes, false).map_err(LexvoxError::from)
        })
        .await
        .map_err(|e| export_err(e.to_string()))?
        .map_err(|e| match e {
            LexvoxError::Io(e) => export_err(e.to_string()),
            other => other,
        })
    }
}

impl std::fmt::Debug for BatchAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchAssembler")
            .field("cache", &self.cache)
            .field("policy", &self.policy)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}
