//! Pipeline driver: parse once, partition, assemble every batch for every
//! voice profile, and tally the run.

use crate::audio::AudioCodec;
use crate::cache::{AudioLayout, SynthesisCache};
use crate::config::Config;
use crate::defaults::{
    BATCH_SIZE, EXAMPLE_GAP_MS, HEADER_SENTINEL, MAX_BATCHES_IN_FLIGHT, MAX_CONCURRENT_SYNTHESIS,
    SAMPLE_RATE, WORD_GAP_MS,
};
use crate::error::{LexvoxError, Result, SynthesisError};
use crate::lexicon::{ParseReport, RowLayout, parse_lines};
use crate::pipeline::batch::{BatchAssembler, BatchOutcome, EmptyBatchPolicy, partition};
use crate::pipeline::error::{ErrorReporter, LogReporter};
use crate::tts::{Synthesizer, VoiceProfile};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Tally of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Records retained by the parser.
    pub records: usize,
    /// Rows dropped for having the wrong column count.
    pub rows_rejected: usize,
    /// Batch tracks written in this run.
    pub produced: usize,
    /// Batches whose track already existed.
    pub skipped: usize,
    /// Batches in which no record produced audio.
    pub empty: usize,
    /// Batch jobs that failed outright (export error or panic).
    pub jobs_failed: usize,
    /// Per-item synthesis failures, ordered by profile, index and role.
    pub failures: Vec<SynthesisError>,
}

impl RunSummary {
    /// Whether every batch of every profile is complete with no item failures.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && self.jobs_failed == 0
    }

    fn record(&mut self, outcome: BatchOutcome) {
        match outcome {
            BatchOutcome::Produced { failures, .. } => {
                self.produced += 1;
                self.failures.extend(failures);
            }
            BatchOutcome::Skipped { .. } => self.skipped += 1,
            BatchOutcome::Empty { failures, .. } => {
                self.empty += 1;
                self.failures.extend(failures);
            }
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} batches produced, {} skipped, {} empty, {} item failures",
            self.records,
            self.produced,
            self.skipped,
            self.empty,
            self.failures.len()
        )?;
        if self.rows_rejected > 0 {
            write!(f, ", {} rows rejected", self.rows_rejected)?;
        }
        if self.jobs_failed > 0 {
            write!(f, ", {} batch jobs failed", self.jobs_failed)?;
        }
        Ok(())
    }
}

/// Drives a lexicon table through the synthesis cache and batch assembler.
///
/// The synthesizer and codec are explicit values so callers choose the
/// service (or a mock) and the cache format.
pub struct Pipeline {
    synthesizer: Arc<dyn Synthesizer>,
    codec: Arc<dyn AudioCodec>,
    voices: Vec<VoiceProfile>,
    audio_dir: PathBuf,
    per_profile_dirs: bool,
    batch_size: usize,
    layout: RowLayout,
    header_sentinel: String,
    empty_batch: EmptyBatchPolicy,
    sample_rate: u32,
    word_gap_ms: u32,
    example_gap_ms: u32,
    max_concurrent_synthesis: usize,
    max_batches_in_flight: usize,
    reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Create a pipeline with default settings writing under `audio_dir`.
    ///
    /// Profile subdirectories are used when more than one voice is given.
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        codec: Arc<dyn AudioCodec>,
        voices: Vec<VoiceProfile>,
        audio_dir: impl Into<PathBuf>,
    ) -> Self {
        let per_profile_dirs = voices.len() > 1;
        Self {
            synthesizer,
            codec,
            voices,
            audio_dir: audio_dir.into(),
            per_profile_dirs,
            batch_size: BATCH_SIZE,
            layout: RowLayout::default(),
            header_sentinel: HEADER_SENTINEL.to_string(),
            empty_batch: EmptyBatchPolicy::default(),
            sample_rate: SAMPLE_RATE,
            word_gap_ms: WORD_GAP_MS,
            example_gap_ms: EXAMPLE_GAP_MS,
            max_concurrent_synthesis: MAX_CONCURRENT_SYNTHESIS,
            max_batches_in_flight: MAX_BATCHES_IN_FLIGHT,
            reporter: Arc::new(LogReporter),
        }
    }

    /// Create a pipeline from validated configuration.
    ///
    /// The directory layout follows the configured voice set, so selecting a
    /// subset of voices keeps reading and writing the same files.
    pub fn from_config(
        config: &Config,
        synthesizer: Arc<dyn Synthesizer>,
        codec: Arc<dyn AudioCodec>,
        voices: Vec<VoiceProfile>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(synthesizer, codec, voices, &config.audio.dir)
            .with_per_profile_dirs(config.per_profile_dirs())
            .with_batch_size(config.audio.batch_size)
            .with_row_layout(config.input.layout)
            .with_header_sentinel(&config.input.header_sentinel)
            .with_empty_batch_policy(config.audio.empty_batch)
            .with_sample_rate(config.audio.sample_rate)
            .with_gaps(config.audio.word_gap_ms, config.audio.example_gap_ms)
            .with_concurrency(
                config.synthesis.max_concurrent,
                config.synthesis.max_batches_in_flight,
            ))
    }

    pub fn with_per_profile_dirs(mut self, per_profile_dirs: bool) -> Self {
        self.per_profile_dirs = per_profile_dirs;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_row_layout(mut self, layout: RowLayout) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_header_sentinel(mut self, sentinel: &str) -> Self {
        self.header_sentinel = sentinel.to_string();
        self
    }

    pub fn with_empty_batch_policy(mut self, policy: EmptyBatchPolicy) -> Self {
        self.empty_batch = policy;
        self
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_gaps(mut self, word_gap_ms: u32, example_gap_ms: u32) -> Self {
        self.word_gap_ms = word_gap_ms;
        self.example_gap_ms = example_gap_ms;
        self
    }

    /// Bound live service calls and concurrently assembled batches.
    pub fn with_concurrency(mut self, max_synthesis: usize, max_batches: usize) -> Self {
        self.max_concurrent_synthesis = max_synthesis.max(1);
        self.max_batches_in_flight = max_batches.max(1);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn audio_layout(&self) -> AudioLayout {
        AudioLayout::new(
            &self.audio_dir,
            self.per_profile_dirs,
            self.codec.extension(),
        )
    }

    /// Parse lines with this pipeline's row layout and header sentinel.
    pub fn parse<I, S>(&self, lines: I) -> ParseReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        parse_lines(lines, self.layout, &self.header_sentinel)
    }

    /// Read a lexicon table and run it.
    pub async fn run_file(&self, path: &Path) -> Result<RunSummary> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|e| LexvoxError::TableRead {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
        self.run(content.lines()).await
    }

    /// Run the pipeline over raw table lines.
    ///
    /// Item failures are collected in the summary, never returned as errors.
    /// Errors are reserved for configuration problems detected up front.
    pub async fn run<I, S>(&self, lines: I) -> Result<RunSummary>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.voices.is_empty() {
            return Err(LexvoxError::ConfigInvalidValue {
                key: "voices".to_string(),
                message: "no voice profiles selected".to_string(),
            });
        }

        let report = self.parse(lines);
        for rejection in &report.rejected {
            tracing::warn!(
                line = rejection.line_number,
                columns = rejection.columns,
                expected = rejection.expected,
                "skipping malformed row"
            );
        }

        let batches = partition(&report.records, self.batch_size)?;
        let mut summary = RunSummary {
            records: report.records.len(),
            rows_rejected: report.rejected.len(),
            ..RunSummary::default()
        };
        tracing::info!(
            records = summary.records,
            batches = batches.len(),
            voices = self.voices.len(),
            synthesizer = self.synthesizer.name(),
            "starting synthesis"
        );

        let cache = SynthesisCache::new(
            self.synthesizer.clone(),
            self.codec.clone(),
            self.audio_layout(),
        )
        .with_max_concurrent(self.max_concurrent_synthesis);
        let assembler = Arc::new(
            BatchAssembler::new(Arc::new(cache))
                .with_reporter(self.reporter.clone())
                .with_policy(self.empty_batch)
                .with_sample_rate(self.sample_rate)
                .with_gaps(self.word_gap_ms, self.example_gap_ms),
        );

        let semaphore = Arc::new(Semaphore::new(self.max_batches_in_flight));
        let batches: Vec<Arc<_>> = batches.into_iter().map(Arc::new).collect();
        let mut handles = Vec::with_capacity(batches.len() * self.voices.len());

        for profile in &self.voices {
            for batch in &batches {
                let assembler = assembler.clone();
                let semaphore = semaphore.clone();
                let profile = profile.clone();
                let batch = batch.clone();
                let label = format!("{} batch {}", profile.name, batch.index);

                let handle = tokio::spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    assembler.assemble(&batch, &profile).await
                });
                handles.push((label, handle));
            }
        }

        for (label, handle) in handles {
            match handle.await {
                Ok(Ok(outcome)) => summary.record(outcome),
                Ok(Err(e)) => {
                    tracing::error!(job = %label, error = %e, "batch failed");
                    summary.jobs_failed += 1;
                }
                Err(e) => {
                    tracing::error!(job = %label, error = %e, "batch task panicked");
                    summary.jobs_failed += 1;
                }
            }
        }

        summary
            .failures
            .sort_by(|a, b| (&a.profile, a.index, a.role).cmp(&(&b.profile, b.index, b.role)));
        tracing::info!("{summary}");
        Ok(summary)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("synthesizer", &self.synthesizer.name())
            .field("voices", &self.voices)
            .field("audio_dir", &self.audio_dir)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::WavCodec;
    use crate::tts::{MockSynthesizer, default_voices};
    use tempfile::TempDir;

    fn table(rows: usize) -> Vec<String> {
        let mut lines = vec![
            "| 単語 | 意味 | 発音 | 例文 |".to_string(),
            "|---|---|---|---|".to_string(),
        ];
        for i in 1..=rows {
            lines.push(format!("| 詞{i} | gloss {i} | ci4 | 例句{i}（sentence {i}） |"));
        }
        lines
    }

    fn pipeline(synthesizer: Arc<MockSynthesizer>, dir: &Path) -> Pipeline {
        Pipeline::new(
            synthesizer,
            Arc::new(WavCodec::default()),
            default_voices(),
            dir,
        )
    }

    #[tokio::test]
    async fn run_produces_every_batch_for_every_voice() {
        let dir = TempDir::new().unwrap();
        let synthesizer = Arc::new(MockSynthesizer::new());

        let summary = pipeline(synthesizer.clone(), dir.path())
            .run(table(23))
            .await
            .unwrap();

        assert_eq!(summary.records, 23);
        assert_eq!(summary.produced, 6);
        assert!(summary.is_clean());
        assert_eq!(synthesizer.calls(), 23 * 2 * 2);
        for profile in ["male", "female"] {
            for n in 1..=3 {
                assert!(
                    dir.path()
                        .join(format!("{profile}/batch/output_batch_{n}.wav"))
                        .exists()
                );
            }
        }
    }

    #[tokio::test]
    async fn second_run_skips_everything() {
        let dir = TempDir::new().unwrap();
        pipeline(Arc::new(MockSynthesizer::new()), dir.path())
            .run(table(12))
            .await
            .unwrap();

        let synthesizer = Arc::new(MockSynthesizer::new().with_failure());
        let summary = pipeline(synthesizer.clone(), dir.path())
            .run(table(12))
            .await
            .unwrap();

        assert_eq!(summary.skipped, 4);
        assert_eq!(summary.produced, 0);
        assert_eq!(synthesizer.calls(), 0);
    }

    #[tokio::test]
    async fn rejected_rows_are_counted() {
        let dir = TempDir::new().unwrap();
        let mut lines = table(2);
        lines.push("| only | three | cells".to_string());

        let summary = pipeline(Arc::new(MockSynthesizer::new()), dir.path())
            .run(lines)
            .await
            .unwrap();

        assert_eq!(summary.records, 2);
        assert_eq!(summary.rows_rejected, 1);
    }

    #[tokio::test]
    async fn no_voices_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(MockSynthesizer::new()),
            Arc::new(WavCodec::default()),
            Vec::new(),
            dir.path(),
        );
        assert!(matches!(
            pipeline.run(table(1)).await,
            Err(LexvoxError::ConfigInvalidValue { .. })
        ));
    }

    #[tokio::test]
    async fn single_voice_omits_profile_directory() {
        let dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(
            Arc::new(MockSynthesizer::new()),
            Arc::new(WavCodec::default()),
            vec![VoiceProfile::new("default", "zh-HK-HiuMaanNeural")],
            dir.path(),
        );

        pipeline.run(table(1)).await.unwrap();

        assert!(dir.path().join("words/word_001.wav").exists());
        assert!(dir.path().join("batch/output_batch_1.wav").exists());
    }

    #[tokio::test]
    async fn run_file_reports_missing_table() {
        let dir = TempDir::new().unwrap();
        let result = pipeline(Arc::new(MockSynthesizer::new()), dir.path())
            .run_file(&dir.path().join("missing.txt"))
            .await;
        assert!(matches!(result, Err(LexvoxError::TableRead { .. })));
    }

    #[test]
    fn summary_display() {
        let summary = RunSummary {
            records: 23,
            produced: 5,
            skipped: 1,
            rows_rejected: 2,
            ..RunSummary::default()
        };
        assert_eq!(
            summary.to_string(),
            "23 records, 5 batches produced, 1 skipped, 0 empty, 0 item failures, 2 rows rejected"
        );
    }
}
