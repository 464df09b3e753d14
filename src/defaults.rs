//! Default configuration constants for lexvox.
//!
//! Shared by the config types, the pipeline and the CLI so the legacy
//! audio layout and timing stay consistent across entry points.

/// Number of records concatenated into one batch track.
pub const BATCH_SIZE: usize = 10;

/// Silence appended after each word clip in a batch track, in milliseconds.
pub const WORD_GAP_MS: u32 = 1000;

/// Silence appended after each example clip in a batch track, in milliseconds.
pub const EXAMPLE_GAP_MS: u32 = 500;

/// Sample rate of every clip written to the audio cache.
///
/// Matches the 48 kHz synthesis output formats, so freshly synthesized
/// audio is persisted without resampling.
pub const SAMPLE_RATE: u32 = 48_000;

/// Root directory of the audio cache.
pub const AUDIO_DIR: &str = "audio";

/// Default lexicon table path.
pub const INPUT_PATH: &str = "output_file.txt";

/// Keyword that identifies the header row of the lexicon table.
pub const HEADER_SENTINEL: &str = "単語";

/// Column delimiter of the lexicon table.
pub const COLUMN_DELIMITER: char = '|';

/// Marker contained in table separator rows (`|---|---|`).
pub const SEPARATOR_MARKER: &str = "---";

/// Placeholder romanization for graphemes the romanizer cannot map.
pub const BLANK_ROMANIZATION: &str = " ";

/// Azure output format requested when the cache holds MP3 files.
pub const MP3_OUTPUT_FORMAT: &str = "audio-48khz-192kbitrate-mono-mp3";

/// Azure output format requested when the cache holds WAV files.
pub const WAV_OUTPUT_FORMAT: &str = "riff-48khz-16bit-mono-pcm";

/// Maximum number of synthesis requests in flight at once.
pub const MAX_CONCURRENT_SYNTHESIS: usize = 4;

/// Maximum number of batch jobs processed concurrently.
pub const MAX_BATCHES_IN_FLIGHT: usize = 2;

/// Timeout for a single synthesis request, in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Built-in voice profiles: `(profile name, service voice id)`.
pub const VOICES: &[(&str, &str)] = &[
    ("male", "zh-HK-WanLungNeural"),
    ("female", "zh-HK-HiuMaanNeural"),
];
