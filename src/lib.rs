//! lexvox - lexicon tables to display records and batched speech audio
//!
//! Parses a pipe-delimited lexicon table into normalized records, segments
//! example sentences into character/romanization pairs, and synthesizes word,
//! example and per-batch audio through a durable, resumable cache.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod lexicon;
#[cfg(feature = "cli")]
pub mod output;
pub mod pipeline;
pub mod render;
pub mod segment;
pub mod tts;

// Core traits (synthesize → cache → assemble)
pub use audio::AudioCodec;
pub use segment::Romanizer;
pub use tts::Synthesizer;

// Pipeline
pub use pipeline::{BatchAssembler, BatchOutcome, EmptyBatchPolicy, Pipeline, RunSummary};

// Error handling
pub use error::{LexvoxError, Result, SynthesisError};

// Config
pub use config::Config;

// Records and segmentation
pub use lexicon::{LexicalRecord, ParseReport, RowLayout, parse_file, parse_lines};
pub use segment::{SegmentedSentence, Segmenter};

// Reporting (for custom failure sinks)
pub use pipeline::error::ErrorReporter;

/// Build version string with optional git commit hash.
///
/// Returns `"0.1.0+abc1234"` when git hash is available, `"0.1.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
