//! Command-line interface for lexvox
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Lexicon tables to segmented display data and batched speech audio
#[derive(Parser, Debug)]
#[command(
    name = "lexvox",
    version,
    about = "Lexicon tables to segmented display data and batched speech audio"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: debug, -vv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Synthesize word, example and batch audio for a lexicon table
    Synth {
        /// Lexicon table (default: input.path from config)
        #[arg(long, short, value_name = "PATH")]
        input: Option<PathBuf>,

        /// Voice profile to synthesize (repeatable, default: all configured)
        #[arg(long = "voice", value_name = "NAME")]
        voices: Vec<String>,

        /// Records per batch track
        #[arg(long, value_name = "N")]
        batch_size: Option<usize>,

        /// Root of the audio cache
        #[arg(long, value_name = "PATH")]
        audio_dir: Option<PathBuf>,

        /// Use a local tone generator and a scratch directory instead of the service
        #[arg(long)]
        dry_run: bool,
    },

    /// Print render hand-off entries as JSON lines
    Parse {
        /// Lexicon table (default: input.path from config)
        #[arg(long, short, value_name = "PATH")]
        input: Option<PathBuf>,

        /// Romanization dictionary (default: romanization.dictionary from config)
        #[arg(long, value_name = "PATH")]
        romanizer: Option<PathBuf>,
    },

    /// Segment a sentence and print its romanization line
    Segment {
        /// Sentence to segment
        text: String,

        /// Romanization dictionary (default: romanization.dictionary from config)
        #[arg(long, value_name = "PATH")]
        romanizer: Option<PathBuf>,
    },

    /// List configured voice profiles
    Voices,

    /// View and initialize configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective configuration (file, defaults and environment)
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Default tracing filter for the verbosity flags.
pub fn log_filter(quiet: bool, verbose: u8) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}
