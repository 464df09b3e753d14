use crate::audio::{AudioCodec, AudioFormat};
use crate::defaults::{
    AUDIO_DIR, BATCH_SIZE, EXAMPLE_GAP_MS, HEADER_SENTINEL, INPUT_PATH, MAX_BATCHES_IN_FLIGHT,
    MAX_CONCURRENT_SYNTHESIS, REQUEST_TIMEOUT_SECS, SAMPLE_RATE, WORD_GAP_MS,
};
use crate::error::{LexvoxError, Result};
use crate::lexicon::RowLayout;
use crate::pipeline::EmptyBatchPolicy;
use crate::tts::{VoiceProfile, default_voices};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Sample rates LAME accepts at 192 kbps (MPEG-1 Layer III).
const MP3_SAMPLE_RATES: [u32; 3] = [32_000, 44_100, 48_000];

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub input: InputConfig,
    pub audio: AudioConfig,
    pub synthesis: SynthesisConfig,
    pub romanization: RomanizationConfig,
    pub voices: Vec<VoiceProfile>,
}

/// Lexicon table input configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    pub path: PathBuf,
    pub layout: RowLayout,
    pub header_sentinel: String,
}

/// Audio cache and batch track configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub dir: PathBuf,
    pub format: AudioFormat,
    pub batch_size: usize,
    pub sample_rate: u32,
    pub word_gap_ms: u32,
    pub example_gap_ms: u32,
    pub empty_batch: EmptyBatchPolicy,
    /// Force or suppress the per-profile directory segment. Unset means
    /// "only when more than one voice is configured".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_profile_dirs: Option<bool>,
}

/// Speech service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Service output format. Unset means the one matching `audio.format`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_format: Option<String>,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub max_concurrent: usize,
    pub max_batches_in_flight: usize,
}

/// Romanization dictionary configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct RomanizationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dictionary: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputConfig::default(),
            audio: AudioConfig::default(),
            synthesis: SynthesisConfig::default(),
            romanization: RomanizationConfig::default(),
            voices: default_voices(),
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(INPUT_PATH),
            layout: RowLayout::default(),
            header_sentinel: HEADER_SENTINEL.to_string(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(AUDIO_DIR),
            format: AudioFormat::default(),
            batch_size: BATCH_SIZE,
            sample_rate: SAMPLE_RATE,
            word_gap_ms: WORD_GAP_MS,
            example_gap_ms: EXAMPLE_GAP_MS,
            empty_batch: EmptyBatchPolicy::default(),
            per_profile_dirs: None,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            output_format: None,
            timeout_secs: REQUEST_TIMEOUT_SECS,
            endpoint: None,
            max_concurrent: MAX_CONCURRENT_SYNTHESIS,
            max_batches_in_flight: MAX_BATCHES_IN_FLIGHT,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file is missing or contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LexvoxError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                LexvoxError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(LexvoxError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            other => other,
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - LEXVOX_INPUT → input.path
    /// - LEXVOX_AUDIO_DIR → audio.dir
    /// - LEXVOX_BATCH_SIZE → audio.batch_size
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(input) = std::env::var("LEXVOX_INPUT")
            && !input.is_empty()
        {
            self.input.path = PathBuf::from(input);
        }

        if let Ok(dir) = std::env::var("LEXVOX_AUDIO_DIR")
            && !dir.is_empty()
        {
            self.audio.dir = PathBuf::from(dir);
        }

        if let Ok(size) = std::env::var("LEXVOX_BATCH_SIZE")
            && !size.is_empty()
        {
            match size.trim().parse() {
                Ok(size) => self.audio.batch_size = size,
                Err(_) => tracing::warn!(value = %size, "ignoring invalid LEXVOX_BATCH_SIZE"),
            }
        }

        self
    }

    /// Check values the types cannot express.
    pub fn validate(&self) -> Result<()> {
        let invalid = |key: &str, message: &str| LexvoxError::ConfigInvalidValue {
            key: key.to_string(),
            message: message.to_string(),
        };

        if self.audio.batch_size == 0 {
            return Err(invalid("audio.batch_size", "must be at least 1"));
        }
        if self.audio.sample_rate == 0 {
            return Err(invalid("audio.sample_rate", "must be positive"));
        }
        if self.audio.format == AudioFormat::Mp3
            && !MP3_SAMPLE_RATES.contains(&self.audio.sample_rate)
        {
            return Err(invalid(
                "audio.sample_rate",
                "mp3 output needs 32000, 44100 or 48000 Hz",
            ));
        }
        if self.synthesis.max_concurrent == 0 {
            return Err(invalid("synthesis.max_concurrent", "must be at least 1"));
        }
        if self.synthesis.max_batches_in_flight == 0 {
            return Err(invalid("synthesis.max_batches_in_flight", "must be at least 1"));
        }
        if self.voices.is_empty() {
            return Err(invalid("voices", "at least one voice profile is required"));
        }

        let mut seen = HashSet::new();
        for profile in &self.voices {
            if profile.name.is_empty()
                || profile.name == "."
                || profile.name == ".."
                || profile.name.contains(['/', '\\'])
            {
                return Err(invalid(
                    "voices.name",
                    &format!("'{}' cannot be used as a directory name", profile.name),
                ));
            }
            if profile.voice.trim().is_empty() {
                return Err(invalid(
                    "voices.voice",
                    &format!("profile '{}' has no voice id", profile.name),
                ));
            }
            if !seen.insert(profile.name.as_str()) {
                return Err(invalid(
                    "voices.name",
                    &format!("duplicate profile '{}'", profile.name),
                ));
            }
        }
        Ok(())
    }

    /// Whether audio paths carry a per-profile directory segment.
    pub fn per_profile_dirs(&self) -> bool {
        self.audio
            .per_profile_dirs
            .unwrap_or(self.voices.len() > 1)
    }

    /// Codec for the configured cache format and sample rate.
    pub fn codec(&self) -> Arc<dyn AudioCodec> {
        self.audio.format.codec(self.audio.sample_rate)
    }

    /// Output format to request from the synthesis service.
    pub fn output_format(&self) -> &str {
        self.synthesis
            .output_format
            .as_deref()
            .unwrap_or(self.audio.format.service_output_format())
    }

    /// Serialize to TOML, as written by `config init`.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| LexvoxError::ConfigParse {
            message: e.to_string(),
        })
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/lexvox/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lexvox")
            .join("config.toml")
    }
}
