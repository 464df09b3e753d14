//! Error types for lexvox.

use crate::cache::Role;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LexvoxError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Failed to parse configuration: {message}")]
    ConfigParse { message: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing credential: set {variable} in the environment or .env")]
    MissingCredential { variable: String },

    // Input errors
    #[error("Failed to read lexicon table {path}: {message}")]
    TableRead { path: String, message: String },

    #[error("Failed to load romanization dictionary {path}: {message}")]
    Dictionary { path: String, message: String },

    // Audio errors
    #[error("Audio decode failed: {message}")]
    AudioDecode { message: String },

    #[error("Audio encode failed: {message}")]
    AudioEncode { message: String },

    #[error("Audio export to {path} failed: {message}")]
    AudioExport { path: String, message: String },

    // Synthesis errors
    #[error("Speech synthesis service error: {message}")]
    SynthesisService { message: String },

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Failure to produce audio for one `(role, index, profile)` cache key.
///
/// Item-level: the batch assembler records it and moves on to the next record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{role} {index:03} ({profile}): {cause}")]
pub struct SynthesisError {
    pub role: Role,
    pub index: usize,
    pub profile: String,
    pub cause: String,
}

impl SynthesisError {
    pub fn new(role: Role, index: usize, profile: &str, cause: impl ToString) -> Self {
        Self {
            role,
            index,
            profile: profile.to_string(),
            cause: cause.to_string(),
        }
    }
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, LexvoxError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = LexvoxError::ConfigFileNotFound {
            path: "/path/to/config.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /path/to/config.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = LexvoxError::ConfigInvalidValue {
            key: "audio.batch_size".to_string(),
            message: "must be positive".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for audio.batch_size: must be positive"
        );
    }

    #[test]
    fn test_missing_credential_names_variable() {
        let error = LexvoxError::MissingCredential {
            variable: "AZURE_SPEECH_KEY".to_string(),
        };
        assert!(error.to_string().contains("AZURE_SPEECH_KEY"));
    }

    #[test]
    fn test_synthesis_error_display() {
        let error = SynthesisError::new(Role::Word, 5, "male", "HTTP 429");
        assert_eq!(error.to_string(), "word 005 (male): HTTP 429");
    }

    #[test]
    fn test_synthesis_error_converts_transparently() {
        let error: LexvoxError = SynthesisError::new(Role::Example, 12, "female", "timeout").into();
        assert_eq!(error.to_string(), "example 012 (female): timeout");
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: LexvoxError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: LexvoxError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: LexvoxError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<LexvoxError>();
        assert_sync::<LexvoxError>();
        assert_send::<SynthesisError>();
    }
}
