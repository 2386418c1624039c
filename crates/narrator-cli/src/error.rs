//! CLI-specific error types and mappings.
//!
//! Maps library errors to exit codes and user-facing messages.

use narrator_core::{NarrationError, SettingsError, TtsError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument error not caught by clap.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error (settings, anchors, credentials).
    #[error("Configuration error: {0}")]
    Config(String),

    /// The audio device could not be opened.
    #[error("Audio error: {0}")]
    Audio(String),

    /// The narration session failed.
    #[error("{0}")]
    Narration(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Narration(_) => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Audio(_) => 69,    // EX_UNAVAILABLE
            Self::Io(_) => 74,       // EX_IOERR
            Self::Config(_) => 78,   // EX_CONFIG
        }
    }
}

impl From<NarrationError> for CliError {
    fn from(err: NarrationError) -> Self {
        match err {
            NarrationError::Settings(e) => e.into(),
            NarrationError::Io(e) => e.into(),
            other => Self::Narration(other.to_string()),
        }
    }
}

impl From<SettingsError> for CliError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Read { .. } => Self::Io(err.to_string()),
            other => Self::Config(other.to_string()),
        }
    }
}

impl From<TtsError> for CliError {
    fn from(err: TtsError) -> Self {
        match err {
            TtsError::Configuration(msg) => Self::Config(msg),
            other => Self::Narration(other.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
