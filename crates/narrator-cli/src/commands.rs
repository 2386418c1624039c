//! Subcommands.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

/// Which splitter `split` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SplitMode {
    /// TTS-sized segments
    Speech,
    /// Caption-sized chunks
    Display,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split a script and print each unit with its byte span
    Split {
        /// Script file
        script: PathBuf,
        /// Split into TTS segments or display chunks
        #[arg(long, value_enum, default_value_t = SplitMode::Display)]
        mode: SplitMode,
        /// Character budget (defaults to the configured one for the mode)
        #[arg(long)]
        max_chars: Option<usize>,
        /// Phrase that must never be split (repeatable)
        #[arg(long = "protect", value_name = "PHRASE")]
        protect: Vec<String>,
    },

    /// Print the caption windows of every segment
    Windows {
        /// Script file
        script: PathBuf,
        /// Total narration length in seconds; estimated from the word count
        /// when omitted
        #[arg(long, value_name = "SECS")]
        duration: Option<f64>,
    },

    /// Narrate a script and print its events
    Play {
        /// Script file
        script: PathBuf,
        /// Anchors file (JSON array of {"match", "scene", "effects"})
        #[arg(long, value_name = "FILE")]
        anchors: Option<PathBuf>,
        /// Generate tones locally instead of calling the speech service
        #[arg(long)]
        offline: bool,
        /// Play through the default output device
        #[arg(long)]
        speaker: bool,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
        /// Hand off to the lead-capture scene when narration ends
        #[arg(long)]
        handoff: bool,
    },
}
