//! Narration settings and validation.
//!
//! Every group derives `Default` and is marked `#[serde(default)]`, so a
//! settings file only needs to name the values it changes.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::OffsetZone;

/// Default character budget of a speech segment.
pub const DEFAULT_SPEECH_MAX_CHARS: usize = 400;

/// Default character budget of a caption chunk.
pub const DEFAULT_DISPLAY_MAX_CHARS: usize = 110;

/// Upper bound for the pause between two segments.
pub const MAX_ADVANCE_GAP_MS: u64 = 100;

/// All tunables of a narration session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NarrationSettings {
    pub segmenter: SegmenterSettings,
    pub timing: TimingSettings,
    pub scheduler: SchedulerSettings,
    pub ambient: AmbientSettings,
    pub voice: VoiceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterSettings {
    /// Character budget per TTS request.
    pub speech_max_chars: usize,

    /// Character budget per on-screen caption.
    pub display_max_chars: usize,

    /// Phrases that must never be cut across two units.
    pub protected_phrases: Vec<String>,
}

impl Default for SegmenterSettings {
    fn default() -> Self {
        Self {
            speech_max_chars: DEFAULT_SPEECH_MAX_CHARS,
            display_max_chars: DEFAULT_DISPLAY_MAX_CHARS,
            protected_phrases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingSettings {
    /// Speaking rate used when the audio duration is unknown.
    pub words_per_minute: f64,

    /// Forward bias applied to the position before caption lookup.
    pub lookahead_ms: u64,

    /// Sync loop polling period.
    pub tick_ms: u64,

    /// Optional per-passage caption offsets. Empty by default.
    pub offset_zones: Vec<OffsetZone>,
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            words_per_minute: crate::timing::DEFAULT_WORDS_PER_MINUTE,
            lookahead_ms: 300,
            tick_ms: 30,
            offset_zones: Vec::new(),
        }
    }
}

impl TimingSettings {
    #[must_use]
    pub const fn lookahead(&self) -> Duration {
        Duration::from_millis(self.lookahead_ms)
    }

    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    /// Attempts per segment, the first one included.
    pub max_attempts: u32,

    /// Base of the exponential retry backoff.
    pub retry_backoff_ms: u64,

    /// Pause between the end of one segment and the start of the next.
    pub advance_gap_ms: u64,

    /// Segments fetched ahead of the one playing.
    pub prefetch_depth: usize,

    /// Session-wide failures that switch captions to a timer.
    pub degraded_failure_threshold: u32,

    /// Per-chunk caption interval once degraded.
    pub degraded_interval_ms: u64,

    /// Longest wait for the UI to report a held animation as done.
    pub animation_hold_timeout_ms: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff_ms: 300,
            advance_gap_ms: 50,
            prefetch_depth: 2,
            degraded_failure_threshold: 5,
            degraded_interval_ms: 4000,
            animation_hold_timeout_ms: 8000,
        }
    }
}

impl SchedulerSettings {
    /// Delay before attempt number `attempt` (1-based) is retried.
    ///
    /// Doubles from the base: 300 ms, 600 ms, 1.2 s, ...
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(factor))
    }

    #[must_use]
    pub const fn advance_gap(&self) -> Duration {
        Duration::from_millis(self.advance_gap_ms)
    }

    #[must_use]
    pub const fn degraded_interval(&self) -> Duration {
        Duration::from_millis(self.degraded_interval_ms)
    }

    #[must_use]
    pub const fn animation_hold_timeout(&self) -> Duration {
        Duration::from_millis(self.animation_hold_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmbientSettings {
    /// Background volume while narration plays, in `[0, 1]`.
    pub ducked_volume: f32,
}

impl Default for AmbientSettings {
    fn default() -> Self {
        Self { ducked_volume: 0.4 }
    }
}

/// Literal text replacement applied before synthesis, for words the voice
/// mispronounces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// Provider voice name.
    pub name: String,

    /// BCP-47 language tag.
    pub language: String,

    /// Pronunciation fixes, applied in order.
    pub substitutions: Vec<Substitution>,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            name: "fr-FR-VivienneNeural".to_string(),
            language: "fr-FR".to_string(),
            substitutions: Vec::new(),
        }
    }
}

/// Settings validation error.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SettingsError {
    #[error("{field} must be at least 1, got 0")]
    ZeroCharBudget { field: &'static str },

    #[error("Words per minute must be a positive number, got {0}")]
    InvalidWordsPerMinute(f64),

    #[error("Sync tick must be between 1 and 1000 ms, got {0}")]
    InvalidTick(u64),

    #[error("Max attempts must be at least 1, got {0}")]
    InvalidMaxAttempts(u32),

    #[error("Advance gap must be at most 100 ms, got {0}")]
    AdvanceGapTooLong(u64),

    #[error("Degraded failure threshold must be at least 1")]
    ZeroFailureThreshold,

    #[error("Degraded interval must be greater than 0 ms")]
    ZeroDegradedInterval,

    #[error("Ducked volume must be between 0 and 1, got {0}")]
    InvalidDuckedVolume(f32),

    #[error("Voice name cannot be empty")]
    EmptyVoiceName,

    #[error("Offset zone '{0}' needs a non-empty text and a finite offset")]
    InvalidOffsetZone(String),

    #[error("Failed to read settings file {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid settings file {path}: {message}")]
    Parse { path: String, message: String },
}

/// Validate settings values.
pub fn validate_settings(settings: &NarrationSettings) -> Result<(), SettingsError> {
    let segmenter = &settings.segmenter;
    if segmenter.speech_max_chars == 0 {
        return Err(SettingsError::ZeroCharBudget {
            field: "speech_max_chars",
        });
    }
    if segmenter.display_max_chars == 0 {
        return Err(SettingsError::ZeroCharBudget {
            field: "display_max_chars",
        });
    }

    let timing = &settings.timing;
    if !(timing.words_per_minute.is_finite() && timing.words_per_minute > 0.0) {
        return Err(SettingsError::InvalidWordsPerMinute(timing.words_per_minute));
    }
    if !(1..=1000).contains(&timing.tick_ms) {
        return Err(SettingsError::InvalidTick(timing.tick_ms));
    }
    if let Some(zone) = timing
        .offset_zones
        .iter()
        .find(|z| z.text.trim().is_empty() || !z.offset_secs.is_finite())
    {
        return Err(SettingsError::InvalidOffsetZone(zone.name.clone()));
    }

    let scheduler = &settings.scheduler;
    if scheduler.max_attempts == 0 {
        return Err(SettingsError::InvalidMaxAttempts(scheduler.max_attempts));
    }
    if scheduler.advance_gap_ms > MAX_ADVANCE_GAP_MS {
        return Err(SettingsError::AdvanceGapTooLong(scheduler.advance_gap_ms));
    }
    if scheduler.degraded_failure_threshold == 0 {
        return Err(SettingsError::ZeroFailureThreshold);
    }
    if scheduler.degraded_interval_ms == 0 {
        return Err(SettingsError::ZeroDegradedInterval);
    }

    let volume = settings.ambient.ducked_volume;
    if !(0.0..=1.0).contains(&volume) {
        return Err(SettingsError::InvalidDuckedVolume(volume));
    }

    if settings.voice.name.trim().is_empty() {
        return Err(SettingsError::EmptyVoiceName);
    }

    Ok(())
}

/// Load and validate settings from a JSON file.
pub fn load_from_path(path: &Path) -> Result<NarrationSettings, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|e| SettingsError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let settings: NarrationSettings =
        serde_json::from_str(&raw).map_err(|e| SettingsError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    validate_settings(&settings)?;
    tracing::debug!(path = %path.display(), "loaded narration settings");
    Ok(settings)
}
