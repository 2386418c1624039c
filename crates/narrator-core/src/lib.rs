//! Core of the narrator engine: script segmentation, caption timing and
//! scene direction.
//!
//! Everything here is synchronous and free of I/O apart from reading settings
//! and script files. The async runtime, audio and network adapters live in
//! `narrator-playback`.

#![deny(unused_crate_dependencies)]

pub mod director;
pub mod domain;
pub mod error;
pub mod events;
pub mod plan;
pub mod ports;
pub mod segmenter;
pub mod settings;
pub mod timing;

// Re-export commonly used types for convenience
pub use director::{BoundAnchor, DirectorAction, SceneDirector};
pub use domain::{
    Anchor, CaptionChunk, DurationSource, OffsetZone, Portrait, Scene, Script, SegmentPriority,
    SideEffect, SpeechSegment, TerminalAction, TimingWindow, ZoneSpan,
};
pub use error::NarrationError;
pub use events::{NarrationEvent, PlaybackState, SessionSummary};
pub use plan::{NarrationPlan, PlannedSegment};
pub use ports::{
    AmbientAudio, AudioClip, AudioFormat, NoopAmbient, TtsError, TtsProvider, TtsRequest,
    VoiceParams,
};
pub use segmenter::{split_for_display, split_for_speech, word_count};
pub use settings::{
    AmbientSettings, NarrationSettings, SchedulerSettings, SegmenterSettings, SettingsError,
    Substitution, TimingSettings, VoiceSettings, load_from_path, validate_settings,
};
pub use timing::{
    DEFAULT_WORDS_PER_MINUTE, TimingEstimator, assign_windows, fixed_windows, resolve_zones,
    warn_unmatched_zones,
};
