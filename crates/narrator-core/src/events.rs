//! Events emitted by a narration session to its UI collaborator.
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "caption_changed", "segment": 0, "chunk": 1, "global_chunk": 1, "text": "..." }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{DurationSource, Scene};

/// Playback state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Idle,
    Fetching,
    Playing,
    Retrying,
    Degraded,
    Done,
}

impl PlaybackState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Playing => "playing",
            Self::Retrying => "retrying",
            Self::Degraded => "degraded",
            Self::Done => "done",
        }
    }
}

/// Outcome of a finished (or torn down) session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Segments that started playing (audio or timer-driven).
    pub played: usize,
    /// Segments given up on after exhausting their attempts.
    pub skipped: usize,
    /// Fetch and play attempts across the whole session.
    pub attempts: u32,
    /// Whether captions fell back to a timer.
    pub degraded: bool,
    /// Anchors that fired.
    pub anchors_fired: usize,
    /// Whether the terminal hand-off was emitted.
    pub handed_off: bool,
}

/// Everything the UI needs to follow a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NarrationEvent {
    /// The scheduler moved to a new state.
    StateChanged { state: PlaybackState },

    /// A segment became the active one.
    SegmentStarted {
        segment: usize,
        duration_secs: f64,
        source: DurationSource,
        chunks: usize,
    },

    /// A different caption chunk is now active.
    CaptionChanged {
        segment: usize,
        chunk: usize,
        global_chunk: usize,
        text: String,
    },

    /// The visual scene changed.
    SceneChanged {
        scene: Scene,
        replay_key: u64,
        /// Segment advancement waits for `animation_complete`.
        hold: bool,
    },

    /// A segment was given up on.
    SegmentSkipped {
        segment: usize,
        attempts: u32,
        reason: String,
    },

    /// A failed fetch or play will be retried after `delay_ms`.
    Retrying {
        segment: usize,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },

    /// Captions now advance on a timer, audio is no longer fetched.
    DegradedMode { failures: u32 },

    /// An anchor's text does not occur in the script.
    AnchorMissing { anchor: String },

    /// Narration reached its end and hands off to the next collaborator.
    Handoff { scene: Scene },

    /// The session is over.
    Completed { summary: SessionSummary },
}

impl NarrationEvent {
    /// Short event name for line-oriented output.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state",
            Self::SegmentStarted { .. } => "segment:started",
            Self::CaptionChanged { .. } => "caption",
            Self::SceneChanged { .. } => "scene",
            Self::SegmentSkipped { .. } => "segment:skipped",
            Self::Retrying { .. } => "retrying",
            Self::DegradedMode { .. } => "degraded",
            Self::AnchorMissing { .. } => "anchor:missing",
            Self::Handoff { .. } => "handoff",
            Self::Completed { .. } => "completed",
        }
    }
}
