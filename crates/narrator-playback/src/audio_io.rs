//! `AudioOutput` and `PlaybackHandle` trait abstractions for narration audio.
//!
//! These traits decouple the scheduler from any concrete audio backend:
//!
//! | Implementor | Where used |
//! |---|---|
//! | [`SimulatedOutput`](crate::output::SimulatedOutput) | Headless runs and tests; a clock stands in for the device |
//! | `SpeakerOutput` | CLI with the `speaker` feature; rodio on the default device |
//!
//! Both traits are object-safe. Handles are shared as
//! `Arc<dyn PlaybackHandle>`: the scheduler owns the only writable
//! reference (it alone calls [`PlaybackHandle::stop`]), the sync loop only
//! reads the position.

use std::time::Duration;

use async_trait::async_trait;
use narrator_core::AudioClip;

/// Errors raised by an audio output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OutputError {
    /// The output device could not be opened.
    #[error("Failed to open audio output: {0}")]
    Device(String),

    /// The output refused to play the clip (undecodable, device busy, ...).
    #[error("Audio output rejected the clip: {0}")]
    Rejected(String),
}

/// One clip playing on an output.
#[async_trait]
pub trait PlaybackHandle: Send + Sync {
    /// Elapsed playback position, when the output can report it.
    fn position(&self) -> Option<Duration>;

    /// Total duration, when the output knows it.
    fn duration(&self) -> Option<Duration>;

    /// Whether playback ended, naturally or through [`stop`](Self::stop).
    fn is_finished(&self) -> bool;

    /// Resolve once playback has ended.
    async fn wait_finished(&self);

    /// Stop playback immediately. Idempotent.
    fn stop(&self);
}

/// Something that can play encoded audio clips.
pub trait AudioOutput: Send + Sync {
    /// Start playing `clip` and return its handle.
    fn play(&self, clip: &AudioClip) -> Result<std::sync::Arc<dyn PlaybackHandle>, OutputError>;

    /// Short output name for logs.
    fn name(&self) -> &'static str;
}
