//! Narration playback: TTS fetch queue, caption sync and audio outputs.
//!
//! [`NarrationSession`] is the entry point. It splits a script with
//! `narrator-core`, fetches speech through a [`TtsProvider`](narrator_core::TtsProvider),
//! plays it on an [`AudioOutput`] and reports captions and scene changes as
//! [`NarrationEvent`](narrator_core::NarrationEvent)s.
//!
//! # Features
//!
//! - `speaker`: [`SpeakerOutput`](output::SpeakerOutput), playback on the
//!   default output device through `rodio`.

#![deny(unused_crate_dependencies)]

pub mod ambient;
pub mod audio_io;
pub mod backend;
pub mod clock;
pub mod duration;
pub mod output;
pub mod scheduler;
pub mod session;
pub mod sync;

pub use ambient::AmbientDucker;
pub use audio_io::{AudioOutput, OutputError, PlaybackHandle};
pub use backend::{HttpTtsConfig, HttpTtsProvider, ToneProvider};
pub use clock::{MediaClock, PositionSource, WallClock};
pub use output::SimulatedOutput;
#[cfg(feature = "speaker")]
pub use output::SpeakerOutput;
pub use scheduler::{PlaybackScheduler, SchedulerEvent, SchedulerStats, SegmentPlayback};
pub use session::{NarrationSession, SessionCommand, SessionHandle};
pub use sync::{SyncLoop, resolve_active};
