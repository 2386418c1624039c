//! Position sources read by the sync loop.
//!
//! The sync loop never touches a playback handle directly; it is given a
//! [`PositionSource`]. Switching captions from audio to a timer is therefore
//! a matter of handing it a [`WallClock`] instead of a [`MediaClock`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::audio_io::PlaybackHandle;

/// Elapsed playback time of the active segment.
pub trait PositionSource: Send {
    fn position(&self) -> Duration;
}

/// Position reported by the playing handle, falling back to wall-clock time
/// since playback started when the handle cannot tell.
pub struct MediaClock {
    handle: Arc<dyn PlaybackHandle>,
    started: Instant,
}

impl MediaClock {
    #[must_use]
    pub fn new(handle: Arc<dyn PlaybackHandle>) -> Self {
        Self {
            handle,
            started: Instant::now(),
        }
    }

    /// The handle's own duration, once known.
    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.handle.duration()
    }
}

impl PositionSource for MediaClock {
    fn position(&self) -> Duration {
        self.handle
            .position()
            .unwrap_or_else(|| self.started.elapsed())
    }
}

/// Time elapsed since the segment started.
#[derive(Debug, Clone, Copy)]
pub struct WallClock {
    started: Instant,
}

impl WallClock {
    #[must_use]
    pub fn start() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl PositionSource for WallClock {
    fn position(&self) -> Duration {
        self.started.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use narrator_core::{AudioClip, AudioFormat};

    use super::*;
    use crate::audio_io::AudioOutput;
    use crate::output::SimulatedOutput;

    fn clip() -> AudioClip {
        AudioClip::new(Vec::new(), AudioFormat::Wav).with_duration(Duration::from_secs(10))
    }

    #[tokio::test(start_paused = true)]
    async fn media_clock_uses_handle_position() {
        let handle = SimulatedOutput::new().play(&clip()).unwrap();
        let clock = MediaClock::new(handle);
        tokio::time::advance(Duration::from_millis(1500)).await;
        assert_eq!(clock.position(), Duration::from_millis(1500));
        assert_eq!(clock.duration(), Some(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn media_clock_falls_back_to_wall_time() {
        let handle = SimulatedOutput::new().without_position().play(&clip()).unwrap();
        let clock = MediaClock::new(handle);
        tokio::time::advance(Duration::from_millis(700)).await;
        assert_eq!(clock.position(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn wall_clock_counts_from_start() {
        let clock = WallClock::start();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(clock.position(), Duration::from_secs(4));
    }
}
