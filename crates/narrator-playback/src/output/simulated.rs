//! Clock-driven headless output.
//!
//! Nothing is rendered: a clip "plays" for its duration on the tokio clock,
//! so paused-time tests run a whole session instantly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::AudioClip;
use tokio::sync::watch;
use tokio::time::Instant;

use crate::audio_io::{AudioOutput, OutputError, PlaybackHandle};
use crate::duration::clip_duration;

/// Headless [`AudioOutput`].
#[derive(Debug, Default)]
pub struct SimulatedOutput {
    reject_remaining: AtomicUsize,
    hide_position: bool,
}

impl SimulatedOutput {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `count` play requests.
    #[must_use]
    pub fn rejecting_first(self, count: usize) -> Self {
        self.reject_remaining.store(count, Ordering::SeqCst);
        self
    }

    /// Handles report no position, like devices that cannot tell.
    #[must_use]
    pub const fn without_position(mut self) -> Self {
        self.hide_position = true;
        self
    }
}

impl AudioOutput for SimulatedOutput {
    fn play(&self, clip: &AudioClip) -> Result<Arc<dyn PlaybackHandle>, OutputError> {
        let rejected = self
            .reject_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if rejected {
            return Err(OutputError::Rejected("simulated rejection".to_string()));
        }

        let duration = clip_duration(clip)
            .ok_or_else(|| OutputError::Rejected("clip duration unknown".to_string()))?;
        tracing::trace!(duration_ms = duration.as_millis(), "simulated playback started");

        let (stopped, _) = watch::channel(false);
        Ok(Arc::new(SimulatedHandle {
            started: Instant::now(),
            duration,
            stopped,
            hide_position: self.hide_position,
        }))
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

struct SimulatedHandle {
    started: Instant,
    duration: Duration,
    stopped: watch::Sender<bool>,
    hide_position: bool,
}

#[async_trait]
impl PlaybackHandle for SimulatedHandle {
    fn position(&self) -> Option<Duration> {
        (!self.hide_position).then(|| self.started.elapsed().min(self.duration))
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.duration)
    }

    fn is_finished(&self) -> bool {
        *self.stopped.borrow() || self.started.elapsed() >= self.duration
    }

    async fn wait_finished(&self) {
        let mut stopped = self.stopped.subscribe();
        tokio::select! {
            () = tokio::time::sleep_until(self.started + self.duration) => {}
            _ = stopped.wait_for(|s| *s) => {}
        }
    }

    fn stop(&self) {
        self.stopped.send_replace(true);
    }
}
