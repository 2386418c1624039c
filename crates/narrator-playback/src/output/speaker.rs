//! Default output device via `rodio`.
//!
//! `rodio::OutputStream` is `!Send` on some platforms, so it lives on a
//! dedicated OS thread for the lifetime of the output. Only the `Send + Sync`
//! `OutputStreamHandle` crosses into the runtime; sinks are created from it.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::AudioClip;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use crate::audio_io::{AudioOutput, OutputError, PlaybackHandle};
use crate::duration::clip_duration;

/// Plays clips on the default output device.
pub struct SpeakerOutput {
    stream_handle: OutputStreamHandle,
    shutdown: mpsc::Sender<()>,
}

impl SpeakerOutput {
    /// Open the default output device.
    pub fn open() -> Result<Self, OutputError> {
        let (ready_tx, ready_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("narrator-audio".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((_stream, handle)) => {
                    if ready_tx.send(Ok(handle)).is_ok() {
                        // Keep the stream alive until the output is dropped.
                        let _ = shutdown_rx.recv();
                    }
                    tracing::debug!("audio thread exiting");
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(OutputError::Device(e.to_string())));
                }
            })
            .map_err(|e| OutputError::Device(format!("failed to spawn audio thread: {e}")))?;

        let stream_handle = ready_rx
            .recv()
            .map_err(|_| OutputError::Device("audio thread exited during startup".to_string()))??;

        tracing::info!("Audio playback initialized on default output device");
        Ok(Self {
            stream_handle,
            shutdown: shutdown_tx,
        })
    }
}

impl Drop for SpeakerOutput {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

impl AudioOutput for SpeakerOutput {
    fn play(&self, clip: &AudioClip) -> Result<Arc<dyn PlaybackHandle>, OutputError> {
        let decoder = Decoder::new(Cursor::new(clip.bytes.clone()))
            .map_err(|e| OutputError::Rejected(format!("undecodable audio: {e}")))?;
        let duration = clip_duration(clip).or_else(|| decoder.total_duration());

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| OutputError::Rejected(e.to_string()))?;
        sink.append(decoder);

        tracing::debug!(duration_ms = duration.map(|d| d.as_millis()), "speaker playback started");
        Ok(Arc::new(SpeakerHandle {
            sink: Arc::new(sink),
            duration,
            stopped: AtomicBool::new(false),
        }))
    }

    fn name(&self) -> &'static str {
        "speaker"
    }
}

struct SpeakerHandle {
    sink: Arc<Sink>,
    duration: Option<Duration>,
    stopped: AtomicBool,
}

#[async_trait]
impl PlaybackHandle for SpeakerHandle {
    fn position(&self) -> Option<Duration> {
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.duration
    }

    fn is_finished(&self) -> bool {
        self.stopped.load(Ordering::SeqCst) || self.sink.empty()
    }

    async fn wait_finished(&self) {
        if self.is_finished() {
            return;
        }
        // `sleep_until_end` returns on drain and on `stop()`.
        let sink = Arc::clone(&self.sink);
        if let Err(e) = tokio::task::spawn_blocking(move || sink.sleep_until_end()).await {
            tracing::warn!(error = %e, "playback watcher failed");
        }
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.sink.stop();
            tracing::debug!("Audio playback stopped");
        }
    }
}
