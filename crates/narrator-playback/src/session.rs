//! Narration session: one actor task driving scheduler, sync loop and
//! scene director.
//!
//! ```text
//!   UI ──commands──► SessionActor ──NarrationEvent──► UI
//!                       │   ▲
//!          enqueue/hold │   │ SchedulerEvent
//!                       ▼   │
//!                  PlaybackScheduler ──► TtsProvider / AudioOutput
//! ```
//!
//! Scheduler, sync loop and director are owned by the actor and only ever
//! touched from its `select!` loop, so none of them needs a lock.

use std::sync::Arc;

use narrator_core::{
    AmbientAudio, Anchor, DirectorAction, DurationSource, NarrationError, NarrationEvent,
    NarrationPlan, NarrationSettings, PlaybackState, SceneDirector, Script, SessionSummary,
    TerminalAction, TimingEstimator, TimingSettings, TtsProvider, VoiceParams, fixed_windows,
    resolve_zones, validate_settings, warn_unmatched_zones,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::ambient::AmbientDucker;
use crate::audio_io::{AudioOutput, PlaybackHandle};
use crate::clock::{MediaClock, PositionSource, WallClock};
use crate::scheduler::{PlaybackScheduler, SchedulerEvent, SegmentPlayback};
use crate::sync::SyncLoop;

// ── Public API ─────────────────────────────────────────────────────

/// Commands the UI sends to a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// A held scene animation finished.
    AnimationComplete,
    /// Tear the session down.
    Stop,
}

/// Everything needed to narrate one script.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), narrator_core::NarrationError> {
/// use std::sync::Arc;
/// use narrator_core::{NoopAmbient, Script, TimingEstimator};
/// use narrator_playback::{NarrationSession, SimulatedOutput, ToneProvider};
///
/// let (handle, mut events) = NarrationSession::new(Script::new("Bonjour."))
///     .start(
///         Arc::new(ToneProvider::new(TimingEstimator::default())),
///         Arc::new(SimulatedOutput::new()),
///         Arc::new(NoopAmbient),
///     )?;
/// while let Some(event) = events.recv().await {
///     println!("{}", event.event_name());
/// }
/// let _summary = handle.wait().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NarrationSession {
    script: Script,
    anchors: Vec<Anchor>,
    terminal: TerminalAction,
    settings: NarrationSettings,
}

impl NarrationSession {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            anchors: Vec::new(),
            terminal: TerminalAction::End,
            settings: NarrationSettings::default(),
        }
    }

    #[must_use]
    pub fn with_anchors(mut self, anchors: Vec<Anchor>) -> Self {
        self.anchors = anchors;
        self
    }

    #[must_use]
    pub const fn with_terminal(mut self, terminal: TerminalAction) -> Self {
        self.terminal = terminal;
        self
    }

    #[must_use]
    pub fn with_settings(mut self, settings: NarrationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Validate the settings, bind anchors and spawn the session task.
    ///
    /// Must be called from within a tokio runtime. Missing anchors are
    /// reported as [`NarrationEvent::AnchorMissing`] before anything plays.
    pub fn start(
        self,
        provider: Arc<dyn TtsProvider>,
        output: Arc<dyn AudioOutput>,
        ambient: Arc<dyn AmbientAudio>,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<NarrationEvent>), NarrationError> {
        validate_settings(&self.settings)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let plan = NarrationPlan::build(&self.script, &self.settings.segmenter);
        let (director, diagnostics) =
            SceneDirector::new(&self.script, &plan, self.anchors, self.terminal);
        for diagnostic in diagnostics {
            if let NarrationError::AnchorNotFound { anchor } = diagnostic {
                let _ = event_tx.send(NarrationEvent::AnchorMissing { anchor });
            }
        }
        warn_unmatched_zones(&self.settings.timing.offset_zones, self.script.text());

        let scheduler = PlaybackScheduler::new(
            provider,
            output,
            VoiceParams::from(&self.settings.voice),
            self.settings.scheduler.clone(),
            cancel.child_token(),
        );

        tracing::info!(
            segments = plan.segments().len(),
            chunks = plan.chunk_count(),
            anchors = director.bound_anchors().len(),
            "narration session starting"
        );

        let actor = SessionActor {
            plan,
            director,
            scheduler,
            estimator: TimingEstimator::new(self.settings.timing.words_per_minute),
            ducker: AmbientDucker::new(ambient, self.settings.ambient.ducked_volume),
            timing: self.settings.timing,
            active: None,
            handed_off: false,
            events: event_tx,
            commands: command_rx,
            commands_open: true,
            cancel: cancel.clone(),
        };
        let task = tokio::spawn(actor.run());

        Ok((
            SessionHandle {
                commands: command_tx,
                cancel,
                task,
            },
            event_rx,
        ))
    }
}

/// Control handle of a running session.
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<SessionCommand>,
    cancel: CancellationToken,
    task: JoinHandle<SessionSummary>,
}

impl SessionHandle {
    /// Ask the session to stop. Idempotent.
    pub fn stop(&self) {
        let _ = self.commands.send(SessionCommand::Stop);
    }

    /// Report that the held scene animation finished.
    pub fn animation_complete(&self) {
        let _ = self.commands.send(SessionCommand::AnimationComplete);
    }

    /// Token that tears the session down when cancelled.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the session to end.
    pub async fn wait(self) -> Result<SessionSummary, NarrationError> {
        self.task.await.map_err(|e| {
            tracing::error!(error = %e, "narration session task failed");
            NarrationError::SessionTornDown
        })
    }
}

// ── Actor ──────────────────────────────────────────────────────────

struct ActiveSync {
    segment: usize,
    sync: SyncLoop,
    source: DurationSource,
    handle: Option<Arc<dyn PlaybackHandle>>,
}

enum Step {
    Cancelled,
    Command(Option<SessionCommand>),
    Scheduler(SchedulerEvent),
    Tick,
}

struct SessionActor {
    plan: NarrationPlan,
    director: SceneDirector,
    scheduler: PlaybackScheduler,
    estimator: TimingEstimator,
    ducker: AmbientDucker,
    timing: TimingSettings,
    active: Option<ActiveSync>,
    handed_off: bool,
    events: mpsc::UnboundedSender<NarrationEvent>,
    commands: mpsc::UnboundedReceiver<SessionCommand>,
    commands_open: bool,
    cancel: CancellationToken,
}

impl SessionActor {
    async fn run(mut self) -> SessionSummary {
        self.ducker.duck();
        if self.plan.is_empty() {
            tracing::info!("nothing to narrate");
            self.emit(NarrationEvent::StateChanged {
                state: PlaybackState::Done,
            });
            return self.complete();
        }
        for planned in self.plan.segments() {
            self.scheduler
                .enqueue(planned.segment.clone(), planned.chunks.len());
        }

        let mut ticker = tokio::time::interval(self.timing.tick());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let step = tokio::select! {
                biased;
                () = self.cancel.cancelled() => Step::Cancelled,
                command = self.commands.recv(), if self.commands_open => Step::Command(command),
                Some(event) = self.scheduler.next_event(), if self.scheduler.has_work() => {
                    Step::Scheduler(event)
                }
                _ = ticker.tick(), if self.active.is_some() => Step::Tick,
            };

            match step {
                Step::Cancelled => return self.shutdown(),
                Step::Command(None) => {
                    tracing::debug!("session handle dropped, commands closed");
                    self.commands_open = false;
                }
                Step::Command(Some(SessionCommand::Stop)) => return self.shutdown(),
                Step::Command(Some(SessionCommand::AnimationComplete)) => {
                    if self.director.animation_complete() {
                        self.scheduler.release_hold();
                    } else {
                        tracing::debug!("animation complete without an active hold");
                    }
                }
                Step::Scheduler(event) => {
                    if self.on_scheduler_event(event) {
                        return self.complete();
                    }
                }
                Step::Tick => self.on_tick(),
            }
        }
    }

    /// Returns `true` once the scheduler is done.
    fn on_scheduler_event(&mut self, event: SchedulerEvent) -> bool {
        match event {
            SchedulerEvent::StateChanged(state) => {
                self.emit(NarrationEvent::StateChanged { state });
                return state == PlaybackState::Done;
            }
            SchedulerEvent::SegmentStarted { segment, playback } => {
                self.on_segment_started(segment, playback);
            }
            SchedulerEvent::SegmentFinished { segment } => self.on_segment_finished(segment),
            SchedulerEvent::Retrying {
                segment,
                attempt,
                delay,
                error,
            } => self.emit(NarrationEvent::Retrying {
                segment,
                attempt,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason: error.to_string(),
            }),
            SchedulerEvent::SegmentSkipped {
                segment,
                attempts,
                error,
            } => self.emit(NarrationEvent::SegmentSkipped {
                segment,
                attempts,
                reason: error.to_string(),
            }),
            SchedulerEvent::DegradedMode { failures } => {
                self.emit(NarrationEvent::DegradedMode { failures });
            }
        }
        false
    }

    fn on_segment_started(&mut self, segment: usize, playback: SegmentPlayback) {
        let Some(planned) = self.plan.segment(segment) else {
            tracing::warn!(segment, "started segment is not in the plan");
            return;
        };
        let chunks = planned.chunks.len();

        let (windows, duration_secs, source, position, handle) = match playback {
            SegmentPlayback::Audio { handle, duration } => {
                let (secs, source) = self.estimator.effective_duration(
                    duration.map(|d| d.as_secs_f64()),
                    planned.segment.speakable(),
                );
                if source == DurationSource::Estimated {
                    tracing::debug!(
                        error = %NarrationError::DurationUnknown { segment },
                        estimate = secs,
                        "estimating caption windows"
                    );
                }
                let zones = resolve_zones(&planned.segment.text, &self.timing.offset_zones);
                let windows = self.estimator.assign_windows(&planned.chunks, secs, &zones);
                let clock: Box<dyn PositionSource> = Box::new(MediaClock::new(Arc::clone(&handle)));
                (windows, secs, source, clock, Some(handle))
            }
            SegmentPlayback::Timer { interval } => {
                let interval = interval.as_secs_f64();
                let clock: Box<dyn PositionSource> = Box::new(WallClock::start());
                (
                    fixed_windows(chunks, interval),
                    interval * chunks as f64,
                    DurationSource::FixedInterval,
                    clock,
                    None,
                )
            }
        };

        tracing::info!(segment, duration_secs, ?source, chunks, "segment started");
        self.emit(NarrationEvent::SegmentStarted {
            segment,
            duration_secs,
            source,
            chunks,
        });
        self.active = Some(ActiveSync {
            segment,
            sync: SyncLoop::new(windows, position, self.timing.lookahead()),
            source,
            handle,
        });
        self.poll_captions();
    }

    fn on_segment_finished(&mut self, segment: usize) {
        let Some(mut active) = self.active.take() else {
            return;
        };
        if active.segment != segment {
            self.active = Some(active);
            return;
        }
        for chunk in active.sync.finish() {
            self.on_caption(segment, chunk);
        }
    }

    fn on_tick(&mut self) {
        self.rebase_if_measured();
        self.poll_captions();
    }

    fn poll_captions(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let segment = active.segment;
        for chunk in active.sync.poll() {
            self.on_caption(segment, chunk);
        }
    }

    /// Swap estimated windows for measured ones once the output learns the
    /// real duration.
    fn rebase_if_measured(&mut self) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        if active.source != DurationSource::Estimated {
            return;
        }
        let Some(duration) = active.handle.as_ref().and_then(|h| h.duration()) else {
            return;
        };
        let Some(planned) = self.plan.segment(active.segment) else {
            return;
        };
        let (secs, source) = self
            .estimator
            .effective_duration(Some(duration.as_secs_f64()), planned.segment.speakable());
        if source != DurationSource::Measured {
            return;
        }

        let zones = resolve_zones(&planned.segment.text, &self.timing.offset_zones);
        let windows = self.estimator.assign_windows(&planned.chunks, secs, &zones);
        active.source = source;
        tracing::info!(
            segment = active.segment,
            duration_secs = secs,
            "real duration known, caption windows rebased"
        );
        let segment = active.segment;
        for chunk in active.sync.rebase(windows) {
            self.on_caption(segment, chunk);
        }
    }

    fn on_caption(&mut self, segment: usize, chunk: usize) {
        let Some(planned) = self.plan.segment(segment) else {
            return;
        };
        let Some(text) = planned.chunks.get(chunk).map(|c| c.text.clone()) else {
            return;
        };
        let global_chunk = planned.global(chunk);
        tracing::debug!(segment, chunk, global_chunk, "caption changed");
        self.emit(NarrationEvent::CaptionChanged {
            segment,
            chunk,
            global_chunk,
            text,
        });

        let actions = self.director.on_caption_changed(global_chunk);
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<DirectorAction>) {
        for action in actions {
            match action {
                DirectorAction::ChangeScene {
                    scene,
                    replay_key,
                    hold,
                } => {
                    self.emit(NarrationEvent::SceneChanged {
                        scene,
                        replay_key,
                        hold,
                    });
                    if hold {
                        self.scheduler.hold();
                    }
                }
                DirectorAction::Handoff { scene } => {
                    tracing::info!(%scene, "narration handed off");
                    self.handed_off = true;
                    self.emit(NarrationEvent::Handoff { scene });
                }
                DirectorAction::End => tracing::debug!("narration reached its end"),
            }
        }
    }

    fn complete(mut self) -> SessionSummary {
        self.active = None;
        let actions = self.director.on_completed();
        self.apply(actions);
        self.ducker.restore();
        self.finish()
    }

    fn shutdown(mut self) -> SessionSummary {
        tracing::info!("narration session stopped");
        self.scheduler.teardown();
        self.active = None;
        self.ducker.restore();
        self.emit(NarrationEvent::StateChanged {
            state: PlaybackState::Done,
        });
        self.finish()
    }

    fn finish(self) -> SessionSummary {
        let stats = self.scheduler.stats();
        let summary = SessionSummary {
            played: stats.played,
            skipped: stats.skipped,
            attempts: stats.attempts,
            degraded: stats.degraded,
            anchors_fired: self.director.fired_count(),
            handed_off: self.handed_off,
        };
        tracing::info!(
            played = summary.played,
            skipped = summary.skipped,
            attempts = summary.attempts,
            degraded = summary.degraded,
            "narration session finished"
        );
        self.emit(NarrationEvent::Completed {
            summary: summary.clone(),
        });
        summary
    }

    fn emit(&self, event: NarrationEvent) {
        if self.events.send(event).is_err() {
            tracing::trace!("event receiver dropped");
        }
    }
}
