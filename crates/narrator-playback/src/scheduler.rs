//! Playback scheduler: the TTS fetch queue and the play order.
//!
//! ```text
//!   Idle → Fetching → Playing ─(gap)→ Fetching/Playing → … → Done
//!             │           │
//!             └─Retrying◄─┘            failures ≥ threshold → Degraded
//! ```
//!
//! The scheduler never blocks. Fetches, retry delays, media ends and gap
//! timers run as tasks in one [`JoinSet`]; their results come back through
//! [`PlaybackScheduler::next_event`], which the session awaits inside its
//! `select!` loop. Every task is tagged with the scheduler generation, so a
//! result that lands after [`teardown`](PlaybackScheduler::teardown) is
//! dropped.
//!
//! Segments may be fetched out of order but always start in order: a segment
//! never becomes active before every earlier one has finished or been
//! skipped.

use std::collections::{HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use narrator_core::{
    AudioClip, NarrationError, PlaybackState, SchedulerSettings, SpeechSegment, TtsError,
    TtsProvider, TtsRequest, VoiceParams,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::audio_io::{AudioOutput, PlaybackHandle};
use crate::duration::clip_duration;

// ── Events ─────────────────────────────────────────────────────────

/// How a started segment advances its captions.
#[derive(Clone)]
pub enum SegmentPlayback {
    /// Audio is playing; captions follow its position.
    Audio {
        handle: Arc<dyn PlaybackHandle>,
        /// Clip duration, provider-reported or read from the audio.
        duration: Option<Duration>,
    },
    /// Degraded: no audio, captions advance every `interval`.
    Timer { interval: Duration },
}

impl std::fmt::Debug for SegmentPlayback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio { duration, .. } => f
                .debug_struct("Audio")
                .field("duration", duration)
                .finish_non_exhaustive(),
            Self::Timer { interval } => f.debug_struct("Timer").field("interval", interval).finish(),
        }
    }
}

/// What the scheduler reports back to the session.
///
/// Failures carry [`NarrationError::FetchFailure`] or
/// [`NarrationError::PlaybackRejected`].
#[derive(Debug)]
pub enum SchedulerEvent {
    StateChanged(PlaybackState),
    SegmentStarted {
        segment: usize,
        playback: SegmentPlayback,
    },
    /// The active segment ended (media end or timer).
    SegmentFinished { segment: usize },
    Retrying {
        segment: usize,
        attempt: u32,
        delay: Duration,
        error: NarrationError,
    },
    SegmentSkipped {
        segment: usize,
        attempts: u32,
        error: NarrationError,
    },
    DegradedMode { failures: u32 },
}

/// Counters kept across the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub played: usize,
    pub skipped: usize,
    pub attempts: u32,
    pub degraded: bool,
}

// ── Internal types ─────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct QueuedSegment {
    segment: SpeechSegment,
    chunks: usize,
}

impl QueuedSegment {
    const fn index(&self) -> usize {
        self.segment.index
    }
}

enum Activity {
    Audio(Arc<dyn PlaybackHandle>),
    Timer,
    /// The output rejected the clip; a replay is scheduled.
    AwaitingReplay,
}

struct ActivePlayback {
    queued: QueuedSegment,
    activity: Activity,
}

enum TaskKind {
    Fetched {
        segment: usize,
        result: Result<AudioClip, TtsError>,
    },
    RetryFetch {
        segment: usize,
    },
    RetryPlay {
        segment: usize,
        clip: AudioClip,
    },
    MediaEnded {
        segment: usize,
    },
    TimerEnded {
        segment: usize,
    },
    GapElapsed,
    HoldExpired {
        epoch: u64,
    },
}

struct TaskOutput {
    generation: u64,
    /// `None` when the task was cancelled.
    kind: Option<TaskKind>,
}

enum Retry {
    Fetch,
    Play(AudioClip),
}

// ── Scheduler ──────────────────────────────────────────────────────

/// Owns the fetch queue, the active playback handle and every timer.
pub struct PlaybackScheduler {
    provider: Arc<dyn TtsProvider>,
    output: Arc<dyn AudioOutput>,
    voice: VoiceParams,
    settings: SchedulerSettings,

    cancel: CancellationToken,
    tasks: JoinSet<TaskOutput>,
    outbox: VecDeque<SchedulerEvent>,
    generation: u64,

    queue: VecDeque<QueuedSegment>,
    fetching: HashSet<usize>,
    retrying: HashSet<usize>,
    ready: HashMap<usize, AudioClip>,
    failed: HashMap<usize, NarrationError>,
    attempts: HashMap<usize, u32>,
    active: Option<ActivePlayback>,

    state: PlaybackState,
    failures: u32,
    gap_pending: bool,
    held: bool,
    hold_epoch: u64,
    torn_down: bool,
    stats: SchedulerStats,
}

impl PlaybackScheduler {
    /// Create a scheduler. Tasks are spawned on the current tokio runtime.
    pub fn new(
        provider: Arc<dyn TtsProvider>,
        output: Arc<dyn AudioOutput>,
        voice: VoiceParams,
        settings: SchedulerSettings,
        cancel: CancellationToken,
    ) -> Self {
        tracing::debug!(
            provider = provider.name(),
            output = output.name(),
            prefetch_depth = settings.prefetch_depth,
            "playback scheduler created"
        );
        Self {
            provider,
            output,
            voice,
            settings,
            cancel,
            tasks: JoinSet::new(),
            outbox: VecDeque::new(),
            generation: 0,
            queue: VecDeque::new(),
            fetching: HashSet::new(),
            retrying: HashSet::new(),
            ready: HashMap::new(),
            failed: HashMap::new(),
            attempts: HashMap::new(),
            active: None,
            state: PlaybackState::Idle,
            failures: 0,
            gap_pending: false,
            held: false,
            hold_epoch: 0,
            torn_down: false,
            stats: SchedulerStats::default(),
        }
    }

    #[must_use]
    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    #[must_use]
    pub const fn stats(&self) -> SchedulerStats {
        self.stats
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the scheduler has an event to deliver or a task running.
    #[must_use]
    pub fn has_work(&self) -> bool {
        !self.outbox.is_empty() || !self.tasks.is_empty()
    }

    /// Handle of the segment currently playing audio.
    #[must_use]
    pub fn active_handle(&self) -> Option<Arc<dyn PlaybackHandle>> {
        match &self.active {
            Some(ActivePlayback {
                activity: Activity::Audio(handle),
                ..
            }) => Some(Arc::clone(handle)),
            _ => None,
        }
    }

    /// Append a segment to the play queue. `chunks` is its caption count,
    /// used for timer-driven playback once degraded.
    pub fn enqueue(&mut self, segment: SpeechSegment, chunks: usize) {
        if self.torn_down {
            tracing::warn!(segment = segment.index, "enqueue after teardown ignored");
            return;
        }
        tracing::debug!(segment = segment.index, chunks, "segment enqueued");
        self.queue.push_back(QueuedSegment { segment, chunks });
        if self.state == PlaybackState::Done {
            self.set_state(PlaybackState::Idle);
        }
        self.pump();
    }

    /// Keep the next segment from starting until [`release_hold`] or the
    /// configured hold timeout.
    ///
    /// [`release_hold`]: Self::release_hold
    pub fn hold(&mut self) {
        if self.torn_down {
            return;
        }
        self.held = true;
        self.hold_epoch += 1;
        let epoch = self.hold_epoch;
        let timeout = self.settings.animation_hold_timeout();
        tracing::debug!(timeout_ms = timeout.as_millis(), "segment advancement held");
        self.spawn_task(async move {
            tokio::time::sleep(timeout).await;
            TaskKind::HoldExpired { epoch }
        });
    }

    pub fn release_hold(&mut self) {
        if std::mem::replace(&mut self.held, false) {
            tracing::debug!("segment advancement released");
            self.play_next();
        }
    }

    /// Wait for the next scheduler event.
    ///
    /// Returns `None` once there is nothing left to wait for. Cancel-safe:
    /// dropping the future loses nothing.
    pub async fn next_event(&mut self) -> Option<SchedulerEvent> {
        loop {
            if let Some(event) = self.outbox.pop_front() {
                return Some(event);
            }
            match self.tasks.join_next().await? {
                Ok(output) => self.on_task_output(output),
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::error!(error = %e, "scheduler task failed"),
            }
        }
    }

    /// Cancel every fetch and timer, stop the active handle and drop all
    /// queued work. Idempotent.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.cancel.cancel();
        self.tasks.abort_all();
        if let Some(active) = self.active.take() {
            if let Activity::Audio(handle) = active.activity {
                handle.stop();
            }
        }
        self.queue.clear();
        self.fetching.clear();
        self.retrying.clear();
        self.ready.clear();
        self.failed.clear();
        self.outbox.clear();
        self.gap_pending = false;
        self.held = false;
        self.generation += 1;
        self.state = PlaybackState::Done;
        tracing::debug!(generation = self.generation, "playback scheduler torn down");
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            tracing::debug!(from = self.state.as_str(), to = state.as_str(), "scheduler state");
            self.state = state;
            self.outbox.push_back(SchedulerEvent::StateChanged(state));
        }
    }

    fn spawn_task<F>(&mut self, task: F)
    where
        F: Future<Output = TaskKind> + Send + 'static,
    {
        let cancel = self.cancel.clone();
        let generation = self.generation;
        self.tasks.spawn(async move {
            let kind = tokio::select! {
                biased;
                () = cancel.cancelled() => None,
                kind = task => Some(kind),
            };
            TaskOutput { generation, kind }
        });
    }

    fn record_attempt(&mut self, segment: usize) -> u32 {
        self.stats.attempts += 1;
        let attempts = self.attempts.entry(segment).or_default();
        *attempts += 1;
        *attempts
    }

    fn attempts_of(&self, segment: usize) -> u32 {
        self.attempts.get(&segment).copied().unwrap_or(0)
    }

    /// Top up prefetches, then try to start the head of the queue.
    fn pump(&mut self) {
        if !self.stats.degraded {
            let window = (1 + self.settings.prefetch_depth)
                .saturating_sub(usize::from(self.active.is_some()));
            let wanted: Vec<SpeechSegment> = self
                .queue
                .iter()
                .take(window)
                .filter(|q| {
                    let i = q.index();
                    !self.fetching.contains(&i)
                        && !self.ready.contains_key(&i)
                        && !self.failed.contains_key(&i)
                })
                .map(|q| q.segment.clone())
                .collect();
            for segment in wanted {
                self.spawn_fetch(&segment);
            }
        }
        self.play_next();
    }

    fn spawn_fetch(&mut self, segment: &SpeechSegment) {
        let attempt = self.record_attempt(segment.index);
        self.fetching.insert(segment.index);
        tracing::debug!(segment = segment.index, attempt, "fetching segment audio");

        let request = TtsRequest {
            text: segment.speakable().to_string(),
            voice: self.voice.clone(),
            priority: segment.priority,
            segment: segment.index,
        };
        let provider = Arc::clone(&self.provider);
        let index = segment.index;
        self.spawn_task(async move {
            TaskKind::Fetched {
                segment: index,
                result: provider.synthesize(request).await,
            }
        });
    }

    /// Start the head of the queue if nothing blocks it.
    fn play_next(&mut self) {
        if self.torn_down || self.active.is_some() || self.gap_pending || self.held {
            return;
        }

        loop {
            let Some(head) = self.queue.front() else {
                if self.stats.played + self.stats.skipped > 0 || self.state != PlaybackState::Idle {
                    tracing::info!(
                        played = self.stats.played,
                        skipped = self.stats.skipped,
                        "all segments done"
                    );
                    self.set_state(PlaybackState::Done);
                }
                return;
            };
            let index = head.index();

            if self.stats.degraded {
                if let Some(queued) = self.queue.pop_front() {
                    self.start_timer(queued);
                }
                return;
            }

            if let Some(error) = self.failed.remove(&index) {
                self.queue.pop_front();
                self.skip(index, error);
                continue;
            }

            if let Some(clip) = self.ready.remove(&index) {
                if let Some(queued) = self.queue.pop_front() {
                    self.play(queued, clip);
                    // More room for prefetch now that a segment is active.
                    self.pump();
                }
                return;
            }

            let waiting = if self.retrying.contains(&index) {
                PlaybackState::Retrying
            } else {
                PlaybackState::Fetching
            };
            self.set_state(waiting);
            return;
        }
    }

    fn play(&mut self, queued: QueuedSegment, clip: AudioClip) {
        let index = queued.index();
        match self.output.play(&clip) {
            Ok(handle) => {
                let duration = clip_duration(&clip).or_else(|| handle.duration());
                tracing::info!(
                    segment = index,
                    duration_ms = duration.map(|d| d.as_millis()),
                    "segment playing"
                );
                self.stats.played += 1;
                self.active = Some(ActivePlayback {
                    queued,
                    activity: Activity::Audio(Arc::clone(&handle)),
                });
                self.set_state(PlaybackState::Playing);
                self.outbox.push_back(SchedulerEvent::SegmentStarted {
                    segment: index,
                    playback: SegmentPlayback::Audio {
                        handle: Arc::clone(&handle),
                        duration,
                    },
                });
                self.spawn_task(async move {
                    handle.wait_finished().await;
                    TaskKind::MediaEnded { segment: index }
                });
            }
            Err(e) => {
                tracing::warn!(segment = index, error = %e, "playback rejected");
                self.active = Some(ActivePlayback {
                    queued,
                    activity: Activity::AwaitingReplay,
                });
                let error = NarrationError::PlaybackRejected {
                    segment: index,
                    message: e.to_string(),
                };
                self.on_failure(index, error, true, Retry::Play(clip));
            }
        }
    }

    fn start_timer(&mut self, queued: QueuedSegment) {
        let index = queued.index();
        let interval = self.settings.degraded_interval();
        let chunks = u32::try_from(queued.chunks.max(1)).unwrap_or(u32::MAX);
        let length = interval.saturating_mul(chunks);
        tracing::info!(segment = index, length_ms = length.as_millis(), "segment on timer");

        self.stats.played += 1;
        self.active = Some(ActivePlayback {
            queued,
            activity: Activity::Timer,
        });
        self.outbox.push_back(SchedulerEvent::SegmentStarted {
            segment: index,
            playback: SegmentPlayback::Timer { interval },
        });
        self.spawn_task(async move {
            tokio::time::sleep(length).await;
            TaskKind::TimerEnded { segment: index }
        });
    }

    fn skip(&mut self, segment: usize, error: NarrationError) {
        let attempts = self.attempts_of(segment);
        tracing::warn!(segment, attempts, error = %error, "segment skipped");
        self.stats.skipped += 1;
        self.outbox.push_back(SchedulerEvent::SegmentSkipped {
            segment,
            attempts,
            error,
        });
    }

    fn on_failure(&mut self, segment: usize, error: NarrationError, retryable: bool, retry: Retry) {
        self.failures += 1;
        if self.stats.degraded {
            return;
        }
        if self.failures >= self.settings.degraded_failure_threshold {
            self.enter_degraded();
            return;
        }

        let attempts = self.attempts_of(segment);
        if retryable && attempts < self.settings.max_attempts {
            let delay = self.settings.backoff(attempts);
            tracing::warn!(
                segment,
                attempt = attempts + 1,
                delay_ms = delay.as_millis(),
                error = %error,
                "retrying segment"
            );
            self.outbox.push_back(SchedulerEvent::Retrying {
                segment,
                attempt: attempts + 1,
                delay,
                error,
            });
            self.retrying.insert(segment);
            match retry {
                Retry::Fetch => {
                    if self.queue.front().map(QueuedSegment::index) == Some(segment)
                        && self.active.is_none()
                    {
                        self.set_state(PlaybackState::Retrying);
                    }
                    self.spawn_task(async move {
                        tokio::time::sleep(delay).await;
                        TaskKind::RetryFetch { segment }
                    });
                }
                Retry::Play(clip) => {
                    self.set_state(PlaybackState::Retrying);
                    self.spawn_task(async move {
                        tokio::time::sleep(delay).await;
                        TaskKind::RetryPlay { segment, clip }
                    });
                }
            }
            return;
        }

        self.retrying.remove(&segment);
        match retry {
            Retry::Fetch => {
                self.fetching.remove(&segment);
                self.failed.insert(segment, error);
                self.pump();
            }
            Retry::Play(_) => {
                self.active = None;
                self.skip(segment, error);
                self.pump();
            }
        }
    }

    fn enter_degraded(&mut self) {
        tracing::warn!(
            failures = self.failures,
            "failure threshold reached, captions switch to a timer"
        );
        self.stats.degraded = true;
        self.fetching.clear();
        self.retrying.clear();
        self.ready.clear();
        self.failed.clear();
        self.outbox.push_back(SchedulerEvent::DegradedMode {
            failures: self.failures,
        });
        self.set_state(PlaybackState::Degraded);

        // A rejected segment waiting for its replay runs on the timer instead.
        if matches!(
            self.active,
            Some(ActivePlayback {
                activity: Activity::AwaitingReplay,
                ..
            })
        ) {
            if let Some(active) = self.active.take() {
                self.start_timer(active.queued);
            }
            return;
        }
        self.play_next();
    }

    fn on_task_output(&mut self, output: TaskOutput) {
        if output.generation != self.generation || self.torn_down {
            tracing::trace!(generation = output.generation, "stale scheduler task result dropped");
            return;
        }
        let Some(kind) = output.kind else {
            return;
        };

        match kind {
            TaskKind::Fetched { segment, result } => self.on_fetched(segment, result),
            TaskKind::RetryFetch { segment } => {
                self.retrying.remove(&segment);
                if self.stats.degraded {
                    return;
                }
                let queued = self
                    .queue
                    .iter()
                    .find(|q| q.index() == segment)
                    .map(|q| q.segment.clone());
                if let Some(speech) = queued {
                    self.spawn_fetch(&speech);
                    if self.active.is_none()
                        && self.queue.front().map(QueuedSegment::index) == Some(speech.index)
                    {
                        self.set_state(PlaybackState::Fetching);
                    }
                }
            }
            TaskKind::RetryPlay { segment, clip } => {
                self.retrying.remove(&segment);
                let awaiting = matches!(
                    &self.active,
                    Some(ActivePlayback { queued, activity: Activity::AwaitingReplay })
                        if queued.index() == segment
                );
                if awaiting && !self.stats.degraded {
                    if let Some(active) = self.active.take() {
                        self.record_attempt(segment);
                        self.play(active.queued, clip);
                    }
                }
            }
            TaskKind::MediaEnded { segment } | TaskKind::TimerEnded { segment } => {
                self.on_segment_ended(segment);
            }
            TaskKind::GapElapsed => {
                self.gap_pending = false;
                self.pump();
            }
            TaskKind::HoldExpired { epoch } => {
                if self.held && epoch == self.hold_epoch {
                    tracing::warn!("animation hold timed out, advancing");
                    self.held = false;
                    self.play_next();
                }
            }
        }
    }

    fn on_fetched(&mut self, segment: usize, result: Result<AudioClip, TtsError>) {
        if self.stats.degraded || !self.fetching.contains(&segment) {
            return;
        }
        match result {
            Ok(clip) => {
                tracing::debug!(segment, bytes = clip.bytes.len(), "segment audio ready");
                self.fetching.remove(&segment);
                self.ready.insert(segment, clip);
                self.play_next();
            }
            Err(e) => {
                tracing::warn!(segment, error = %e, "segment fetch failed");
                let retryable = e.is_retryable();
                let error = NarrationError::FetchFailure {
                    segment,
                    message: e.to_string(),
                };
                self.on_failure(segment, error, retryable, Retry::Fetch);
            }
        }
    }

    fn on_segment_ended(&mut self, segment: usize) {
        let matches = self
            .active
            .as_ref()
            .is_some_and(|active| active.queued.index() == segment);
        if !matches {
            return;
        }
        self.active = None;
        tracing::debug!(segment, "segment finished");
        self.outbox
            .push_back(SchedulerEvent::SegmentFinished { segment });

        if self.queue.is_empty() {
            self.play_next();
            return;
        }
        self.gap_pending = true;
        let gap = self.settings.advance_gap();
        self.spawn_task(async move {
            tokio::time::sleep(gap).await;
            TaskKind::GapElapsed
        });
    }
}

impl Drop for PlaybackScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}
