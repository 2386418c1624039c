//! Fault injection: one segment never synthesizes.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::{
    AudioClip, AudioFormat, NarrationEvent, NarrationSettings, NoopAmbient, PlaybackState,
    SchedulerSettings, Script, SegmentPriority, SpeechSegment, TtsError, TtsProvider, TtsRequest,
    VoiceParams, VoiceSettings,
};
use narrator_playback::{NarrationSession, PlaybackScheduler, SchedulerEvent, SimulatedOutput};
use tokio_util::sync::CancellationToken;

/// Fails every request for `broken`, answers half a second of audio otherwise.
struct Faulty {
    broken: usize,
    calls: AtomicU32,
}

impl Faulty {
    fn new(broken: usize) -> Arc<Self> {
        Arc::new(Self {
            broken,
            calls: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TtsProvider for Faulty {
    async fn synthesize(&self, request: TtsRequest) -> Result<AudioClip, TtsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if request.segment == self.broken {
            return Err(TtsError::Timeout(Duration::from_secs(5)));
        }
        Ok(AudioClip::new(Vec::new(), AudioFormat::Mp3).with_duration(Duration::from_millis(500)))
    }

    fn name(&self) -> &'static str {
        "faulty"
    }
}

fn segment(index: usize) -> SpeechSegment {
    let text = format!("Phrase numéro {index}.");
    SpeechSegment {
        index,
        span: 0..text.len(),
        text,
        max_chars: 400,
        priority: if index == 0 {
            SegmentPriority::High
        } else {
            SegmentPriority::Normal
        },
    }
}

async fn run(segments: usize, broken: usize, settings: SchedulerSettings) -> (Vec<SchedulerEvent>, PlaybackScheduler, u32) {
    let provider = Faulty::new(broken);
    let mut scheduler = PlaybackScheduler::new(
        provider.clone(),
        Arc::new(SimulatedOutput::new()),
        VoiceParams::from(&VoiceSettings::default()),
        settings,
        CancellationToken::new(),
    );
    for i in 0..segments {
        scheduler.enqueue(segment(i), 1);
    }

    let mut events = Vec::new();
    while let Some(event) = scheduler.next_event().await {
        let done = matches!(event, SchedulerEvent::StateChanged(PlaybackState::Done));
        events.push(event);
        if done {
            break;
        }
    }
    let calls = provider.calls.load(Ordering::SeqCst);
    (events, scheduler, calls)
}

#[tokio::test(start_paused = true)]
async fn broken_segment_is_skipped_at_every_position() {
    const N: usize = 5;
    let settings = SchedulerSettings::default();

    for broken in 0..N {
        let (events, scheduler, calls) = run(N, broken, settings.clone()).await;

        let started: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                SchedulerEvent::SegmentStarted { segment, .. } => Some(*segment),
                _ => None,
            })
            .collect();
        let expected: Vec<usize> = (0..N).filter(|&i| i != broken).collect();
        assert_eq!(started, expected, "broken segment {broken}");

        let stats = scheduler.stats();
        assert_eq!(scheduler.state(), PlaybackState::Done);
        assert_eq!(stats.played, N - 1);
        assert_eq!(stats.skipped, 1);
        assert!(stats.attempts <= N as u32 * settings.max_attempts);
        assert_eq!(stats.attempts, calls);
        assert_eq!(calls, (N as u32 - 1) + settings.max_attempts);
        assert!(!stats.degraded);
    }
}

#[tokio::test(start_paused = true)]
async fn single_attempt_budget_never_retries() {
    let settings = SchedulerSettings {
        max_attempts: 1,
        ..SchedulerSettings::default()
    };
    let (events, scheduler, calls) = run(3, 1, settings).await;

    assert!(!events.iter().any(|e| matches!(e, SchedulerEvent::Retrying { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, SchedulerEvent::SegmentSkipped { segment: 1, attempts: 1, .. })));
    assert_eq!(calls, 3);
    assert_eq!(scheduler.stats().played, 2);
}

#[tokio::test(start_paused = true)]
async fn session_summary_reports_the_skip() {
    let mut settings = NarrationSettings::default();
    settings.segmenter.speech_max_chars = 20;
    let script = Script::new("Première phrase.\n\nDeuxième phrase.\n\nTroisième phrase.");

    let (handle, mut events) = NarrationSession::new(script)
        .with_settings(settings)
        .start(Faulty::new(1), Arc::new(SimulatedOutput::new()), Arc::new(NoopAmbient))
        .unwrap();

    let mut skipped = Vec::new();
    let mut retries = 0;
    while let Some(event) = events.recv().await {
        match event {
            NarrationEvent::SegmentSkipped { segment, .. } => skipped.push(segment),
            NarrationEvent::Retrying { segment: 1, .. } => retries += 1,
            _ => {}
        }
    }
    let summary = handle.wait().await.unwrap();

    assert_eq!(skipped, vec![1]);
    assert_eq!(retries, 2);
    assert_eq!(summary.played, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.attempts, 5);
}
