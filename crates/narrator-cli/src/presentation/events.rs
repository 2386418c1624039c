//! One-line rendering of narration events.

use narrator_core::NarrationEvent;

/// Human-readable line for `event`, prefixed with its short name.
pub fn event_line(event: &NarrationEvent) -> String {
    let detail = match event {
        NarrationEvent::StateChanged { state } => state.as_str().to_string(),
        NarrationEvent::SegmentStarted {
            segment,
            duration_secs,
            source,
            chunks,
        } => format!("#{segment} {duration_secs:.2}s ({source:?}, {chunks} chunks)"),
        NarrationEvent::CaptionChanged {
            global_chunk, text, ..
        } => format!("[{global_chunk}] {text}"),
        NarrationEvent::SceneChanged {
            scene,
            replay_key,
            hold,
        } => {
            let hold = if *hold { " (hold)" } else { "" };
            format!("{scene} key={replay_key}{hold}")
        }
        NarrationEvent::SegmentSkipped {
            segment,
            attempts,
            reason,
        } => format!("#{segment} after {attempts} attempt(s): {reason}"),
        NarrationEvent::Retrying {
            segment,
            attempt,
            delay_ms,
            reason,
        } => format!("#{segment} attempt {attempt} in {delay_ms} ms: {reason}"),
        NarrationEvent::DegradedMode { failures } => {
            format!("{failures} failures, captions on a timer")
        }
        NarrationEvent::AnchorMissing { anchor } => format!("{anchor:?}"),
        NarrationEvent::Handoff { scene } => scene.to_string(),
        NarrationEvent::Completed { summary } => format!(
            "played={} skipped={} attempts={} degraded={} anchors={} handoff={}",
            summary.played,
            summary.skipped,
            summary.attempts,
            summary.degraded,
            summary.anchors_fired,
            summary.handed_off
        ),
    };
    format!("{:<16} {detail}", event.event_name())
}
