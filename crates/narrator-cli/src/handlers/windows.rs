//! Windows command handler.

use std::ops::Range;
use std::path::Path;

use anyhow::Result;
use narrator_core::{
    CaptionChunk, NarrationPlan, NarrationSettings, TimingEstimator, TimingWindow, resolve_zones,
    warn_unmatched_zones,
};

use crate::handlers::read_script;
use crate::presentation::{format_span, print_separator, truncate_chars};

/// Caption windows of one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentWindows {
    pub segment: usize,
    pub duration_secs: f64,
    pub chunks: Vec<CaptionChunk>,
    /// Byte range of each chunk in the whole script.
    pub script_spans: Vec<Range<usize>>,
    pub windows: Vec<TimingWindow>,
}

/// Execute the windows command.
///
/// With `duration`, the total is shared out across segments by character
/// count; otherwise each segment gets its word-count estimate.
pub fn execute(settings: &NarrationSettings, script: &Path, duration: Option<f64>) -> Result<()> {
    if let Some(secs) = duration {
        if !(secs.is_finite() && secs > 0.0) {
            return Err(crate::CliError::Arguments(format!(
                "--duration must be a positive number of seconds, got {secs}"
            ))
            .into());
        }
    }

    let script = read_script(script)?;
    warn_unmatched_zones(&settings.timing.offset_zones, script.text());
    let plan = NarrationPlan::build(&script, &settings.segmenter);
    if plan.is_empty() {
        println!("Script is empty.");
        return Ok(());
    }

    for seg in compute_windows(&plan, settings, duration) {
        println!("Segment {} ({:.2}s)", seg.segment, seg.duration_secs);
        print_separator(96);
        let rows = seg.chunks.iter().zip(&seg.windows).zip(&seg.script_spans);
        for ((chunk, window), span) in rows {
            println!(
                "  {:>3}  {:>7.2} - {:>7.2} ({:>5.2}s)  {}  {}",
                window.chunk,
                window.start,
                window.end,
                window.len_secs(),
                format_span(span),
                truncate_chars(&chunk.text, 48)
            );
        }
        println!();
    }
    Ok(())
}

/// Lay out the windows of every segment in `plan`.
pub fn compute_windows(
    plan: &NarrationPlan,
    settings: &NarrationSettings,
    total_secs: Option<f64>,
) -> Vec<SegmentWindows> {
    let estimator = TimingEstimator::new(settings.timing.words_per_minute);
    let total_chars: usize = plan
        .segments()
        .iter()
        .map(|p| p.segment.text.chars().count())
        .sum();

    plan.segments()
        .iter()
        .map(|planned| {
            let text = &planned.segment.text;
            let duration_secs = match total_secs {
                Some(total) if total_chars > 0 => {
                    total * text.chars().count() as f64 / total_chars as f64
                }
                _ => estimator.estimate_duration(planned.segment.speakable()),
            };
            let zones = resolve_zones(text, &settings.timing.offset_zones);
            SegmentWindows {
                segment: planned.segment.index,
                duration_secs,
                windows: estimator.assign_windows(&planned.chunks, duration_secs, &zones),
                script_spans: (0..planned.chunks.len())
                    .filter_map(|i| planned.script_span(i))
                    .collect(),
                chunks: planned.chunks.clone(),
            }
        })
        .collect()
}
