//! Caption timing estimation.
//!
//! Windows are proportional to character counts: a chunk holding 20% of a
//! segment's characters gets 20% of its duration. The duration itself is the
//! measured audio length when available, otherwise a word-count estimate.

use crate::domain::{CaptionChunk, DurationSource, OffsetZone, TimingWindow, ZoneSpan};
use crate::segmenter::word_count;

/// Default speaking rate used for estimates.
pub const DEFAULT_WORDS_PER_MINUTE: f64 = 150.0;

/// Turns chunks and a duration into per-chunk timing windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingEstimator {
    words_per_minute: f64,
}

impl Default for TimingEstimator {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl TimingEstimator {
    /// Create an estimator for the given speaking rate.
    ///
    /// A non-positive or non-finite rate falls back to
    /// [`DEFAULT_WORDS_PER_MINUTE`].
    #[must_use]
    pub fn new(words_per_minute: f64) -> Self {
        let words_per_minute = if words_per_minute.is_finite() && words_per_minute > 0.0 {
            words_per_minute
        } else {
            DEFAULT_WORDS_PER_MINUTE
        };
        Self { words_per_minute }
    }

    #[must_use]
    pub const fn words_per_minute(&self) -> f64 {
        self.words_per_minute
    }

    /// Estimated speaking time of `text`, in seconds.
    #[must_use]
    pub fn estimate_duration(&self, text: &str) -> f64 {
        word_count(text) as f64 / self.words_per_minute * 60.0
    }

    /// Pick the duration to lay windows over.
    ///
    /// A measured duration is used only when it is a positive finite number.
    #[must_use]
    pub fn effective_duration(&self, measured: Option<f64>, text: &str) -> (f64, DurationSource) {
        match measured {
            Some(secs) if is_usable_duration(secs) => (secs, DurationSource::Measured),
            other => {
                if let Some(bad) = other {
                    tracing::debug!(duration = bad, "unusable duration, estimating from word count");
                }
                (self.estimate_duration(text), DurationSource::Estimated)
            }
        }
    }

    /// Assign a window to every chunk.
    ///
    /// `duration_secs` falls back to the word-count estimate of the chunks
    /// when it is NaN, infinite, zero or negative.
    #[must_use]
    pub fn assign_windows(
        &self,
        chunks: &[CaptionChunk],
        duration_secs: f64,
        zones: &[ZoneSpan],
    ) -> Vec<TimingWindow> {
        if chunks.is_empty() {
            return Vec::new();
        }

        let duration = if is_usable_duration(duration_secs) {
            duration_secs
        } else {
            let words: usize = chunks.iter().map(|c| word_count(&c.text)).sum();
            let estimate = words as f64 / self.words_per_minute * 60.0;
            tracing::debug!(
                duration = duration_secs,
                estimate,
                "invalid duration, falling back to estimate"
            );
            estimate
        };

        let total_chars: usize = chunks.iter().map(CaptionChunk::char_len).sum();
        let scale = if total_chars == 0 {
            0.0
        } else {
            duration / total_chars as f64
        };

        let mut starts = Vec::with_capacity(chunks.len());
        let mut consumed = 0usize;
        for chunk in chunks {
            let shift: f64 = zones
                .iter()
                .filter(|zone| zone.contains(chunk.span.start))
                .map(|zone| zone.offset_secs)
                .sum();
            starts.push(consumed as f64 * scale + shift);
            consumed += chunk.char_len();
        }

        // Clamp into [0, D] and keep starts non-decreasing after shifting.
        let mut floor = 0.0_f64;
        for start in &mut starts {
            *start = start.clamp(0.0, duration).max(floor);
            floor = *start;
        }

        (0..chunks.len())
            .map(|chunk| TimingWindow {
                chunk,
                start: starts[chunk],
                end: starts.get(chunk + 1).copied().unwrap_or(duration),
            })
            .collect()
    }
}

/// [`TimingEstimator::assign_windows`] at the default speaking rate.
#[must_use]
pub fn assign_windows(
    chunks: &[CaptionChunk],
    duration_secs: f64,
    zones: &[ZoneSpan],
) -> Vec<TimingWindow> {
    TimingEstimator::default().assign_windows(chunks, duration_secs, zones)
}

/// One window per chunk, each `interval_secs` long, back to back.
///
/// Used when audio is unavailable and captions advance on a timer.
#[must_use]
pub fn fixed_windows(chunk_count: usize, interval_secs: f64) -> Vec<TimingWindow> {
    (0..chunk_count)
        .map(|chunk| TimingWindow {
            chunk,
            start: chunk as f64 * interval_secs,
            end: (chunk + 1) as f64 * interval_secs,
        })
        .collect()
}

/// Locate offset zones in a segment's text.
///
/// Zones whose text does not occur are logged and dropped. A missing
/// `until` marker limits the zone to its own text.
#[must_use]
pub fn resolve_zones(text: &str, zones: &[OffsetZone]) -> Vec<ZoneSpan> {
    zones
        .iter()
        .filter_map(|zone| {
            if !zone.offset_secs.is_finite() {
                tracing::warn!(zone = %zone.name, "offset zone has a non-finite offset, ignoring");
                return None;
            }
            let start = text.find(zone.text.as_str())?;
            let mut end = start + zone.text.len();
            if let Some(until) = &zone.until {
                match text[start..].find(until.as_str()) {
                    Some(pos) => end = end.max(start + pos + until.len()),
                    None => tracing::warn!(
                        zone = %zone.name,
                        until = %until,
                        "offset zone end marker not found, zone limited to its own text"
                    ),
                }
            }
            Some(ZoneSpan {
                start,
                end,
                offset_secs: zone.offset_secs,
            })
        })
        .collect()
}

/// Log every configured zone whose text does not occur in the script.
///
/// Zones are resolved per segment, so a zone missing from one segment is
/// expected; this reports the ones that can never apply.
pub fn warn_unmatched_zones(zones: &[OffsetZone], script: &str) {
    for zone in zones {
        if !script.contains(zone.text.as_str()) {
            tracing::warn!(zone = %zone.name, text = %zone.text, "offset zone not found in script, ignoring");
        }
    }
}

fn is_usable_duration(secs: f64) -> bool {
    secs.is_finite() && secs > 0.0
}
