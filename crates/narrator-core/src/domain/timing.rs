//! Timing window and offset zone types.

use serde::{Deserialize, Serialize};

/// The `[start, end)` interval, in seconds, during which a chunk is the
/// active caption.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimingWindow {
    /// Index of the chunk within its segment.
    pub chunk: usize,
    pub start: f64,
    pub end: f64,
}

impl TimingWindow {
    /// Whether `t` falls inside the half-open window.
    #[must_use]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.start && t < self.end
    }

    /// Window length in seconds.
    #[must_use]
    pub fn len_secs(&self) -> f64 {
        self.end - self.start
    }
}

/// Where a segment's duration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationSource {
    /// Read from the synthesized audio or reported by the output.
    Measured,
    /// Word-count estimate at the configured speaking rate.
    Estimated,
    /// Fixed per-chunk interval (degraded mode).
    FixedInterval,
}

/// A named stretch of script whose captions are shifted by a constant.
///
/// The zone starts at the first occurrence of `text` in the segment and ends
/// after `until` when given, otherwise after `text` itself. Every chunk whose
/// start falls inside the zone is shifted by `offset_secs`.
///
/// This compensates for a systematic estimation bias of a particular voice;
/// it is an approximation, not a timing law.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OffsetZone {
    pub name: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<String>,
    pub offset_secs: f64,
}

impl OffsetZone {
    pub fn new(name: impl Into<String>, text: impl Into<String>, offset_secs: f64) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            until: None,
            offset_secs,
        }
    }

    /// Extend the zone to the end of `until`.
    #[must_use]
    pub fn until(mut self, until: impl Into<String>) -> Self {
        self.until = Some(until.into());
        self
    }
}

/// An [`OffsetZone`] resolved to a byte range of a concrete source text.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneSpan {
    pub start: usize,
    pub end: usize,
    pub offset_secs: f64,
}

impl ZoneSpan {
    #[must_use]
    pub const fn contains(&self, byte_offset: usize) -> bool {
        byte_offset >= self.start && byte_offset < self.end
    }
}
