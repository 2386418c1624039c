//! Precomputed segment and caption layout of a script.

use std::ops::Range;

use crate::domain::{CaptionChunk, Script, SpeechSegment};
use crate::segmenter::{split_for_display, split_for_speech};
use crate::settings::SegmenterSettings;

/// A speech segment with its caption chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSegment {
    pub segment: SpeechSegment,
    /// Chunks of `segment.text`; spans are relative to that text.
    pub chunks: Vec<CaptionChunk>,
    /// Global index of the first chunk.
    pub first_chunk: usize,
}

impl PlannedSegment {
    /// Global chunk index of a local one.
    #[must_use]
    pub const fn global(&self, chunk: usize) -> usize {
        self.first_chunk + chunk
    }

    /// Script byte range of a local chunk.
    #[must_use]
    pub fn script_span(&self, chunk: usize) -> Option<Range<usize>> {
        let base = self.segment.span.start;
        self.chunks
            .get(chunk)
            .map(|c| base + c.span.start..base + c.span.end)
    }
}

/// Every segment and chunk of a script, computed once per session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NarrationPlan {
    segments: Vec<PlannedSegment>,
    chunk_count: usize,
}

impl NarrationPlan {
    /// Split `script` into speech segments, then each segment into chunks.
    #[must_use]
    pub fn build(script: &Script, settings: &SegmenterSettings) -> Self {
        let mut chunk_count = 0;
        let segments = split_for_speech(
            script.text(),
            settings.speech_max_chars,
            &settings.protected_phrases,
        )
        .into_iter()
        .map(|segment| {
            let chunks = split_for_display(
                &segment.text,
                settings.display_max_chars,
                &settings.protected_phrases,
            );
            let first_chunk = chunk_count;
            chunk_count += chunks.len();
            PlannedSegment {
                segment,
                chunks,
                first_chunk,
            }
        })
        .collect::<Vec<_>>();

        tracing::debug!(
            segments = segments.len(),
            chunks = chunk_count,
            "narration plan built"
        );

        Self {
            segments,
            chunk_count,
        }
    }

    #[must_use]
    pub fn segments(&self) -> &[PlannedSegment] {
        &self.segments
    }

    #[must_use]
    pub fn segment(&self, index: usize) -> Option<&PlannedSegment> {
        self.segments.get(index)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total number of chunks across all segments.
    #[must_use]
    pub const fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Global index of the very last chunk.
    #[must_use]
    pub const fn last_chunk(&self) -> Option<usize> {
        self.chunk_count.checked_sub(1)
    }

    /// Global index of the chunk covering a script byte offset.
    ///
    /// An offset in the whitespace between two chunks belongs to the chunk
    /// before it.
    #[must_use]
    pub fn chunk_at(&self, byte_offset: usize) -> Option<usize> {
        let planned = self
            .segments
            .iter()
            .find(|p| p.segment.span.contains(&byte_offset))?;
        let local = byte_offset - planned.segment.span.start;
        let chunk = planned
            .chunks
            .iter()
            .rposition(|c| c.span.start <= local)
            .unwrap_or(0);
        (!planned.chunks.is_empty()).then(|| planned.global(chunk))
    }

    /// Global index of the chunk where `needle` first occurs in the script.
    #[must_use]
    pub fn locate(&self, script: &Script, needle: &str) -> Option<usize> {
        let needle = needle.trim();
        if needle.is_empty() {
            return None;
        }
        script
            .text()
            .find(needle)
            .and_then(|offset| self.chunk_at(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(speech: usize, display: usize) -> SegmenterSettings {
        SegmenterSettings {
            speech_max_chars: speech,
            display_max_chars: display,
            protected_phrases: Vec::new(),
        }
    }

    #[test]
    fn global_indices_run_across_segments() {
        let script = Script::new("Un deux trois. Quatre cinq six.\n\nSept huit neuf. Dix onze douze.");
        let plan = NarrationPlan::build(&script, &settings(400, 16));
        assert_eq!(plan.segments().len(), 2);
        assert_eq!(plan.segments()[0].chunks.len(), 2);
        assert_eq!(plan.segments()[1].first_chunk, 2);
        assert_eq!(plan.chunk_count(), 4);
        assert_eq!(plan.last_chunk(), Some(3));
        let span = plan.segments()[1].script_span(1).unwrap();
        assert_eq!(&script.text()[span], "Dix onze douze.");
    }

    #[test]
    fn locate_binds_to_containing_chunk() {
        let script = Script::new("Un deux trois. Quatre cinq six.\n\nSept huit neuf. Dix onze douze.");
        let plan = NarrationPlan::build(&script, &settings(400, 16));
        assert_eq!(plan.locate(&script, "cinq"), Some(1));
        assert_eq!(plan.locate(&script, "Sept"), Some(2));
        assert_eq!(plan.locate(&script, "onze douze"), Some(3));
        assert_eq!(plan.locate(&script, "absent"), None);
        assert_eq!(plan.locate(&script, "   "), None);
    }

    #[test]
    fn empty_script_has_no_chunks() {
        let plan = NarrationPlan::build(&Script::new(""), &SegmenterSettings::default());
        assert!(plan.is_empty());
        assert_eq!(plan.last_chunk(), None);
    }
}
