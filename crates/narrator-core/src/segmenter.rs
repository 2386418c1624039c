//! Script segmentation for speech synthesis and on-screen captions.
//!
//! Both splitters share one greedy packing policy and differ only in their
//! character budget. Units are exact slices of the input: the segmenter never
//! rewrites text, it only decides where to cut.
//!
//! Break preference, strongest first:
//! 1. blank line (always a break),
//! 2. end of sentence (`.`, `!`, `?`, `…`, optionally followed by closing
//!    quotes or brackets),
//! 3. clause punctuation (`,`, `;`, `:`),
//! 4. any word boundary.
//!
//! A protected phrase is never cut, and a single token longer than the
//! budget is emitted whole.

use std::ops::Range;

use crate::domain::{CaptionChunk, SegmentPriority, SpeechSegment};

/// Characters that may trail a sentence or clause mark without changing
/// the gap class (`Il a dit « Bonjour. »` still ends a sentence).
const CLOSING_MARKS: &[char] = &['"', '\'', '»', '”', '’', ')', ']', '}'];

/// Split a script into TTS-sized segments.
///
/// Segments partition the input: each one owns the whitespace that follows
/// it and the first one also owns any leading whitespace. The first segment
/// is marked [`SegmentPriority::High`].
#[must_use]
pub fn split_for_speech(
    text: &str,
    max_chars: usize,
    protected_phrases: &[String],
) -> Vec<SpeechSegment> {
    let ranges = unit_ranges(text, max_chars, protected_phrases);
    let count = ranges.len();

    ranges
        .iter()
        .enumerate()
        .map(|(index, range)| {
            let start = if index == 0 { 0 } else { range.start };
            let end = ranges.get(index + 1).map_or(text.len(), |next| next.start);
            SpeechSegment {
                index,
                text: text[start..end].to_string(),
                span: start..end,
                max_chars,
                priority: if index == 0 {
                    SegmentPriority::High
                } else {
                    SegmentPriority::Normal
                },
            }
        })
        .inspect(|segment| {
            tracing::trace!(
                index = segment.index,
                of = count,
                chars = segment.speakable().chars().count(),
                "speech segment"
            );
        })
        .collect()
}

/// Split text into display-sized caption chunks.
///
/// Chunk text is trimmed; `span` is its byte range within `text`.
#[must_use]
pub fn split_for_display(
    text: &str,
    max_chars: usize,
    protected_phrases: &[String],
) -> Vec<CaptionChunk> {
    unit_ranges(text, max_chars, protected_phrases)
        .into_iter()
        .map(|span| CaptionChunk {
            text: text[span.clone()].to_string(),
            span,
        })
        .collect()
}

/// Number of whitespace-separated words in `text`.
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ── Internal helpers ───────────────────────────────────────────────

/// Strength of the gap that follows a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Gap {
    Word,
    Clause,
    Sentence,
    Paragraph,
}

/// An atomic run of text that is never split.
#[derive(Debug, Clone, Copy)]
struct Token {
    start: usize,
    end: usize,
    chars: usize,
}

/// Byte ranges of every unit, in order, trimmed of surrounding whitespace.
fn unit_ranges(text: &str, max_chars: usize, protected_phrases: &[String]) -> Vec<Range<usize>> {
    let max_chars = max_chars.max(1);
    let tokens = tokenize(text, protected_phrases);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut gaps: Vec<Gap> = tokens
        .windows(2)
        .map(|pair| classify_gap(text, pair[0], pair[1]))
        .collect();

    // A detached closing mark (`« oui. »`) takes over the strength of the
    // gap in front of it so the break lands after the mark.
    for i in 1..gaps.len() {
        let token = &text[tokens[i].start..tokens[i].end];
        if token.trim_end_matches(CLOSING_MARKS).is_empty()
            && gaps[i] == Gap::Word
            && gaps[i - 1] < Gap::Paragraph
        {
            gaps[i] = gaps[i - 1];
            gaps[i - 1] = Gap::Word;
        }
    }

    let mut ranges = Vec::new();
    let mut paragraph_start = 0;
    for (i, gap) in gaps.iter().enumerate() {
        if *gap == Gap::Paragraph {
            pack_paragraph(text, &tokens, &gaps, paragraph_start..i + 1, max_chars, &mut ranges);
            paragraph_start = i + 1;
        }
    }
    pack_paragraph(
        text,
        &tokens,
        &gaps,
        paragraph_start..tokens.len(),
        max_chars,
        &mut ranges,
    );
    ranges
}

/// Greedily pack the tokens of one paragraph into units.
fn pack_paragraph(
    text: &str,
    tokens: &[Token],
    gaps: &[Gap],
    paragraph: Range<usize>,
    max_chars: usize,
    out: &mut Vec<Range<usize>>,
) {
    let last = paragraph.end - 1;
    let mut first = paragraph.start;

    while first <= last {
        // Furthest token that still fits, reserving one column for the
        // separator when more text follows.
        let mut fit = None;
        let mut len = 0;
        for k in first..=last {
            if k > first {
                len += text[tokens[k - 1].end..tokens[k].start].chars().count();
            }
            len += tokens[k].chars;
            let separator = usize::from(k < last);
            if len + separator > max_chars {
                break;
            }
            fit = Some(k);
        }

        let end_token = match fit {
            // Hard floor: the token alone is over budget.
            None => first,
            Some(k) if k == last => last,
            Some(k) => {
                let strongest = gaps[first..=k].iter().copied().max().unwrap_or(Gap::Word);
                (first..=k)
                    .rev()
                    .find(|&j| gaps[j] == strongest)
                    .unwrap_or(k)
            }
        };

        out.push(tokens[first].start..tokens[end_token].end);
        first = end_token + 1;
    }
}

/// Maximal non-whitespace runs, with protected phrase occurrences merged
/// into single tokens.
fn tokenize(text: &str, protected_phrases: &[String]) -> Vec<Token> {
    let mut raw: Vec<Range<usize>> = Vec::new();
    let mut current: Option<usize> = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), current) {
            (true, Some(start)) => {
                raw.push(start..i);
                current = None;
            }
            (false, None) => current = Some(i),
            _ => {}
        }
    }
    if let Some(start) = current {
        raw.push(start..text.len());
    }

    let protected = protected_occurrences(text, protected_phrases);

    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());
    for range in raw {
        let glued = tokens.last().is_some_and(|prev| {
            protected
                .iter()
                .any(|occ| occ.start < prev.end && occ.end > range.start)
        });
        if glued {
            if let Some(prev) = tokens.last_mut() {
                prev.end = range.end;
                prev.chars = text[prev.start..prev.end].chars().count();
            }
        } else {
            tokens.push(Token {
                start: range.start,
                end: range.end,
                chars: text[range].chars().count(),
            });
        }
    }
    tokens
}

/// Byte ranges of every occurrence of every protected phrase.
fn protected_occurrences(text: &str, protected_phrases: &[String]) -> Vec<Range<usize>> {
    protected_phrases
        .iter()
        .map(|phrase| phrase.trim())
        .filter(|phrase| !phrase.is_empty())
        .flat_map(|phrase| {
            text.match_indices(phrase)
                .map(move |(start, matched)| start..start + matched.len())
        })
        .collect()
}

fn classify_gap(text: &str, before: Token, after: Token) -> Gap {
    let whitespace = &text[before.end..after.start];
    if whitespace.matches('\n').count() >= 2 {
        return Gap::Paragraph;
    }

    let token = text[before.start..before.end].trim_end_matches(CLOSING_MARKS);
    match token.chars().last() {
        Some('.' | '!' | '?' | '…') => Gap::Sentence,
        Some(',' | ';' | ':') => Gap::Clause,
        _ => Gap::Word,
    }
}
