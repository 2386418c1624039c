//! Script, speech segment and caption chunk types.

use std::ops::Range;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::NarrationError;

/// Immutable narration text for one playback session.
///
/// Paragraphs are separated by blank lines; a blank line is always a
/// segment and chunk boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    text: String,
}

impl Script {
    /// Wrap a narration text.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a UTF-8 script file.
    pub fn from_path(path: &Path) -> Result<Self, NarrationError> {
        let text = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), bytes = text.len(), "loaded script");
        Ok(Self::new(text))
    }

    /// Full script text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the script has anything to say.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<&str> for Script {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Script {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Priority hint forwarded to the TTS provider.
///
/// The first segment of a session is requested with `High` priority so the
/// provider can answer with a shorter timeout and a tighter length cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentPriority {
    High,
    #[default]
    Normal,
}

/// A unit of text sized for one TTS request.
///
/// `text` includes the whitespace that follows the segment in the script, so
/// concatenating every segment's `text` in order reconstructs the script
/// exactly. Use [`SpeechSegment::speakable`] for the text actually sent to
/// the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechSegment {
    /// Position of this segment in the session (0-based).
    pub index: usize,

    /// Exact slice of the script covered by this segment.
    pub text: String,

    /// Byte range of `text` within the script.
    pub span: Range<usize>,

    /// Character budget the segment was cut against.
    pub max_chars: usize,

    /// Priority hint for the TTS request.
    pub priority: SegmentPriority,
}

impl SpeechSegment {
    /// Trimmed text to synthesize.
    #[must_use]
    pub fn speakable(&self) -> &str {
        self.text.trim()
    }
}

/// A display-sized caption unit.
///
/// `span` is the byte range of `text` relative to the source the chunk was
/// cut from: the owning segment's `text` when produced by a session, or the
/// whole input when the segmenter is called directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptionChunk {
    pub text: String,
    pub span: Range<usize>,
}

impl CaptionChunk {
    /// Number of characters (not bytes) in the chunk.
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn script_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Bonjour.\n\nÀ bientôt.").unwrap();
        let script = Script::from_path(file.path()).unwrap();
        assert_eq!(script.text(), "Bonjour.\n\nÀ bientôt.");

        let dir = tempfile::tempdir().unwrap();
        let missing = Script::from_path(&dir.path().join("absent.txt"));
        assert!(matches!(missing, Err(NarrationError::Io(_))));
    }

    #[test]
    fn speakable_strips_trailing_separator() {
        let segment = SpeechSegment {
            index: 0,
            text: "Bonjour.\n\n".to_string(),
            span: 0..10,
            max_chars: 40,
            priority: SegmentPriority::High,
        };
        assert_eq!(segment.speakable(), "Bonjour.");
    }

    #[test]
    fn blank_script() {
        assert!(Script::new("  \n ").is_blank());
        assert!(!Script::from("Salut").is_blank());
    }

    #[test]
    fn caption_char_len_counts_chars() {
        let chunk = CaptionChunk {
            text: "Âme".to_string(),
            span: 0..4,
        };
        assert_eq!(chunk.char_len(), 3);
    }
}
