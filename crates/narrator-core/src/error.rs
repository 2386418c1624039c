//! Narration error types.

use crate::settings::SettingsError;

/// Errors that can occur while preparing or running a narration session.
///
/// Segment-level variants are handled inside the session (retry, then skip)
/// and only surface through logs and events.
#[derive(Debug, thiserror::Error)]
pub enum NarrationError {
    /// Fetching audio for a segment failed.
    #[error("Failed to fetch audio for segment {segment}: {message}")]
    FetchFailure { segment: usize, message: String },

    /// The audio output refused to play a segment.
    #[error("Playback of segment {segment} was rejected: {message}")]
    PlaybackRejected { segment: usize, message: String },

    /// No usable duration for a segment; windows will be estimated.
    #[error("Duration of segment {segment} is unknown")]
    DurationUnknown { segment: usize },

    /// An anchor's text does not occur in the script.
    #[error("Anchor text not found in script: {anchor:?}")]
    AnchorNotFound { anchor: String },

    /// The session was stopped before the operation could finish.
    #[error("Narration session was torn down")]
    SessionTornDown,

    /// Invalid settings.
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// IO error (script files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_errors_name_the_segment() {
        let err = NarrationError::FetchFailure {
            segment: 2,
            message: "timeout".into(),
        };
        assert_eq!(err.to_string(), "Failed to fetch audio for segment 2: timeout");

        let err = NarrationError::PlaybackRejected {
            segment: 0,
            message: "device busy".into(),
        };
        assert_eq!(err.to_string(), "Playback of segment 0 was rejected: device busy");
    }
}
