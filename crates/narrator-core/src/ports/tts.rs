//! Text-to-speech port.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::SegmentPriority;
use crate::settings::VoiceSettings;

/// Voice selection forwarded to the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceParams {
    pub name: String,
    pub language: String,
}

impl From<&VoiceSettings> for VoiceParams {
    fn from(settings: &VoiceSettings) -> Self {
        Self {
            name: settings.name.clone(),
            language: settings.language.clone(),
        }
    }
}

/// One synthesis request, one per speech segment attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsRequest {
    pub text: String,
    pub voice: VoiceParams,
    pub priority: SegmentPriority,
    /// Index of the segment the request is for (used for logging and tags).
    pub segment: usize,
}

/// Container format of synthesized audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
}

impl AudioFormat {
    /// File extension, also used as a format hint.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }
}

/// Encoded audio returned by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    /// Duration when the provider knows it. Otherwise it comes from
    /// `bytes` or from the playback handle.
    pub duration: Option<Duration>,
}

impl AudioClip {
    #[must_use]
    pub const fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self {
            bytes,
            format,
            duration: None,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Provider-side synthesis errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TtsError {
    #[error("Speech synthesis timed out after {0:?}")]
    Timeout(Duration),

    #[error("Speech service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Nothing to synthesize")]
    EmptyText,

    #[error("Speech service is not configured: {0}")]
    Configuration(String),
}

impl TtsError {
    /// Whether another attempt could succeed.
    ///
    /// Timeouts, network errors, rate limits and server errors are transient.
    /// Configuration problems, empty text and other client errors are not.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Network(_) => true,
            Self::Http { status, .. } => *status == 408 || *status == 429 || *status >= 500,
            Self::EmptyText | Self::Configuration(_) => false,
        }
    }
}

/// Backend-agnostic speech synthesis.
///
/// Implementations must be `Send + Sync`: the session shares one provider
/// between concurrent prefetch tasks.
#[async_trait]
pub trait TtsProvider: Send + Sync {
    /// Synthesize one segment.
    async fn synthesize(&self, request: TtsRequest) -> Result<AudioClip, TtsError>;

    /// Short provider name for logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(TtsError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(TtsError::Network("reset".into()).is_retryable());
        assert!(TtsError::Http {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(TtsError::Http {
            status: 429,
            message: String::new()
        }
        .is_retryable());
        assert!(!TtsError::Http {
            status: 401,
            message: String::new()
        }
        .is_retryable());
        assert!(!TtsError::EmptyText.is_retryable());
        assert!(!TtsError::Configuration("no key".into()).is_retryable());
    }

    struct Echo;

    #[async_trait]
    impl TtsProvider for Echo {
        async fn synthesize(&self, request: TtsRequest) -> Result<AudioClip, TtsError> {
            if request.text.trim().is_empty() {
                return Err(TtsError::EmptyText);
            }
            Ok(AudioClip::new(request.text.into_bytes(), AudioFormat::Wav))
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    #[test]
    fn provider_is_object_safe() {
        let provider: Box<dyn TtsProvider> = Box::new(Echo);
        let request = |text: &str| TtsRequest {
            text: text.to_string(),
            voice: VoiceParams::from(&VoiceSettings::default()),
            priority: SegmentPriority::High,
            segment: 0,
        };
        let clip = tokio_test::block_on(provider.synthesize(request("Bonjour"))).unwrap();
        assert_eq!(clip.bytes, b"Bonjour");
        assert_eq!(clip.duration, None);
        assert_eq!(
            tokio_test::block_on(provider.synthesize(request("  "))),
            Err(TtsError::EmptyText)
        );
    }

    #[test]
    fn voice_params_from_settings() {
        let params = VoiceParams::from(&VoiceSettings::default());
        assert_eq!(params.name, "fr-FR-VivienneNeural");
        assert_eq!(params.language, "fr-FR");
    }
}
