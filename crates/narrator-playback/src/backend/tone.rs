//! Offline provider: a soft tone as long as the text would take to say.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use narrator_core::{AudioClip, AudioFormat, TimingEstimator, TtsError, TtsProvider, TtsRequest};

const DEFAULT_SAMPLE_RATE: u32 = 16_000;
const TONE_HZ: f32 = 220.0;
const AMPLITUDE: f32 = 0.1;

/// Generates 16-bit mono WAV clips without any network access.
#[derive(Debug, Clone)]
pub struct ToneProvider {
    estimator: TimingEstimator,
    sample_rate: u32,
    silent: bool,
}

impl ToneProvider {
    #[must_use]
    pub const fn new(estimator: TimingEstimator) -> Self {
        Self {
            estimator,
            sample_rate: DEFAULT_SAMPLE_RATE,
            silent: false,
        }
    }

    /// Write silence instead of a tone.
    #[must_use]
    pub const fn silent(mut self) -> Self {
        self.silent = true;
        self
    }

    #[must_use]
    pub const fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    fn render(&self, duration: Duration) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let frames = (duration.as_secs_f64() * f64::from(self.sample_rate)).round() as u64;

        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        let rate = self.sample_rate as f32;
        for i in 0..frames {
            let sample = if self.silent {
                0.0
            } else {
                (2.0 * std::f32::consts::PI * TONE_HZ * (i as f32 / rate)).sin() * AMPLITUDE
            };
            #[allow(clippy::cast_possible_truncation)]
            writer.write_sample((sample * f32::from(i16::MAX)) as i16)?;
        }
        writer.finalize()?;
        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl TtsProvider for ToneProvider {
    async fn synthesize(&self, request: TtsRequest) -> Result<AudioClip, TtsError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(TtsError::EmptyText);
        }
        let duration = Duration::from_secs_f64(self.estimator.estimate_duration(text));
        let bytes = self
            .render(duration)
            .map_err(|e| TtsError::Configuration(format!("WAV encoding failed: {e}")))?;

        tracing::debug!(
            segment = request.segment,
            duration_ms = duration.as_millis(),
            bytes = bytes.len(),
            "tone clip generated"
        );
        Ok(AudioClip::new(bytes, AudioFormat::Wav).with_duration(duration))
    }

    fn name(&self) -> &'static str {
        "tone"
    }
}

#[cfg(test)]
mod tests {
    use narrator_core::{SegmentPriority, VoiceParams, VoiceSettings};

    use super::*;
    use crate::duration::encoded_duration;

    fn request(text: &str) -> TtsRequest {
        TtsRequest {
            text: text.to_string(),
            voice: VoiceParams::from(&VoiceSettings::default()),
            priority: SegmentPriority::Normal,
            segment: 3,
        }
    }

    #[tokio::test]
    async fn clip_length_matches_estimate() {
        // 5 words at 150 wpm = 2 s
        let provider = ToneProvider::new(TimingEstimator::default()).with_sample_rate(8000);
        let clip = provider.synthesize(request("un deux trois quatre cinq")).await.unwrap();
        assert_eq!(clip.format, AudioFormat::Wav);
        let declared = clip.duration.unwrap();
        assert!((declared.as_secs_f64() - 2.0).abs() < 1e-6);
        let measured = encoded_duration(&clip.bytes, clip.format).unwrap();
        assert!((measured.as_secs_f64() - 2.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let provider = ToneProvider::new(TimingEstimator::default()).silent();
        assert_eq!(
            provider.synthesize(request("   ")).await,
            Err(TtsError::EmptyText)
        );
    }
}
