//! Audio duration lookup.
//!
//! WAV headers are read with `hound`. Everything else goes through the
//! `symphonia` format reader: the frame count from the codec parameters when the
//! container declares it, otherwise the end timestamp of the last packet.

use std::io::Cursor;
use std::time::Duration;

use narrator_core::{AudioClip, AudioFormat};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Duration of a clip: the provider's value if set, otherwise read from the bytes.
#[must_use]
pub fn clip_duration(clip: &AudioClip) -> Option<Duration> {
    clip.duration.or_else(|| encoded_duration(&clip.bytes, clip.format))
}

/// Playing time of encoded audio. `None` when it cannot be told.
#[must_use]
pub fn encoded_duration(bytes: &[u8], format: AudioFormat) -> Option<Duration> {
    if bytes.is_empty() {
        return None;
    }
    let found = match format {
        AudioFormat::Wav => wav_duration(bytes).or_else(|| symphonia_duration(bytes, format)),
        AudioFormat::Mp3 => symphonia_duration(bytes, format),
    };
    if found.is_none() {
        tracing::debug!(format = format.extension(), len = bytes.len(), "could not read audio duration");
    }
    found.filter(|d| !d.is_zero())
}

fn wav_duration(bytes: &[u8]) -> Option<Duration> {
    let reader = hound::WavReader::new(Cursor::new(bytes)).ok()?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        f64::from(reader.duration()) / f64::from(rate),
    ))
}

fn symphonia_duration(bytes: &[u8], format: AudioFormat) -> Option<Duration> {
    let source = MediaSourceStream::new(
        Box::new(Cursor::new(bytes.to_vec())),
        MediaSourceStreamOptions::default(),
    );
    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let opened = symphonia::default::get_probe()
        .format(
            &hint,
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .ok()?;
    let mut reader = opened.format;

    let track = reader.default_track()?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if rate > 0 {
            return Some(Duration::from_secs_f64(frames as f64 / f64::from(rate)));
        }
    }

    // No declared length: walk the packets.
    let time_base = params.time_base?;
    let mut end_ts = 0u64;
    while let Ok(packet) = reader.next_packet() {
        if packet.track_id() == track_id {
            end_ts = end_ts.max(packet.ts() + packet.dur());
        }
    }
    let time = time_base.calc_time(end_ts);
    Some(Duration::from_secs(time.seconds) + Duration::from_secs_f64(time.frac))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn silent_wav(seconds: u32, rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for _ in 0..seconds * rate {
                writer.write_sample(0i16).unwrap();
            }
            writer.finalize().unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn wav_duration_from_header() {
        let bytes = silent_wav(2, 8000);
        let duration = encoded_duration(&bytes, AudioFormat::Wav).unwrap();
        assert!((duration.as_secs_f64() - 2.0).abs() < 1e-6);
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(encoded_duration(b"definitely not audio", AudioFormat::Mp3), None);
        assert_eq!(encoded_duration(&[], AudioFormat::Wav), None);
    }

    #[test]
    fn provider_duration_wins() {
        let clip = AudioClip::new(b"opaque".to_vec(), AudioFormat::Mp3)
            .with_duration(Duration::from_millis(1500));
        assert_eq!(clip_duration(&clip), Some(Duration::from_millis(1500)));
    }
}
