//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports use only domain types; adapters live in `narrator-playback`.

pub mod ambient;
pub mod tts;

pub use ambient::{AmbientAudio, NoopAmbient};
pub use tts::{AudioClip, AudioFormat, TtsError, TtsProvider, TtsRequest, VoiceParams};
