//! Audio output implementations of [`AudioOutput`](crate::audio_io::AudioOutput).

mod simulated;
#[cfg(feature = "speaker")]
mod speaker;

pub use simulated::SimulatedOutput;
#[cfg(feature = "speaker")]
pub use speaker::SpeakerOutput;
