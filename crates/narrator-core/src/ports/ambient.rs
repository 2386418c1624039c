//! Ambient (background) audio port.

/// Background audio whose volume the narration lowers while speaking.
///
/// Methods take `&self`; implementations use interior mutability.
#[cfg_attr(test, mockall::automock)]
pub trait AmbientAudio: Send + Sync {
    /// Current volume in `[0, 1]`.
    fn volume(&self) -> f32;

    /// Set the volume, clamped to `[0, 1]` by the implementation.
    fn set_volume(&self, volume: f32);
}

/// No background audio.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAmbient;

impl AmbientAudio for NoopAmbient {
    fn volume(&self) -> f32 {
        1.0
    }

    fn set_volume(&self, _volume: f32) {}
}
