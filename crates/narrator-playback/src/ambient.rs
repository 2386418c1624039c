//! Ambient ducking: background audio steps down while narration speaks.

use std::sync::Arc;

use narrator_core::AmbientAudio;

/// Lowers the ambient volume for the length of a session.
///
/// `duck` remembers the volume it replaced and `restore` puts it back. Both
/// are idempotent, so a restore on completion followed by one on teardown
/// touches the port once.
pub struct AmbientDucker {
    ambient: Arc<dyn AmbientAudio>,
    ducked_volume: f32,
    saved: Option<f32>,
}

impl AmbientDucker {
    #[must_use]
    pub fn new(ambient: Arc<dyn AmbientAudio>, ducked_volume: f32) -> Self {
        Self {
            ambient,
            ducked_volume: ducked_volume.clamp(0.0, 1.0),
            saved: None,
        }
    }

    /// Whether the ambient volume is currently lowered.
    #[must_use]
    pub const fn is_ducked(&self) -> bool {
        self.saved.is_some()
    }

    pub fn duck(&mut self) {
        if self.saved.is_some() {
            return;
        }
        let previous = self.ambient.volume();
        self.saved = Some(previous);
        // Never raise a quieter ambient track.
        let target = self.ducked_volume.min(previous);
        self.ambient.set_volume(target);
        tracing::debug!(previous, ducked = target, "ambient audio ducked");
    }

    pub fn restore(&mut self) {
        if let Some(previous) = self.saved.take() {
            self.ambient.set_volume(previous);
            tracing::debug!(volume = previous, "ambient audio restored");
        }
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::function;

    use super::*;

    mockall::mock! {
        Ambient {}
        impl AmbientAudio for Ambient {
            fn volume(&self) -> f32;
            fn set_volume(&self, volume: f32);
        }
    }

    fn approx(expected: f32) -> impl Fn(&f32) -> bool {
        move |v| (*v - expected).abs() < f32::EPSILON
    }

    #[test]
    fn ducks_then_restores_once() {
        let mut mock = MockAmbient::new();
        mock.expect_volume().times(1).return_const(0.8_f32);
        mock.expect_set_volume()
            .with(function(approx(0.4)))
            .times(1)
            .return_const(());
        mock.expect_set_volume()
            .with(function(approx(0.8)))
            .times(1)
            .return_const(());

        let mut ducker = AmbientDucker::new(Arc::new(mock), 0.4);
        ducker.duck();
        ducker.duck();
        assert!(ducker.is_ducked());
        ducker.restore();
        ducker.restore();
        assert!(!ducker.is_ducked());
    }

    #[test]
    fn quiet_ambient_is_not_raised() {
        let mut mock = MockAmbient::new();
        mock.expect_volume().return_const(0.2_f32);
        mock.expect_set_volume()
            .with(function(approx(0.2)))
            .times(2)
            .return_const(());

        let mut ducker = AmbientDucker::new(Arc::new(mock), 0.4);
        ducker.duck();
        ducker.restore();
    }

    #[test]
    fn restore_without_duck_is_noop() {
        let mut mock = MockAmbient::new();
        mock.expect_set_volume().never();
        let mut ducker = AmbientDucker::new(Arc::new(mock), 0.4);
        ducker.restore();
    }
}
