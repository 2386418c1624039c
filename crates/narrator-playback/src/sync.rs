//! Active-caption resolution for the playing segment.

use std::time::Duration;

use narrator_core::TimingWindow;

use crate::clock::PositionSource;

/// Index of the window active at `t` seconds.
///
/// The window containing `t` wins; otherwise the last window starting at or
/// before `t`; otherwise the first one, so a caption is always shown once
/// playback has started. Returns 0 for an empty slice.
#[must_use]
pub fn resolve_active(windows: &[TimingWindow], t: f64) -> usize {
    if let Some(i) = windows.iter().position(|w| w.contains(t)) {
        return i;
    }
    windows.iter().rposition(|w| w.start <= t).unwrap_or(0)
}

/// Polls a [`PositionSource`] and reports caption changes.
pub struct SyncLoop {
    windows: Vec<TimingWindow>,
    source: Box<dyn PositionSource>,
    lookahead: Duration,
    current: Option<usize>,
}

impl SyncLoop {
    #[must_use]
    pub fn new(
        windows: Vec<TimingWindow>,
        source: Box<dyn PositionSource>,
        lookahead: Duration,
    ) -> Self {
        Self {
            windows,
            source,
            lookahead,
            current: None,
        }
    }

    /// Currently active chunk, if any poll has happened yet.
    #[must_use]
    pub const fn current(&self) -> Option<usize> {
        self.current
    }

    #[must_use]
    pub fn windows(&self) -> &[TimingWindow] {
        &self.windows
    }

    /// Resolve the active chunk. Returns the chunks that became active since
    /// the last poll, in order; empty when nothing changed.
    ///
    /// A forward jump reports every chunk it crossed, so a window shorter
    /// than one tick (or collapsed to zero by an offset zone) is still shown.
    pub fn poll(&mut self) -> Vec<usize> {
        if self.windows.is_empty() {
            return Vec::new();
        }
        let t = (self.source.position() + self.lookahead).as_secs_f64();
        self.advance_to(resolve_active(&self.windows, t))
    }

    /// Swap in recomputed windows, for example once the real duration is
    /// known. Reports like [`poll`](Self::poll).
    pub fn rebase(&mut self, windows: Vec<TimingWindow>) -> Vec<usize> {
        tracing::debug!(chunks = windows.len(), "caption windows rebased");
        self.windows = windows;
        self.poll()
    }

    /// The segment ended: make the last chunk active if it is not yet,
    /// reporting any chunks between the current one and the last.
    pub fn finish(&mut self) -> Vec<usize> {
        match self.windows.len().checked_sub(1) {
            Some(last) => self.advance_to(last),
            None => Vec::new(),
        }
    }

    fn advance_to(&mut self, index: usize) -> Vec<usize> {
        let crossed: Vec<usize> = match self.current {
            Some(current) if current == index => return Vec::new(),
            Some(current) if index > current => (current + 1..=index).collect(),
            Some(_) => vec![index],
            None => (0..=index).collect(),
        };
        if crossed.len() > 1 {
            tracing::debug!(from = ?self.current, to = index, "caption jumped ahead");
        }
        tracing::trace!(chunk = index, "active caption changed");
        self.current = Some(index);
        crossed
    }
}
