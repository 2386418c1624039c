//! Domain types shared by every narrator crate.
//!
//! These are plain data types: scripts and their derived units, timing
//! windows, scenes and anchors. Reading a script file is the only I/O.

mod scene;
mod script;
mod timing;

pub use scene::{Anchor, Portrait, Scene, SideEffect, TerminalAction};
pub use script::{CaptionChunk, Script, SegmentPriority, SpeechSegment};
pub use timing::{DurationSource, OffsetZone, TimingWindow, ZoneSpan};
