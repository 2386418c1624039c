//! Command handlers.
//!
//! Handlers follow one pattern:
//! - Signature: `pub fn execute(settings: &NarrationSettings, ...) -> Result<()>`
//!   (`play` is async)
//! - Thin wrappers that:
//!   1. Read the script and any side files
//!   2. Call into `narrator-core` / `narrator-playback`
//!   3. Format output for the terminal
//!
//! Segmentation, timing and scheduling logic stays in the library crates.

pub mod play;
pub mod split;
pub mod windows;

use std::path::Path;

use narrator_core::{NarrationSettings, Script, load_from_path};

use crate::error::CliError;

/// Settings from `--config`, or the defaults.
pub fn load_settings(config: Option<&Path>) -> Result<NarrationSettings, CliError> {
    match config {
        Some(path) => Ok(load_from_path(path)?),
        None => Ok(NarrationSettings::default()),
    }
}

/// Read a script file.
pub fn read_script(path: &Path) -> Result<Script, CliError> {
    Script::from_path(path).map_err(|e| CliError::Io(format!("{}: {e}", path.display())))
}
