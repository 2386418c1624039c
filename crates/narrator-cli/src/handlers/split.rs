//! Split command handler.
//!
//! Prints every unit the segmenter produces, with its byte span in the
//! script, so budgets and protected phrases can be tuned by eye.

use std::ops::Range;
use std::path::Path;

use anyhow::Result;
use narrator_core::{NarrationSettings, split_for_display, split_for_speech};

use crate::commands::SplitMode;
use crate::handlers::read_script;
use crate::presentation::{format_span, print_separator};

/// Execute the split command.
///
/// `max_chars` overrides the configured budget of the chosen mode;
/// `protect` adds to the configured protected phrases.
pub fn execute(
    settings: &NarrationSettings,
    script: &Path,
    mode: SplitMode,
    max_chars: Option<usize>,
    protect: &[String],
) -> Result<()> {
    let script = read_script(script)?;

    let mut protected = settings.segmenter.protected_phrases.clone();
    protected.extend(protect.iter().cloned());
    let budget = max_chars.unwrap_or(match mode {
        SplitMode::Speech => settings.segmenter.speech_max_chars,
        SplitMode::Display => settings.segmenter.display_max_chars,
    });
    if budget == 0 {
        return Err(crate::CliError::Arguments("--max-chars must be at least 1".into()).into());
    }

    let units = split_units(script.text(), mode, budget, &protected);
    if units.is_empty() {
        println!("Script is empty.");
        return Ok(());
    }

    println!("{} unit(s), budget {budget} chars:\n", units.len());
    println!("{:<4} {:<12} {:<6} Text", "#", "Span", "Chars");
    print_separator(80);
    for (i, (span, text)) in units.iter().enumerate() {
        println!(
            "{i:<4} {} {:<6} {text}",
            format_span(span),
            text.chars().count()
        );
    }
    Ok(())
}

/// Units of `text` with their byte spans.
pub fn split_units(
    text: &str,
    mode: SplitMode,
    max_chars: usize,
    protected: &[String],
) -> Vec<(Range<usize>, String)> {
    match mode {
        SplitMode::Speech => split_for_speech(text, max_chars, protected)
            .into_iter()
            .map(|s| (s.span, s.text))
            .collect(),
        SplitMode::Display => split_for_display(text, max_chars, protected)
            .into_iter()
            .map(|c| (c.span, c.text))
            .collect(),
    }
}
