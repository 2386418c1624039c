//! Table formatting utilities for CLI output.

use std::ops::Range;

/// Truncates a string to at most `max_chars` characters, adding "..." if
/// needed.
///
/// # Examples
///
/// ```rust
/// use narrator_cli::presentation::truncate_chars;
///
/// assert_eq!(truncate_chars("Bonjour", 10), "Bonjour");
/// assert_eq!(truncate_chars("Chemin de Vie", 9), "Chemin...");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// `start..end` padded for table columns.
pub fn format_span(span: &Range<usize>) -> String {
    format!("{:>5}..{:<5}", span.start, span.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_characters() {
        assert_eq!(truncate_chars("écoutez", 7), "écoutez");
        assert_eq!(truncate_chars("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_format_span() {
        assert_eq!(format_span(&(3..42)), "    3..42   ");
    }
}
