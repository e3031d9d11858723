//! Table formatting utilities for CLI output.

use std::time::Duration;

/// Truncates a string to a maximum number of characters, adding "..." if
/// needed.
///
/// # Examples
///
/// ```rust
/// use dictee_cli::presentation::truncate_string;
///
/// assert_eq!(truncate_string("Hello", 10), "Hello");
/// assert_eq!(truncate_string("Hello World", 8), "Hello...");
/// ```
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Format an optional value for table display, returning a default if None.
pub fn format_optional<T: std::fmt::Display>(value: &Option<T>, default: &str) -> String {
    value
        .as_ref()
        .map_or_else(|| default.to_string(), ToString::to_string)
}

/// `mm:ss`, or `h:mm:ss` past the hour.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

pub const fn difficulty_label(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "facile",
        2 => "moyen",
        _ => "difficile",
    }
}
