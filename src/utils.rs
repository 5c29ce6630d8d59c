//! Shared formatting helpers.

use std::borrow::Cow;

/// Formats a duration in seconds into a human-readable string.
///
/// `3661` becomes `"1h 1m 1s"`, `61` becomes `"1m 1s"`, `30` becomes `"30s"`.
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    match (hours, minutes) {
        (0, 0) => format!("{}s", secs),
        (0, _) => format!("{}m {}s", minutes, secs),
        _ => format!("{}h {}m {}s", hours, minutes, secs),
    }
}

/// Truncates a string to at most `max_len` characters, appending "..." if
/// truncated.
///
/// Returns a `Cow<str>` to avoid allocation when no truncation is needed.
pub fn truncate(s: &str, max_len: usize) -> Cow<'_, str> {
    if s.chars().count() <= max_len {
        Cow::Borrowed(s)
    } else if max_len <= 3 {
        Cow::Owned(s.chars().take(max_len).collect())
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        Cow::Owned(format!("{}...", head))
    }
}
