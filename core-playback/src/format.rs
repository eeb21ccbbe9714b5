//! Display helpers for the presentation layer.

/// Default maximum title length used by [`truncate_title`].
pub const DEFAULT_TITLE_LENGTH: usize = 40;

/// Format seconds as `m:ss`. Non-positive and non-finite input yields an
/// empty string.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return String::new();
    }
    let total = seconds.floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

/// Shorten `title` to at most `max_len` characters, ending with `...` when
/// cut.
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        return title.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let mut out: String = title.chars().take(keep).collect();
    out.push_str("...");
    out
}
