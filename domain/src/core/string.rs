//! String helpers for log lines and terminal previews.

/// Collapse whitespace runs (including newlines) into single spaces and cut
/// the result to at most `max_chars` characters, appending `...` when cut.
pub fn preview(s: &str, max_chars: usize) -> String {
    let flat = s.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = flat.chars().take(keep).collect();
    out.push_str("...");
    out
}
