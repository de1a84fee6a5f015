use std::borrow::Cow;

/// Ellipsis string appended on truncation
const ELLIPSIS: &str = "...";

/// Truncates a string to at most `max_chars` characters, appending "..." when cut.
///
/// Counts Unicode scalar values, so multi-byte characters are never split.
/// The ellipsis is appended *after* the kept prefix, so a truncated result is
/// `max_chars + 3` characters long.
///
/// # Returns
///
/// - `Cow::Borrowed(s)` if `s` has at most `max_chars` characters (no allocation)
/// - `Cow::Owned` with the first `max_chars` characters followed by `...` otherwise
///
/// # Examples
///
/// ```
/// use blogwire::util::truncate_chars;
///
/// assert_eq!(truncate_chars("Short", 10), "Short");
/// assert_eq!(truncate_chars("Hello World", 5), "Hello...");
/// assert_eq!(truncate_chars("日本語テキスト", 3), "日本語...");
/// ```
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS)),
        None => Cow::Borrowed(s),
    }
}

/// Collapses every run of whitespace into a single ASCII space and trims both ends.
///
/// Returns `Cow::Borrowed` when the input is already normalized (common for
/// short titles), avoiding an allocation.
pub fn collapse_whitespace(s: &str) -> Cow<'_, str> {
    let trimmed = s.trim();

    // Fast path: nothing to trim, no double spaces, no tabs/newlines
    let needs_collapse = trimmed.len() != s.len()
        || trimmed.contains("  ")
        || trimmed.chars().any(|c| c.is_whitespace() && c != ' ');

    if !needs_collapse {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(trimmed.len());
    for word in trimmed.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(word);
    }
    Cow::Owned(out)
}
