/// Appended to every truncated text so consumers know content was dropped.
pub const TRUNCATION_MARKER: &str = "\n\n[Output truncated: content exceeded the size limit]";

/// Paragraph and sentence breaks are only used when they keep at least this share of the window.
pub const BOUNDARY_MIN_RATIO: f64 = 0.7;
/// Word breaks are only used when they keep at least this share of the window.
pub const WORD_MIN_RATIO: f64 = 0.5;

/// Cap `text` at `max_chars` characters, marker included.
///
/// Returns the text unchanged when it already fits. Otherwise keeps a prefix, preferring to cut
/// at a paragraph break, then a sentence end, then a word boundary, and falls back to a hard cut.
pub fn truncate_with_marker(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let marker_chars = TRUNCATION_MARKER.chars().count();
    if max_chars <= marker_chars {
        return TRUNCATION_MARKER
            .trim_start()
            .chars()
            .take(max_chars)
            .collect();
    }

    let window = prefix_chars(text, max_chars - marker_chars);
    let cut = break_point(window);
    format!("{}{TRUNCATION_MARKER}", &window[..cut])
}

/// Truncate text that may already end with the marker, keeping exactly one marker.
///
/// The kept content stays a prefix of the content before the first truncation.
pub fn retruncate(text: &str, max_chars: usize) -> String {
    let Some(base) = text.strip_suffix(TRUNCATION_MARKER) else {
        return truncate_with_marker(text, max_chars);
    };

    let budget = max_chars.saturating_sub(TRUNCATION_MARKER.chars().count());
    let window = prefix_chars(base, budget);
    let cut = if window.len() == base.len() {
        window.len()
    } else {
        break_point(window)
    };
    format!("{}{TRUNCATION_MARKER}", &window[..cut])
}

/// Whether [`truncate_with_marker`] changed the text.
pub fn is_truncated(text: &str) -> bool {
    text.ends_with(TRUNCATION_MARKER)
}

fn prefix_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Byte offset at which to cut `window`.
fn break_point(window: &str) -> usize {
    let len = window.len();
    // Byte lengths; thresholds only need to be proportional.
    let boundary_min = (len as f64 * BOUNDARY_MIN_RATIO) as usize;
    let word_min = (len as f64 * WORD_MIN_RATIO) as usize;

    if let Some(idx) = window.rfind("\n\n").filter(|&idx| idx >= boundary_min) {
        return idx;
    }
    if let Some(idx) = last_sentence_end(window).filter(|&idx| idx >= boundary_min) {
        return idx;
    }
    if let Some(idx) = window
        .rfind(char::is_whitespace)
        .filter(|&idx| idx >= word_min)
    {
        return idx;
    }
    len
}

/// Offset just past the last `.`, `!` or `?` that is followed by whitespace.
fn last_sentence_end(window: &str) -> Option<usize> {
    window
        .char_indices()
        .rev()
        .find(|&(idx, c)| {
            matches!(c, '.' | '!' | '?') && window[idx + 1..].starts_with(char::is_whitespace)
        })
        .map(|(idx, _)| idx + 1)
}
