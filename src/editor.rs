// editor.rs: Text operations behind a timestamp-authoring editor.
//
// The host owns the widget; these functions work on its plain text and
// byte-offset cursor. Authoring flow: placeholders are typed (or inserted)
// ahead of time, then stamped one by one while the song plays.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

/// An empty bracket pair marks "timestamp goes here".
pub const PLACEHOLDER: &str = "[]";

// A placeholder or an already-stamped marker, either precision.
static STAMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[(\d{2}:\d{2}(\.\d{2})?)?\]").unwrap());

/// The result of [`stamp_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamped {
    pub text: String,
    /// Cursor after the edit: the start of the following token when one
    /// exists, else the end of the replacement marker.
    pub cursor: usize,
}

/// Insert a placeholder at `at` (a char boundary) and return the new text
/// with the cursor placed just past it.
pub fn insert_placeholder(text: &str, at: usize) -> (String, usize) {
    let mut out = String::with_capacity(text.len() + PLACEHOLDER.len());
    out.push_str(&text[..at]);
    out.push_str(PLACEHOLDER);
    out.push_str(&text[at..]);
    (out, at + PLACEHOLDER.len())
}

/// Byte range of the next placeholder or timestamp token at or after
/// `from`.
pub fn find_stamp(text: &str, from: usize) -> Option<Range<usize>> {
    if from > text.len() {
        return None;
    }
    STAMP.find_at(text, from).map(|m| m.range())
}

/// Replace the next token at or after `from` with a high-precision marker
/// for `now_ms`, as the stamp key does while the song plays. `None` when
/// nothing is left to stamp.
pub fn stamp_next(text: &str, from: usize, now_ms: u64) -> Option<Stamped> {
    let target = find_stamp(text, from)?;
    let marker = format_stamp(now_ms);
    let mut out = String::with_capacity(text.len() + marker.len());
    out.push_str(&text[..target.start]);
    out.push_str(&marker);
    out.push_str(&text[target.end..]);
    let after = target.start + marker.len();
    let cursor = find_stamp(&out, after).map_or(after, |next| next.start);
    Some(Stamped { text: out, cursor })
}

/// Remove leftover placeholders, leaving text ready for parsing.
pub fn strip_placeholders(text: &str) -> String {
    text.replace(PLACEHOLDER, "")
}

fn format_stamp(now_ms: u64) -> String {
    format!(
        "[{:02}:{:02}.{:02}]",
        now_ms / 60_000,
        now_ms / 1_000 % 60,
        now_ms / 10 % 100
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_places_the_cursor_past_the_placeholder() {
        assert_eq!(insert_placeholder("hello", 5), ("hello[]".to_string(), 7));
        assert_eq!(insert_placeholder("hello", 0), ("[]hello".to_string(), 2));
    }

    #[test]
    fn find_stamp_matches_every_token_form() {
        let text = "a[]b[00:01]c[00:01.50]d";
        assert_eq!(find_stamp(text, 0), Some(1..3));
        assert_eq!(find_stamp(text, 3), Some(4..11));
        assert_eq!(find_stamp(text, 11), Some(12..22));
        assert_eq!(find_stamp(text, 22), None);
        assert_eq!(find_stamp("[0:1]", 0), None);
    }

    #[test]
    fn stamp_replaces_the_next_token() {
        let stamped = stamp_next("[]Hello\n[]World", 0, 61_230).unwrap();
        assert_eq!(stamped.text, "[01:01.23]Hello\n[]World");
        // Cursor jumps to the next placeholder, ready for the next tap.
        assert_eq!(stamped.cursor, 16);
    }

    #[test]
    fn stamp_cursor_stays_put_when_nothing_follows() {
        let stamped = stamp_next("intro[]", 0, 500).unwrap();
        assert_eq!(stamped.text, "intro[00:00.50]");
        assert_eq!(stamped.cursor, stamped.text.len());
    }

    #[test]
    fn stamp_overwrites_existing_markers() {
        let stamped = stamp_next("x[00:09]y", 0, 1_000).unwrap();
        assert_eq!(stamped.text, "x[00:01.00]y");
        assert_eq!(stamped.cursor, 11);
    }

    #[test]
    fn stamp_without_tokens_is_none() {
        assert_eq!(stamp_next("no tokens here", 0, 0), None);
    }

    #[test]
    fn strip_only_removes_empty_brackets() {
        assert_eq!(strip_placeholders("[]a[00:01]b[]"), "a[00:01]b");
    }

    #[test]
    fn authoring_flow_inserts_then_stamps_in_order() {
        let (text, _) = insert_placeholder("Hello\nWorld\n", 0);
        let (text, _) = insert_placeholder(&text, 8);
        assert_eq!(text, "[]Hello\n[]World\n");
        let first = stamp_next(&text, 0, 1_000).unwrap();
        assert_eq!(first.text, "[00:01.00]Hello\n[]World\n");
        assert_eq!(first.cursor, 16);
        let second = stamp_next(&first.text, first.cursor, 2_500).unwrap();
        assert_eq!(second.text, "[00:01.00]Hello\n[00:02.50]World\n");
        assert_eq!(second.cursor, 26);
    }
}
