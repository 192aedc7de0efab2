//! Windowed access to a resolved body.
//!
//! Offsets and lengths count Unicode scalar values, so a window never splits
//! a multi-byte character.

use serde::{Deserialize, Serialize};

/// A slice of a body plus the metadata needed to request the next one.
///
/// `text` is `None` both when the message has no body and when the caller
/// asked for a zero-length window. Callers tell those apart through
/// `total_length`, which is `0` only for a missing or empty body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyWindow {
    /// Requested slice of the body.
    pub text: Option<String>,
    /// Length of the full body in characters.
    pub total_length: usize,
    /// Whether characters remain after this window.
    pub has_more: bool,
}

/// Slices `body` into the window `[offset, offset + limit)`.
///
/// Windows past the end are clamped rather than rejected.
pub fn paginate(body: Option<&str>, offset: usize, limit: usize) -> BodyWindow {
    let Some(body) = body else {
        return BodyWindow {
            text: None,
            total_length: 0,
            has_more: false,
        };
    };

    let total_length = body.chars().count();
    if limit == 0 {
        return BodyWindow {
            text: None,
            total_length,
            has_more: false,
        };
    }

    let end = offset.saturating_add(limit);
    let text: String = body.chars().skip(offset).take(limit).collect();

    BodyWindow {
        text: Some(text),
        total_length,
        has_more: end < total_length,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_body() {
        let window = paginate(None, 5, 10);
        assert_eq!(window.text, None);
        assert_eq!(window.total_length, 0);
        assert!(!window.has_more);
    }

    #[test]
    fn zero_limit_reports_length_only() {
        let window = paginate(Some("hello"), 0, 0);
        assert_eq!(window.text, None);
        assert_eq!(window.total_length, 5);
        assert!(!window.has_more);
    }

    #[test]
    fn zero_limit_on_empty_body_reports_zero_length() {
        let window = paginate(Some(""), 0, 0);
        assert_eq!(window.text, None);
        assert_eq!(window.total_length, 0);
    }

    #[test]
    fn middle_window() {
        let body: String = (0..100).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let window = paginate(Some(&body), 10, 20);

        assert_eq!(window.text.as_deref(), Some(&body[10..30]));
        assert_eq!(window.text.as_ref().map(String::len), Some(20));
        assert_eq!(window.total_length, 100);
        assert!(window.has_more);
    }

    #[test]
    fn final_window_is_short() {
        let window = paginate(Some("0123456789"), 8, 5);
        assert_eq!(window.text.as_deref(), Some("89"));
        assert!(!window.has_more);
    }

    #[test]
    fn exact_end_has_no_more() {
        let window = paginate(Some("0123456789"), 5, 5);
        assert_eq!(window.text.as_deref(), Some("56789"));
        assert!(!window.has_more);
    }

    #[test]
    fn offset_past_end_is_empty() {
        let window = paginate(Some("short"), 50, 10);
        assert_eq!(window.text.as_deref(), Some(""));
        assert_eq!(window.total_length, 5);
        assert!(!window.has_more);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let window = paginate(Some("héllo wörld"), 1, 4);
        assert_eq!(window.text.as_deref(), Some("éllo"));
        assert_eq!(window.total_length, 11);
        assert!(window.has_more);
    }

    #[test]
    fn huge_limit_does_not_overflow() {
        let window = paginate(Some("abc"), 1, usize::MAX);
        assert_eq!(window.text.as_deref(), Some("bc"));
        assert!(!window.has_more);
    }
}
