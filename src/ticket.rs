//! Ticket references and merge request types derived from MR titles.
//!
//! Both are best-effort metadata: a title without a recognizable reference
//! simply yields empty strings.

use compact_str::{CompactString, ToCompactString};
use once_cell::sync::Lazy;
use regex::Regex;

/// `ABC-1234`, `abc:123`, `abc/12`: letters, one separator, 2 to 5 digits.
static TICKET_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z]+[^0-9A-Za-z_][0-9]{2,5}").unwrap());

/// `feature/ABC-123`, anchored at the start of the title.
static TYPED_TICKET: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z]+[^0-9A-Za-z_][a-zA-Z]+[^0-9A-Za-z_][0-9]{2,5}").unwrap()
});

/// First ticket-like token in `title`, or an empty string.
pub fn extract_ticket_token(title: &str) -> CompactString {
    TICKET_TOKEN
        .find(title)
        .map(|m| m.as_str().to_compact_string())
        .unwrap_or_default()
}

/// Replaces `/`, ` ` and `:` with `-` and uppercases, e.g. `abc/123` -> `ABC-123`.
pub fn normalize_ticket_id(token: &str) -> CompactString {
    token
        .chars()
        .map(|c| match c {
            '/' | ' ' | ':' => '-',
            c => c,
        })
        .flat_map(char::to_uppercase)
        .collect()
}

/// Normalized ticket id referenced by `title`, or an empty string.
pub fn ticket_id(title: &str) -> CompactString {
    normalize_ticket_id(&extract_ticket_token(title))
}

/// Label in front of a leading typed reference: `feature/ABC-123: ...` -> `FEATURE`.
pub fn classify_type(title: &str) -> CompactString {
    let Some(typed) = TYPED_TICKET.find(title) else {
        return CompactString::default();
    };

    normalize_ticket_id(typed.as_str())
        .split('-')
        .next()
        .unwrap_or_default()
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_ticket_token() {
        assert_eq!(extract_ticket_token("Fix ABC-1234: bug"), "ABC-1234");
        assert_eq!(extract_ticket_token("abc:123 follow-up"), "abc:123");
        assert_eq!(extract_ticket_token("no ticket here"), "");
        assert_eq!(extract_ticket_token(""), "");
    }

    #[test]
    fn test_extract_ticket_token_digit_bounds() {
        // a single digit is not a ticket
        assert_eq!(extract_ticket_token("bump v-1"), "");
        assert_eq!(extract_ticket_token("JIRA-1234567"), "JIRA-12345");
    }

    #[test]
    fn test_normalize_ticket_id() {
        assert_eq!(normalize_ticket_id("abc/123"), "ABC-123");
        assert_eq!(normalize_ticket_id("abc:123"), "ABC-123");
        assert_eq!(normalize_ticket_id("abc 123"), "ABC-123");
        assert_eq!(normalize_ticket_id(""), "");
    }

    #[test]
    fn test_normalize_ticket_id_is_idempotent() {
        for token in ["ABC-1234", "abc/12", "Ops:99999", "x y"] {
            let once = normalize_ticket_id(token);
            assert_eq!(normalize_ticket_id(&once), once);
        }
    }

    #[test]
    fn test_ticket_id() {
        assert_eq!(ticket_id("Resolve abc/456 crash on start"), "ABC-456");
        assert_eq!(ticket_id("Update README"), "");
    }

    #[test]
    fn test_classify_type() {
        assert_eq!(classify_type("feature/ABC-123: add login"), "FEATURE");
        assert_eq!(classify_type("bugfix:OPS-42 null check"), "BUGFIX");
        assert_eq!(classify_type("ABC-123 only"), "");
        assert_eq!(classify_type("Draft: feature/ABC-123"), "");
        assert_eq!(classify_type(""), "");
    }
}
