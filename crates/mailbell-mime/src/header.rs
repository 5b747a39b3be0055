//! Mail header handling.

use crate::encoding::decode_rfc2047;
use std::collections::HashMap;

/// Collection of email headers.
///
/// Field names are case-insensitive. Values are stored unfolded but not
/// yet decoded.
#[derive(Debug, Clone, Default)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_lowercase();
        let value = value.into();
        self.headers.entry(name).or_default().push(value);
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Gets the first value for a header with encoded words decoded.
    #[must_use]
    pub fn decoded(&self, name: &str) -> Option<String> {
        self.get(name).map(decode_rfc2047)
    }

    /// Returns the number of distinct field names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Returns true if no header was parsed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parses a raw header block as returned by an IMAP `BODY[HEADER]` fetch.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    #[must_use]
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(raw))
    }

    /// Parses headers from raw text.
    ///
    /// Headers are in the format:
    /// ```text
    /// Header-Name: value
    ///   continuation
    /// ```
    ///
    /// Continuation lines are unfolded into the preceding value. Parsing
    /// stops at the first empty line. Lines without a colon are ignored.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut headers = Self::new();
        let mut current_name: Option<String> = None;
        let mut current_value = String::new();

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if current_name.is_some() {
                    current_value.push(' ');
                    current_value.push_str(line.trim());
                }
                continue;
            }

            if let Some(name) = current_name.take() {
                headers.add(name, current_value.trim());
                current_value.clear();
            }

            if let Some((name, value)) = line.split_once(':') {
                current_name = Some(name.trim().to_string());
                current_value = value.trim().to_string();
            }
        }

        if let Some(name) = current_name {
            headers.add(name, current_value.trim());
        }

        headers
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_headers_new() {
        let headers = Headers::new();
        assert!(headers.is_empty());
    }

    #[test]
    fn test_headers_add_get() {
        let mut headers = Headers::new();
        headers.add("Subject", "hello");
        assert_eq!(headers.get("Subject"), Some("hello"));
        assert_eq!(headers.get("subject"), Some("hello"));
        assert_eq!(headers.get("SUBJECT"), Some("hello"));
        assert_eq!(headers.get("From"), None);
    }

    #[test]
    fn test_headers_get_all() {
        let mut headers = Headers::new();
        headers.add("Received", "from a");
        headers.add("received", "from b");
        assert_eq!(headers.get_all("Received"), vec!["from a", "from b"]);
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_headers_parse() {
        let text = "From: alice@example.com\r\nSubject: Lunch?\r\n\r\n";
        let headers = Headers::parse(text);
        assert_eq!(headers.get("From"), Some("alice@example.com"));
        assert_eq!(headers.get("Subject"), Some("Lunch?"));
    }

    #[test]
    fn test_headers_parse_folded() {
        let text = "Subject: a very\r\n long\r\n\tsubject\r\nFrom: bob@example.com\r\n";
        let headers = Headers::parse(text);
        assert_eq!(headers.get("Subject"), Some("a very long subject"));
        assert_eq!(headers.get("From"), Some("bob@example.com"));
    }

    #[test]
    fn test_headers_parse_stops_at_blank_line() {
        let text = "Subject: first\n\nSubject: body text\n";
        let headers = Headers::parse(text);
        assert_eq!(headers.get_all("Subject"), vec!["first"]);
    }

    #[test]
    fn test_headers_parse_value_with_colon() {
        let headers = Headers::parse("Subject: Re: Fwd: plans\r\n");
        assert_eq!(headers.get("Subject"), Some("Re: Fwd: plans"));
    }

    #[test]
    fn test_headers_parse_empty_value() {
        let headers = Headers::parse("Subject:\r\nFrom: x@example.com\r\n");
        assert_eq!(headers.get("Subject"), Some(""));
    }

    #[test]
    fn test_headers_decoded_folded_words() {
        let raw = b"Subject: =?utf-8?Q?Caf=C3=A9?=\r\n =?utf-8?Q?_ouvert?=\r\n\r\n";
        let headers = Headers::from_bytes(raw);
        assert_eq!(headers.decoded("subject").as_deref(), Some("Café ouvert"));
    }

    #[test]
    fn test_headers_from_bytes_invalid_utf8() {
        let raw = b"Subject: caf\xE9\r\n";
        let headers = Headers::from_bytes(raw);
        assert_eq!(headers.get("Subject"), Some("caf\u{FFFD}"));
    }
}
