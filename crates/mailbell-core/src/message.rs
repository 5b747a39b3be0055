//! Message and notification models.

use mailbell_imap::Uid;
use mailbell_mime::Headers;

/// Title used when a message has no `From`.
pub const UNKNOWN_SENDER: &str = "(unknown sender)";
/// Text used when a message has no `Subject`.
pub const NO_SUBJECT: &str = "(no subject)";

/// An unseen message, reduced to what a notification shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSummary {
    /// Message UID in its mailbox.
    pub uid: Uid,
    /// Decoded mailbox name.
    pub mailbox: String,
    /// Decoded `From`.
    pub from: Option<String>,
    /// Decoded `Subject`.
    pub subject: Option<String>,
}

impl MessageSummary {
    /// Builds a summary from a raw header block.
    #[must_use]
    pub fn from_header(uid: Uid, mailbox: impl Into<String>, raw: &[u8]) -> Self {
        let headers = Headers::from_bytes(raw);
        let field = |name: &str| headers.decoded(name).filter(|v| !v.trim().is_empty());

        Self {
            uid,
            mailbox: mailbox.into(),
            from: field("From"),
            subject: field("Subject"),
        }
    }
}

/// Title and body of one notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// Notification title.
    pub title: String,
    /// Notification text.
    pub body: String,
}

impl From<&MessageSummary> for NotificationEvent {
    fn from(message: &MessageSummary) -> Self {
        Self {
            title: message
                .from
                .clone()
                .unwrap_or_else(|| UNKNOWN_SENDER.to_string()),
            body: message
                .subject
                .clone()
                .unwrap_or_else(|| NO_SUBJECT.to_string()),
        }
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

    fn uid(n: u32) -> Uid {
        Uid::new(n).unwrap()
    }

    #[test]
    fn test_summary_decodes_headers() {
        let raw = b"From: =?UTF-8?Q?J=C3=BCrgen?= <j@example.de>\r\n\
                    Subject: =?ISO-8859-1?B?UmFwcG9ydCBm9nIgbWFq?=\r\n\r\n";
        let summary = MessageSummary::from_header(uid(7), "INBOX", raw);
        assert_eq!(summary.uid, uid(7));
        assert_eq!(summary.mailbox, "INBOX");
        assert_eq!(summary.from.as_deref(), Some("Jürgen <j@example.de>"));
        assert_eq!(summary.subject.as_deref(), Some("Rapport för maj"));
    }

    #[test]
    fn test_summary_missing_fields() {
        let summary = MessageSummary::from_header(uid(1), "INBOX", b"Subject:   \r\n\r\n");
        assert_eq!(summary.from, None);
        assert_eq!(summary.subject, None);

        let event = NotificationEvent::from(&summary);
        assert_eq!(event.title, UNKNOWN_SENDER);
        assert_eq!(event.body, NO_SUBJECT);
    }

    #[test]
    fn test_event_from_summary() {
        let summary = MessageSummary {
            uid: uid(3),
            mailbox: "INBOX".into(),
            from: Some("Alice <alice@example.com>".into()),
            subject: Some("Lunch?".into()),
        };
        let event = NotificationEvent::from(&summary);
        assert_eq!(event.title, "Alice <alice@example.com>");
        assert_eq!(event.body, "Lunch?");
    }
}
