//! Mailbox names, LIST data and EXAMINE/SELECT status.

use std::fmt;

use super::{Flag, utf7};

/// Mailbox name as sent on the wire (modified UTF-7).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mailbox(String);

impl Mailbox {
    /// Wraps a name exactly as the server sent it.
    #[must_use]
    pub fn from_wire(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Encodes a human-readable name for use on the wire.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self(utf7::encode(name))
    }

    /// The INBOX mailbox.
    #[must_use]
    pub fn inbox() -> Self {
        Self("INBOX".to_string())
    }

    /// Returns the wire form of the name.
    #[must_use]
    pub fn as_wire(&self) -> &str {
        &self.0
    }

    /// Returns the decoded name, or the wire form if it is not valid modified UTF-7.
    #[must_use]
    pub fn name(&self) -> String {
        utf7::decode(&self.0).unwrap_or_else(|| self.0.clone())
    }
}

impl fmt::Display for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Mailbox attribute from a LIST response.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MailboxAttribute {
    /// `\Noselect`: the name exists only as a hierarchy node.
    NoSelect,
    /// `\NonExistent` (RFC 5258)
    NonExistent,
    /// `\HasChildren`
    HasChildren,
    /// `\HasNoChildren`
    HasNoChildren,
    /// `\Marked`
    Marked,
    /// `\Unmarked`
    Unmarked,
    /// `\All` (RFC 6154)
    All,
    /// `\Archive` (RFC 6154)
    Archive,
    /// `\Drafts` (RFC 6154)
    Drafts,
    /// `\Flagged` (RFC 6154)
    Flagged,
    /// `\Junk` (RFC 6154)
    Junk,
    /// `\Sent` (RFC 6154)
    Sent,
    /// `\Trash` (RFC 6154)
    Trash,
    /// Any other attribute, kept verbatim.
    Other(String),
}

impl MailboxAttribute {
    /// Parses an attribute atom such as `\Noselect`.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "\\NOSELECT" => Self::NoSelect,
            "\\NONEXISTENT" => Self::NonExistent,
            "\\HASCHILDREN" => Self::HasChildren,
            "\\HASNOCHILDREN" => Self::HasNoChildren,
            "\\MARKED" => Self::Marked,
            "\\UNMARKED" => Self::Unmarked,
            "\\ALL" => Self::All,
            "\\ARCHIVE" => Self::Archive,
            "\\DRAFTS" => Self::Drafts,
            "\\FLAGGED" => Self::Flagged,
            "\\JUNK" => Self::Junk,
            "\\SENT" => Self::Sent,
            "\\TRASH" => Self::Trash,
            _ => Self::Other(s.to_string()),
        }
    }

    /// Returns the attribute as it appears on the wire.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::NoSelect => "\\Noselect",
            Self::NonExistent => "\\NonExistent",
            Self::HasChildren => "\\HasChildren",
            Self::HasNoChildren => "\\HasNoChildren",
            Self::Marked => "\\Marked",
            Self::Unmarked => "\\Unmarked",
            Self::All => "\\All",
            Self::Archive => "\\Archive",
            Self::Drafts => "\\Drafts",
            Self::Flagged => "\\Flagged",
            Self::Junk => "\\Junk",
            Self::Sent => "\\Sent",
            Self::Trash => "\\Trash",
            Self::Other(s) => s,
        }
    }

    /// Compares against a user-supplied attribute name.
    ///
    /// Case-insensitive, and the leading backslash is optional.
    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        let ours = self.as_str().trim_start_matches('\\');
        ours.eq_ignore_ascii_case(name.trim().trim_start_matches('\\'))
    }
}

/// LIST response data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListResponse {
    /// Mailbox attributes.
    pub attributes: Vec<MailboxAttribute>,
    /// Hierarchy delimiter, `None` for a flat namespace.
    pub delimiter: Option<char>,
    /// Mailbox name.
    pub mailbox: Mailbox,
}

impl ListResponse {
    /// Returns true if the mailbox can be selected.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self
            .attributes
            .iter()
            .any(|a| matches!(a, MailboxAttribute::NoSelect | MailboxAttribute::NonExistent))
    }
}

/// Mailbox status collected from an EXAMINE exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
    /// Number of recent messages.
    pub recent: u32,
    /// Flags defined for this mailbox.
    pub flags: Vec<Flag>,
    /// Whether the mailbox was opened read-only.
    pub read_only: bool,
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
    fn mailbox_round_trips_international_name() {
        let mb = Mailbox::from_name("Entwürfe");
        assert_eq!(mb.as_wire(), "Entw&APw-rfe");
        assert_eq!(mb.name(), "Entwürfe");
        assert_eq!(mb.to_string(), "Entwürfe");
    }

    #[test]
    fn mailbox_invalid_utf7_falls_back_to_wire() {
        let mb = Mailbox::from_wire("Broken&***-");
        assert_eq!(mb.name(), "Broken&***-");
    }

    #[test]
    fn attribute_parse_is_case_insensitive() {
        assert_eq!(MailboxAttribute::parse("\\NOSELECT"), MailboxAttribute::NoSelect);
        assert_eq!(MailboxAttribute::parse("\\Junk"), MailboxAttribute::Junk);
        assert_eq!(
            MailboxAttribute::parse("\\Important"),
            MailboxAttribute::Other("\\Important".to_string())
        );
    }

    #[test]
    fn attribute_matches_user_names() {
        assert!(MailboxAttribute::Junk.matches("\\Junk"));
        assert!(MailboxAttribute::Junk.matches("junk"));
        assert!(MailboxAttribute::Other("\\Important".to_string()).matches("\\IMPORTANT"));
        assert!(!MailboxAttribute::Trash.matches("\\Junk"));
    }

    #[test]
    fn list_response_selectable() {
        let list = ListResponse {
            attributes: vec![MailboxAttribute::HasChildren],
            delimiter: Some('/'),
            mailbox: Mailbox::from_wire("[Gmail]"),
        };
        assert!(list.is_selectable());

        let list = ListResponse {
            attributes: vec![MailboxAttribute::NoSelect, MailboxAttribute::HasChildren],
            ..list
        };
        assert!(!list.is_selectable());
    }
}
