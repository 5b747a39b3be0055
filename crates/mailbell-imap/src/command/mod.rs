//! IMAP commands and their wire serialization.

mod tag;

use crate::types::{Mailbox, UidSet};

pub use tag::TagGenerator;

/// Search key for `UID SEARCH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriteria {
    /// `UNSEEN`
    Unseen,
}

/// Data item requested by `UID FETCH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchAttribute {
    /// `UID`
    Uid,
    /// `BODY.PEEK[HEADER]`, or `BODY.PEEK[HEADER.FIELDS (...)]` when fields are given.
    ///
    /// `PEEK` keeps the server from setting `\Seen`.
    HeaderPeek(Vec<String>),
}

/// IMAP command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `CAPABILITY`
    Capability,
    /// `LOGOUT`
    Logout,
    /// `STARTTLS`
    StartTls,
    /// `LOGIN user password`
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// `LIST reference pattern`
    List {
        /// Reference name, usually empty.
        reference: String,
        /// Mailbox pattern with `*`/`%` wildcards.
        pattern: String,
    },
    /// `EXAMINE mailbox`, a read-only SELECT
    Examine(Mailbox),
    /// `CLOSE`
    Close,
    /// `UID SEARCH criteria`
    UidSearch(SearchCriteria),
    /// `UID FETCH set (items)`
    UidFetch {
        /// Messages to fetch.
        uids: UidSet,
        /// Requested data items.
        items: Vec<FetchAttribute>,
    },
}

impl Command {
    /// Serializes the command with the given tag, including the trailing CRLF.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');

        match self {
            Self::Capability => buf.extend_from_slice(b"CAPABILITY"),
            Self::Logout => buf.extend_from_slice(b"LOGOUT"),
            Self::StartTls => buf.extend_from_slice(b"STARTTLS"),
            Self::Close => buf.extend_from_slice(b"CLOSE"),
            Self::Login { username, password } => {
                buf.extend_from_slice(b"LOGIN ");
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::List { reference, pattern } => {
                buf.extend_from_slice(b"LIST ");
                write_astring(&mut buf, reference);
                buf.push(b' ');
                write_list_mailbox(&mut buf, pattern);
            }
            Self::Examine(mailbox) => {
                buf.extend_from_slice(b"EXAMINE ");
                write_astring(&mut buf, mailbox.as_wire());
            }
            Self::UidSearch(criteria) => {
                buf.extend_from_slice(b"UID SEARCH ");
                write_search(&mut buf, *criteria);
            }
            Self::UidFetch { uids, items } => {
                buf.extend_from_slice(b"UID FETCH ");
                buf.extend_from_slice(uids.to_string().as_bytes());
                buf.extend_from_slice(b" (");
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    write_fetch_attribute(&mut buf, item);
                }
                buf.push(b')');
            }
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }

    /// Returns a form of the command that is safe to log.
    #[must_use]
    pub fn redacted(&self) -> String {
        match self {
            Self::Login { username, .. } => format!("LOGIN {username} ****"),
            other => {
                let bytes = other.serialize("");
                String::from_utf8_lossy(&bytes).trim().to_string()
            }
        }
    }
}

/// Writes an astring, quoting it when it is not a plain atom.
///
/// 8-bit bytes go out inside the quoted string; servers without UTF-8
/// support reject them with BAD, which is reported as a protocol error.
fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(|b| needs_quoting(b) || !b.is_ascii()) {
        write_quoted(buf, s);
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Like [`write_astring`] but leaves the `*` and `%` wildcards unquoted.
fn write_list_mailbox(buf: &mut Vec<u8>, pattern: &str) {
    if !pattern.is_empty()
        && pattern
            .bytes()
            .all(|b| b == b'*' || b == b'%' || !needs_quoting(b))
    {
        buf.extend_from_slice(pattern.as_bytes());
    } else {
        write_quoted(buf, pattern);
    }
}

fn write_quoted(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for b in s.bytes() {
        if b == b'"' || b == b'\\' {
            buf.push(b'\\');
        }
        buf.push(b);
    }
    buf.push(b'"');
}

const fn needs_quoting(b: u8) -> bool {
    matches!(
        b,
        b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'}' | b'%' | b'*' | b']'
    ) || b < 0x20
        || b == 0x7f
}

fn write_search(buf: &mut Vec<u8>, criteria: SearchCriteria) {
    match criteria {
        SearchCriteria::Unseen => buf.extend_from_slice(b"UNSEEN"),
    }
}

fn write_fetch_attribute(buf: &mut Vec<u8>, attr: &FetchAttribute) {
    match attr {
        FetchAttribute::Uid => buf.extend_from_slice(b"UID"),
        FetchAttribute::HeaderPeek(fields) if fields.is_empty() => {
            buf.extend_from_slice(b"BODY.PEEK[HEADER]");
        }
        FetchAttribute::HeaderPeek(fields) => {
            buf.extend_from_slice(b"BODY.PEEK[HEADER.FIELDS (");
            buf.extend_from_slice(fields.join(" ").as_bytes());
            buf.extend_from_slice(b")]");
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
    use crate::types::Uid;

    fn wire(cmd: &Command) -> String {
        String::from_utf8(cmd.serialize("A0001")).unwrap()
    }

    #[test]
    fn login_plain_and_quoted() {
        let cmd = Command::Login {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        };
        assert_eq!(wire(&cmd), "A0001 LOGIN alice s3cret\r\n");

        let cmd = Command::Login {
            username: "alice@example.com".to_string(),
            password: "with space \"and\" quote".to_string(),
        };
        assert_eq!(
            wire(&cmd),
            "A0001 LOGIN alice@example.com \"with space \\\"and\\\" quote\"\r\n"
        );
    }

    #[test]
    fn login_non_ascii_password_is_quoted() {
        let cmd = Command::Login {
            username: "bob".to_string(),
            password: "pässword".to_string(),
        };
        assert_eq!(wire(&cmd), "A0001 LOGIN bob \"pässword\"\r\n");
    }

    #[test]
    fn login_is_redacted() {
        let cmd = Command::Login {
            username: "alice".to_string(),
            password: "s3cret".to_string(),
        };
        assert_eq!(cmd.redacted(), "LOGIN alice ****");
        assert_eq!(Command::Close.redacted(), "CLOSE");
    }

    #[test]
    fn list_all() {
        let cmd = Command::List {
            reference: String::new(),
            pattern: "*".to_string(),
        };
        assert_eq!(wire(&cmd), "A0001 LIST \"\" *\r\n");
    }

    #[test]
    fn examine_quotes_brackets_and_spaces() {
        let cmd = Command::Examine(Mailbox::from_name("[Gmail]/All Mail"));
        assert_eq!(wire(&cmd), "A0001 EXAMINE \"[Gmail]/All Mail\"\r\n");
        let cmd = Command::Examine(Mailbox::inbox());
        assert_eq!(wire(&cmd), "A0001 EXAMINE INBOX\r\n");
    }

    #[test]
    fn examine_encodes_international_name() {
        let cmd = Command::Examine(Mailbox::from_name("Entwürfe"));
        assert_eq!(wire(&cmd), "A0001 EXAMINE Entw&APw-rfe\r\n");
    }

    #[test]
    fn uid_search_unseen() {
        let cmd = Command::UidSearch(SearchCriteria::Unseen);
        assert_eq!(wire(&cmd), "A0001 UID SEARCH UNSEEN\r\n");
    }

    #[test]
    fn uid_fetch_header_fields() {
        let uids = UidSet::from_uids([3, 4, 9].map(|n| Uid::new(n).unwrap()));
        let cmd = Command::UidFetch {
            uids,
            items: vec![
                FetchAttribute::Uid,
                FetchAttribute::HeaderPeek(vec!["FROM".to_string(), "SUBJECT".to_string()]),
            ],
        };
        assert_eq!(
            wire(&cmd),
            "A0001 UID FETCH 3:4,9 (UID BODY.PEEK[HEADER.FIELDS (FROM SUBJECT)])\r\n"
        );
    }

    #[test]
    fn uid_fetch_whole_header() {
        let cmd = Command::UidFetch {
            uids: UidSet::from_uids([Uid::new(1).unwrap()]),
            items: vec![FetchAttribute::HeaderPeek(Vec::new())],
        };
        assert_eq!(wire(&cmd), "A0001 UID FETCH 1 (BODY.PEEK[HEADER])\r\n");
    }

    #[test]
    fn simple_commands() {
        assert_eq!(wire(&Command::Capability), "A0001 CAPABILITY\r\n");
        assert_eq!(wire(&Command::StartTls), "A0001 STARTTLS\r\n");
        assert_eq!(wire(&Command::Close), "A0001 CLOSE\r\n");
        assert_eq!(wire(&Command::Logout), "A0001 LOGOUT\r\n");
    }
}
