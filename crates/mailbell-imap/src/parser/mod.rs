//! Sans-I/O parser for IMAP server responses.

mod fetch;
pub mod lexer;

use crate::Result;
use crate::types::{
    Capability, Flag, ListResponse, Mailbox, MailboxAttribute, ResponseCode, Status, Tag, Uid,
};

pub use fetch::FetchItem;
use lexer::{Lexer, Token};

/// A parsed server response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Completion of a command.
    Tagged {
        /// Tag of the completed command.
        tag: Tag,
        /// Completion status.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// Server data.
    Untagged(UntaggedResponse),
    /// Continuation request (`+`).
    Continuation {
        /// Text following the `+`.
        text: String,
    },
}

/// Untagged server data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK|NO|BAD|PREAUTH|BYE ...`
    Status {
        /// Status keyword.
        status: Status,
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY ...`
    Capability(Vec<Capability>),
    /// `* FLAGS (...)`
    Flags(Vec<Flag>),
    /// `* LIST (...) "/" name`
    List(ListResponse),
    /// `* SEARCH n n ...`
    Search(Vec<Uid>),
    /// `* n EXISTS`
    Exists(u32),
    /// `* n RECENT`
    Recent(u32),
    /// `* n EXPUNGE`
    Expunge(u32),
    /// `* n FETCH (...)`
    Fetch {
        /// Message sequence number.
        seq: u32,
        /// Returned data items.
        items: Vec<FetchItem>,
    },
    /// Any other untagged data; the keyword is kept for logging.
    Other(String),
}

/// Response parser.
pub struct ResponseParser;

impl ResponseParser {
    /// Parses one complete response, including embedded literals.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Parse`] if the response does not follow the grammar.
    pub fn parse(input: &[u8]) -> Result<Response> {
        let mut lexer = Lexer::new(input);

        match lexer.next_token()? {
            Token::Asterisk => {
                lexer.expect_space()?;
                Self::untagged(&mut lexer).map(Response::Untagged)
            }
            Token::Plus => {
                lexer.eat(b' ');
                Ok(Response::Continuation {
                    text: lexer.rest_of_line(),
                })
            }
            Token::Atom(tag) => {
                let tag = Tag::new(tag);
                lexer.expect_space()?;
                let keyword = lexer.atom()?;
                let status = Status::parse(keyword)
                    .ok_or_else(|| lexer.error(format!("invalid status {keyword}")))?;
                let (code, text) = Self::resp_text(&mut lexer)?;
                Ok(Response::Tagged {
                    tag,
                    status,
                    code,
                    text,
                })
            }
            token => Err(lexer.error(format!("expected *, + or tag, got {token:?}"))),
        }
    }

    fn untagged(lexer: &mut Lexer<'_>) -> Result<UntaggedResponse> {
        match lexer.next_token()? {
            Token::Number(n) => {
                lexer.expect_space()?;
                let keyword = lexer.atom()?.to_ascii_uppercase();
                match keyword.as_str() {
                    "EXISTS" => Ok(UntaggedResponse::Exists(n)),
                    "RECENT" => Ok(UntaggedResponse::Recent(n)),
                    "EXPUNGE" => Ok(UntaggedResponse::Expunge(n)),
                    "FETCH" => {
                        lexer.expect_space()?;
                        let items = fetch::parse_fetch(lexer)?;
                        Ok(UntaggedResponse::Fetch { seq: n, items })
                    }
                    _ => Ok(UntaggedResponse::Other(keyword)),
                }
            }
            Token::Atom(keyword) => {
                if let Some(status) = Status::parse(keyword) {
                    let (code, text) = Self::resp_text(lexer)?;
                    return Ok(UntaggedResponse::Status { status, code, text });
                }
                match keyword.to_ascii_uppercase().as_str() {
                    "CAPABILITY" => Ok(UntaggedResponse::Capability(capabilities(lexer)?)),
                    "FLAGS" => {
                        lexer.expect_space()?;
                        Ok(UntaggedResponse::Flags(flag_list(lexer)?))
                    }
                    "LIST" | "LSUB" => {
                        lexer.expect_space()?;
                        Ok(UntaggedResponse::List(list(lexer)?))
                    }
                    "SEARCH" => Ok(UntaggedResponse::Search(search(lexer)?)),
                    other => Ok(UntaggedResponse::Other(other.to_string())),
                }
            }
            token => Err(lexer.error(format!("unexpected {token:?} in untagged response"))),
        }
    }

    /// Parses `[code] text` after a status keyword.
    fn resp_text(lexer: &mut Lexer<'_>) -> Result<(Option<ResponseCode>, String)> {
        // Some servers omit the text entirely.
        if !lexer.eat(b' ') {
            return Ok((None, lexer.rest_of_line()));
        }
        let code = if lexer.peek() == Some(b'[') {
            Some(response_code(lexer)?)
        } else {
            None
        };
        lexer.eat(b' ');
        Ok((code, lexer.rest_of_line()))
    }
}

fn response_code(lexer: &mut Lexer<'_>) -> Result<ResponseCode> {
    lexer.expect(&Token::LBracket)?;
    let name = lexer.atom()?.to_ascii_uppercase();

    let code = match name.as_str() {
        "ALERT" => ResponseCode::Alert,
        "AUTHENTICATIONFAILED" => ResponseCode::AuthenticationFailed,
        "READ-ONLY" => ResponseCode::ReadOnly,
        "READ-WRITE" => ResponseCode::ReadWrite,
        "CAPABILITY" => ResponseCode::Capability(capabilities(lexer)?),
        _ => ResponseCode::Other(name),
    };

    // Arguments of codes we do not interpret, e.g. PERMANENTFLAGS (...)
    lexer.take_until(b']');
    lexer.expect(&Token::RBracket)?;
    Ok(code)
}

fn capabilities(lexer: &mut Lexer<'_>) -> Result<Vec<Capability>> {
    let mut caps = Vec::new();
    while lexer.eat(b' ') {
        match lexer.next_token()? {
            Token::Atom(s) => caps.push(Capability::parse(s)),
            token => return Err(lexer.error(format!("unexpected {token:?} in capability list"))),
        }
    }
    Ok(caps)
}

pub(crate) fn flag_list(lexer: &mut Lexer<'_>) -> Result<Vec<Flag>> {
    lexer.expect(&Token::LParen)?;
    let mut flags = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => return Ok(flags),
            Token::Space => {}
            Token::Atom(s) => flags.push(Flag::parse(s)),
            token => return Err(lexer.error(format!("unexpected {token:?} in flag list"))),
        }
    }
}

fn list(lexer: &mut Lexer<'_>) -> Result<ListResponse> {
    lexer.expect(&Token::LParen)?;
    let mut attributes = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::RParen => break,
            Token::Space => {}
            Token::Atom(s) => attributes.push(MailboxAttribute::parse(s)),
            token => return Err(lexer.error(format!("unexpected {token:?} in LIST attributes"))),
        }
    }

    lexer.expect_space()?;
    let delimiter = match lexer.next_token()? {
        Token::Nil => None,
        Token::Quoted(s) => s.chars().next(),
        token => return Err(lexer.error(format!("unexpected {token:?} as LIST delimiter"))),
    };

    lexer.expect_space()?;
    let name = match lexer.peek() {
        Some(b'"' | b'{') => lexer.astring()?,
        // Unquoted names may contain brackets, e.g. [Gmail]/Sent
        _ => lexer.rest_of_line(),
    };

    Ok(ListResponse {
        attributes,
        delimiter,
        mailbox: Mailbox::from_wire(name),
    })
}

fn search(lexer: &mut Lexer<'_>) -> Result<Vec<Uid>> {
    let mut uids = Vec::new();
    while lexer.eat(b' ') {
        match lexer.next_token()? {
            Token::Number(n) => uids.push(Uid::new(n).ok_or_else(|| lexer.error("UID 0"))?),
            // CONDSTORE appends (MODSEQ n)
            Token::LParen => {
                lexer.take_until(b')');
                lexer.expect(&Token::RParen)?;
            }
            Token::Crlf | Token::Eof => break,
            token => return Err(lexer.error(format!("unexpected {token:?} in SEARCH"))),
        }
    }
    Ok(uids)
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

    fn untagged(input: &[u8]) -> UntaggedResponse {
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(u) => u,
            other => panic!("expected untagged response, got {other:?}"),
        }
    }

    #[test]
    fn greeting_with_capabilities() {
        let u = untagged(b"* OK [CAPABILITY IMAP4rev1 STARTTLS AUTH=PLAIN] Dovecot ready.\r\n");
        match u {
            UntaggedResponse::Status {
                status: Status::Ok,
                code: Some(ResponseCode::Capability(caps)),
                text,
            } => {
                assert_eq!(caps.len(), 3);
                assert!(caps.contains(&Capability::StartTls));
                assert!(caps.contains(&Capability::Auth("PLAIN".to_string())));
                assert_eq!(text, "Dovecot ready.");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn tagged_no_with_code() {
        let response =
            ResponseParser::parse(b"A0001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
                .unwrap();
        assert_eq!(
            response,
            Response::Tagged {
                tag: Tag::new("A0001"),
                status: Status::No,
                code: Some(ResponseCode::AuthenticationFailed),
                text: "Invalid credentials".to_string(),
            }
        );
    }

    #[test]
    fn tagged_ok_without_text() {
        let response = ResponseParser::parse(b"A0003 OK\r\n").unwrap();
        assert!(matches!(
            response,
            Response::Tagged { status: Status::Ok, ref text, .. } if text.is_empty()
        ));
    }

    #[test]
    fn examine_response_codes() {
        assert_eq!(
            untagged(b"* OK [UIDNEXT 4392] Predicted next UID\r\n"),
            UntaggedResponse::Status {
                status: Status::Ok,
                code: Some(ResponseCode::Other("UIDNEXT".to_string())),
                text: "Predicted next UID".to_string(),
            }
        );
        assert!(matches!(
            untagged(b"* OK [PERMANENTFLAGS (\\Deleted \\Seen \\*)] Limited\r\n"),
            UntaggedResponse::Status { code: Some(ResponseCode::Other(ref name)), .. }
                if name == "PERMANENTFLAGS"
        ));
        assert!(matches!(
            untagged(b"* OK [UNSEEN 12] Message 12 is first unseen\r\n"),
            UntaggedResponse::Status { code: Some(ResponseCode::Other(ref name)), ref text, .. }
                if name == "UNSEEN" && text == "Message 12 is first unseen"
        ));
    }

    #[test]
    fn exists_and_recent() {
        assert_eq!(untagged(b"* 23 EXISTS\r\n"), UntaggedResponse::Exists(23));
        assert_eq!(untagged(b"* 1 RECENT\r\n"), UntaggedResponse::Recent(1));
    }

    #[test]
    fn flags() {
        assert_eq!(
            untagged(b"* FLAGS (\\Answered \\Flagged \\Seen $Forwarded)\r\n"),
            UntaggedResponse::Flags(vec![
                Flag::Answered,
                Flag::Flagged,
                Flag::Seen,
                Flag::Keyword("$Forwarded".to_string()),
            ])
        );
    }

    #[test]
    fn list_quoted() {
        match untagged(b"* LIST (\\HasNoChildren \\Junk) \"/\" \"[Gmail]/Spam\"\r\n") {
            UntaggedResponse::List(list) => {
                assert_eq!(
                    list.attributes,
                    vec![MailboxAttribute::HasNoChildren, MailboxAttribute::Junk]
                );
                assert_eq!(list.delimiter, Some('/'));
                assert_eq!(list.mailbox.as_wire(), "[Gmail]/Spam");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn list_unquoted_and_nil_delimiter() {
        match untagged(b"* LIST (\\Noselect) NIL INBOX\r\n") {
            UntaggedResponse::List(list) => {
                assert_eq!(list.delimiter, None);
                assert_eq!(list.mailbox.as_wire(), "INBOX");
                assert!(!list.is_selectable());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn list_literal_name() {
        match untagged(b"* LIST () \".\" {11}\r\nWeird \"Box\"\r\n") {
            UntaggedResponse::List(list) => {
                assert_eq!(list.mailbox.as_wire(), "Weird \"Box\"");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn list_utf7_name() {
        match untagged(b"* LIST (\\HasNoChildren) \"/\" \"Entw&APw-rfe\"\r\n") {
            UntaggedResponse::List(list) => assert_eq!(list.mailbox.name(), "Entwürfe"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_results() {
        assert_eq!(
            untagged(b"* SEARCH 2 84 882\r\n"),
            UntaggedResponse::Search(vec![
                Uid::new(2).unwrap(),
                Uid::new(84).unwrap(),
                Uid::new(882).unwrap(),
            ])
        );
        assert_eq!(untagged(b"* SEARCH\r\n"), UntaggedResponse::Search(vec![]));
        assert_eq!(
            untagged(b"* SEARCH 5 (MODSEQ 917162500)\r\n"),
            UntaggedResponse::Search(vec![Uid::new(5).unwrap()])
        );
    }

    #[test]
    fn unknown_untagged_is_kept() {
        assert_eq!(
            untagged(b"* ENABLED CONDSTORE\r\n"),
            UntaggedResponse::Other("ENABLED".to_string())
        );
    }

    #[test]
    fn continuation() {
        assert_eq!(
            ResponseParser::parse(b"+ Ready for literal\r\n").unwrap(),
            Response::Continuation {
                text: "Ready for literal".to_string()
            }
        );
    }

    #[test]
    fn bye() {
        assert!(matches!(
            untagged(b"* BYE Autologout; idle for too long\r\n"),
            UntaggedResponse::Status { status: Status::Bye, .. }
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(ResponseParser::parse(b"(oops)\r\n").is_err());
        assert!(ResponseParser::parse(b"A1 MAYBE\r\n").is_err());
    }
}
