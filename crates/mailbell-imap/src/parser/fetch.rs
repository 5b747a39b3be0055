//! FETCH response parsing.

use super::flag_list;
use super::lexer::{Lexer, Token};
use crate::Result;
use crate::types::{Flag, Uid};

/// One data item of a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `UID n`
    Uid(Uid),
    /// `FLAGS (...)`
    Flags(Vec<Flag>),
    /// `RFC822.SIZE n`
    Size(u32),
    /// `BODY[section]<origin> data`
    Body {
        /// Section specification between the brackets, e.g. `HEADER`.
        section: String,
        /// Returned bytes, `None` for NIL.
        data: Option<Vec<u8>>,
    },
    /// Item the client does not interpret; its value is skipped.
    Other(String),
}

/// Parses the parenthesized item list of a FETCH response.
pub fn parse_fetch(lexer: &mut Lexer<'_>) -> Result<Vec<FetchItem>> {
    lexer.expect(&Token::LParen)?;
    let mut items = Vec::new();

    loop {
        let name = match lexer.next_token()? {
            Token::RParen => return Ok(items),
            Token::Space => continue,
            Token::Atom(name) => name.to_ascii_uppercase(),
            token => return Err(lexer.error(format!("unexpected {token:?} in FETCH"))),
        };

        let item = match name.as_str() {
            "UID" => {
                lexer.expect_space()?;
                let n = lexer.number()?;
                FetchItem::Uid(Uid::new(n).ok_or_else(|| lexer.error("UID 0"))?)
            }
            "FLAGS" => {
                lexer.expect_space()?;
                FetchItem::Flags(flag_list(lexer)?)
            }
            "RFC822.SIZE" => {
                lexer.expect_space()?;
                FetchItem::Size(lexer.number()?)
            }
            "BODY" | "BINARY" if lexer.peek() == Some(b'[') => {
                let section = body_section(lexer)?;
                lexer.expect_space()?;
                FetchItem::Body {
                    section,
                    data: lexer.nstring_bytes()?,
                }
            }
            "RFC822" | "RFC822.HEADER" | "RFC822.TEXT" => {
                lexer.expect_space()?;
                FetchItem::Body {
                    section: name.trim_start_matches("RFC822").trim_start_matches('.').to_string(),
                    data: lexer.nstring_bytes()?,
                }
            }
            _ => {
                lexer.expect_space()?;
                skip_value(lexer)?;
                FetchItem::Other(name)
            }
        };
        items.push(item);
    }
}

/// Reads `[section]` and an optional `<origin>`, returning the section text.
fn body_section(lexer: &mut Lexer<'_>) -> Result<String> {
    lexer.expect(&Token::LBracket)?;
    let section = String::from_utf8_lossy(lexer.take_until(b']')).into_owned();
    lexer.expect(&Token::RBracket)?;

    if lexer.eat(b'<') {
        lexer.take_until(b'>');
        if !lexer.eat(b'>') {
            return Err(lexer.error("unterminated partial origin"));
        }
    }
    Ok(section)
}

/// Skips one value: an atom, string, literal, or a balanced parenthesized list.
fn skip_value(lexer: &mut Lexer<'_>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match lexer.next_token()? {
            Token::LParen => depth += 1,
            Token::RParen if depth > 0 => depth -= 1,
            Token::Crlf | Token::Eof | Token::RParen => {
                return Err(lexer.error("unterminated FETCH value"));
            }
            _ => {}
        }
        if depth == 0 {
            return Ok(());
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
    use crate::parser::{Response, ResponseParser, UntaggedResponse};

    fn fetch(input: &[u8]) -> (u32, Vec<FetchItem>) {
        match ResponseParser::parse(input).unwrap() {
            Response::Untagged(UntaggedResponse::Fetch { seq, items }) => (seq, items),
            other => panic!("expected FETCH, got {other:?}"),
        }
    }

    #[test]
    fn uid_and_header_fields_literal() {
        let header = b"From: Alice <alice@example.com>\r\nSubject: Hi\r\n\r\n";
        let mut input = format!(
            "* 3 FETCH (UID 42 BODY[HEADER.FIELDS (FROM SUBJECT)] {{{}}}\r\n",
            header.len()
        )
        .into_bytes();
        input.extend_from_slice(header);
        input.extend_from_slice(b")\r\n");

        let (seq, items) = fetch(&input);
        assert_eq!(seq, 3);
        assert_eq!(items[0], FetchItem::Uid(Uid::new(42).unwrap()));
        assert_eq!(
            items[1],
            FetchItem::Body {
                section: "HEADER.FIELDS (FROM SUBJECT)".to_string(),
                data: Some(header.to_vec()),
            }
        );
    }

    #[test]
    fn uid_after_body() {
        let (_, items) = fetch(b"* 1 FETCH (BODY[HEADER] {2}\r\n\r\n UID 7)\r\n");
        assert_eq!(
            items,
            vec![
                FetchItem::Body {
                    section: "HEADER".to_string(),
                    data: Some(b"\r\n".to_vec()),
                },
                FetchItem::Uid(Uid::new(7).unwrap()),
            ]
        );
    }

    #[test]
    fn nil_body_and_partial_origin() {
        let (_, items) = fetch(b"* 2 FETCH (BODY[TEXT]<0> NIL)\r\n");
        assert_eq!(
            items,
            vec![FetchItem::Body {
                section: "TEXT".to_string(),
                data: None,
            }]
        );
    }

    #[test]
    fn flags_and_size() {
        let (_, items) = fetch(b"* 4 FETCH (FLAGS (\\Seen) RFC822.SIZE 2048)\r\n");
        assert_eq!(
            items,
            vec![FetchItem::Flags(vec![Flag::Seen]), FetchItem::Size(2048)]
        );
    }

    #[test]
    fn unknown_items_are_skipped() {
        let (_, items) = fetch(
            b"* 5 FETCH (MODSEQ (12345) X-GM-LABELS (\"\\\\Inbox\" Work) UID 9)\r\n",
        );
        assert_eq!(
            items,
            vec![
                FetchItem::Other("MODSEQ".to_string()),
                FetchItem::Other("X-GM-LABELS".to_string()),
                FetchItem::Uid(Uid::new(9).unwrap()),
            ]
        );
    }

    #[test]
    fn truncated_fetch_is_error() {
        assert!(ResponseParser::parse(b"* 6 FETCH (UID 1\r\n").is_err());
    }
}
