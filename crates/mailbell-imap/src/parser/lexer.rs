//! Tokenizer for IMAP server responses.
//!
//! Works over a complete response buffer, including any literal data the
//! framing layer has already read, so it never performs I/O.

use std::borrow::Cow;

use crate::{Error, Result};

/// Token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// Unquoted atom. Flags such as `\Seen` and `\*` lex as atoms.
    Atom(&'a str),
    /// Quoted string with escapes resolved.
    Quoted(Cow<'a, str>),
    /// Literal `{n}\r\n` followed by `n` bytes.
    Literal(&'a [u8]),
    /// Number.
    Number(u32),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// Single space.
    Space,
    /// `*`
    Asterisk,
    /// `+`
    Plus,
    /// `NIL`
    Nil,
    /// `\r\n`
    Crlf,
    /// End of input.
    Eof,
}

/// Cursor over a response buffer.
pub struct Lexer<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a lexer positioned at the start of `input`.
    #[must_use]
    pub const fn new(input: &'a [u8]) -> Self {
        Self { input, pos: 0 }
    }

    /// Current byte offset.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Returns the next byte without consuming it.
    #[must_use]
    pub fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Consumes one byte if it equals `byte`.
    pub fn eat(&mut self, byte: u8) -> bool {
        if self.peek() == Some(byte) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Reads the next token.
    ///
    /// # Errors
    ///
    /// Returns a parse error on bytes that cannot start a token, unterminated
    /// strings and truncated literals.
    pub fn next_token(&mut self) -> Result<Token<'a>> {
        let Some(byte) = self.peek() else {
            return Ok(Token::Eof);
        };

        let single = match byte {
            b'(' => Some(Token::LParen),
            b')' => Some(Token::RParen),
            b'[' => Some(Token::LBracket),
            b']' => Some(Token::RBracket),
            b' ' => Some(Token::Space),
            b'*' => Some(Token::Asterisk),
            b'+' => Some(Token::Plus),
            _ => None,
        };
        if let Some(token) = single {
            self.pos += 1;
            return Ok(token);
        }

        match byte {
            b'\r' if self.input.get(self.pos + 1) == Some(&b'\n') => {
                self.pos += 2;
                Ok(Token::Crlf)
            }
            b'"' => self.quoted(),
            b'{' => self.literal(),
            b'\\' if self.input.get(self.pos + 1) == Some(&b'*') => {
                let start = self.pos;
                self.pos += 2;
                Ok(Token::Atom(self.str_from(start)?))
            }
            _ if is_atom_char(byte) => self.atom_or_number(),
            _ => Err(self.error(format!("unexpected byte {byte:#04x}"))),
        }
    }

    fn quoted(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let start = self.pos;
        let mut escaped: Option<Vec<u8>> = None;

        loop {
            match self.peek() {
                None | Some(b'\r' | b'\n') => return Err(self.error("unterminated quoted string")),
                Some(b'"') => break,
                Some(b'\\') => {
                    let buf = escaped.get_or_insert_with(|| self.input[start..self.pos].to_vec());
                    self.pos += 1;
                    match self.peek() {
                        Some(c @ (b'"' | b'\\')) => buf.push(c),
                        _ => return Err(self.error("invalid escape in quoted string")),
                    }
                }
                Some(c) => {
                    if let Some(buf) = escaped.as_mut() {
                        buf.push(c);
                    }
                }
            }
            self.pos += 1;
        }

        let token = match escaped {
            Some(buf) => Token::Quoted(Cow::Owned(String::from_utf8_lossy(&buf).into_owned())),
            None => Token::Quoted(String::from_utf8_lossy(&self.input[start..self.pos])),
        };
        self.pos += 1;
        Ok(token)
    }

    fn literal(&mut self) -> Result<Token<'a>> {
        self.pos += 1;
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        let size: usize = std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| self.error("invalid literal size"))?;
        self.eat(b'+');
        if !self.eat(b'}') || !self.eat(b'\r') || !self.eat(b'\n') {
            return Err(self.error("malformed literal prefix"));
        }

        let end = self
            .pos
            .checked_add(size)
            .filter(|&end| end <= self.input.len())
            .ok_or_else(|| self.error("truncated literal"))?;
        let data = &self.input[self.pos..end];
        self.pos = end;
        Ok(Token::Literal(data))
    }

    fn atom_or_number(&mut self) -> Result<Token<'a>> {
        let start = self.pos;
        while self.peek().is_some_and(is_atom_char) {
            self.pos += 1;
        }
        let s = self.str_from(start)?;

        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse()
                .map(Token::Number)
                .map_err(|_| self.error("number out of range"));
        }
        if s.eq_ignore_ascii_case("NIL") {
            return Ok(Token::Nil);
        }
        Ok(Token::Atom(s))
    }

    fn str_from(&self, start: usize) -> Result<&'a str> {
        std::str::from_utf8(&self.input[start..self.pos])
            .map_err(|_| self.error("invalid UTF-8 in atom"))
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.pos, message)
    }

    /// Consumes the next token and checks it has the same kind as `expected`.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the token differs.
    pub fn expect(&mut self, expected: &Token<'_>) -> Result<()> {
        let token = self.next_token()?;
        if std::mem::discriminant(&token) == std::mem::discriminant(expected) {
            Ok(())
        } else {
            Err(self.error(format!("expected {expected:?}, got {token:?}")))
        }
    }

    /// Consumes a single space.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the next byte is not a space.
    pub fn expect_space(&mut self) -> Result<()> {
        if self.eat(b' ') {
            Ok(())
        } else {
            Err(self.error("expected space"))
        }
    }

    /// Reads a number.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the next token is not a number.
    pub fn number(&mut self) -> Result<u32> {
        match self.next_token()? {
            Token::Number(n) => Ok(n),
            token => Err(self.error(format!("expected number, got {token:?}"))),
        }
    }

    /// Reads an atom.
    ///
    /// # Errors
    ///
    /// Returns a parse error if the next token is not an atom.
    pub fn atom(&mut self) -> Result<&'a str> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s),
            token => Err(self.error(format!("expected atom, got {token:?}"))),
        }
    }

    /// Reads an `astring`: atom, number, quoted string or literal.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any other token.
    pub fn astring(&mut self) -> Result<String> {
        match self.next_token()? {
            Token::Atom(s) => Ok(s.to_string()),
            Token::Number(n) => Ok(n.to_string()),
            Token::Quoted(s) => Ok(s.into_owned()),
            Token::Literal(data) => Ok(String::from_utf8_lossy(data).into_owned()),
            token => Err(self.error(format!("expected astring, got {token:?}"))),
        }
    }

    /// Reads an `nstring` as raw bytes: NIL, quoted string or literal.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any other token.
    pub fn nstring_bytes(&mut self) -> Result<Option<Vec<u8>>> {
        match self.next_token()? {
            Token::Nil => Ok(None),
            Token::Quoted(s) => Ok(Some(s.into_owned().into_bytes())),
            Token::Literal(data) => Ok(Some(data.to_vec())),
            token => Err(self.error(format!("expected nstring, got {token:?}"))),
        }
    }

    /// Consumes raw bytes up to (not including) `stop`, or to the end of the line.
    pub fn take_until(&mut self, stop: u8) -> &'a [u8] {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == stop || b == b'\r' {
                break;
            }
            self.pos += 1;
        }
        &self.input[start..self.pos]
    }

    /// Consumes the rest of the line and the trailing CRLF, returning the text.
    pub fn rest_of_line(&mut self) -> String {
        let text = String::from_utf8_lossy(self.take_until(b'\r')).into_owned();
        if self.eat(b'\r') {
            self.eat(b'\n');
        }
        text
    }
}

/// Returns true if `b` may appear in an atom.
///
/// `\` is accepted so that flags like `\Seen` lex as one token.
#[must_use]
pub const fn is_atom_char(b: u8) -> bool {
    matches!(b, 0x21..=0x7e)
        && !matches!(b, b'(' | b')' | b'{' | b'%' | b'*' | b'"' | b'[' | b']')
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

    fn tokens(input: &[u8]) -> Vec<Token<'_>> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::Eof {
                return out;
            }
            out.push(token);
        }
    }

    #[test]
    fn tagged_response() {
        assert_eq!(
            tokens(b"A0001 OK done\r\n"),
            vec![
                Token::Atom("A0001"),
                Token::Space,
                Token::Atom("OK"),
                Token::Space,
                Token::Atom("done"),
                Token::Crlf,
            ]
        );
    }

    #[test]
    fn flags_and_wildcard() {
        assert_eq!(
            tokens(b"(\\Seen \\*)"),
            vec![
                Token::LParen,
                Token::Atom("\\Seen"),
                Token::Space,
                Token::Atom("\\*"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn numbers_nil_and_brackets() {
        assert_eq!(
            tokens(b"[UIDNEXT 4392] nil"),
            vec![
                Token::LBracket,
                Token::Atom("UIDNEXT"),
                Token::Space,
                Token::Number(4392),
                Token::RBracket,
                Token::Space,
                Token::Nil,
            ]
        );
    }

    #[test]
    fn body_section_splits_at_bracket() {
        assert_eq!(
            tokens(b"BODY[HEADER]"),
            vec![
                Token::Atom("BODY"),
                Token::LBracket,
                Token::Atom("HEADER"),
                Token::RBracket,
            ]
        );
    }

    #[test]
    fn quoted_string_with_escapes() {
        let mut lexer = Lexer::new(b"\"say \\\"hi\\\" \\\\ now\"");
        assert_eq!(
            lexer.next_token().unwrap(),
            Token::Quoted(Cow::Borrowed("say \"hi\" \\ now"))
        );
    }

    #[test]
    fn quoted_string_unterminated() {
        let mut lexer = Lexer::new(b"\"open\r\n");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn literal_borrows_data() {
        let mut lexer = Lexer::new(b"{5}\r\nhello)");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"hello"));
        assert_eq!(lexer.next_token().unwrap(), Token::RParen);
    }

    #[test]
    fn non_synchronizing_literal() {
        let mut lexer = Lexer::new(b"{2+}\r\nok");
        assert_eq!(lexer.next_token().unwrap(), Token::Literal(b"ok"));
    }

    #[test]
    fn truncated_literal() {
        let mut lexer = Lexer::new(b"{10}\r\nshort");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn number_overflow_is_error() {
        let mut lexer = Lexer::new(b"99999999999");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn rest_of_line_consumes_crlf() {
        let mut lexer = Lexer::new(b"anything (goes) here\r\nnext");
        assert_eq!(lexer.rest_of_line(), "anything (goes) here");
        assert_eq!(lexer.next_token().unwrap(), Token::Atom("next"));
    }

    #[test]
    fn atom_chars() {
        assert!(is_atom_char(b'A'));
        assert!(is_atom_char(b'\\'));
        assert!(is_atom_char(b'.'));
        assert!(!is_atom_char(b' '));
        assert!(!is_atom_char(b'['));
        assert!(!is_atom_char(b'"'));
    }
}
