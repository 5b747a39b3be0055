//! Literal-aware line framing.
//!
//! A server response is a CRLF-terminated line, except that a line ending
//! in `{n}` is followed by `n` raw bytes and then the rest of the response.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::{Error, Result};

const BUFFER_SIZE: usize = 8 * 1024;

/// Longest line accepted from the server.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Largest literal accepted from the server.
pub const MAX_LITERAL_SIZE: usize = 16 * 1024 * 1024;

/// Buffered IMAP connection.
pub struct FramedStream<S> {
    reader: BufReader<S>,
    response: BytesMut,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wraps a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::with_capacity(BUFFER_SIZE, stream),
            response: BytesMut::with_capacity(BUFFER_SIZE),
        }
    }

    /// Reads one complete response, literals included.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the connection closes mid-response and
    /// [`Error::Protocol`] if a size limit is exceeded.
    pub async fn read_response(&mut self) -> Result<Vec<u8>> {
        self.response.clear();

        loop {
            let line_start = self.response.len();
            self.read_line().await?;

            let Some(size) = literal_size(&self.response[line_start..]) else {
                break;
            };
            if size > MAX_LITERAL_SIZE {
                return Err(Error::Protocol(format!(
                    "literal of {size} bytes exceeds limit of {MAX_LITERAL_SIZE}"
                )));
            }
            let start = self.response.len();
            self.response.resize(start + size, 0);
            self.reader.read_exact(&mut self.response[start..]).await?;
        }

        Ok(self.response.to_vec())
    }

    /// Appends one CRLF-terminated line to the response buffer.
    async fn read_line(&mut self) -> Result<()> {
        let mut read = 0usize;
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                return Err(Error::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by server",
                )));
            }

            let (chunk, done) = match available.iter().position(|&b| b == b'\n') {
                Some(pos) => (&available[..=pos], true),
                None => (available, false),
            };
            let len = chunk.len();
            read += len;
            if read > MAX_LINE_LENGTH {
                return Err(Error::Protocol(format!(
                    "line exceeds limit of {MAX_LINE_LENGTH} bytes"
                )));
            }
            self.response.extend_from_slice(chunk);
            self.reader.consume(len);

            if done {
                return Ok(());
            }
        }
    }

    /// Writes and flushes one serialized command.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn write_command(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.reader.get_mut();
        stream.write_all(data).await?;
        stream.flush().await?;
        Ok(())
    }

    /// Returns the inner stream. Unread buffered bytes are discarded.
    pub fn into_inner(self) -> S {
        self.reader.into_inner()
    }
}

/// Returns `n` if the line ends with `{n}\r\n` or `{n+}\r\n`.
fn literal_size(line: &[u8]) -> Option<usize> {
    let line = line.strip_suffix(b"\r\n")?.strip_suffix(b"}")?;
    let line = line.strip_suffix(b"+").unwrap_or(line);
    let open = line.iter().rposition(|&b| b == b'{')?;
    let digits = &line[open + 1..];
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
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
    use tokio_test::io::Builder;

    use super::*;

    #[test]
    fn literal_size_detection() {
        assert_eq!(literal_size(b"* 1 FETCH (BODY[] {123}\r\n"), Some(123));
        assert_eq!(literal_size(b"A1 LOGIN {5+}\r\n"), Some(5));
        assert_eq!(literal_size(b"{0}\r\n"), Some(0));
        assert_eq!(literal_size(b"* OK no literal\r\n"), None);
        assert_eq!(literal_size(b"* OK {abc}\r\n"), None);
        assert_eq!(literal_size(b"* OK {}\r\n"), None);
        assert_eq!(literal_size(b"{12}"), None);
    }

    #[tokio::test]
    async fn reads_simple_line() {
        let mock = Builder::new().read(b"* OK ready\r\n").build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(framed.read_response().await.unwrap(), b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn reads_line_split_across_packets() {
        let mock = Builder::new().read(b"* OK re").read(b"ady\r\n").build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(framed.read_response().await.unwrap(), b"* OK ready\r\n");
    }

    #[tokio::test]
    async fn reads_literal_and_continuation() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[HEADER] {7}\r\n")
            .read(b"Hi\r\n\r\n")
            .read(b" UID 5)\r\n* 2 EXISTS\r\n")
            .build();
        let mut framed = FramedStream::new(mock);

        assert_eq!(
            framed.read_response().await.unwrap(),
            b"* 1 FETCH (BODY[HEADER] {7}\r\nHi\r\n\r\n UID 5)\r\n"
        );
        assert_eq!(framed.read_response().await.unwrap(), b"* 2 EXISTS\r\n");
    }

    #[tokio::test]
    async fn literal_containing_braces_is_not_reparsed() {
        let mock = Builder::new()
            .read(b"* 1 FETCH (BODY[] {6}\r\n{99}\r\n)\r\n")
            .build();
        let mut framed = FramedStream::new(mock);
        assert_eq!(
            framed.read_response().await.unwrap(),
            b"* 1 FETCH (BODY[] {6}\r\n{99}\r\n)\r\n"
        );
    }

    #[tokio::test]
    async fn eof_is_io_error() {
        let mock = Builder::new().read(b"* OK partial").build();
        let mut framed = FramedStream::new(mock);
        assert!(matches!(framed.read_response().await, Err(Error::Io(_))));
    }

    #[tokio::test]
    async fn oversized_literal_is_rejected() {
        let mock = Builder::new().read(b"* 1 FETCH (BODY[] {999999999}\r\n").build();
        let mut framed = FramedStream::new(mock);
        assert!(matches!(
            framed.read_response().await,
            Err(Error::Protocol(_))
        ));
    }

    #[tokio::test]
    async fn writes_command() {
        let mock = Builder::new().write(b"A0000 CAPABILITY\r\n").build();
        let mut framed = FramedStream::new(mock);
        framed.write_command(b"A0000 CAPABILITY\r\n").await.unwrap();
    }
}
