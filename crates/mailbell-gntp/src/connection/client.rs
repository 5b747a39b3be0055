//! GNTP client.

use super::Config;
use crate::command::{Notification, Registration, Request};
use crate::error::{Error, Result};
use crate::parser::parse_response;
use crate::types::{KeyHash, Response};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

/// Longest response line accepted.
const MAX_LINE_LENGTH: usize = 8 * 1024;
/// Most header lines accepted in one response.
const MAX_LINES: usize = 64;

/// GNTP client.
///
/// Holds no connection; every request opens a fresh one.
#[derive(Debug, Clone)]
pub struct Client {
    config: Config,
}

impl Client {
    /// Creates a client for the given daemon.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Returns the daemon configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Sends a `REGISTER` request.
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn register(&self, registration: Registration) -> Result<Response> {
        self.send(&Request::Register(registration)).await
    }

    /// Sends a `NOTIFY` request.
    ///
    /// # Errors
    ///
    /// See [`Client::send`].
    pub async fn notify(&self, notification: Notification) -> Result<Response> {
        self.send(&Request::Notify(notification)).await
    }

    /// Connects to the daemon, sends `request` and reads the response.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon cannot be reached, does not answer
    /// within the timeout, answers `-ERROR`, or sends a malformed response.
    #[instrument(
        skip_all,
        fields(host = %self.config.host, port = self.config.port, kind = request.message_type())
    )]
    pub async fn send(&self, request: &Request) -> Result<Response> {
        let key = self.config.password.as_deref().map(KeyHash::generate);
        let bytes = request.serialize(key.as_ref());
        let limit = self.config.timeout;

        let stream = tokio::time::timeout(
            limit,
            TcpStream::connect((self.config.host.as_str(), self.config.port)),
        )
        .await
        .map_err(|_| Error::Timeout(limit))??;
        debug!("connected to notification daemon");

        let response = tokio::time::timeout(limit, exchange(stream, &bytes))
            .await
            .map_err(|_| Error::Timeout(limit))??;
        debug!(action = ?response.action, "daemon accepted request");
        Ok(response)
    }
}

/// Writes a serialized request to `stream` and reads one response.
///
/// # Errors
///
/// Returns an error on I/O failure, an `-ERROR` response, or a malformed
/// response.
pub async fn exchange<S>(stream: S, request: &[u8]) -> Result<Response>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(stream);
    reader.get_mut().write_all(request).await?;
    reader.get_mut().flush().await?;

    let mut lines = Vec::new();
    loop {
        let mut buf = Vec::new();
        let limit = u64::try_from(MAX_LINE_LENGTH).unwrap_or(u64::MAX);
        let n = (&mut reader).take(limit).read_until(b'\n', &mut buf).await?;

        if n == 0 {
            if lines.is_empty() {
                return Err(Error::Protocol("Connection closed before response".into()));
            }
            break;
        }
        if n >= MAX_LINE_LENGTH && !buf.ends_with(b"\n") {
            return Err(Error::Protocol(format!(
                "Response line exceeds {MAX_LINE_LENGTH} bytes"
            )));
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            if lines.is_empty() {
                continue;
            }
            break;
        }
        if lines.len() == MAX_LINES {
            return Err(Error::Protocol(format!(
                "Response exceeds {MAX_LINES} lines"
            )));
        }
        lines.push(line.to_string());
    }

    parse_response(&lines)
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
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_exchange_ok() {
        let mock = Builder::new()
            .write(b"GNTP/1.0 NOTIFY NONE\r\n\r\n")
            .read(b"GNTP/1.0 -OK NONE\r\nResponse-Action: NOTIFY\r\n\r\n")
            .build();
        let response = exchange(mock, b"GNTP/1.0 NOTIFY NONE\r\n\r\n").await.unwrap();
        assert_eq!(response.action.as_deref(), Some("NOTIFY"));
    }

    #[tokio::test]
    async fn test_exchange_split_reads() {
        let mock = Builder::new()
            .write(b"X\r\n")
            .read(b"GNTP/1.0 -O")
            .read(b"K NONE\r\nResponse-Act")
            .read(b"ion: REGISTER\r\n\r\n")
            .build();
        let response = exchange(mock, b"X\r\n").await.unwrap();
        assert_eq!(response.action.as_deref(), Some("REGISTER"));
    }

    #[tokio::test]
    async fn test_exchange_error_response() {
        let mock = Builder::new()
            .write(b"X\r\n")
            .read(b"GNTP/1.0 -ERROR NONE\r\nError-Code: 400\r\nError-Description: Bad key\r\n\r\n")
            .build();
        let err = exchange(mock, b"X\r\n").await.unwrap_err();
        assert!(matches!(err, Error::Server { code, .. } if code.as_u16() == 400));
    }

    #[tokio::test]
    async fn test_exchange_closed_without_response() {
        let mock = Builder::new().write(b"X\r\n").build();
        let err = exchange(mock, b"X\r\n").await.unwrap_err();
        assert!(err.is_protocol());
    }

    #[tokio::test]
    async fn test_exchange_response_closed_without_blank_line() {
        let mock = Builder::new()
            .write(b"X\r\n")
            .read(b"GNTP/1.0 -OK NONE\r\n")
            .build();
        assert!(exchange(mock, b"X\r\n").await.is_ok());
    }

    #[tokio::test]
    async fn test_exchange_line_too_long() {
        let long = vec![b'a'; MAX_LINE_LENGTH];
        let mock = Builder::new().write(b"X\r\n").read(&long).build();
        let err = exchange(mock, b"X\r\n").await.unwrap_err();
        assert!(err.is_protocol());
    }
}
