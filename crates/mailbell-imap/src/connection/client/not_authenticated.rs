//! Not-authenticated state: greeting, STARTTLS and LOGIN.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info};

use super::Client;
use super::states::{Authenticated, NotAuthenticated};
use crate::command::{Command, TagGenerator};
use crate::connection::config::{Config, Security};
use crate::connection::framed::FramedStream;
use crate::connection::stream::{self, ImapStream};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

impl<S> Client<S, NotAuthenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Reads the server greeting from a freshly connected stream.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bye`] if the server refuses the connection and a
    /// parse error if the greeting is not a status response.
    pub async fn from_stream(stream: S) -> Result<Self> {
        let mut framed = FramedStream::new(stream);
        let greeting = framed.read_response().await?;

        let capabilities = match ResponseParser::parse(&greeting)? {
            Response::Untagged(UntaggedResponse::Status {
                status: Status::Bye,
                text,
                ..
            }) => return Err(Error::Bye(text)),
            Response::Untagged(UntaggedResponse::Status { code, text, .. }) => {
                debug!(greeting = %text, "imap greeting");
                match code {
                    Some(ResponseCode::Capability(caps)) => caps,
                    _ => Vec::new(),
                }
            }
            other => {
                return Err(Error::Protocol(format!(
                    "expected greeting, got {other:?}"
                )));
            }
        };

        Ok(Self {
            stream: framed,
            tag_gen: TagGenerator::default(),
            capabilities,
            timeout: None,
            state: NotAuthenticated,
        })
    }

    /// Logs in with a username and password.
    ///
    /// # Errors
    ///
    /// Returns [`Error::No`] when the server rejects the credentials.
    pub async fn login(
        mut self,
        username: &str,
        password: &str,
    ) -> Result<Client<S, Authenticated>> {
        if [username, password]
            .iter()
            .any(|s| s.contains(['\r', '\n']))
        {
            return Err(Error::Protocol(
                "credentials must not contain line breaks".to_string(),
            ));
        }
        if self.has_capability(&Capability::LoginDisabled) {
            return Err(Error::No("server has disabled LOGIN on this connection".to_string()));
        }

        let completion = self
            .execute(&Command::Login {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await?;
        self.absorb_capabilities(&completion);
        info!(user = %username, "logged in");

        Ok(self.transition(Authenticated))
    }
}

impl Client<ImapStream, NotAuthenticated> {
    /// Connects according to `config`, reads the greeting and negotiates
    /// STARTTLS when configured.
    ///
    /// # Errors
    ///
    /// Returns connection, TLS and timeout errors, and [`Error::Protocol`]
    /// if STARTTLS is required but not offered.
    pub async fn connect(config: &Config) -> Result<Self> {
        let raw = stream::connect(config).await?;
        let client = tokio::time::timeout(config.timeout, Self::from_stream(raw))
            .await
            .map_err(|_| Error::Timeout(config.timeout))??
            .with_timeout(config.timeout);

        match config.security {
            Security::StartTls => client.starttls(&config.host).await,
            Security::Implicit | Security::None => Ok(client),
        }
    }

    /// Upgrades the connection with STARTTLS.
    ///
    /// Capabilities are re-read afterwards, as they may change once the
    /// channel is encrypted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Protocol`] if the server does not offer STARTTLS.
    pub async fn starttls(mut self, host: &str) -> Result<Self> {
        if self.capabilities.is_empty() {
            self.capability().await?;
        }
        if !self.has_capability(&Capability::StartTls) {
            return Err(Error::Protocol("server does not offer STARTTLS".to_string()));
        }
        self.execute(&Command::StartTls).await?;

        let tls = self.stream.into_inner().upgrade_to_tls(host).await?;
        let mut client = Self {
            stream: FramedStream::new(tls),
            tag_gen: self.tag_gen,
            capabilities: Vec::new(),
            timeout: self.timeout,
            state: NotAuthenticated,
        };
        client.capability().await?;
        Ok(client)
    }
}
