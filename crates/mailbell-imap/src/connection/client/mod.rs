//! Type-state IMAP client.
//!
//! Each IMAP state is a type parameter, so only the commands valid in that
//! state are callable. Transitions consume the client and return it in the
//! new state.

mod authenticated;
mod not_authenticated;
mod selected;
mod states;

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, trace};

pub use self::authenticated::Selection;
pub use self::selected::FetchedHeader;
pub use self::states::{Authenticated, NotAuthenticated, Selected};
use super::framed::FramedStream;
use crate::command::{Command, TagGenerator};
use crate::parser::{Response, ResponseParser, UntaggedResponse};
use crate::types::{Capability, ResponseCode, Status};
use crate::{Error, Result};

/// IMAP client connection in state `State`.
pub struct Client<S, State> {
    stream: FramedStream<S>,
    tag_gen: TagGenerator,
    capabilities: Vec<Capability>,
    timeout: Option<Duration>,
    state: State,
}

impl<S, State> std::fmt::Debug for Client<S, State>
where
    State: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("capabilities", &self.capabilities)
            .field("timeout", &self.timeout)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Result of a command round trip.
#[derive(Debug)]
pub(crate) struct Completion {
    pub untagged: Vec<UntaggedResponse>,
    pub code: Option<ResponseCode>,
}

impl<S, State> Client<S, State>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the capabilities last advertised by the server.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns true if the server advertised `cap`.
    #[must_use]
    pub fn has_capability(&self, cap: &Capability) -> bool {
        self.capabilities.contains(cap)
    }

    /// Bounds every later command round trip by `timeout`.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sends CAPABILITY and stores the answer.
    ///
    /// # Errors
    ///
    /// Returns the I/O, timeout or server error of the round trip.
    pub async fn capability(&mut self) -> Result<&[Capability]> {
        let completion = self.execute(&Command::Capability).await?;
        self.absorb_capabilities(&completion);
        Ok(&self.capabilities)
    }

    /// Sends LOGOUT and drops the connection.
    ///
    /// # Errors
    ///
    /// Returns the I/O, timeout or server error of the round trip.
    pub async fn logout(mut self) -> Result<()> {
        self.execute(&Command::Logout).await.map(drop)
    }

    /// Moves the connection into another state.
    fn transition<Next>(self, state: Next) -> Client<S, Next> {
        Client {
            stream: self.stream,
            tag_gen: self.tag_gen,
            capabilities: self.capabilities,
            timeout: self.timeout,
            state,
        }
    }

    fn absorb_capabilities(&mut self, completion: &Completion) {
        for response in &completion.untagged {
            if let UntaggedResponse::Capability(caps) = response {
                self.capabilities.clone_from(caps);
            }
        }
        if let Some(ResponseCode::Capability(caps)) = &completion.code {
            self.capabilities.clone_from(caps);
        }
    }

    /// Sends `command` and collects responses up to its tagged completion.
    pub(crate) async fn execute(&mut self, command: &Command) -> Result<Completion> {
        let tag = self.tag_gen.next();
        debug!(%tag, command = %command.redacted(), "imap command");
        let bytes = command.serialize(&tag);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.round_trip(&tag, &bytes))
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => self.round_trip(&tag, &bytes).await,
        }
    }

    async fn round_trip(&mut self, tag: &str, bytes: &[u8]) -> Result<Completion> {
        self.stream.write_command(bytes).await?;

        let mut untagged = Vec::new();
        loop {
            let raw = self.stream.read_response().await?;
            let is_ours = raw
                .strip_prefix(tag.as_bytes())
                .is_some_and(|rest| rest.first() == Some(&b' '));

            let response = match ResponseParser::parse(&raw) {
                Ok(response) => response,
                Err(err) if is_ours => return Err(err),
                Err(err) => {
                    debug!(
                        error = %err,
                        line = %String::from_utf8_lossy(&raw).trim_end(),
                        "skipping unparseable response"
                    );
                    continue;
                }
            };
            trace!(?response, "imap response");

            match response {
                Response::Tagged {
                    status, code, text, ..
                } if is_ours => {
                    return match status {
                        Status::Ok | Status::PreAuth => Ok(Completion { untagged, code }),
                        Status::No => Err(Error::No(text)),
                        Status::Bad => Err(Error::Bad(text)),
                        Status::Bye => Err(Error::Bye(text)),
                    };
                }
                Response::Tagged { tag: other, .. } => {
                    return Err(Error::Protocol(format!(
                        "completion for unknown tag {other} while waiting for {tag}"
                    )));
                }
                Response::Untagged(response) => untagged.push(response),
                Response::Continuation { .. } => {
                    return Err(Error::Protocol(
                        "unexpected continuation request".to_string(),
                    ));
                }
            }
        }
    }
}
