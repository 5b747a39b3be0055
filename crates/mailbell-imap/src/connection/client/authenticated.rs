//! Authenticated state: LIST and EXAMINE.

use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use super::Client;
use super::states::{Authenticated, Selected};
use crate::command::Command;
use crate::parser::UntaggedResponse;
use crate::types::{ListResponse, Mailbox, MailboxStatus, ResponseCode};
use crate::{Error, Result};

/// Outcome of EXAMINE.
///
/// A refused selection leaves the session usable in the authenticated
/// state, so the caller gets the client back.
#[derive(Debug)]
pub enum Selection<S> {
    /// The mailbox is now selected.
    Selected(Client<S, Selected>),
    /// The server answered NO.
    Refused {
        /// The still-authenticated client.
        client: Client<S, Authenticated>,
        /// Server explanation.
        reason: String,
    },
}

impl<S> Client<S, Authenticated>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Lists mailboxes matching `pattern` under `reference`.
    ///
    /// # Errors
    ///
    /// Returns the I/O, timeout or server error of the round trip.
    pub async fn list(&mut self, reference: &str, pattern: &str) -> Result<Vec<ListResponse>> {
        let completion = self
            .execute(&Command::List {
                reference: reference.to_string(),
                pattern: pattern.to_string(),
            })
            .await?;

        Ok(completion
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::List(list) => Some(list),
                _ => None,
            })
            .collect())
    }

    /// Opens `mailbox` read-only. Flags, including `\Seen`, are left alone.
    ///
    /// # Errors
    ///
    /// Returns I/O, timeout, BAD and BYE errors. NO is reported as
    /// [`Selection::Refused`].
    pub async fn examine(mut self, mailbox: &Mailbox) -> Result<Selection<S>> {
        let completion = match self.execute(&Command::Examine(mailbox.clone())).await {
            Ok(completion) => completion,
            Err(Error::No(reason)) => {
                debug!(mailbox = %mailbox, %reason, "selection refused");
                return Ok(Selection::Refused {
                    client: self,
                    reason,
                });
            }
            Err(err) => return Err(err),
        };

        let mut status = MailboxStatus {
            read_only: !matches!(completion.code, Some(ResponseCode::ReadWrite)),
            ..MailboxStatus::default()
        };
        for response in completion.untagged {
            match response {
                UntaggedResponse::Exists(n) => status.exists = n,
                UntaggedResponse::Recent(n) => status.recent = n,
                UntaggedResponse::Flags(flags) => status.flags = flags,
                _ => {}
            }
        }
        debug!(mailbox = %mailbox, exists = status.exists, "mailbox opened");

        Ok(Selection::Selected(self.transition(Selected {
            mailbox: mailbox.clone(),
            status,
        })))
    }
}
