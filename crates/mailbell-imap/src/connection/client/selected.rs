//! Selected state: searching and fetching headers.

use tokio::io::{AsyncRead, AsyncWrite};

use super::Client;
use super::states::{Authenticated, Selected};
use crate::command::{Command, FetchAttribute, SearchCriteria};
use crate::parser::{FetchItem, UntaggedResponse};
use crate::types::{Mailbox, MailboxStatus, Uid, UidSet};
use crate::Result;

/// Raw header block of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedHeader {
    /// Message UID.
    pub uid: Uid,
    /// Header bytes as returned by the server.
    pub header: Vec<u8>,
}

impl<S> Client<S, Selected>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Returns the selected mailbox.
    #[must_use]
    pub const fn mailbox(&self) -> &Mailbox {
        &self.state.mailbox
    }

    /// Returns the status reported when the mailbox was opened.
    #[must_use]
    pub const fn status(&self) -> &MailboxStatus {
        &self.state.status
    }

    /// Runs `UID SEARCH` and returns the matching UIDs in ascending order.
    ///
    /// # Errors
    ///
    /// Returns the I/O, timeout or server error of the round trip.
    pub async fn uid_search(&mut self, criteria: &SearchCriteria) -> Result<Vec<Uid>> {
        let completion = self.execute(&Command::UidSearch(criteria.clone())).await?;

        let mut uids: Vec<Uid> = completion
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Search(uids) => Some(uids),
                _ => None,
            })
            .flatten()
            .collect();
        uids.sort_unstable();
        uids.dedup();
        Ok(uids)
    }

    /// Fetches header blocks without setting `\Seen`.
    ///
    /// With an empty `fields` the whole header is fetched, otherwise only
    /// the named fields. Results are ordered by UID.
    ///
    /// # Errors
    ///
    /// Returns the I/O, timeout or server error of the round trip.
    pub async fn uid_fetch_headers(
        &mut self,
        uids: &UidSet,
        fields: &[&str],
    ) -> Result<Vec<FetchedHeader>> {
        if uids.is_empty() {
            return Ok(Vec::new());
        }
        let command = Command::UidFetch {
            uids: uids.clone(),
            items: vec![
                FetchAttribute::Uid,
                FetchAttribute::HeaderPeek(fields.iter().map(|f| (*f).to_string()).collect()),
            ],
        };
        let completion = self.execute(&command).await?;

        let mut headers: Vec<FetchedHeader> = completion
            .untagged
            .into_iter()
            .filter_map(|response| match response {
                UntaggedResponse::Fetch { items, .. } => header_from_items(items),
                _ => None,
            })
            .collect();
        headers.sort_by_key(|h| h.uid);
        Ok(headers)
    }

    /// Closes the mailbox and returns to the authenticated state.
    ///
    /// # Errors
    ///
    /// Returns the I/O, timeout or server error of the round trip.
    pub async fn close(mut self) -> Result<Client<S, Authenticated>> {
        self.execute(&Command::Close).await?;
        Ok(self.transition(Authenticated))
    }
}

/// Pairs the UID with the header section of a FETCH response.
///
/// Unsolicited FETCH responses (flag updates) carry no header and are dropped.
fn header_from_items(items: Vec<FetchItem>) -> Option<FetchedHeader> {
    let mut uid = None;
    let mut header = None;
    for item in items {
        match item {
            FetchItem::Uid(u) => uid = Some(u),
            FetchItem::Body { section, data } if section.starts_with("HEADER") => {
                header = Some(data.unwrap_or_default());
            }
            _ => {}
        }
    }
    Some(FetchedHeader {
        uid: uid?,
        header: header?,
    })
}
