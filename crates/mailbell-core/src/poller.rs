//! IMAP polling for unseen messages.
//!
//! One poll is one session: connect, log in, walk the mailboxes read-only,
//! fetch the `From` and `Subject` of every unseen message, log out.

use std::future::Future;

use mailbell_imap::{
    Authenticated, Client, ImapStream, ListResponse, Mailbox, NotAuthenticated, SearchCriteria,
    Selection, UidSet,
};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, instrument, trace, warn};

use crate::error::{Error, Result};
use crate::message::MessageSummary;
use crate::settings::{Credentials, Exclusions, ImapSettings, Settings};

/// Header fields fetched for each unseen message.
const SUMMARY_FIELDS: &[&str] = &["FROM", "SUBJECT"];

/// Result of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollOutcome {
    /// Mailboxes that were opened and searched.
    pub mailboxes: usize,
    /// Unseen messages, in mailbox then UID order.
    pub messages: Vec<MessageSummary>,
}

/// Source of unseen messages.
pub trait MailSource {
    /// Runs one poll cycle.
    fn poll(&mut self) -> impl Future<Output = Result<PollOutcome>>;
}

/// Which mailboxes a poll looks at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scope {
    /// The single mailbox to check, or every listed mailbox when `None`.
    pub mailbox: Option<String>,
    /// Skipped mailboxes when listing.
    pub exclusions: Exclusions,
}

impl Scope {
    /// Keeps the listed mailboxes that can be opened and are not excluded.
    #[must_use]
    pub fn filter(&self, listed: Vec<ListResponse>) -> Vec<Mailbox> {
        listed
            .into_iter()
            .filter(|entry| {
                let name = entry.mailbox.name();
                if !entry.is_selectable() {
                    trace!(mailbox = %name, "not selectable");
                    return false;
                }
                if self.exclusions.excludes(&name, &entry.attributes) {
                    trace!(mailbox = %name, "excluded");
                    return false;
                }
                true
            })
            .map(|entry| entry.mailbox)
            .collect()
    }
}

/// Polls an IMAP account over a fresh connection each time.
#[derive(Debug, Clone)]
pub struct ImapPoller {
    imap: ImapSettings,
    credentials: Credentials,
    scope: Scope,
}

impl ImapPoller {
    /// Creates a poller for the profile in `settings`.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        Self {
            imap: settings.imap.clone(),
            credentials: settings.credentials.clone(),
            scope: Scope {
                mailbox: settings.mailbox.clone(),
                exclusions: settings.exclusions.clone(),
            },
        }
    }
}

impl MailSource for ImapPoller {
    #[instrument(skip_all, fields(host = %self.imap.host, port = self.imap.port))]
    async fn poll(&mut self) -> Result<PollOutcome> {
        let client: Client<ImapStream, NotAuthenticated> =
            Client::connect(&self.imap.config()).await?;
        check(client, &self.credentials, &self.scope).await
    }
}

/// Runs a full check over an already greeted connection.
///
/// # Errors
///
/// Returns [`Error::AuthenticationFailed`] if the login is refused, and the
/// mapped IMAP error if anything else fails. A mailbox the server refuses
/// to open is skipped.
pub async fn check<S>(
    client: Client<S, NotAuthenticated>,
    credentials: &Credentials,
    scope: &Scope,
) -> Result<PollOutcome>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut client = client
        .login(credentials.user(), credentials.password())
        .await
        .map_err(Error::from_login)?;

    let mailboxes = match &scope.mailbox {
        Some(name) => vec![Mailbox::from_name(name)],
        None => scope.filter(client.list("", "*").await?),
    };
    debug!(count = mailboxes.len(), "mailboxes to check");

    let mut outcome = PollOutcome::default();
    for mailbox in &mailboxes {
        let (next, found) = check_mailbox(client, mailbox).await?;
        client = next;
        if let Some(mut found) = found {
            outcome.mailboxes += 1;
            outcome.messages.append(&mut found);
        }
    }

    if let Err(err) = client.logout().await {
        debug!(error = %err, "logout failed");
    }
    Ok(outcome)
}

/// Examines one mailbox. `None` means the server refused to open it.
async fn check_mailbox<S>(
    client: Client<S, Authenticated>,
    mailbox: &Mailbox,
) -> Result<(Client<S, Authenticated>, Option<Vec<MessageSummary>>)>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let name = mailbox.name();

    let mut selected = match client.examine(mailbox).await? {
        Selection::Selected(selected) => selected,
        Selection::Refused { client, reason } => {
            warn!(mailbox = %name, %reason, "cannot open mailbox, skipped");
            return Ok((client, None));
        }
    };

    let unseen = selected.uid_search(&SearchCriteria::Unseen).await?;
    let headers = selected
        .uid_fetch_headers(&UidSet::from_uids(unseen), SUMMARY_FIELDS)
        .await?;
    let messages: Vec<MessageSummary> = headers
        .into_iter()
        .map(|fetched| MessageSummary::from_header(fetched.uid, name.clone(), &fetched.header))
        .collect();
    debug!(mailbox = %name, unseen = messages.len(), "mailbox checked");

    let client = selected.close().await?;
    Ok((client, Some(messages)))
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
    use mailbell_imap::{MailboxAttribute, Uid};
    use tokio_test::io::Builder;

    const GREETING: &[u8] = b"* OK [CAPABILITY IMAP4rev1] ready\r\n";

    fn fetch_line(seq: u32, uid: u32, header: &[u8]) -> Vec<u8> {
        let mut line = format!(
            "* {seq} FETCH (UID {uid} BODY[HEADER.FIELDS (FROM SUBJECT)] {{{}}}\r\n",
            header.len()
        )
        .into_bytes();
        line.extend_from_slice(header);
        line.extend_from_slice(b")\r\n");
        line
    }

    fn credentials() -> Credentials {
        Credentials::new("alice", "secret")
    }

    #[test]
    fn test_scope_filter() {
        let scope = Scope {
            mailbox: None,
            exclusions: Exclusions {
                names: vec!["[Gmail]/All Mail".into()],
                flags: vec!["\\Junk".into()],
            },
        };
        let entry = |attributes: Vec<MailboxAttribute>, name: &str| ListResponse {
            attributes,
            delimiter: Some('/'),
            mailbox: Mailbox::from_wire(name),
        };
        let kept = scope.filter(vec![
            entry(vec![], "INBOX"),
            entry(vec![MailboxAttribute::NoSelect], "[Gmail]"),
            entry(vec![], "[Gmail]/All Mail"),
            entry(vec![MailboxAttribute::Junk], "[Gmail]/Spam"),
            entry(vec![MailboxAttribute::HasNoChildren], "Entw&APw-rfe"),
        ]);
        let names: Vec<String> = kept.iter().map(Mailbox::name).collect();
        assert_eq!(names, vec!["INBOX", "Entwürfe"]);
    }

    #[tokio::test]
    async fn test_check_all_mailboxes() {
        let first = b"From: Alice <alice@example.com>\r\nSubject: Lunch?\r\n\r\n";
        let second = b"From: =?utf-8?Q?Bj=C3=B6rn?= <b@example.se>\r\nSubject: Re: Lunch?\r\n\r\n";

        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN alice secret\r\n")
            .read(b"A0000 OK Logged in\r\n")
            .write(b"A0001 LIST \"\" *\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" INBOX\r\n")
            .read(b"* LIST (\\Noselect \\HasChildren) \"/\" \"[Gmail]\"\r\n")
            .read(b"* LIST (\\HasNoChildren \\All) \"/\" \"[Gmail]/All Mail\"\r\n")
            .read(b"* LIST (\\HasNoChildren \\Junk) \"/\" \"[Gmail]/Spam\"\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" Entw&APw-rfe\r\n")
            .read(b"* LIST (\\HasNoChildren) \"/\" Archive\r\n")
            .read(b"A0001 OK LIST completed\r\n")
            .write(b"A0002 EXAMINE INBOX\r\n")
            .read(b"* 5 EXISTS\r\n")
            .read(b"A0002 OK [READ-ONLY] EXAMINE completed\r\n")
            .write(b"A0003 UID SEARCH UNSEEN\r\n")
            .read(b"* SEARCH 12 11\r\n")
            .read(b"A0003 OK SEARCH completed\r\n")
            .write(b"A0004 UID FETCH 11:12 (UID BODY.PEEK[HEADER.FIELDS (FROM SUBJECT)])\r\n")
            .read(&fetch_line(4, 11, first))
            .read(&fetch_line(5, 12, second))
            .read(b"A0004 OK FETCH completed\r\n")
            .write(b"A0005 CLOSE\r\n")
            .read(b"A0005 OK CLOSE completed\r\n")
            .write(b"A0006 EXAMINE Entw&APw-rfe\r\n")
            .read(b"* 0 EXISTS\r\n")
            .read(b"A0006 OK [READ-ONLY] EXAMINE completed\r\n")
            .write(b"A0007 UID SEARCH UNSEEN\r\n")
            .read(b"* SEARCH\r\n")
            .read(b"A0007 OK SEARCH completed\r\n")
            .write(b"A0008 CLOSE\r\n")
            .read(b"A0008 OK CLOSE completed\r\n")
            .write(b"A0009 EXAMINE Archive\r\n")
            .read(b"A0009 NO [NONEXISTENT] No such mailbox\r\n")
            .write(b"A0010 LOGOUT\r\n")
            .read(b"* BYE bye\r\n")
            .read(b"A0010 OK LOGOUT completed\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let scope = Scope {
            mailbox: None,
            exclusions: Exclusions {
                names: vec!["[Gmail]/All Mail".into()],
                flags: vec!["junk".into()],
            },
        };
        let outcome = check(client, &credentials(), &scope).await.unwrap();

        assert_eq!(outcome.mailboxes, 2);
        assert_eq!(outcome.messages.len(), 2);
        assert_eq!(outcome.messages[0].uid, Uid::new(11).unwrap());
        assert_eq!(outcome.messages[0].mailbox, "INBOX");
        assert_eq!(
            outcome.messages[0].from.as_deref(),
            Some("Alice <alice@example.com>")
        );
        assert_eq!(
            outcome.messages[1].from.as_deref(),
            Some("Björn <b@example.se>")
        );
        assert_eq!(outcome.messages[1].subject.as_deref(), Some("Re: Lunch?"));
    }

    #[tokio::test]
    async fn test_check_single_mailbox_without_unseen() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN alice secret\r\n")
            .read(b"A0000 OK Logged in\r\n")
            .write(b"A0001 EXAMINE \"[Gmail]/All Mail\"\r\n")
            .read(b"A0001 OK [READ-ONLY] EXAMINE completed\r\n")
            .write(b"A0002 UID SEARCH UNSEEN\r\n")
            .read(b"* SEARCH\r\n")
            .read(b"A0002 OK SEARCH completed\r\n")
            .write(b"A0003 CLOSE\r\n")
            .read(b"A0003 OK CLOSE completed\r\n")
            .write(b"A0004 LOGOUT\r\n")
            .read(b"A0004 OK LOGOUT completed\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let scope = Scope {
            mailbox: Some("[Gmail]/All Mail".into()),
            exclusions: Exclusions::default(),
        };
        let outcome = check(client, &credentials(), &scope).await.unwrap();
        assert_eq!(outcome.mailboxes, 1);
        assert!(outcome.messages.is_empty());
    }

    #[tokio::test]
    async fn test_check_rejected_login() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN alice secret\r\n")
            .read(b"A0000 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let err = check(client, &credentials(), &Scope::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AuthenticationFailed(_)));
    }

    #[tokio::test]
    async fn test_check_connection_dropped() {
        let mock = Builder::new()
            .read(GREETING)
            .write(b"A0000 LOGIN alice secret\r\n")
            .read(b"A0000 OK Logged in\r\n")
            .write(b"A0001 LIST \"\" *\r\n")
            .build();

        let client = Client::from_stream(mock).await.unwrap();
        let err = check(client, &credentials(), &Scope::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)), "{err:?}");
    }
}
