//! # mailbell-imap
//!
//! A small async IMAP client covering what a new-mail checker needs:
//! connecting (implicit TLS, STARTTLS or plaintext), `LOGIN`, `LIST`,
//! read-only `EXAMINE`, `UID SEARCH`, header-only `UID FETCH`, `CLOSE`
//! and `LOGOUT`.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbell_imap::{Client, Config, Mailbox, SearchCriteria, Selection, UidSet};
//!
//! let config = Config::new("imap.example.com");
//! let client = Client::connect(&config).await?;
//! let client = client.login("user@example.com", "password").await?;
//!
//! if let Selection::Selected(mut inbox) = client.examine(&Mailbox::inbox()).await? {
//!     let unseen = inbox.uid_search(&SearchCriteria::Unseen).await?;
//!     let headers = inbox
//!         .uid_fetch_headers(&UidSet::from_uids(unseen), &["FROM", "SUBJECT"])
//!         .await?;
//! }
//! ```
//!
//! ## Connection States
//!
//! The client is a type-state machine, so commands that are invalid in the
//! current IMAP state do not compile:
//!
//! ```text
//! NotAuthenticated ── login() ──→ Authenticated ── examine() ──→ Selected
//!                                       ↑                            │
//!                                       └───────── close() ──────────┘
//! ```

#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Command, FetchAttribute, SearchCriteria, TagGenerator};
pub use connection::{
    Authenticated, Client, Config, FetchedHeader, FramedStream, ImapStream, NotAuthenticated,
    Security, Selected, Selection,
};
pub use error::{Error, Result};
pub use parser::{FetchItem, Response, ResponseParser, UntaggedResponse};
pub use types::{
    Capability, Flag, ListResponse, Mailbox, MailboxAttribute, MailboxStatus, ResponseCode,
    Status, Tag, Uid, UidSet,
};
