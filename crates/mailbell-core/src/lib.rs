//! # mailbell-core
//!
//! Core logic of the mailbell new-mail notifier.
//!
//! This crate provides:
//! - Settings file loading with profiles and command-line overrides
//! - An IMAP poller that collects unseen messages read-only
//! - A GNTP notifier that shows one notification per message
//! - The checker loop that ties them together
//!
//! The loop is generic over [`MailSource`] and [`Notify`], so it can be
//! driven by test doubles as well as by [`ImapPoller`] and [`GrowlNotifier`].

#![forbid(unsafe_code)]

pub mod checker;
mod error;
pub mod message;
pub mod notifier;
pub mod poller;
pub mod settings;

pub use checker::{Checker, CycleReport};
pub use error::{Error, Result};
pub use message::{MessageSummary, NotificationEvent};
pub use notifier::{GrowlNotifier, Notify};
pub use poller::{ImapPoller, MailSource, PollOutcome, Scope};
pub use settings::{Credentials, Overrides, Settings};
