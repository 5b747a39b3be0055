//! # mailbell-gntp
//!
//! An async client for the Growl Notification Transport Protocol
//! (GNTP/1.0), enough to register an application and post notifications
//! to a desktop notification daemon.
//!
//! ## Features
//!
//! - **Requests**: `REGISTER` and `NOTIFY`, with URL or inline binary icons
//! - **Responses**: `-OK` and `-ERROR` with error codes
//! - **Authorization**: optional salted SHA-256 key hash
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailbell_gntp::{Client, Config, Notification, NotificationType, Registration};
//!
//! #[tokio::main]
//! async fn main() -> mailbell_gntp::Result<()> {
//!     let client = Client::new(Config::default());
//!
//!     let registration =
//!         Registration::new("mailbell").notification(NotificationType::new("New email"));
//!     client.register(registration).await?;
//!
//!     client
//!         .notify(Notification::new("mailbell", "New email", "alice@example.com").text("Lunch?"))
//!         .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`command`]: Request builders and serialization
//! - [`connection`]: Daemon configuration and client
//! - [`parser`]: Response parser
//! - [`types`]: Error codes, icons, resources, key hashes

#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod parser;
pub mod types;

pub use command::{Notification, NotificationType, Registration, Request};
pub use connection::{Client, Config, DEFAULT_PORT, exchange};
pub use error::{Error, Result};
pub use types::{ErrorCode, Icon, KeyHash, Resource, Response};
