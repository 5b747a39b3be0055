//! IMAP connection management.
//!
//! - Configuration (host, port, security mode, timeout)
//! - TLS/plaintext stream abstraction
//! - Literal-aware framing
//! - Type-state client

mod client;
mod config;
mod framed;
mod stream;

pub use client::{Authenticated, Client, FetchedHeader, NotAuthenticated, Selected, Selection};
pub use config::{Config, Security};
pub use framed::FramedStream;
pub use stream::{ImapStream, connect, create_tls_connector};
