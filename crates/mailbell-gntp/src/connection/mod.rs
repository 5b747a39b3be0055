//! Connection handling.
//!
//! GNTP is one request per TCP connection: the client writes a request,
//! the daemon answers and the connection is closed.

mod client;
mod config;

pub use client::{Client, exchange};
pub use config::{Config, DEFAULT_PORT};
