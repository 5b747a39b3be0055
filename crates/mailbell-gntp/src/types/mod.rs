//! Core GNTP types.

mod error_code;
mod key_hash;
mod resource;
mod response;

pub use error_code::ErrorCode;
pub use key_hash::KeyHash;
pub use resource::{Icon, Resource};
pub use response::Response;

use std::fmt::Write as _;

/// Uppercase hex, the form GNTP uses for hashes and salts.
pub(crate) fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02X}");
        out
    })
}

/// Lowercase hex, used for resource identifiers.
pub(crate) fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}
