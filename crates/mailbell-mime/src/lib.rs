//! # mailbell-mime
//!
//! The small slice of MIME that a new-mail notifier needs: parsing a raw
//! header block into fields and turning RFC 2047 encoded words back into
//! readable text.
//!
//! ## Quick Start
//!
//! ```
//! use mailbell_mime::Headers;
//!
//! let raw = b"From: =?ISO-8859-1?Q?Andr=E9?= <andre@example.com>\r\n\
//!             Subject: =?UTF-8?B?SGVsbG8=?=\r\n \
//!             =?UTF-8?B?IFdvcmxk?=\r\n\
//!             \r\n";
//!
//! let headers = Headers::from_bytes(raw);
//! assert_eq!(headers.decoded("from").as_deref(), Some("André <andre@example.com>"));
//! assert_eq!(headers.decoded("Subject").as_deref(), Some("Hello World"));
//! ```

#![forbid(unsafe_code)]

pub mod encoding;
mod error;
pub mod header;

pub use encoding::{decode_charset, decode_encoded_word, decode_rfc2047};
pub use error::{Error, Result};
pub use header::Headers;
