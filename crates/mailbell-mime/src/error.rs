//! Error types for header decoding.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Text is not shaped like `=?charset?encoding?text?=`.
    #[error("Invalid encoded word: {0}")]
    InvalidEncodedWord(String),

    /// Encoding letter other than `B` or `Q`.
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),

    /// Bad `=XX` escape in a `Q` word.
    #[error("Invalid escape sequence: {0}")]
    InvalidEscape(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
