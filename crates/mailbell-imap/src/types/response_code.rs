//! Response codes.

use super::Capability;

/// Bracketed response code carried by status responses, e.g. `[READ-ONLY]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseCode {
    /// ALERT: human-readable message that must be shown to the user.
    Alert,
    /// AUTHENTICATIONFAILED (RFC 5530)
    AuthenticationFailed,
    /// CAPABILITY list piggybacked on a greeting or LOGIN reply.
    Capability(Vec<Capability>),
    /// READ-ONLY: mailbox selected read-only.
    ReadOnly,
    /// READ-WRITE: mailbox selected read-write.
    ReadWrite,
    /// Anything not listed above, e.g. UIDNEXT or PERMANENTFLAGS.
    Other(String),
}
