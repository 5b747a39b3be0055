//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The settings file does not exist.
    #[error("Settings file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The settings file exists but could not be read.
    #[error("Cannot read settings file {}: {source}", .path.display())]
    ConfigUnreadable {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The settings file is not valid INI.
    #[error("Invalid settings file: {0}")]
    ConfigSyntax(String),

    /// The selected profile has no section in the settings file.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// No profile on the command line nor in `[general]`.
    #[error("No profile selected: pass --profile or set `profile` in [general]")]
    NoProfileSelected,

    /// A required key is absent from the profile and from `[default]`.
    #[error("Missing setting: {0}")]
    MissingSetting(String),

    /// A key holds a value that cannot be used.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidSetting {
        /// Setting name.
        key: String,
        /// Offending value.
        value: String,
    },

    /// The IMAP server refused the credentials.
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A server could not be reached, dropped the connection or timed out.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A server sent something that could not be understood.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// A server understood a request and refused it.
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl Error {
    /// Returns true for errors that must stop the program at startup.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_)
                | Self::ConfigUnreadable { .. }
                | Self::ConfigSyntax(_)
                | Self::ProfileNotFound(_)
                | Self::NoProfileSelected
                | Self::MissingSetting(_)
                | Self::InvalidSetting { .. }
        )
    }

    /// Maps the outcome of `LOGIN`: a NO there means bad credentials.
    #[must_use]
    pub fn from_login(err: mailbell_imap::Error) -> Self {
        match err {
            mailbell_imap::Error::No(reason) => Self::AuthenticationFailed(reason),
            other => other.into(),
        }
    }

    pub(crate) fn invalid(key: &str, value: &str) -> Self {
        Self::InvalidSetting {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<mailbell_imap::Error> for Error {
    fn from(err: mailbell_imap::Error) -> Self {
        use mailbell_imap::Error as Imap;
        match err {
            Imap::Io(_)
            | Imap::Tls(_)
            | Imap::InvalidDnsName(_)
            | Imap::Timeout(_)
            | Imap::Bye(_) => Self::ConnectionFailed(err.to_string()),
            Imap::Parse { .. } | Imap::Bad(_) | Imap::Protocol(_) => {
                Self::MalformedResponse(err.to_string())
            }
            Imap::No(reason) => Self::Rejected(reason),
        }
    }
}

impl From<mailbell_gntp::Error> for Error {
    fn from(err: mailbell_gntp::Error) -> Self {
        use mailbell_gntp::Error as Gntp;
        match err {
            Gntp::Io(_) | Gntp::Timeout(_) => Self::ConnectionFailed(err.to_string()),
            Gntp::Protocol(_) => Self::MalformedResponse(err.to_string()),
            Gntp::Server { .. } => Self::Rejected(err.to_string()),
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

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
    use std::time::Duration;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(Error::ConfigNotFound("settings.ini".into()).is_fatal());
        assert!(Error::ProfileNotFound("work".into()).is_fatal());
        assert!(Error::NoProfileSelected.is_fatal());
        assert!(Error::invalid("port", "x").is_fatal());
        assert!(!Error::AuthenticationFailed("no".into()).is_fatal());
        assert!(!Error::ConnectionFailed("down".into()).is_fatal());
    }

    #[test]
    fn test_login_no_is_authentication_failure() {
        let err = Error::from_login(mailbell_imap::Error::No("[AUTHENTICATIONFAILED] nope".into()));
        assert!(matches!(err, Error::AuthenticationFailed(_)));

        let err = Error::from_login(mailbell_imap::Error::Timeout(Duration::from_secs(1)));
        assert!(matches!(err, Error::ConnectionFailed(_)));
    }

    #[test]
    fn test_imap_error_mapping() {
        assert!(matches!(
            Error::from(mailbell_imap::Error::Bye("shutting down".into())),
            Error::ConnectionFailed(_)
        ));
        assert!(matches!(
            Error::from(mailbell_imap::Error::Protocol("junk".into())),
            Error::MalformedResponse(_)
        ));
        assert!(matches!(
            Error::from(mailbell_imap::Error::No("no such mailbox".into())),
            Error::Rejected(_)
        ));
    }

    #[test]
    fn test_gntp_error_mapping() {
        let refused = std::io::Error::from(std::io::ErrorKind::ConnectionRefused);
        assert!(matches!(
            Error::from(mailbell_gntp::Error::Io(refused)),
            Error::ConnectionFailed(_)
        ));
        assert!(matches!(
            Error::from(mailbell_gntp::Error::Protocol("?".into())),
            Error::MalformedResponse(_)
        ));
    }
}
