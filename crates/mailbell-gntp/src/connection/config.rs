//! Daemon address and credentials.

use std::fmt;
use std::time::Duration;

/// Port the GNTP daemon listens on by default.
pub const DEFAULT_PORT: u16 = 23053;

/// Where and how to reach the notification daemon.
#[derive(Clone)]
pub struct Config {
    /// Daemon host.
    pub host: String,
    /// Daemon port.
    pub port: u16,
    /// Password for key hashing, if the daemon requires one.
    pub password: Option<String>,
    /// Bound on connecting and on the whole exchange.
    pub timeout: Duration,
}

impl Config {
    /// Creates a config without a password and a 60 second timeout.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("localhost", DEFAULT_PORT)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

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

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 23053);
        assert!(config.password.is_none());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = Config::new("growl.lan", 23053).password("hunter2");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("****"));
    }
}
