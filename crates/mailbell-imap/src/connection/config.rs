//! Connection configuration.

use std::time::Duration;

/// Connection security mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Security {
    /// No encryption. Only for local test servers.
    None,
    /// Plaintext connection upgraded with STARTTLS before login.
    StartTls,
    /// TLS from the first byte.
    #[default]
    Implicit,
}

impl Security {
    /// Returns the standard port for this mode.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::None | Self::StartTls => 143,
            Self::Implicit => 993,
        }
    }
}

impl std::str::FromStr for Security {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" | "ssl" | "implicit" => Ok(Self::Implicit),
            "starttls" => Ok(Self::StartTls),
            "none" | "plain" | "plaintext" => Ok(Self::None),
            other => Err(format!("unknown security mode `{other}`")),
        }
    }
}

/// Where and how to connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Server hostname.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Security mode.
    pub security: Security,
    /// Limit for connecting and for each command round trip.
    pub timeout: Duration,
}

impl Config {
    /// Creates a configuration for implicit TLS on port 993.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Security::Implicit.default_port(),
            security: Security::Implicit,
            timeout: Duration::from_secs(60),
        }
    }

    /// Sets the security mode and, with it, the standard port.
    #[must_use]
    pub const fn security(mut self, security: Security) -> Self {
        self.security = security;
        self.port = security.default_port();
        self
    }

    /// Overrides the port.
    #[must_use]
    pub const fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_implicit_tls() {
        let config = Config::new("imap.example.com");
        assert_eq!(config.port, 993);
        assert_eq!(config.security, Security::Implicit);
    }

    #[test]
    fn security_sets_port_before_override() {
        let config = Config::new("localhost").security(Security::StartTls);
        assert_eq!(config.port, 143);

        let config = Config::new("localhost").security(Security::None).port(1143);
        assert_eq!(config.port, 1143);
    }

    #[test]
    fn security_from_str() {
        assert_eq!("TLS".parse::<Security>().unwrap(), Security::Implicit);
        assert_eq!("starttls".parse::<Security>().unwrap(), Security::StartTls);
        assert_eq!("none".parse::<Security>().unwrap(), Security::None);
        assert!("maybe".parse::<Security>().is_err());
    }
}
