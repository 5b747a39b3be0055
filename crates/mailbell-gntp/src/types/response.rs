//! GNTP response types.

/// Successful (`-OK`) response from the daemon.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Response {
    /// Value of `Response-Action` (e.g., `REGISTER`).
    pub action: Option<String>,
    /// All headers in order.
    pub headers: Vec<(String, String)>,
}

impl Response {
    /// Gets the first value for a header, compared case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}
