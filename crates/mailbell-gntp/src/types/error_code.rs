//! GNTP error codes.

/// Error code carried by an `-ERROR` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ErrorCode(u16);

impl ErrorCode {
    /// Creates a new error code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// Returns the numeric code.
    #[must_use]
    pub const fn as_u16(self) -> u16 {
        self.0
    }

    /// Returns true for network level failures (2xx).
    #[must_use]
    pub const fn is_network(self) -> bool {
        self.0 >= 200 && self.0 < 300
    }

    /// Returns true for malformed requests (3xx).
    #[must_use]
    pub const fn is_request(self) -> bool {
        self.0 >= 300 && self.0 < 400
    }

    /// Returns true for rejections by the daemon (4xx).
    #[must_use]
    pub const fn is_rejected(self) -> bool {
        self.0 >= 400 && self.0 < 500
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Codes defined by GNTP/1.0
impl ErrorCode {
    /// 200 The server timed out waiting for the request to complete
    pub const TIMED_OUT: Self = Self(200);
    /// 201 The server was unavailable or the client could not reach it
    pub const NETWORK_FAILURE: Self = Self(201);
    /// 300 The request contained an unsupported directive or invalid headers
    pub const INVALID_REQUEST: Self = Self(300);
    /// 301 The request was not a GNTP request
    pub const UNKNOWN_PROTOCOL: Self = Self(301);
    /// 302 The request specified an unknown or unsupported GNTP version
    pub const UNKNOWN_PROTOCOL_VERSION: Self = Self(302);
    /// 303 The request was missing required information
    pub const REQUIRED_HEADER_MISSING: Self = Self(303);
    /// 400 The request supplied a missing or wrong password/key
    pub const NOT_AUTHORIZED: Self = Self(400);
    /// 401 Application is not registered to send notifications
    pub const UNKNOWN_APPLICATION: Self = Self(401);
    /// 402 Notification type was not registered by the application
    pub const UNKNOWN_NOTIFICATION: Self = Self(402);
    /// 403 The original request was already processed
    pub const ALREADY_PROCESSED: Self = Self(403);
    /// 404 Notification type is registered but disabled
    pub const NOTIFICATION_DISABLED: Self = Self(404);
    /// 500 The server encountered an internal error
    pub const INTERNAL_SERVER_ERROR: Self = Self(500);
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
    fn test_error_code_classes() {
        assert!(ErrorCode::TIMED_OUT.is_network());
        assert!(ErrorCode::REQUIRED_HEADER_MISSING.is_request());
        assert!(ErrorCode::UNKNOWN_APPLICATION.is_rejected());
        assert!(!ErrorCode::INTERNAL_SERVER_ERROR.is_rejected());
        assert_eq!(ErrorCode::new(402), ErrorCode::UNKNOWN_NOTIFICATION);
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::NOT_AUTHORIZED.to_string(), "400");
    }
}
