//! Access constants.
//!
//! Key prefixes in the shared key-value store and the fixed user-facing
//! messages of the verification endpoint.

/// Key prefixes in the ephemeral store.
pub mod keys {
    /// Rate bucket per client address: `rate_limit:scan:{ip}`.
    pub const RATE_LIMIT_SCAN: &str = "rate_limit:scan:";

    /// Access session per session token: `access_session:{token}`.
    pub const ACCESS_SESSION: &str = "access_session:";
}

/// Messages shown to the person scanning.
pub mod messages {
    /// Rate limit exceeded.
    pub const TOO_MANY_ATTEMPTS: &str = "Too many attempts. Please wait a minute.";

    /// Empty submission.
    pub const NO_DATA: &str = "No QR data provided";

    /// Oversized submission.
    pub const INVALID_FORMAT: &str = "Invalid QR code format";

    /// Successful verification.
    pub const PASS_VALID: &str = "QR Code Pass Valid";

    /// Wrong, expired and inactive codes alike.
    pub const INVALID_OR_EXPIRED: &str = "Invalid or expired QR code";

    /// Request without a session.
    pub const NOT_AUTHENTICATED: &str = "Not authenticated";

    /// Request whose session just ran out.
    pub const SESSION_EXPIRED: &str = "Session expired";
}

/// Owner label used when a pass was issued without one.
pub const DEFAULT_OWNER_LABEL: &str = "Guest";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefixes_are_namespaced() {
        assert!(keys::RATE_LIMIT_SCAN.ends_with(':'));
        assert!(keys::ACCESS_SESSION.ends_with(':'));
        assert_ne!(keys::RATE_LIMIT_SCAN, keys::ACCESS_SESSION);
    }
}
