//! Error types for pass verification and access sessions.

use thiserror::Error;

/// Result type alias for access operations.
pub type Result<T> = std::result::Result<T, AccessError>;

/// Error taxonomy for the access path.
///
/// Security-sensitive outcomes (wrong code, expired pass, inactive pass) all
/// collapse into [`AccessError::InvalidCode`] so that no caller can learn which
/// one occurred.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccessError {
    // ═══════════════════════════════════════════════════════════
    // Verification Errors
    // ═══════════════════════════════════════════════════════════

    /// Too many verification attempts from this client.
    #[error("Too many attempts, please retry after {retry_after:?}")]
    RateLimited {
        /// Duration to wait before retrying
        retry_after: std::time::Duration,
    },

    /// Submitted code is empty or oversized.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Which check failed
        reason: InputProblem,
    },

    /// No active, unexpired pass matched the submitted code.
    #[error("Invalid or expired code")]
    InvalidCode,

    // ═══════════════════════════════════════════════════════════
    // Session Errors
    // ═══════════════════════════════════════════════════════════

    /// Caller carries no access session.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Caller's access session ran out during this request's check.
    #[error("Session has expired")]
    SessionExpired,

    // ═══════════════════════════════════════════════════════════
    // Administration
    // ═══════════════════════════════════════════════════════════

    /// No pass with the requested id.
    #[error("Pass not found")]
    PassNotFound,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Ephemeral store (sessions, rate buckets) failed.
    #[error("Session store unavailable: {0}")]
    StoreUnavailable(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Why a submitted code was rejected before any pass was consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputProblem {
    /// Nothing (or only whitespace) was submitted.
    Missing,
    /// Longer than the configured maximum.
    TooLong,
}

impl std::fmt::Display for InputProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => f.write_str("no code provided"),
            Self::TooLong => f.write_str("code exceeds maximum length"),
        }
    }
}

impl AccessError {
    /// Returns `true` if this error is caused by the caller's input or state.
    ///
    /// # Examples
    ///
    /// ```
    /// # use canteen_auth::AccessError;
    /// assert!(AccessError::InvalidCode.is_user_error());
    /// assert!(!AccessError::InternalError("boom".into()).is_user_error());
    /// ```
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::InvalidCode
                | Self::Unauthenticated
                | Self::SessionExpired
                | Self::PassNotFound
        )
    }

    /// Returns `true` if this error indicates possible abuse.
    ///
    /// # Examples
    ///
    /// ```
    /// # use canteen_auth::AccessError;
    /// use std::time::Duration;
    /// assert!(AccessError::RateLimited { retry_after: Duration::from_secs(60) }.is_security_issue());
    /// assert!(!AccessError::SessionExpired.is_security_issue());
    /// ```
    #[must_use]
    pub const fn is_security_issue(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::InvalidCode)
    }
}

impl From<canteen_core::KvError> for AccessError {
    fn from(err: canteen_core::KvError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
