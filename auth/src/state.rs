//! Access state types.
//!
//! Passes are persisted; access sessions are ephemeral and live only in the
//! shared key-value store.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_OWNER_LABEL;

// ═══════════════════════════════════════════════════════════════════════
// ID Types
// ═══════════════════════════════════════════════════════════════════════

/// Unique identifier for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PassId(pub i64);

impl std::fmt::Display for PassId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque access session token carried by the client in a cookie.
///
/// 256 bits of OS randomness, URL-safe base64. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Longest value accepted from a client.
    const MAX_LEN: usize = 64;

    /// Generate a new random token.
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Accept a token presented by a client, rejecting anything that could
    /// not have been generated here.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let valid = !value.is_empty()
            && value.len() <= Self::MAX_LEN
            && value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(value.to_string()))
    }

    /// Token value, for the cookie.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Passes
// ═══════════════════════════════════════════════════════════════════════

/// A persisted access pass.
///
/// Holds only the one-way hash of its code. Intentionally not `Serialize`;
/// use [`PassSummary`] for anything leaving the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pass {
    /// Identity.
    pub id: PassId,
    /// Argon2id PHC string of the code.
    pub secret_hash: String,
    /// Free-text holder label.
    pub owner_label: Option<String>,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
    /// End of validity (`None` = never expires).
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the pass may be used at all.
    pub is_active: bool,
    /// Last successful verification.
    pub used_at: Option<DateTime<Utc>>,
    /// Successful verifications so far.
    pub use_count: u32,
}

impl Pass {
    /// Whether the pass grants access at `now`.
    ///
    /// `false` when inactive, or when `expires_at` is set and `now` is past it.
    /// Prior use does not invalidate a pass.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        self.expires_at.is_none_or(|expires_at| now <= expires_at)
    }

    /// Record a successful use.
    pub fn mark_used(&mut self, now: DateTime<Utc>) {
        self.use_count = self.use_count.saturating_add(1);
        self.used_at = Some(now);
    }

    /// Owner label, or the default guest label.
    #[must_use]
    pub fn display_owner(&self) -> &str {
        self.owner_label
            .as_deref()
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(DEFAULT_OWNER_LABEL)
    }

    /// Public view of this pass.
    #[must_use]
    pub fn summary(&self) -> PassSummary {
        PassSummary {
            id: self.id,
            owner_label: self.owner_label.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            is_active: self.is_active,
            used_at: self.used_at,
            use_count: self.use_count,
        }
    }
}

/// Fields of a pass about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPass {
    /// Argon2id PHC string of the code.
    pub secret_hash: String,
    /// Free-text holder label.
    pub owner_label: Option<String>,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
    /// End of validity.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Pass metadata without the secret hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassSummary {
    /// Identity.
    pub id: PassId,
    /// Free-text holder label.
    pub owner_label: Option<String>,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
    /// End of validity.
    pub expires_at: Option<DateTime<Utc>>,
    /// Whether the pass may be used.
    pub is_active: bool,
    /// Last successful verification.
    pub used_at: Option<DateTime<Utc>>,
    /// Successful verifications so far.
    pub use_count: u32,
}

/// Result of issuing or resetting a pass.
///
/// The only place the plaintext code ever appears.
#[derive(Clone, Serialize)]
pub struct IssuedPass {
    /// Pass metadata.
    pub pass: PassSummary,
    /// Plaintext code to encode in the QR image.
    pub code: String,
}

impl std::fmt::Debug for IssuedPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedPass")
            .field("pass", &self.pass)
            .field("code", &"<redacted>")
            .finish()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Access Sessions
// ═══════════════════════════════════════════════════════════════════════

/// Ephemeral authorization derived from a successful scan.
///
/// Independent of the pass after issuance: deactivating or expiring the pass
/// does not shorten a session already granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSession {
    /// Owner label copied from the pass.
    pub owner_label: String,
    /// Time of the successful verification.
    pub authenticated_at: DateTime<Utc>,
}

impl AccessSession {
    /// Whether the session is still inside its lifetime at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>, lifetime: chrono::Duration) -> bool {
        self.authenticated_at + lifetime > now
    }

    /// Time left, floored at zero.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>, lifetime: chrono::Duration) -> chrono::Duration {
        let remaining = lifetime - (now - self.authenticated_at);
        remaining.max(chrono::Duration::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).single().unwrap_or_default()
    }

    fn pass() -> Pass {
        Pass {
            id: PassId(1),
            secret_hash: "$argon2id$...".to_string(),
            owner_label: Some("guest-1".to_string()),
            created_at: now(),
            expires_at: Some(now() + Duration::days(30)),
            is_active: true,
            used_at: None,
            use_count: 0,
        }
    }

    #[test]
    fn test_valid_until_expiry() {
        let pass = pass();
        assert!(pass.is_valid(now()));
        assert!(pass.is_valid(now() + Duration::days(30)));
        assert!(!pass.is_valid(now() + Duration::days(30) + Duration::seconds(1)));
    }

    #[test]
    fn test_expired_pass_invalid_even_if_active() {
        let mut pass = pass();
        pass.expires_at = Some(now() - Duration::seconds(1));
        assert!(pass.is_active);
        assert!(!pass.is_valid(now()));
    }

    #[test]
    fn test_inactive_pass_invalid() {
        let mut pass = pass();
        pass.is_active = false;
        pass.expires_at = None;
        assert!(!pass.is_valid(now()));
    }

    #[test]
    fn test_use_is_a_counter_not_a_gate() {
        let mut pass = pass();
        pass.mark_used(now());
        pass.mark_used(now() + Duration::minutes(5));
        assert_eq!(pass.use_count, 2);
        assert_eq!(pass.used_at, Some(now() + Duration::minutes(5)));
        assert!(pass.is_valid(now() + Duration::minutes(6)));
    }

    #[test]
    fn test_display_owner_defaults_to_guest() {
        let mut pass = pass();
        pass.owner_label = None;
        assert_eq!(pass.display_owner(), "Guest");
        pass.owner_label = Some("  ".to_string());
        assert_eq!(pass.display_owner(), "Guest");
    }

    #[test]
    fn test_session_remaining_floors_at_zero() {
        let session = AccessSession {
            owner_label: "guest-1".to_string(),
            authenticated_at: now(),
        };
        let lifetime = Duration::seconds(300);
        assert_eq!(session.remaining(now() + Duration::seconds(100), lifetime).num_seconds(), 200);
        assert!(session.is_active(now() + Duration::seconds(299), lifetime));
        assert!(!session.is_active(now() + Duration::seconds(300), lifetime));
        assert_eq!(session.remaining(now() + Duration::seconds(301), lifetime), Duration::zero());
    }

    #[test]
    fn test_session_token_parse() {
        let token = SessionToken::generate();
        assert_eq!(SessionToken::parse(token.as_str()), Some(token));
        assert_eq!(SessionToken::parse(""), None);
        assert_eq!(SessionToken::parse("a;b"), None);
        assert_eq!(SessionToken::parse(&"a".repeat(65)), None);
        assert_eq!(format!("{:?}", SessionToken::generate()), "SessionToken(..)");
    }
}
