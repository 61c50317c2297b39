//! Session guard: time-boxed access sessions in the shared store.
//!
//! A session is a JSON [`AccessSession`] stored under
//! `access_session:{token}`. Expiry is decided by comparing
//! `authenticated_at + session_duration` with the injected clock on every
//! read. The store TTL is longer than the session lifetime by the notice
//! grace period, so an expired session can still be recognised once and
//! reported as "expired" instead of "never authenticated".

use crate::constants::keys;
use crate::error::{AccessError, Result};
use crate::state::{AccessSession, SessionToken};
use canteen_core::environment::Clock;
use canteen_core::kv::{self, KeyValueStore};
use chrono::Duration;
use std::sync::Arc;

/// Outcome of inspecting a caller's session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Session is inside its lifetime.
    Active {
        /// The session.
        session: AccessSession,
        /// Time left.
        remaining: Duration,
    },
    /// Session existed but ran out; it has now been cleared.
    Expired,
    /// No session.
    Absent,
}

/// Issues, checks and clears access sessions.
#[derive(Clone)]
pub struct SessionGuard {
    kv: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    session_duration: Duration,
    notice_grace: Duration,
}

impl SessionGuard {
    /// Create a guard for sessions lasting `session_duration`.
    #[must_use]
    pub fn new(
        kv: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        session_duration: Duration,
        notice_grace: Duration,
    ) -> Self {
        Self {
            kv,
            clock,
            session_duration,
            notice_grace,
        }
    }

    fn key(token: &SessionToken) -> String {
        format!("{}{}", keys::ACCESS_SESSION, token.as_str())
    }

    /// Start a session for `owner_label`, replacing `previous` if given.
    ///
    /// Always returns a fresh token.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::StoreUnavailable` if the store fails.
    pub async fn issue(
        &self,
        owner_label: &str,
        previous: Option<&SessionToken>,
    ) -> Result<SessionToken> {
        if let Some(previous) = previous {
            self.kv.delete(&Self::key(previous)).await?;
        }

        let token = SessionToken::generate();
        let session = AccessSession {
            owner_label: owner_label.to_string(),
            authenticated_at: self.clock.now(),
        };
        let ttl = (self.session_duration + self.notice_grace)
            .to_std()
            .map_err(|e| AccessError::InternalError(format!("Invalid session TTL: {e}")))?;

        kv::set_json(self.kv.as_ref(), &Self::key(&token), &session, Some(ttl)).await?;
        Ok(token)
    }

    /// Inspect the caller's session.
    ///
    /// An expired session is deleted on the read that detects it, so the
    /// next read reports [`SessionStatus::Absent`].
    ///
    /// # Errors
    ///
    /// Returns `AccessError::StoreUnavailable` if the store fails.
    pub async fn status(&self, token: Option<&SessionToken>) -> Result<SessionStatus> {
        let Some(token) = token else {
            return Ok(SessionStatus::Absent);
        };

        let key = Self::key(token);
        let Some(session) = kv::get_json::<AccessSession>(self.kv.as_ref(), &key).await? else {
            return Ok(SessionStatus::Absent);
        };

        let now = self.clock.now();
        if session.is_active(now, self.session_duration) {
            let remaining = session.remaining(now, self.session_duration);
            Ok(SessionStatus::Active { session, remaining })
        } else {
            tracing::debug!(owner_label = %session.owner_label, "Access session expired");
            self.kv.delete(&key).await?;
            Ok(SessionStatus::Expired)
        }
    }

    /// Whether the caller holds an active session.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::StoreUnavailable` if the store fails.
    pub async fn is_authenticated(&self, token: Option<&SessionToken>) -> Result<bool> {
        Ok(matches!(
            self.status(token).await?,
            SessionStatus::Active { .. }
        ))
    }

    /// Time left on the caller's session, zero if none.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::StoreUnavailable` if the store fails.
    pub async fn remaining(&self, token: Option<&SessionToken>) -> Result<Duration> {
        match self.status(token).await? {
            SessionStatus::Active { remaining, .. } => Ok(remaining),
            SessionStatus::Expired | SessionStatus::Absent => Ok(Duration::zero()),
        }
    }

    /// Require an active session.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::SessionExpired` when the session just ran out,
    /// `AccessError::Unauthenticated` when there is none, or
    /// `AccessError::StoreUnavailable` if the store fails.
    pub async fn require(&self, token: Option<&SessionToken>) -> Result<AccessSession> {
        match self.status(token).await? {
            SessionStatus::Active { session, .. } => Ok(session),
            SessionStatus::Expired => Err(AccessError::SessionExpired),
            SessionStatus::Absent => Err(AccessError::Unauthenticated),
        }
    }

    /// Remove the caller's session. Returns `true` if one existed.
    ///
    /// # Errors
    ///
    /// Returns `AccessError::StoreUnavailable` if the store fails.
    pub async fn clear(&self, token: &SessionToken) -> Result<bool> {
        Ok(self.kv.delete(&Self::key(token)).await?)
    }
}
