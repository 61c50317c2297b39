//! Application state shared by all handlers.

use canteen_auth::{AccessServices, AccessVerifier, PassRegistry, SessionGuard};
use canteen_orders::{CheckoutReconciler, OrderBuilder};
use std::sync::Arc;
use std::time::Duration;

/// Name of the access session cookie.
pub const SESSION_COOKIE: &str = "canteen_session";

/// How the session cookie is written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieSettings {
    /// Add the `Secure` attribute.
    pub secure: bool,
    /// `Max-Age`; should cover the session lifetime plus the expiry notice grace.
    pub max_age: Duration,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            secure: false,
            max_age: Duration::from_secs(600),
        }
    }
}

/// Application state shared across all HTTP handlers.
///
/// Every field is cheap to clone; axum clones the state per request.
#[derive(Clone)]
pub struct AppState {
    /// Pass verification.
    pub verifier: AccessVerifier,
    /// Session checks.
    pub guard: SessionGuard,
    /// Pass administration.
    pub registry: PassRegistry,
    /// In-person orders and the menu.
    pub orders: OrderBuilder,
    /// Hosted checkout.
    pub checkout: CheckoutReconciler,
    /// Bearer token for `/admin`; admin routes are not mounted without it.
    pub admin_token: Option<Arc<str>>,
    /// Session cookie attributes.
    pub cookie: CookieSettings,
    /// Key rate limits on `X-Forwarded-For` / `X-Real-IP` instead of the peer.
    pub trust_proxy_headers: bool,
}

impl AppState {
    /// Assemble the state from wired services.
    #[must_use]
    pub fn new(access: AccessServices, orders: OrderBuilder, checkout: CheckoutReconciler) -> Self {
        Self {
            verifier: access.verifier,
            guard: access.guard,
            registry: access.registry,
            orders,
            checkout,
            admin_token: None,
            cookie: CookieSettings::default(),
            trust_proxy_headers: false,
        }
    }

    /// Enable the admin routes behind `token`.
    #[must_use]
    pub fn with_admin_token(mut self, token: impl Into<Arc<str>>) -> Self {
        self.admin_token = Some(token.into());
        self
    }

    /// Override cookie attributes.
    #[must_use]
    pub const fn with_cookie(mut self, cookie: CookieSettings) -> Self {
        self.cookie = cookie;
        self
    }

    /// Take the client address from forwarding headers. Only for deployments
    /// behind a proxy that sets them.
    #[must_use]
    pub const fn with_trusted_proxy_headers(mut self, trusted: bool) -> Self {
        self.trust_proxy_headers = trusted;
        self
    }

    /// `Set-Cookie` value carrying `token`.
    #[must_use]
    pub fn session_cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.cookie.max_age.as_secs()
        );
        if self.cookie.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// `Set-Cookie` value removing the session cookie.
    #[must_use]
    pub fn cleared_session_cookie(&self) -> String {
        let mut cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
        if self.cookie.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_is_clone() {
        fn assert_clone<T: Clone>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_cookie_settings_default() {
        let settings = CookieSettings::default();
        assert!(!settings.secure);
        assert_eq!(settings.max_age, Duration::from_secs(600));
    }
}
