//! Checkout configuration.

use std::time::Duration;

/// Placeholder the provider substitutes with its session id in the success URL.
pub const CHECKOUT_SESSION_ID_PLACEHOLDER: &str = "{CHECKOUT_SESSION_ID}";

/// Path of the checkout return endpoint.
pub const SUCCESS_PATH: &str = "/payments/checkout-success/";

/// Path of the checkout cancel endpoint.
pub const CANCEL_PATH: &str = "/payments/checkout-cancel/";

/// Hosted checkout configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// ISO currency code sent to the provider.
    ///
    /// Default: `eur`
    pub currency: String,

    /// Absolute URL the provider redirects to after payment. Must contain
    /// [`CHECKOUT_SESSION_ID_PLACEHOLDER`].
    pub success_url: String,

    /// Absolute URL the provider redirects to when the buyer cancels.
    pub cancel_url: String,

    /// Lifetime of a pending checkout stash.
    ///
    /// Default: 3600 seconds
    pub stash_ttl: Duration,

    /// Lifetime of the claim that serialises concurrent returns for one
    /// checkout reference.
    ///
    /// Default: 30 seconds
    pub claim_ttl: Duration,

    /// How long a return that finds the claim taken waits for the holder's
    /// order to appear before giving up.
    ///
    /// Default: 3 seconds
    pub claim_wait: Duration,
}

impl CheckoutConfig {
    /// Configuration with return URLs under `public_base_url`
    /// (e.g. `https://canteen.example.com`).
    #[must_use]
    pub fn new(public_base_url: &str) -> Self {
        let base = public_base_url.trim_end_matches('/');
        Self {
            currency: "eur".to_string(),
            success_url: format!(
                "{base}{SUCCESS_PATH}?session_id={CHECKOUT_SESSION_ID_PLACEHOLDER}"
            ),
            cancel_url: format!("{base}{CANCEL_PATH}"),
            stash_ttl: Duration::from_secs(3600),
            claim_ttl: Duration::from_secs(30),
            claim_wait: Duration::from_secs(3),
        }
    }

    /// Set currency.
    #[must_use]
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into().to_lowercase();
        self
    }

    /// Set stash lifetime.
    #[must_use]
    pub const fn with_stash_ttl(mut self, ttl: Duration) -> Self {
        self.stash_ttl = ttl;
        self
    }

    /// Set how long a concurrent return waits for the claim holder.
    #[must_use]
    pub const fn with_claim_wait(mut self, wait: Duration) -> Self {
        self.claim_wait = wait;
        self
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}
