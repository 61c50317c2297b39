//! Error types for ordering and checkout.

use thiserror::Error;

/// Result type alias for ordering operations.
pub type Result<T> = std::result::Result<T, OrderError>;

/// Error taxonomy for carts, orders and hosted checkout.
///
/// Cart errors carry specific, user-presentable messages (they hold no
/// secrets and help a legitimate retry). Everything else is reported to the
/// caller generically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OrderError {
    // ═══════════════════════════════════════════════════════════
    // Cart Errors
    // ═══════════════════════════════════════════════════════════

    /// No items were submitted.
    #[error("Cart is empty")]
    EmptyCart,

    /// An item has no id or a non-positive quantity.
    #[error("Invalid cart item")]
    InvalidCart,

    /// A requested item does not exist or is not available.
    #[error("Some items are unavailable")]
    UnavailableItem,

    /// A requested quantity exceeds stock.
    #[error("Insufficient stock for {item_name}")]
    InsufficientStock {
        /// Name of the first item short of stock
        item_name: String,
    },

    /// Payment method not accepted on this path.
    #[error("Invalid payment method")]
    InvalidPaymentMethod,

    // ═══════════════════════════════════════════════════════════
    // Checkout Errors
    // ═══════════════════════════════════════════════════════════

    /// A checkout return could not be turned into an order. Terminal for
    /// that checkout attempt.
    #[error("Checkout reconciliation failed: {0}")]
    ReconciliationFailed(String),

    /// The hosted checkout provider failed or returned something unusable.
    #[error("Checkout provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Hosted checkout has no credentials configured.
    #[error("Hosted checkout is not configured")]
    ProviderNotConfigured,

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════

    /// Database operation failed.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Ephemeral store (checkout stash) failed.
    #[error("Checkout store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error (should not be exposed to users).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OrderError {
    /// Returns `true` for cart problems the caller can fix and retry.
    ///
    /// # Examples
    ///
    /// ```
    /// # use canteen_orders::OrderError;
    /// assert!(OrderError::EmptyCart.is_cart_error());
    /// assert!(!OrderError::ProviderNotConfigured.is_cart_error());
    /// ```
    #[must_use]
    pub const fn is_cart_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart
                | Self::InvalidCart
                | Self::UnavailableItem
                | Self::InsufficientStock { .. }
                | Self::InvalidPaymentMethod
        )
    }

    /// Short, stable label for metrics.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::EmptyCart => "empty_cart",
            Self::InvalidCart => "invalid_cart",
            Self::UnavailableItem => "unavailable_item",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidPaymentMethod => "invalid_payment_method",
            Self::ReconciliationFailed(_) => "reconciliation_failed",
            Self::ProviderUnavailable(_) => "provider_unavailable",
            Self::ProviderNotConfigured => "provider_not_configured",
            Self::DatabaseError(_) => "database",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<canteen_core::KvError> for OrderError {
    fn from(err: canteen_core::KvError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
