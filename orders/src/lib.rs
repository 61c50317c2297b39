//! # Canteen Orders
//!
//! Cart validation, atomic order construction and hosted checkout
//! reconciliation.
//!
//! ## Components
//!
//! - **Catalog snapshot** ([`providers::Catalog`]): available items and prices
//! - **Order builder** ([`builder`]): validates a cart, commits the order
//!   and its stock decrement in one transaction
//! - **Checkout reconciler** ([`checkout`]): stashes a cart against a
//!   provider session and turns the provider's redirect into exactly one
//!   paid order
//! - **Hosted checkout client** ([`hosted`]): Stripe-compatible HTTP client
//!
//! ## Flow
//!
//! ```text
//! cart → OrderBuilder ─────────────────────────────→ OrderStore (in person)
//! cart → CheckoutReconciler.stage → provider → redirect
//!      → CheckoutReconciler.reconcile → OrderBuilder → OrderStore (paid)
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod builder;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod hosted;
pub mod providers;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use builder::{BuildRequest, OrderBuilder};
pub use checkout::{
    CheckoutProvider, CheckoutReconciler, PendingCheckout, ProviderPaymentState, StagedCheckout,
};
pub use config::CheckoutConfig;
pub use error::{OrderError, Result};
pub use hosted::HostedCheckoutClient;
pub use providers::{Catalog, OrderStore};
pub use types::{
    CartItem, CatalogItem, CatalogItemId, Order, OrderId, OrderLine, OrderStatus, OrderSummary,
    PaymentMethod, PaymentStatus, ValidatedCart,
};
