//! Order builder: validates carts and commits orders.

use crate::cart;
use crate::error::{OrderError, Result};
use crate::providers::{Catalog, OrderStore};
use crate::types::{
    CartItem, CatalogItem, NewOrder, Order, OrderStatus, PaymentMethod, PaymentStatus,
    ValidatedCart,
};
use canteen_core::environment::Clock;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Header of an order to build from a validated cart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildRequest {
    /// Holder label.
    pub owner_label: String,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Payment time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Hosted checkout session reference.
    pub external_checkout_ref: Option<String>,
}

/// Validates carts against the catalog and commits orders through the store.
#[derive(Clone)]
pub struct OrderBuilder {
    catalog: Arc<dyn Catalog>,
    store: Arc<dyn OrderStore>,
    clock: Arc<dyn Clock>,
}

impl OrderBuilder {
    /// Create a builder.
    #[must_use]
    pub fn new(catalog: Arc<dyn Catalog>, store: Arc<dyn OrderStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            catalog,
            store,
            clock,
        }
    }

    /// Order store handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn OrderStore> {
        &self.store
    }

    /// Available items ordered by name.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the catalog query fails.
    pub async fn menu(&self) -> Result<Vec<CatalogItem>> {
        self.catalog.available_items(None).await
    }

    /// Validate raw cart entries against the live catalog.
    ///
    /// # Errors
    ///
    /// Cart errors (`EmptyCart`, `InvalidCart`, `UnavailableItem`,
    /// `InsufficientStock`) or a storage error.
    pub async fn validate(&self, items: &[CartItem]) -> Result<ValidatedCart> {
        let quantities = cart::collect_quantities(items)?;
        let ids = quantities.keys().copied().collect();
        let available = self.catalog.available_items(Some(ids)).await?;
        cart::resolve(&quantities, &available)
    }

    /// Commit an order for a validated cart.
    ///
    /// Stock is re-validated inside the store's transaction, so a cart that
    /// was valid a moment ago can still fail with `InsufficientStock`.
    ///
    /// # Errors
    ///
    /// Any error of [`OrderStore::commit_order`].
    pub async fn build(&self, cart: ValidatedCart, request: BuildRequest) -> Result<Order> {
        let payment_method = request.payment_method;
        let new_order = NewOrder {
            owner_label: request.owner_label,
            created_at: self.clock.now(),
            status: request.status,
            payment_method,
            payment_status: request.payment_status,
            paid_at: request.paid_at,
            external_checkout_ref: request.external_checkout_ref,
        };

        match self.store.commit_order(cart, new_order).await {
            Ok(order) => {
                metrics::counter!("orders.created", "payment_method" => payment_method.as_str())
                    .increment(1);
                tracing::info!(
                    order_id = %order.id,
                    owner_label = %order.owner_label,
                    payment_method = payment_method.as_str(),
                    total_amount = %order.total_amount,
                    "Order created"
                );
                Ok(order)
            }
            Err(e) => {
                record_rejection(&e);
                Err(e)
            }
        }
    }

    /// The order endpoint flow: an in-person order from raw cart entries.
    ///
    /// `payment_method` defaults to `in_person`; every other value, including
    /// `hosted_redirect`, is rejected.
    ///
    /// # Errors
    ///
    /// `EmptyCart`, `InvalidPaymentMethod`, any validation error, or any
    /// error of [`build`](Self::build).
    pub async fn place_in_person(
        &self,
        items: &[CartItem],
        payment_method: Option<&str>,
        owner_label: &str,
    ) -> Result<Order> {
        let validated = match precheck(items, payment_method) {
            Ok(()) => self.validate(items).await,
            Err(e) => Err(e),
        };
        let cart = validated.inspect_err(|e| {
            record_rejection(e);
            tracing::debug!(owner_label, reason = e.reason(), "Order rejected");
        })?;

        self.build(
            cart,
            BuildRequest {
                owner_label: owner_label.to_string(),
                payment_method: PaymentMethod::InPerson,
                payment_status: PaymentStatus::Pending,
                status: OrderStatus::Pending,
                paid_at: None,
                external_checkout_ref: None,
            },
        )
        .await
    }
}

fn precheck(items: &[CartItem], payment_method: Option<&str>) -> Result<()> {
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }
    match payment_method.unwrap_or(PaymentMethod::InPerson.as_str()).parse()? {
        PaymentMethod::InPerson => Ok(()),
        PaymentMethod::HostedRedirect => Err(OrderError::InvalidPaymentMethod),
    }
}

fn record_rejection(err: &OrderError) {
    if err.is_cart_error() {
        metrics::counter!("orders.rejected", "reason" => err.reason()).increment(1);
    }
}
