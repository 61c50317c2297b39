//! Ordering providers.
//!
//! Storage traits for the catalog read path and the order store. Both are
//! dyn-compatible (boxed futures) so services hold `Arc<dyn ...>`.

use crate::error::Result;
use crate::types::{CatalogItem, CatalogItemId, NewOrder, Order, OrderId, OrderSummary, ValidatedCart};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by ordering providers.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Read-only view of the catalog. Catalog mutation happens elsewhere.
pub trait Catalog: Send + Sync {
    /// Available items, ordered by name. `ids` restricts the result.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::DatabaseError` if the query fails.
    fn available_items(&self, ids: Option<Vec<CatalogItemId>>) -> StoreFuture<'_, Vec<CatalogItem>>;

    /// One item regardless of availability.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::DatabaseError` if the query fails.
    fn get_item(&self, id: CatalogItemId) -> StoreFuture<'_, Option<CatalogItem>>;
}

/// Durable order storage.
pub trait OrderStore: Send + Sync {
    /// Commit an order atomically.
    ///
    /// Within one transaction: lock the cart's items, re-validate availability
    /// and stock against the locked rows, insert the order and its lines with
    /// snapshotted prices, decrement stock, and set the total. Either all of it
    /// is retained or none of it.
    ///
    /// # Errors
    ///
    /// - `OrderError::UnavailableItem` / `OrderError::InsufficientStock` when
    ///   re-validation fails
    /// - `OrderError::ReconciliationFailed` if an order already carries the
    ///   same external checkout reference
    /// - `OrderError::DatabaseError` on storage failure
    fn commit_order(&self, cart: ValidatedCart, order: NewOrder) -> StoreFuture<'_, Order>;

    /// Fetch an order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::DatabaseError` if the query fails.
    fn get_order(&self, id: OrderId) -> StoreFuture<'_, Option<Order>>;

    /// Fetch the order created for a hosted checkout session.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::DatabaseError` if the query fails.
    fn find_by_checkout_ref(&self, checkout_ref: String) -> StoreFuture<'_, Option<Order>>;

    /// Paid total and counts.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::DatabaseError` if the query fails.
    fn summary(&self) -> StoreFuture<'_, OrderSummary>;
}
