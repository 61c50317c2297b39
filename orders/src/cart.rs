//! Cart validation against a catalog snapshot.
//!
//! Validation happens twice for every order: once against the catalog read
//! path before any side effect (so the caller gets a specific message
//! cheaply), and again inside the order store's transaction against locked
//! rows, which is the check that actually guards stock.

use crate::error::{OrderError, Result};
use crate::types::{CartItem, CartQuantities, CatalogItem, CatalogItemId, ValidatedCart, ValidatedLine};
use std::collections::HashMap;

/// Turn raw cart entries into per-item quantities.
///
/// Every entry needs a positive integer id and an integer quantity of at
/// least 1; fractions, strings and booleans are malformed. When the same id
/// appears more than once, the last entry wins.
///
/// # Errors
///
/// Returns `OrderError::EmptyCart` for no entries, or `OrderError::InvalidCart`
/// for a malformed entry.
pub fn collect_quantities(items: &[CartItem]) -> Result<CartQuantities> {
    if items.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let mut quantities = CartQuantities::new();
    for item in items {
        let id = item.item_id().ok_or(OrderError::InvalidCart)?;
        let quantity = item.requested_quantity().ok_or(OrderError::InvalidCart)?;
        quantities.insert(id, quantity);
    }
    Ok(quantities)
}

/// Resolve quantities against `available` catalog items.
///
/// Items with `is_available = false` are treated as missing.
///
/// # Errors
///
/// Returns `OrderError::UnavailableItem` if any requested item is missing or
/// unavailable, or `OrderError::InsufficientStock` naming the first item
/// (by id) whose stock is below the requested quantity.
pub fn resolve(quantities: &CartQuantities, available: &[CatalogItem]) -> Result<ValidatedCart> {
    let by_id: HashMap<CatalogItemId, &CatalogItem> = available
        .iter()
        .filter(|item| item.is_available)
        .map(|item| (item.id, item))
        .collect();

    if quantities.keys().any(|id| !by_id.contains_key(id)) {
        return Err(OrderError::UnavailableItem);
    }

    let mut lines = Vec::with_capacity(quantities.len());
    for (id, &quantity) in quantities {
        let item = by_id.get(id).ok_or(OrderError::UnavailableItem)?;
        if item.stock_count < quantity {
            return Err(OrderError::InsufficientStock {
                item_name: item.name.clone(),
            });
        }
        lines.push(ValidatedLine {
            item: (*item).clone(),
            quantity,
        });
    }

    Ok(ValidatedCart::new(lines))
}

/// [`collect_quantities`] followed by [`resolve`].
///
/// # Errors
///
/// Any error of either step.
pub fn validate_cart(items: &[CartItem], catalog: &[CatalogItem]) -> Result<ValidatedCart> {
    let quantities = collect_quantities(items)?;
    resolve(&quantities, catalog)
}
