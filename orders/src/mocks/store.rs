//! In-memory catalog and order store.

use crate::cart;
use crate::error::{OrderError, Result};
use crate::providers::{Catalog, OrderStore, StoreFuture};
use crate::types::{
    CatalogItem, CatalogItemId, NewOrder, Order, OrderId, OrderLine, OrderStatus, OrderSummary,
    PaymentStatus, ValidatedCart,
};
use canteen_core::Money;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    items: BTreeMap<CatalogItemId, CatalogItem>,
    orders: BTreeMap<OrderId, Order>,
}

/// In-memory catalog and order store.
///
/// A single mutex covers items and orders, so every commit is linearized
/// against every other: the re-validation and the stock decrement happen
/// under the same lock, which is what a row lock gives the database store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryOrderStore {
    /// Create a store holding `items`.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = CatalogItem>) -> Self {
        let state = State {
            items: items.into_iter().map(|item| (item.id, item)).collect(),
            orders: BTreeMap::new(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| OrderError::Internal("Mutex lock failed".to_string()))
    }

    /// Snapshot of an item (for assertions).
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn item(&self, id: CatalogItemId) -> Result<Option<CatalogItem>> {
        Ok(self.lock()?.items.get(&id).cloned())
    }

    /// Every committed order.
    ///
    /// # Errors
    ///
    /// Returns error if lock is poisoned.
    pub fn orders(&self) -> Result<Vec<Order>> {
        Ok(self.lock()?.orders.values().cloned().collect())
    }

    fn commit(&self, cart: &ValidatedCart, new: NewOrder) -> Result<Order> {
        let mut state = self.lock()?;

        if let Some(checkout_ref) = &new.external_checkout_ref {
            if state
                .orders
                .values()
                .any(|o| o.external_checkout_ref.as_ref() == Some(checkout_ref))
            {
                return Err(OrderError::ReconciliationFailed(
                    "order already exists for checkout".to_string(),
                ));
            }
        }

        let quantities = cart.quantities();
        let current: Vec<CatalogItem> = quantities
            .keys()
            .filter_map(|id| state.items.get(id).cloned())
            .collect();
        let revalidated = cart::resolve(&quantities, &current)?;

        let mut lines = Vec::with_capacity(revalidated.lines().len());
        let mut total = Money::ZERO;
        for line in revalidated.lines() {
            let order_line = OrderLine {
                item_id: line.item.id,
                item_name: line.item.name.clone(),
                quantity: line.quantity,
                unit_price: line.item.price,
            };
            total = order_line
                .line_total()
                .and_then(|line_total| total.checked_add(line_total))
                .ok_or_else(|| OrderError::Internal("Order total overflow".to_string()))?;
            lines.push(order_line);
        }

        for line in &lines {
            if let Some(item) = state.items.get_mut(&line.item_id) {
                item.stock_count = item.stock_count.saturating_sub(line.quantity);
            }
        }

        let id = OrderId(state.orders.keys().next_back().map_or(1, |id| id.0 + 1));
        let order = Order {
            id,
            owner_label: new.owner_label,
            created_at: new.created_at,
            status: new.status,
            payment_method: new.payment_method,
            payment_status: new.payment_status,
            total_amount: total,
            external_checkout_ref: new.external_checkout_ref,
            paid_at: new.paid_at,
            lines,
        };
        state.orders.insert(id, order.clone());
        Ok(order)
    }
}

impl Catalog for InMemoryOrderStore {
    fn available_items(&self, ids: Option<Vec<CatalogItemId>>) -> StoreFuture<'_, Vec<CatalogItem>> {
        let result = self.lock().map(|state| {
            let mut items: Vec<CatalogItem> = state
                .items
                .values()
                .filter(|item| item.is_available)
                .filter(|item| ids.as_ref().is_none_or(|ids| ids.contains(&item.id)))
                .cloned()
                .collect();
            items.sort_by(|a, b| a.name.cmp(&b.name));
            items
        });
        Box::pin(async move { result })
    }

    fn get_item(&self, id: CatalogItemId) -> StoreFuture<'_, Option<CatalogItem>> {
        let result = self.item(id);
        Box::pin(async move { result })
    }
}

impl OrderStore for InMemoryOrderStore {
    fn commit_order(&self, cart: ValidatedCart, order: NewOrder) -> StoreFuture<'_, Order> {
        let result = self.commit(&cart, order);
        Box::pin(async move { result })
    }

    fn get_order(&self, id: OrderId) -> StoreFuture<'_, Option<Order>> {
        let result = self.lock().map(|state| state.orders.get(&id).cloned());
        Box::pin(async move { result })
    }

    fn find_by_checkout_ref(&self, checkout_ref: String) -> StoreFuture<'_, Option<Order>> {
        let result = self.lock().map(|state| {
            state
                .orders
                .values()
                .find(|o| o.external_checkout_ref.as_deref() == Some(checkout_ref.as_str()))
                .cloned()
        });
        Box::pin(async move { result })
    }

    fn summary(&self) -> StoreFuture<'_, OrderSummary> {
        let result = self.lock().map(|state| {
            state
                .orders
                .values()
                .fold(OrderSummary::default(), |mut summary, order| {
                    if order.payment_status == PaymentStatus::Paid {
                        summary.paid_total = summary.paid_total.saturating_add(order.total_amount);
                        summary.paid_count += 1;
                    }
                    if order.status == OrderStatus::Pending {
                        summary.pending_count += 1;
                    }
                    summary
                })
        });
        Box::pin(async move { result })
    }
}
