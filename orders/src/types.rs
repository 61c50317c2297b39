//! Ordering domain types.

use canteen_core::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::OrderError;

// ============================================================================
// Identifiers
// ============================================================================

/// Catalog item identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogItemId(pub i64);

impl fmt::Display for CatalogItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Order identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub i64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// A purchasable item with live stock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Identity.
    pub id: CatalogItemId,
    /// Display name.
    pub name: String,
    /// Current unit price.
    pub price: Money,
    /// Units in stock.
    pub stock_count: u32,
    /// Whether the item is offered at all.
    pub is_available: bool,
}

// ============================================================================
// Enums
// ============================================================================

/// How an order is paid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid at the counter.
    InPerson,
    /// Paid through the hosted checkout redirect.
    HostedRedirect,
}

impl PaymentMethod {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InPerson => "in_person",
            Self::HostedRedirect => "hosted_redirect",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_person" => Ok(Self::InPerson),
            "hosted_redirect" => Ok(Self::HostedRedirect),
            _ => Err(OrderError::InvalidPaymentMethod),
        }
    }
}

/// Payment progress of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet paid.
    Pending,
    /// Paid.
    Paid,
    /// Payment failed.
    Failed,
    /// Payment cancelled.
    Cancelled,
}

impl PaymentStatus {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderError::Internal(format!("unknown payment status {other}"))),
        }
    }
}

/// Fulfilment status of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment at the counter.
    Pending,
    /// Paid.
    Paid,
}

impl OrderStatus {
    /// Stable storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(OrderError::Internal(format!("unknown order status {other}"))),
        }
    }
}

// ============================================================================
// Carts
// ============================================================================

/// One raw cart entry as submitted by a client.
///
/// Fields are kept as raw JSON so that missing, fractional, string or boolean
/// values surface as [`OrderError::InvalidCart`] rather than a
/// deserialization failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Catalog item id.
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    /// Requested quantity.
    #[serde(default)]
    pub quantity: Option<serde_json::Value>,
}

impl CartItem {
    /// Convenience constructor.
    #[must_use]
    pub fn new(id: i64, quantity: i64) -> Self {
        Self {
            id: Some(id.into()),
            quantity: Some(quantity.into()),
        }
    }

    /// The id, if it is a positive JSON integer.
    #[must_use]
    pub fn item_id(&self) -> Option<CatalogItemId> {
        self.id
            .as_ref()
            .and_then(serde_json::Value::as_i64)
            .filter(|id| *id > 0)
            .map(CatalogItemId)
    }

    /// The quantity, if it is a JSON integer of at least 1 that fits a `u32`.
    #[must_use]
    pub fn requested_quantity(&self) -> Option<u32> {
        self.quantity
            .as_ref()
            .and_then(serde_json::Value::as_u64)
            .filter(|q| *q >= 1)
            .and_then(|q| u32::try_from(q).ok())
    }
}

/// Requested quantity per catalog item.
pub type CartQuantities = BTreeMap<CatalogItemId, u32>;

/// One resolved cart line: a snapshot of the item and the quantity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedLine {
    /// Item as read during validation.
    pub item: CatalogItem,
    /// Requested quantity (at least 1).
    pub quantity: u32,
}

/// A cart whose items all exist, are available and are in stock.
///
/// Lines are ordered by item id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedCart {
    lines: Vec<ValidatedLine>,
}

impl ValidatedCart {
    pub(crate) const fn new(lines: Vec<ValidatedLine>) -> Self {
        Self { lines }
    }

    /// Resolved lines.
    #[must_use]
    pub fn lines(&self) -> &[ValidatedLine] {
        &self.lines
    }

    /// Requested quantities, for re-validation inside a transaction.
    #[must_use]
    pub fn quantities(&self) -> CartQuantities {
        self.lines
            .iter()
            .map(|line| (line.item.id, line.quantity))
            .collect()
    }

    /// Total at the prices seen during validation.
    #[must_use]
    pub fn total(&self) -> Option<Money> {
        self.lines.iter().try_fold(Money::ZERO, |acc, line| {
            acc.checked_add(line.item.price.checked_multiply(line.quantity)?)
        })
    }
}

// ============================================================================
// Orders
// ============================================================================

/// Order header fields chosen by the caller of a build.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewOrder {
    /// Holder label.
    pub owner_label: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Payment time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Hosted checkout session reference.
    pub external_checkout_ref: Option<String>,
}

/// One line of a committed order. Prices are snapshots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    /// Item ordered.
    pub item_id: CatalogItemId,
    /// Item name at order time.
    pub item_name: String,
    /// Quantity (at least 1).
    pub quantity: u32,
    /// Unit price at order time.
    pub unit_price: Money,
}

impl OrderLine {
    /// `unit_price * quantity`.
    #[must_use]
    pub const fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity)
    }
}

/// A committed order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Identity.
    pub id: OrderId,
    /// Holder label.
    pub owner_label: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Fulfilment status.
    pub status: OrderStatus,
    /// Payment method.
    pub payment_method: PaymentMethod,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Sum of line totals.
    pub total_amount: Money,
    /// Hosted checkout session reference.
    pub external_checkout_ref: Option<String>,
    /// Payment time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Lines, ordered by item id.
    pub lines: Vec<OrderLine>,
}

/// Aggregate figures for the admin overview.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    /// Sum of paid order totals.
    pub paid_total: Money,
    /// Number of paid orders.
    pub paid_count: u64,
    /// Number of orders awaiting payment.
    pub pending_count: u64,
}
