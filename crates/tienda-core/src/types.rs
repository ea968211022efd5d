//! # Domain Types
//!
//! Plain data shared by every module of tienda-core.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    CartItem     │   │ PriceBreakdown  │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  subtotal       │   │  id (UUID)      │       │
//! │  │  unit_price     │   │  discount       │   │  items (frozen) │       │
//! │  │  image          │   │  shipping       │   │  breakdown      │       │
//! │  └─────────────────┘   │  total          │   │  status + log   │       │
//! │                        └─────────────────┘   │  version        │       │
//! │                                              └─────────────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ ShippingMethod  │   │  OrderStatus    │   │     Actor       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Standard       │   │  Pending        │   │  Customer       │       │
//! │  │  CashOnDelivery │   │  Processing     │   │  Admin          │       │
//! │  └─────────────────┘   │  Shipped        │   └─────────────────┘       │
//! │                        │  Delivered      │                              │
//! │                        │  Cancelled      │                              │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Behavior lives in the sibling modules: [`crate::cart`],
//! [`crate::shipping`], [`crate::pricing`], [`crate::lifecycle`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Cart Item
// =============================================================================

/// A line item in a cart or an order snapshot.
///
/// There is no quantity: the same product added twice is two line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product name at time of adding.
    pub name: String,

    /// Unit price at time of adding.
    pub unit_price: Money,

    /// Opaque image reference, never interpreted.
    pub image: String,
}

impl CartItem {
    pub fn new(name: impl Into<String>, unit_price: Money, image: impl Into<String>) -> Self {
        CartItem {
            name: name.into(),
            unit_price,
            image: image.into(),
        }
    }
}

// =============================================================================
// Destination
// =============================================================================

/// Delivery destination entered at checkout.
///
/// Only `city` is interpreted (shipping eligibility); the rest is carried
/// for the fulfilment team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Destination {
    pub recipient: String,
    pub phone: String,
    pub address: String,
    pub city: String,
}

impl Destination {
    /// Destination with only a city, for pricing previews.
    pub fn city(city: impl Into<String>) -> Self {
        Destination {
            city: city.into(),
            ..Destination::default()
        }
    }
}

// =============================================================================
// Shipping Method
// =============================================================================

/// How an order is delivered and paid for at the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShippingMethod {
    /// Courier delivery, offered everywhere.
    Standard,
    /// Paid on delivery, local delivery zone only.
    CashOnDelivery,
}

impl ShippingMethod {
    /// Every known method, in display order.
    pub const ALL: [ShippingMethod; 2] = [ShippingMethod::Standard, ShippingMethod::CashOnDelivery];

    pub const fn as_str(&self) -> &'static str {
        match self {
            ShippingMethod::Standard => "standard",
            ShippingMethod::CashOnDelivery => "cash_on_delivery",
        }
    }
}

impl std::fmt::Display for ShippingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Lifecycle state of an order. Transition rules are in [`crate::lifecycle`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed at checkout, not yet picked up by an operator.
    #[default]
    Pending,
    /// Being prepared.
    Processing,
    /// Handed to the courier.
    Shipped,
    /// Received by the customer (terminal).
    Delivered,
    /// Cancelled before shipping (terminal).
    Cancelled,
}

// =============================================================================
// Actor
// =============================================================================

/// Who is issuing a request, as reported by the identity collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Actor {
    /// Authenticated shopper.
    Customer,
    /// Store operator using the admin dashboard.
    Admin,
}

impl Actor {
    pub fn from_is_admin(is_admin: bool) -> Self {
        if is_admin {
            Actor::Admin
        } else {
            Actor::Customer
        }
    }
}

// =============================================================================
// Price Breakdown
// =============================================================================

/// Immutable pricing snapshot computed once at checkout.
///
/// ## Invariants
/// - `discount_amount <= subtotal`
/// - `total = subtotal - discount_amount + shipping_cost >= 0`
///
/// Fields are private; the only constructor checks both invariants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
    subtotal: Money,
    discount_amount: Money,
    shipping_cost: Money,
    total: Money,
}

impl PriceBreakdown {
    /// Builds a breakdown from its parts, computing the total.
    ///
    /// Used by the pricing engine and when rehydrating a stored order.
    pub fn from_parts(
        subtotal: Money,
        discount_amount: Money,
        shipping_cost: Money,
    ) -> CoreResult<Self> {
        if subtotal.is_negative() || shipping_cost.is_negative() || discount_amount.is_negative()
        {
            return Err(ValidationError::OutOfRange {
                field: "price breakdown".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }

        if discount_amount > subtotal {
            return Err(ValidationError::OutOfRange {
                field: "discount amount".to_string(),
                min: 0,
                max: subtotal.units(),
            }
            .into());
        }

        let total = (subtotal - discount_amount)
            .checked_add(shipping_cost)
            .ok_or_else(|| CoreError::AmountOverflow {
                field: "total".to_string(),
            })?;

        Ok(PriceBreakdown {
            subtotal,
            discount_amount,
            shipping_cost,
            total,
        })
    }

    pub fn subtotal(&self) -> Money {
        self.subtotal
    }

    pub fn discount_amount(&self) -> Money {
        self.discount_amount
    }

    pub fn shipping_cost(&self) -> Money {
        self.shipping_cost
    }

    pub fn total(&self) -> Money {
        self.total
    }
}

// =============================================================================
// Order
// =============================================================================

/// One entry in an order's status log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub status: OrderStatus,
    #[ts(as = "String")]
    pub at: DateTime<Utc>,
}

/// A placed order.
///
/// Items and breakdown are frozen at checkout and never recomputed.
/// Status, log and version change only through
/// [`crate::lifecycle::transition`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub items: Vec<CartItem>,
    pub breakdown: PriceBreakdown,
    pub destination: Destination,
    pub shipping_method: ShippingMethod,
    /// Canonical code of the coupon that produced the discount, if any.
    pub coupon_code: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub(crate) status: OrderStatus,
    pub(crate) status_log: Vec<StatusChange>,
    pub(crate) version: u64,
}

impl Order {
    pub fn status(&self) -> OrderStatus {
        self.status
    }

    /// Status changes in the order they happened, starting with `pending`.
    pub fn status_log(&self) -> &[StatusChange] {
        &self.status_log
    }

    /// Number of transitions applied since checkout.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Raw order parts as read back from storage.
#[derive(Debug, Clone)]
pub struct StoredOrder {
    pub id: String,
    pub items: Vec<CartItem>,
    pub breakdown: PriceBreakdown,
    pub destination: Destination,
    pub shipping_method: ShippingMethod,
    pub coupon_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub status_log: Vec<StatusChange>,
    pub version: u64,
}

impl TryFrom<StoredOrder> for Order {
    type Error = ValidationError;

    /// Rebuilds an order, requiring the log to end at the stored status.
    fn try_from(stored: StoredOrder) -> Result<Self, Self::Error> {
        match stored.status_log.last() {
            None => {
                return Err(ValidationError::Required {
                    field: "status log".to_string(),
                })
            }
            Some(last) if last.status != stored.status => {
                return Err(ValidationError::InvalidFormat {
                    field: "status log".to_string(),
                    reason: format!(
                        "last entry is {} but order status is {}",
                        last.status, stored.status
                    ),
                })
            }
            Some(_) => {}
        }

        Ok(Order {
            id: stored.id,
            items: stored.items,
            breakdown: stored.breakdown,
            destination: stored.destination,
            shipping_method: stored.shipping_method,
            coupon_code: stored.coupon_code,
            created_at: stored.created_at,
            status: stored.status,
            status_log: stored.status_log,
            version: stored.version,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
