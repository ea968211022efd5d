//! # Order Lifecycle
//!
//! The order status graph and the only function allowed to move an order
//! along it.
//!
//! ## Status Graph
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐     ┌────────────┐     ┌─────────┐     ┌───────────┐     │
//! │   │ pending │────►│ processing │────►│ shipped │────►│ delivered │     │
//! │   └────┬────┘     └─────┬──────┘     └─────────┘     └───────────┘     │
//! │        │                │                              (terminal)       │
//! │        │                ▼                                               │
//! │        │          ┌───────────┐                                         │
//! │        └─────────►│ cancelled │  (terminal)                             │
//! │                   └───────────┘                                         │
//! │                                                                         │
//! │  Anything else, including staying in the same status, is illegal.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Applying a Transition
//! [`transition`] checks the graph first and only then mutates: it appends
//! `(next, at)` to the status log, sets the status and bumps the version.
//! A rejected transition leaves the order exactly as it was.
//!
//! The version is what the store compares against to reject concurrent
//! writers (see `OrderRepository::transition` in tienda-db).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::types::{Actor, Order, OrderStatus, StatusChange};

impl OrderStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Statuses reachable in one step from `self`.
    pub fn allowed_transitions(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Pending => &[OrderStatus::Processing, OrderStatus::Cancelled],
            OrderStatus::Processing => &[OrderStatus::Shipped, OrderStatus::Cancelled],
            OrderStatus::Shipped => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// Delivered and cancelled orders never change again.
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "order status".to_string(),
                allowed: OrderStatus::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

/// Moves `order` to `next`, recording the change at `at`.
///
/// ## Errors
/// `IllegalTransition` if the graph has no `status → next` edge. The order
/// is not modified in that case.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tienda_core::{lifecycle, Cart, CartItem, Destination, Money, OrderStatus};
/// use tienda_core::{PricingEngine, ShippingMethod};
///
/// let cart: Cart = [CartItem::new("Gorra", Money::from_units(30_000), "")]
///     .into_iter()
///     .collect();
/// let mut order = PricingEngine::default()
///     .checkout(&cart, None, ShippingMethod::Standard, Destination::city("Cali"), Utc::now())
///     .unwrap();
///
/// lifecycle::transition(&mut order, OrderStatus::Processing, Utc::now()).unwrap();
/// assert_eq!(order.status(), OrderStatus::Processing);
/// assert_eq!(order.version(), 1);
///
/// assert!(lifecycle::transition(&mut order, OrderStatus::Pending, Utc::now()).is_err());
/// ```
pub fn transition(order: &mut Order, next: OrderStatus, at: DateTime<Utc>) -> CoreResult<()> {
    let from = order.status;
    if !from.can_transition_to(next) {
        return Err(CoreError::IllegalTransition { from, to: next });
    }

    order.status_log.push(StatusChange { status: next, at });
    order.status = next;
    order.version += 1;
    Ok(())
}

/// Only admins may change an order's status.
pub fn authorize(actor: Actor, action: &str) -> CoreResult<()> {
    match actor {
        Actor::Admin => Ok(()),
        Actor::Customer => Err(CoreError::NotPermitted {
            actor,
            action: action.to_string(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
