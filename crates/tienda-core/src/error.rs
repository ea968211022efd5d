//! # Error Types
//!
//! Domain-specific error types for tienda-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tienda-core errors (this file)                                        │
//! │  ├── CoreError        - Pricing and lifecycle rule failures            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tienda-db errors (separate crate)                                     │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller / UI             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure is local and recoverable. Nothing in tienda-core panics or
//! partially applies an operation before returning one of these.

use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::money::Money;
use crate::types::{Actor, OrderStatus, ShippingMethod};

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart index does not point at a current line item.
    #[error("Cart index {index} is out of range (cart has {len} items)")]
    OutOfRange { index: usize, len: usize },

    /// Checkout was attempted on a cart with no items.
    #[error("Cannot price an empty cart")]
    EmptyCart,

    /// The method exists but is not offered for this destination.
    ///
    /// ## When This Occurs
    /// ```text
    /// city = "Bogotá" (outside local delivery zone)
    ///      │
    ///      ▼
    /// method = cash_on_delivery
    ///      │
    ///      ▼
    /// MethodNotAvailable { method: CashOnDelivery, city: "Bogotá" }
    /// ```
    #[error("Shipping method {method} is not available for '{city}'")]
    MethodNotAvailable { method: ShippingMethod, city: String },

    /// An amount on the checkout path does not fit in `Money`.
    #[error("{field} exceeds the largest supported amount")]
    AmountOverflow { field: String },

    /// The requested method name is not one the store knows.
    #[error("Unsupported shipping method: '{0}'")]
    UnsupportedMethod(String),

    /// The status graph does not allow `from → to`.
    #[error("Illegal order transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    /// The order changed since the caller read it.
    #[error("Order {order_id} was modified concurrently (expected version {expected_version})")]
    StaleTransition {
        order_id: String,
        expected_version: u64,
    },

    /// A well-formed coupon that does not apply to this checkout.
    #[error("Coupon {code} cannot be applied: {reason}")]
    CouponNotApplicable {
        code: String,
        reason: CouponRejection,
    },

    /// The actor's role does not allow the operation.
    #[error("{actor:?} is not permitted to {action}")]
    NotPermitted { actor: Actor, action: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Why a structurally valid coupon was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CouponRejection {
    Inactive,
    BelowMinimum { min_amount: Money, subtotal: Money },
    Expired { expired_at: DateTime<Utc> },
}

impl fmt::Display for CouponRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CouponRejection::Inactive => write!(f, "coupon is not active"),
            CouponRejection::BelowMinimum {
                min_amount,
                subtotal,
            } => write!(f, "subtotal {} is below the minimum of {}", subtotal, min_amount),
            CouponRejection::Expired { expired_at } => {
                write!(f, "coupon expired on {}", expired_at.format("%Y-%m-%d"))
            }
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Raised before business logic runs, or when a stored record fails to
/// rebuild into a domain value.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid UUID, bad coupon code characters).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::OutOfRange { index: 3, len: 2 };
        assert_eq!(
            err.to_string(),
            "Cart index 3 is out of range (cart has 2 items)"
        );

        let err = CoreError::MethodNotAvailable {
            method: ShippingMethod::CashOnDelivery,
            city: "Bogotá".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Shipping method cash_on_delivery is not available for 'Bogotá'"
        );

        let err = CoreError::IllegalTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Cancelled,
        };
        assert_eq!(err.to_string(), "Illegal order transition: delivered -> cancelled");
    }

    #[test]
    fn test_coupon_rejection_messages() {
        let err = CoreError::CouponNotApplicable {
            code: "VERANO10".to_string(),
            reason: CouponRejection::BelowMinimum {
                min_amount: Money::from_units(100_000),
                subtotal: Money::from_units(50_000),
            },
        };
        assert_eq!(
            err.to_string(),
            "Coupon VERANO10 cannot be applied: subtotal $50.000 is below the minimum of $100.000"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
