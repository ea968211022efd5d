//! # Coupons
//!
//! Percentage-discount coupons and the rules for applying them.
//!
//! ## Applying a Coupon
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Customer types "verano10"                                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize_code() → "VERANO10"   ← the ONLY place codes are normalized  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  store lookup → Coupon (structurally valid by construction)            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  check(subtotal, now)                                                  │
//! │       ├── inactive?            → Inactive                              │
//! │       ├── subtotal < minimum?  → BelowMinimum                          │
//! │       ├── expired before now?  → Expired                               │
//! │       └── OK                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  discount_amount = floor(subtotal × percent / 100)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, CouponRejection, ValidationError};
use crate::money::Money;
use crate::validation::{validate_coupon_code, validate_discount_percent, validate_price};

/// Canonical form of a coupon code: trimmed and upper-cased.
///
/// ## Example
/// ```rust
/// use tienda_core::coupon::normalize_code;
///
/// assert_eq!(normalize_code("  verano10 "), "VERANO10");
/// ```
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// A percentage-discount coupon.
///
/// A `Coupon` value is always structurally valid: the code is non-empty and
/// the percent is in `1..=100`. Both [`Coupon::new`] and deserialization go
/// through the same checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CouponRecord", into = "CouponRecord")]
pub struct Coupon {
    code: String,
    discount_percent: u8,
    min_amount: Money,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
}

/// Unchecked coupon fields, as stored or entered in the admin form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRecord {
    pub code: String,
    pub discount_percent: i64,
    pub min_amount: i64,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Coupon {
    /// Creates a coupon, canonicalizing the code.
    ///
    /// ## Errors
    /// - empty or malformed code
    /// - `discount_percent` outside `1..=100`
    /// - negative `min_amount`
    pub fn new(
        code: &str,
        discount_percent: i64,
        min_amount: Money,
        is_active: bool,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let code = normalize_code(code);
        validate_coupon_code(&code)?;
        let discount_percent = validate_discount_percent(discount_percent)?;
        validate_price("minimum amount", min_amount)?;

        Ok(Coupon {
            code,
            discount_percent,
            min_amount,
            is_active,
            expires_at,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn discount_percent(&self) -> u8 {
        self.discount_percent
    }

    pub fn min_amount(&self) -> Money {
        self.min_amount
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether `entered` refers to this coupon, ignoring case and padding.
    pub fn matches(&self, entered: &str) -> bool {
        normalize_code(entered) == self.code
    }

    /// Copy of this coupon with a different active flag.
    pub fn with_active(&self, is_active: bool) -> Self {
        Coupon {
            is_active,
            ..self.clone()
        }
    }

    /// Explains whether the coupon applies to `subtotal` at `now`.
    pub fn check(&self, subtotal: Money, now: DateTime<Utc>) -> CoreResult<()> {
        let rejection = if !self.is_active {
            Some(CouponRejection::Inactive)
        } else if subtotal < self.min_amount {
            Some(CouponRejection::BelowMinimum {
                min_amount: self.min_amount,
                subtotal,
            })
        } else {
            match self.expires_at {
                Some(expired_at) if expired_at < now => {
                    Some(CouponRejection::Expired { expired_at })
                }
                _ => None,
            }
        };

        match rejection {
            None => Ok(()),
            Some(reason) => Err(CoreError::CouponNotApplicable {
                code: self.code.clone(),
                reason,
            }),
        }
    }

    pub fn is_valid_for(&self, subtotal: Money, now: DateTime<Utc>) -> bool {
        self.check(subtotal, now).is_ok()
    }

    /// Discount for `subtotal` at `now`, rounded down; zero if the coupon
    /// does not apply.
    pub fn discount_amount(&self, subtotal: Money, now: DateTime<Utc>) -> Money {
        if !self.is_valid_for(subtotal, now) {
            return Money::zero();
        }
        subtotal.percent_floor(self.discount_percent)
    }
}

impl TryFrom<CouponRecord> for Coupon {
    type Error = ValidationError;

    fn try_from(record: CouponRecord) -> Result<Self, Self::Error> {
        Coupon::new(
            &record.code,
            record.discount_percent,
            Money::from_units(record.min_amount),
            record.is_active,
            record.expires_at,
        )
    }
}

impl From<Coupon> for CouponRecord {
    fn from(coupon: Coupon) -> Self {
        CouponRecord {
            code: coupon.code,
            discount_percent: i64::from(coupon.discount_percent),
            min_amount: coupon.min_amount.units(),
            is_active: coupon.is_active,
            expires_at: coupon.expires_at,
        }
    }
}
