//! # Validation Module
//!
//! Input validation for catalog items, coupons and destinations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Checkout / Admin forms                                        │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── validate_cart()       before pricing a checkout                   │
//! │  ├── Coupon::new()         on coupon creation/storage                  │
//! │  └── validate_city()       on destination entry                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  └── NOT NULL / CHECK constraints                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Cart::add` stores items as given; running these checks is the
//! caller's job.

use crate::cart::Cart;
use crate::error::ValidationError;
use crate::money::Money;
use crate::types::CartItem;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a product name.
pub const MAX_NAME_LEN: usize = 200;

/// Maximum length of a coupon code.
pub const MAX_COUPON_CODE_LEN: usize = 32;

/// Maximum length of a city name.
pub const MAX_CITY_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a product name.
///
/// ## Rules
/// - Must not be empty (after trimming)
/// - At most 200 characters
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_item_name;
///
/// assert!(validate_item_name("Camisa azul").is_ok());
/// assert!(validate_item_name("  ").is_err());
/// ```
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Validates a canonical coupon code.
///
/// ## Rules
/// - Must not be empty
/// - At most 32 characters
/// - Letters, digits, hyphens and underscores only
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "coupon code".to_string(),
        });
    }

    if code.chars().count() > MAX_COUPON_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "coupon code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "coupon code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a destination city.
///
/// An empty city is allowed here: shipping reports it as an incomplete
/// destination instead of an error.
pub fn validate_city(city: &str) -> ValidationResult<()> {
    if city.trim().chars().count() > MAX_CITY_LEN {
        return Err(ValidationError::TooLong {
            field: "city".to_string(),
            max: MAX_CITY_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a non-negative amount. `field` names it in the error.
///
/// ## Example
/// ```rust
/// use tienda_core::money::Money;
/// use tienda_core::validation::validate_price;
///
/// assert!(validate_price("price", Money::from_units(80_000)).is_ok());
/// assert!(validate_price("price", Money::zero()).is_ok());
/// assert!(validate_price("price", Money::from_units(-1)).is_err());
/// ```
pub fn validate_price(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a coupon percentage and narrows it to `u8`.
///
/// ## Rules
/// - 1 to 100 inclusive (a 0% coupon is structurally invalid)
pub fn validate_discount_percent(percent: i64) -> ValidationResult<u8> {
    if !(1..=100).contains(&percent) {
        return Err(ValidationError::OutOfRange {
            field: "discount percent".to_string(),
            min: 1,
            max: 100,
        });
    }

    Ok(percent as u8)
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates a single line item.
pub fn validate_cart_item(item: &CartItem) -> ValidationResult<()> {
    validate_item_name(&item.name)?;
    validate_price("unit price", item.unit_price)
}

/// Validates every line item of a cart before checkout.
///
/// An empty cart passes here; pricing rejects it with `EmptyCart`.
pub fn validate_cart(cart: &Cart) -> ValidationResult<()> {
    cart.items().iter().try_for_each(validate_cart_item)
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates an order ID.
///
/// ## Example
/// ```rust
/// use tienda_core::validation::validate_order_id;
///
/// assert!(validate_order_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_order_id("not-a-uuid").is_err());
/// ```
pub fn validate_order_id(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "order id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "order id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_item_name() {
        assert!(validate_item_name("Camisa azul").is_ok());
        assert!(validate_item_name("").is_err());
        assert!(validate_item_name("   ").is_err());
        assert!(validate_item_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_coupon_code() {
        assert!(validate_coupon_code("VERANO10").is_ok());
        assert!(validate_coupon_code("BLACK_FRIDAY-2026").is_ok());

        assert!(validate_coupon_code("").is_err());
        assert!(validate_coupon_code("HAS SPACE").is_err());
        assert!(validate_coupon_code("50%OFF").is_err());
        assert!(validate_coupon_code(&"A".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_discount_percent() {
        assert_eq!(validate_discount_percent(1).unwrap(), 1);
        assert_eq!(validate_discount_percent(100).unwrap(), 100);

        assert!(validate_discount_percent(0).is_err());
        assert!(validate_discount_percent(101).is_err());
        assert!(validate_discount_percent(-10).is_err());
    }

    #[test]
    fn test_validate_city() {
        assert!(validate_city("Bucaramanga").is_ok());
        assert!(validate_city("").is_ok());
        assert!(validate_city(&"x".repeat(150)).is_err());
    }

    #[test]
    fn test_validate_cart() {
        let mut cart = Cart::new();
        assert!(validate_cart(&cart).is_ok());

        cart.add(CartItem::new("Camisa", Money::from_units(80_000), "img/1"));
        assert!(validate_cart(&cart).is_ok());

        cart.add(CartItem::new("", Money::from_units(1000), "img/2"));
        assert!(matches!(
            validate_cart(&cart),
            Err(ValidationError::Required { .. })
        ));

        let mut negative = Cart::new();
        negative.add(CartItem::new("Gorra", Money::from_units(-1), "img/3"));
        assert!(matches!(
            validate_cart(&negative),
            Err(ValidationError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_validate_order_id() {
        assert!(validate_order_id("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_order_id("").is_err());
        assert!(validate_order_id("123").is_err());
    }
}
