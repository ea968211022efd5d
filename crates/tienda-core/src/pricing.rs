//! # Pricing Engine
//!
//! Composes cart, coupon and shipping into a [`PriceBreakdown`], and turns a
//! priced checkout into a pending [`Order`].
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          price()                                        │
//! │                                                                         │
//! │  Cart ──────► empty? ──yes──► EmptyCart                                │
//! │                 │                                                       │
//! │                 no                                                      │
//! │                 ▼                                                       │
//! │  subtotal = Σ unit_price                                               │
//! │                 │                                                       │
//! │  Coupon? ──────►│ discount = coupon.discount_amount(subtotal, now)     │
//! │                 │            (0 when absent or not applicable)         │
//! │                 ▼                                                       │
//! │  method ∈ available_methods(city)? ──no──► MethodNotAvailable          │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  shipping = cost_of(method, city, subtotal)                            │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  PriceBreakdown { subtotal, discount, shipping, total }                │
//! │                                                                         │
//! │                          checkout()                                     │
//! │                                                                         │
//! │  price() ──► freeze items ──► Order { status: pending, version: 0 }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `price` reads nothing but its arguments; calling it again with the same
//! inputs returns the same breakdown, so checkout retries are safe.
//!
//! ## Example
//! ```rust
//! use chrono::Utc;
//! use tienda_core::{Cart, CartItem, Money, PricingEngine, ShippingMethod};
//!
//! let mut cart = Cart::new();
//! cart.add(CartItem::new("Camisa", Money::from_units(80_000), "img/camisa.jpg"));
//!
//! let engine = PricingEngine::default();
//! let breakdown = engine
//!     .price(&cart, None, ShippingMethod::Standard, "Bogotá", Utc::now())
//!     .unwrap();
//! assert_eq!(breakdown.total().units(), 95_000);
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::cart::Cart;
use crate::coupon::Coupon;
use crate::error::{CoreError, CoreResult};
use crate::shipping::{ShippingCalculator, ShippingConfig};
use crate::types::{Destination, Order, OrderStatus, PriceBreakdown, ShippingMethod, StatusChange};
use crate::validation::validate_city;

/// Prices checkouts against one shipping configuration.
#[derive(Debug, Clone, Default)]
pub struct PricingEngine {
    shipping: ShippingCalculator,
}

impl PricingEngine {
    pub fn new(config: ShippingConfig) -> Self {
        PricingEngine {
            shipping: ShippingCalculator::new(config),
        }
    }

    pub fn shipping(&self) -> &ShippingCalculator {
        &self.shipping
    }

    /// Prices a checkout.
    ///
    /// ## Errors
    /// - `EmptyCart` if the cart has no items
    /// - `MethodNotAvailable` if `method` is not offered for `city`
    /// - `Validation` if `city` is longer than a city name can be
    /// - `AmountOverflow` if the subtotal or total does not fit in `Money`
    ///
    /// A coupon that does not apply is not an error; it contributes a zero
    /// discount. Use [`Coupon::check`] to tell the customer why.
    pub fn price(
        &self,
        cart: &Cart,
        coupon: Option<&Coupon>,
        method: ShippingMethod,
        city: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<PriceBreakdown> {
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }
        validate_city(city)?;

        let subtotal = cart.subtotal()?;
        let discount = coupon.map_or_else(Default::default, |c| c.discount_amount(subtotal, now));
        let shipping = self.shipping.cost_of(method, city, subtotal)?;

        PriceBreakdown::from_parts(subtotal, discount, shipping)
    }

    /// Prices the cart and builds the pending order from the snapshot.
    ///
    /// The coupon code is recorded only if it produced a discount.
    pub fn checkout(
        &self,
        cart: &Cart,
        coupon: Option<&Coupon>,
        method: ShippingMethod,
        destination: Destination,
        now: DateTime<Utc>,
    ) -> CoreResult<Order> {
        let breakdown = self.price(cart, coupon, method, &destination.city, now)?;

        let coupon_code = coupon
            .filter(|_| !breakdown.discount_amount().is_zero())
            .map(|c| c.code().to_string());

        Ok(Order {
            id: Uuid::new_v4().to_string(),
            items: cart.items().to_vec(),
            breakdown,
            destination,
            shipping_method: method,
            coupon_code,
            created_at: now,
            status: OrderStatus::Pending,
            status_log: vec![StatusChange {
                status: OrderStatus::Pending,
                at: now,
            }],
            version: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::CartItem;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn cart_of(prices: &[i64]) -> Cart {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| CartItem::new(format!("item-{i}"), Money::from_units(*p), ""))
            .collect()
    }

    fn ten_percent() -> Coupon {
        Coupon::new("DIEZ", 10, Money::from_units(100_000), true, None).unwrap()
    }

    #[test]
    fn test_scenario_standard_to_bogota() {
        let cart = cart_of(&[80_000, 90_000]);
        let coupon = ten_percent();

        let b = PricingEngine::default()
            .price(&cart, Some(&coupon), ShippingMethod::Standard, "Bogotá", now())
            .unwrap();

        assert_eq!(b.subtotal().units(), 170_000);
        assert_eq!(b.discount_amount().units(), 17_000);
        assert_eq!(b.shipping_cost().units(), 15_000);
        assert_eq!(b.total().units(), 168_000);
    }

    #[test]
    fn test_scenario_cod_to_bucaramanga() {
        let cart = cart_of(&[80_000, 90_000]);
        let coupon = ten_percent();

        let b = PricingEngine::default()
            .price(
                &cart,
                Some(&coupon),
                ShippingMethod::CashOnDelivery,
                "Bucaramanga",
                now(),
            )
            .unwrap();

        assert_eq!(b.discount_amount().units(), 17_000);
        assert_eq!(b.shipping_cost().units(), 5_000);
        assert_eq!(b.total().units(), 158_000);
    }

    #[test]
    fn test_scenario_free_shipping_over_threshold() {
        let cart = cart_of(&[150_000, 100_000]);
        let engine = PricingEngine::default();

        for (method, city) in [
            (ShippingMethod::Standard, "Bogotá"),
            (ShippingMethod::Standard, "Bucaramanga"),
            (ShippingMethod::CashOnDelivery, "Bucaramanga"),
        ] {
            let b = engine.price(&cart, None, method, city, now()).unwrap();
            assert!(b.shipping_cost().is_zero());
            assert_eq!(b.total().units(), 250_000);
        }
    }

    #[test]
    fn test_no_coupon_total_is_subtotal_plus_standard() {
        let engine = PricingEngine::default();
        for prices in [&[1][..], &[80_000], &[50_000, 60_000, 70_000]] {
            let cart = cart_of(prices);
            let b = engine
                .price(&cart, None, ShippingMethod::Standard, "Bogotá", now())
                .unwrap();
            assert_eq!(
                b.total(),
                cart.subtotal().unwrap() + engine.shipping().config().standard_cost
            );
        }
    }

    #[test]
    fn test_empty_cart_fails() {
        let err = PricingEngine::default()
            .price(&Cart::new(), None, ShippingMethod::Standard, "Bogotá", now())
            .unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_oversized_prices_fail_instead_of_wrapping() {
        let engine = PricingEngine::default();

        let err = engine
            .price(&cart_of(&[i64::MAX, 1]), None, ShippingMethod::Standard, "Bogotá", now())
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { ref field } if field == "subtotal"));

        // Subtotal fits, but adding shipping does not.
        let engine = PricingEngine::new(
            ShippingConfig::default().with_free_shipping_threshold(Money::from_units(i64::MAX)),
        );
        let err = engine
            .price(&cart_of(&[i64::MAX - 1]), None, ShippingMethod::Standard, "Bogotá", now())
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { ref field } if field == "total"));
    }

    #[test]
    fn test_overlong_city_is_rejected() {
        let city = "B".repeat(crate::validation::MAX_CITY_LEN + 1);
        let err = PricingEngine::default()
            .price(&cart_of(&[10_000]), None, ShippingMethod::Standard, &city, now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_cod_outside_zone_fails() {
        let err = PricingEngine::default()
            .price(
                &cart_of(&[10_000]),
                None,
                ShippingMethod::CashOnDelivery,
                "Medellín",
                now(),
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::MethodNotAvailable { .. }));
    }

    #[test]
    fn test_inapplicable_coupon_prices_without_discount() {
        let cart = cart_of(&[50_000]);
        let b = PricingEngine::default()
            .price(&cart, Some(&ten_percent()), ShippingMethod::Standard, "Cali", now())
            .unwrap();
        assert!(b.discount_amount().is_zero());
        assert_eq!(b.total().units(), 65_000);
    }

    #[test]
    fn test_price_is_repeatable() {
        let cart = cart_of(&[80_000, 90_000]);
        let coupon = ten_percent();
        let engine = PricingEngine::default();

        let first = engine
            .price(&cart, Some(&coupon), ShippingMethod::Standard, "Bogotá", now())
            .unwrap();
        let second = engine
            .price(&cart, Some(&coupon), ShippingMethod::Standard, "Bogotá", now())
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_checkout_builds_pending_order() {
        let cart = cart_of(&[80_000, 90_000]);
        let coupon = ten_percent();
        let destination = Destination {
            recipient: "Ana Pérez".to_string(),
            phone: "3001234567".to_string(),
            address: "Cra 27 # 45-10".to_string(),
            city: "Bucaramanga".to_string(),
        };

        let order = PricingEngine::default()
            .checkout(
                &cart,
                Some(&coupon),
                ShippingMethod::CashOnDelivery,
                destination.clone(),
                now(),
            )
            .unwrap();

        assert_eq!(order.status(), OrderStatus::Pending);
        assert_eq!(order.version(), 0);
        assert_eq!(order.status_log().len(), 1);
        assert_eq!(order.status_log()[0].at, now());
        assert_eq!(order.items, cart.items());
        assert_eq!(order.breakdown.total().units(), 158_000);
        assert_eq!(order.coupon_code.as_deref(), Some("DIEZ"));
        assert_eq!(order.destination, destination);
        assert_eq!(order.created_at, now());
        assert!(uuid::Uuid::parse_str(&order.id).is_ok());
    }

    #[test]
    fn test_checkout_drops_unused_coupon_code() {
        let order = PricingEngine::default()
            .checkout(
                &cart_of(&[10_000]),
                Some(&ten_percent()),
                ShippingMethod::Standard,
                Destination::city("Bogotá"),
                now(),
            )
            .unwrap();
        assert!(order.coupon_code.is_none());
    }

    #[test]
    fn test_order_snapshot_is_independent_of_cart() {
        let mut cart = cart_of(&[80_000]);
        let order = PricingEngine::default()
            .checkout(&cart, None, ShippingMethod::Standard, Destination::city("Cali"), now())
            .unwrap();

        cart.clear();
        cart.add(CartItem::new("item-0", Money::from_units(1), ""));

        assert_eq!(order.items[0].unit_price.units(), 80_000);
        assert_eq!(order.breakdown.subtotal().units(), 80_000);
    }
}
