//! # tienda-core: Pricing and Order Rules for Tienda
//!
//! This crate holds the storefront's business rules as pure functions with
//! zero I/O dependencies. It turns a cart into a checked price, moves orders
//! through their lifecycle and folds orders into dashboard figures.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tienda Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Storefront / Admin dashboard                    │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► Orders ──► Metrics        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tienda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │   cart   │ │  coupon  │ │ shipping │ │ pricing  │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │lifecycle │ │ metrics  │ │  money   │ │validation│          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   tienda-db (Storage Layer)                     │   │
//! │  │         SQLite orders and coupons, optimistic transitions       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`cart`] - The shopping cart
//! - [`coupon`] - Percentage coupons and code normalization
//! - [`shipping`] - Shipping methods, eligibility and cost
//! - [`pricing`] - `price` and `checkout`
//! - [`lifecycle`] - Order status graph and `transition`
//! - [`metrics`] - Dashboard revenue aggregation
//! - [`types`] - Shared domain types
//! - [`money`] - Integer money
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output
//! 2. **Explicit Time**: every time-dependent function takes `now`
//! 3. **Integer Money**: all amounts are whole pesos (i64), discounts round down
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use tienda_core::{Cart, CartItem, Coupon, Money, PricingEngine, ShippingMethod};
//!
//! let mut cart = Cart::new();
//! cart.add(CartItem::new("Camisa", Money::from_units(80_000), "img/camisa.jpg"));
//! cart.add(CartItem::new("Pantalón", Money::from_units(90_000), "img/pantalon.jpg"));
//!
//! let coupon = Coupon::new("verano10", 10, Money::from_units(100_000), true, None).unwrap();
//!
//! let breakdown = PricingEngine::default()
//!     .price(&cart, Some(&coupon), ShippingMethod::Standard, "Bogotá", Utc::now())
//!     .unwrap();
//!
//! // 170.000 - 17.000 + 15.000
//! assert_eq!(breakdown.total().units(), 168_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod error;
pub mod lifecycle;
pub mod metrics;
pub mod money;
pub mod pricing;
pub mod shipping;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::Cart;
pub use coupon::{normalize_code, Coupon, CouponRecord};
pub use error::{CoreError, CoreResult, CouponRejection, ValidationError};
pub use metrics::{aggregate, MetricsSnapshot, OrderSummary, RevenueSummary};
pub use money::Money;
pub use pricing::PricingEngine;
pub use shipping::{ShippingCalculator, ShippingConfig, ShippingOptions};
pub use types::*;
