//! # Cart
//!
//! The shopping cart owned by one checkout session.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Frontend Action          Cart Operation          Effect                │
//! │  ───────────────          ──────────────          ──────                │
//! │                                                                         │
//! │  Click Product ──────────► add(item) ───────────► items.push(item)     │
//! │                                                                         │
//! │  Click Remove ───────────► remove_at(i) ────────► items.remove(i)      │
//! │                                                                         │
//! │  Order placed ───────────► clear() ─────────────► items.clear()        │
//! │                                                                         │
//! │  View Cart ──────────────► subtotal() ──────────► checked sum          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Items keep insertion order; removal never reorders the rest.
//! - Adding the same product twice yields two line items.
//! - Names and prices are stored as given; see [`crate::validation`] for
//!   the checks callers run before checkout.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::CartItem;

/// An ordered list of line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Appends a line item.
    pub fn add(&mut self, item: CartItem) {
        self.items.push(item);
    }

    /// Removes and returns the line item at `index`.
    ///
    /// ## Errors
    /// `OutOfRange` if `index` is not a current position. The cart is
    /// unchanged in that case.
    pub fn remove_at(&mut self, index: usize) -> CoreResult<CartItem> {
        if index >= self.items.len() {
            return Err(CoreError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Clears all items from the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Sum of all unit prices; zero for an empty cart.
    ///
    /// ## Errors
    /// `AmountOverflow` if the prices add up past `i64::MAX`.
    pub fn subtotal(&self) -> CoreResult<Money> {
        Money::checked_sum(self.items.iter().map(|i| i.unit_price)).ok_or_else(|| {
            CoreError::AmountOverflow {
                field: "subtotal".to_string(),
            }
        })
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<CartItem> for Cart {
    fn from_iter<I: IntoIterator<Item = CartItem>>(iter: I) -> Self {
        Cart {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, price: i64) -> CartItem {
        CartItem::new(name, Money::from_units(price), format!("img/{}.jpg", name))
    }

    #[test]
    fn test_cart_add_item() {
        let mut cart = Cart::new();
        cart.add(item("camisa", 80_000));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.subtotal().unwrap().units(), 80_000);
    }

    #[test]
    fn test_cart_add_same_product_twice_keeps_two_lines() {
        let mut cart = Cart::new();
        cart.add(item("camisa", 80_000));
        cart.add(item("camisa", 80_000));

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.subtotal().unwrap().units(), 160_000);
    }

    #[test]
    fn test_cart_remove_keeps_order() {
        let mut cart: Cart = [item("a", 1), item("b", 2), item("c", 3)]
            .into_iter()
            .collect();

        let removed = cart.remove_at(1).unwrap();
        assert_eq!(removed.name, "b");

        let names: Vec<&str> = cart.items().iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(cart.subtotal().unwrap().units(), 4);
    }

    #[test]
    fn test_cart_remove_out_of_range() {
        let mut cart: Cart = [item("a", 1)].into_iter().collect();

        let err = cart.remove_at(1).unwrap_err();
        assert!(matches!(err, CoreError::OutOfRange { index: 1, len: 1 }));
        assert_eq!(cart.len(), 1);

        let mut empty = Cart::new();
        assert!(empty.remove_at(0).is_err());
    }

    #[test]
    fn test_cart_clear() {
        let mut cart: Cart = [item("a", 1), item("b", 2)].into_iter().collect();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.subtotal().unwrap().is_zero());
    }

    #[test]
    fn test_empty_cart_subtotal_is_zero() {
        assert_eq!(Cart::new().subtotal().unwrap(), Money::zero());
    }

    #[test]
    fn test_subtotal_overflow_is_an_error() {
        let cart: Cart = [item("a", i64::MAX), item("b", 1)].into_iter().collect();

        let err = cart.subtotal().unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }
}
