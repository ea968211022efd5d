//! # Shipping
//!
//! Which shipping methods a destination can use, and what they cost.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Shipping Eligibility & Cost                         │
//! │                                                                         │
//! │  city ──► in local delivery zone?                                      │
//! │              ├── yes → [standard, cash_on_delivery]                    │
//! │              ├── no  → [standard]                                      │
//! │              └── ""  → [standard] + destination_incomplete             │
//! │                                                                         │
//! │  subtotal ──► >= free_shipping_threshold?                              │
//! │              ├── yes → 0 for every method                              │
//! │              └── no  → standard_cost | cod_cost                        │
//! │                                                                         │
//! │  Defaults: threshold 200.000, standard 15.000, COD 5.000               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All constants live in [`ShippingConfig`]; nothing in the calculation is
//! hard-coded.

use std::collections::BTreeSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::ShippingMethod;

/// Default subtotal at or above which shipping is free.
pub const DEFAULT_FREE_SHIPPING_THRESHOLD: Money = Money::from_units(200_000);

/// Default standard shipping cost.
pub const DEFAULT_STANDARD_COST: Money = Money::from_units(15_000);

/// Default cash-on-delivery cost.
pub const DEFAULT_COD_COST: Money = Money::from_units(5_000);

/// Default cities served by the local courier.
pub const DEFAULT_LOCAL_DELIVERY_ZONE: &[&str] =
    &["Bucaramanga", "Floridablanca", "Girón", "Piedecuesta"];

// =============================================================================
// Configuration
// =============================================================================

/// Shipping constants.
///
/// ## Example
/// ```rust
/// use tienda_core::money::Money;
/// use tienda_core::shipping::ShippingConfig;
///
/// let config = ShippingConfig::default()
///     .with_free_shipping_threshold(Money::from_units(150_000))
///     .with_local_delivery_zone(["Cúcuta"]);
/// assert!(config.is_local("cúcuta"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingConfig {
    pub free_shipping_threshold: Money,
    pub standard_cost: Money,
    pub cod_cost: Money,
    pub local_delivery_zone: BTreeSet<String>,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        ShippingConfig {
            free_shipping_threshold: DEFAULT_FREE_SHIPPING_THRESHOLD,
            standard_cost: DEFAULT_STANDARD_COST,
            cod_cost: DEFAULT_COD_COST,
            local_delivery_zone: DEFAULT_LOCAL_DELIVERY_ZONE
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

impl ShippingConfig {
    pub fn with_free_shipping_threshold(mut self, threshold: Money) -> Self {
        self.free_shipping_threshold = threshold;
        self
    }

    pub fn with_standard_cost(mut self, cost: Money) -> Self {
        self.standard_cost = cost;
        self
    }

    pub fn with_cod_cost(mut self, cost: Money) -> Self {
        self.cod_cost = cost;
        self
    }

    /// Replaces the local delivery zone.
    pub fn with_local_delivery_zone<I, S>(mut self, cities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.local_delivery_zone = cities.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive, whitespace-trimmed zone membership.
    pub fn is_local(&self, city: &str) -> bool {
        let wanted = normalize_city(city);
        if wanted.is_empty() {
            return false;
        }
        self.local_delivery_zone
            .iter()
            .any(|c| normalize_city(c) == wanted)
    }
}

fn normalize_city(city: &str) -> String {
    city.trim().to_lowercase()
}

// =============================================================================
// Shipping Method Parsing
// =============================================================================

impl FromStr for ShippingMethod {
    type Err = CoreError;

    /// Accepts `standard`, `cash_on_delivery`, `cash-on-delivery`,
    /// `cashOnDelivery` and `cod`, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_lowercase();

        match key.as_str() {
            "standard" => Ok(ShippingMethod::Standard),
            "cashondelivery" | "cod" => Ok(ShippingMethod::CashOnDelivery),
            _ => Err(CoreError::UnsupportedMethod(s.to_string())),
        }
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Methods offered for a destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShippingOptions {
    pub methods: Vec<ShippingMethod>,
    /// True when no city was given; the UI should ask for it.
    pub destination_incomplete: bool,
}

impl ShippingOptions {
    pub fn contains(&self, method: ShippingMethod) -> bool {
        self.methods.contains(&method)
    }
}

/// Resolves eligible methods and their cost from a [`ShippingConfig`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShippingCalculator {
    config: ShippingConfig,
}

impl ShippingCalculator {
    pub fn new(config: ShippingConfig) -> Self {
        ShippingCalculator { config }
    }

    pub fn config(&self) -> &ShippingConfig {
        &self.config
    }

    /// Methods offered for `city`.
    ///
    /// `standard` is always offered. `cash_on_delivery` only inside the
    /// local delivery zone.
    pub fn available_methods(&self, city: &str) -> ShippingOptions {
        if city.trim().is_empty() {
            return ShippingOptions {
                methods: vec![ShippingMethod::Standard],
                destination_incomplete: true,
            };
        }

        let methods = ShippingMethod::ALL
            .into_iter()
            .filter(|m| match m {
                ShippingMethod::Standard => true,
                ShippingMethod::CashOnDelivery => self.config.is_local(city),
            })
            .collect();

        ShippingOptions {
            methods,
            destination_incomplete: false,
        }
    }

    /// Cost of shipping `subtotal` to `city` with `method`.
    ///
    /// ## Errors
    /// `MethodNotAvailable` when `method` is not offered for `city`.
    pub fn cost_of(&self, method: ShippingMethod, city: &str, subtotal: Money) -> CoreResult<Money> {
        if !self.available_methods(city).contains(method) {
            return Err(CoreError::MethodNotAvailable {
                method,
                city: city.to_string(),
            });
        }

        if subtotal >= self.config.free_shipping_threshold {
            return Ok(Money::zero());
        }

        Ok(match method {
            ShippingMethod::Standard => self.config.standard_cost,
            ShippingMethod::CashOnDelivery => self.config.cod_cost,
        })
    }

    /// Parses `method` and prices it; `UnsupportedMethod` for unknown names.
    pub fn quote(&self, method: &str, city: &str, subtotal: Money) -> CoreResult<Money> {
        let method: ShippingMethod = method.parse()?;
        self.cost_of(method, city, subtotal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calc() -> ShippingCalculator {
        ShippingCalculator::default()
    }

    #[test]
    fn test_standard_only_outside_zone() {
        let options = calc().available_methods("Bogotá");
        assert_eq!(options.methods, vec![ShippingMethod::Standard]);
        assert!(!options.destination_incomplete);
    }

    #[test]
    fn test_cod_inside_zone_ignores_case_and_padding() {
        for city in ["Bucaramanga", "bucaramanga", "  BUCARAMANGA ", "Girón", "girón"] {
            let options = calc().available_methods(city);
            assert_eq!(
                options.methods,
                vec![ShippingMethod::Standard, ShippingMethod::CashOnDelivery],
                "city {city:?}"
            );
        }
    }

    #[test]
    fn test_empty_city_flags_incomplete_destination() {
        for city in ["", "   "] {
            let options = calc().available_methods(city);
            assert_eq!(options.methods, vec![ShippingMethod::Standard]);
            assert!(options.destination_incomplete);
        }
    }

    #[test]
    fn test_costs_below_threshold() {
        let c = calc();
        let subtotal = Money::from_units(170_000);
        assert_eq!(
            c.cost_of(ShippingMethod::Standard, "Bogotá", subtotal).unwrap().units(),
            15_000
        );
        assert_eq!(
            c.cost_of(ShippingMethod::CashOnDelivery, "Bucaramanga", subtotal)
                .unwrap()
                .units(),
            5_000
        );
    }

    #[test]
    fn test_free_at_and_above_threshold() {
        let c = calc();
        for subtotal in [200_000, 200_001, 250_000, 10_000_000] {
            let s = Money::from_units(subtotal);
            assert!(c.cost_of(ShippingMethod::Standard, "Bogotá", s).unwrap().is_zero());
            assert!(c.cost_of(ShippingMethod::Standard, "Bucaramanga", s).unwrap().is_zero());
            assert!(c
                .cost_of(ShippingMethod::CashOnDelivery, "Bucaramanga", s)
                .unwrap()
                .is_zero());
        }
        assert!(!c
            .cost_of(ShippingMethod::Standard, "Bogotá", Money::from_units(199_999))
            .unwrap()
            .is_zero());
    }

    #[test]
    fn test_cod_outside_zone_not_available() {
        let err = calc()
            .cost_of(ShippingMethod::CashOnDelivery, "Bogotá", Money::from_units(1000))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::MethodNotAvailable {
                method: ShippingMethod::CashOnDelivery,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_methods() {
        assert_eq!("standard".parse::<ShippingMethod>().unwrap(), ShippingMethod::Standard);
        for name in ["cash_on_delivery", "cash-on-delivery", "cashOnDelivery", "COD"] {
            assert_eq!(
                name.parse::<ShippingMethod>().unwrap(),
                ShippingMethod::CashOnDelivery
            );
        }
        assert!(matches!(
            "drone".parse::<ShippingMethod>(),
            Err(CoreError::UnsupportedMethod(name)) if name == "drone"
        ));
    }

    #[test]
    fn test_quote_unknown_method() {
        assert!(matches!(
            calc().quote("express", "Bogotá", Money::from_units(1000)),
            Err(CoreError::UnsupportedMethod(_))
        ));
        assert_eq!(
            calc().quote("cod", "Piedecuesta", Money::from_units(1000)).unwrap().units(),
            5_000
        );
    }

    #[test]
    fn test_config_overrides() {
        let config = ShippingConfig::default()
            .with_free_shipping_threshold(Money::from_units(50_000))
            .with_standard_cost(Money::from_units(9_000))
            .with_cod_cost(Money::from_units(3_000))
            .with_local_delivery_zone(["Bogotá"]);
        let c = ShippingCalculator::new(config);

        assert!(c.available_methods("bogotá").contains(ShippingMethod::CashOnDelivery));
        assert!(!c.available_methods("Bucaramanga").contains(ShippingMethod::CashOnDelivery));
        assert_eq!(
            c.cost_of(ShippingMethod::Standard, "Cali", Money::from_units(49_999))
                .unwrap()
                .units(),
            9_000
        );
        assert!(c
            .cost_of(ShippingMethod::CashOnDelivery, "Bogotá", Money::from_units(50_000))
            .unwrap()
            .is_zero());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: ShippingConfig =
            serde_json::from_str(r#"{"standardCost": 12000}"#).unwrap();
        assert_eq!(config.standard_cost.units(), 12_000);
        assert_eq!(config.cod_cost, DEFAULT_COD_COST);
        assert!(config.is_local("Floridablanca"));
    }
}
