//! # Store Configuration
//!
//! Runtime configuration loaded from environment variables with fallback to
//! defaults.
//!
//! ## Environment Variables
//! ```text
//! ┌──────────────────────────────────┬─────────────────────────────────────┐
//! │ Variable                         │ Default                             │
//! ├──────────────────────────────────┼─────────────────────────────────────┤
//! │ TIENDA_DB_PATH                   │ ./tienda_dev.db                     │
//! │ TIENDA_DB_POOL_SIZE              │ 4                                   │
//! │ TIENDA_FREE_SHIPPING_THRESHOLD   │ 200000                              │
//! │ TIENDA_STANDARD_SHIPPING_COST    │ 15000                               │
//! │ TIENDA_COD_SHIPPING_COST         │ 5000                                │
//! │ TIENDA_LOCAL_DELIVERY_ZONE       │ Bucaramanga,Floridablanca,Girón,    │
//! │                                  │ Piedecuesta                         │
//! └──────────────────────────────────┴─────────────────────────────────────┘
//! ```
//!
//! Amounts are whole pesos. A set but unparseable amount is an error, not a
//! silent fallback.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tienda_core::shipping::ShippingConfig;
use tienda_core::{Money, PricingEngine};

use crate::pool::{DbConfig, DEFAULT_POOL_SIZE};

pub const ENV_DB_PATH: &str = "TIENDA_DB_PATH";
pub const ENV_DB_POOL_SIZE: &str = "TIENDA_DB_POOL_SIZE";
pub const ENV_FREE_SHIPPING_THRESHOLD: &str = "TIENDA_FREE_SHIPPING_THRESHOLD";
pub const ENV_STANDARD_SHIPPING_COST: &str = "TIENDA_STANDARD_SHIPPING_COST";
pub const ENV_COD_SHIPPING_COST: &str = "TIENDA_COD_SHIPPING_COST";
pub const ENV_LOCAL_DELIVERY_ZONE: &str = "TIENDA_LOCAL_DELIVERY_ZONE";

/// Default database file for development.
pub const DEFAULT_DB_PATH: &str = "./tienda_dev.db";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// Everything a storefront process needs to price and persist orders.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_path: PathBuf,
    pub db_pool_size: u32,
    pub shipping: ShippingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: PathBuf::from(DEFAULT_DB_PATH),
            db_pool_size: DEFAULT_POOL_SIZE,
            shipping: ShippingConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Loads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from any key lookup.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_db::config::StoreConfig;
    ///
    /// let config = StoreConfig::from_lookup(|key| match key {
    ///     "TIENDA_STANDARD_SHIPPING_COST" => Some("12000".to_string()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.shipping.standard_cost.units(), 12_000);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = StoreConfig::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_DB_POOL_SIZE) {
            config.db_pool_size = parse_pool_size(&raw)?;
        }

        if let Some(raw) = lookup(ENV_FREE_SHIPPING_THRESHOLD) {
            config.shipping.free_shipping_threshold = parse_amount(ENV_FREE_SHIPPING_THRESHOLD, &raw)?;
        }

        if let Some(raw) = lookup(ENV_STANDARD_SHIPPING_COST) {
            config.shipping.standard_cost = parse_amount(ENV_STANDARD_SHIPPING_COST, &raw)?;
        }

        if let Some(raw) = lookup(ENV_COD_SHIPPING_COST) {
            config.shipping.cod_cost = parse_amount(ENV_COD_SHIPPING_COST, &raw)?;
        }

        if let Some(raw) = lookup(ENV_LOCAL_DELIVERY_ZONE) {
            let cities: Vec<&str> = raw
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect();
            if cities.is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: ENV_LOCAL_DELIVERY_ZONE.to_string(),
                    value: raw.clone(),
                    reason: "expected a comma-separated list of cities".to_string(),
                });
            }
            config.shipping = config.shipping.with_local_delivery_zone(cities);
        }

        Ok(config)
    }

    /// Pool configuration for [`Self::database_path`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::from(self)
    }

    /// Pricing engine using these shipping rules.
    pub fn pricing_engine(&self) -> PricingEngine {
        PricingEngine::new(self.shipping.clone())
    }
}

fn parse_amount(key: &str, raw: &str) -> Result<Money, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let units: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("expected a whole number of pesos"))?;
    if units < 0 {
        return Err(invalid("must not be negative"));
    }
    Ok(Money::from_units(units))
}

fn parse_pool_size(raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_DB_POOL_SIZE.to_string(),
            value: raw.to_string(),
            reason: "expected a positive number of connections".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = StoreConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.db_pool_size, DEFAULT_POOL_SIZE);
        assert_eq!(config.shipping, ShippingConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = StoreConfig::from_lookup(lookup_from(&[
            (ENV_DB_PATH, "/var/lib/tienda/tienda.db"),
            (ENV_DB_POOL_SIZE, "8"),
            (ENV_FREE_SHIPPING_THRESHOLD, "300000"),
            (ENV_STANDARD_SHIPPING_COST, " 12000 "),
            (ENV_COD_SHIPPING_COST, "0"),
            (ENV_LOCAL_DELIVERY_ZONE, "Medellín, Envigado,,"),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/tienda/tienda.db"));
        assert_eq!(config.db_config().max_connections(), 8);
        assert_eq!(config.shipping.free_shipping_threshold.units(), 300_000);
        assert_eq!(config.shipping.standard_cost.units(), 12_000);
        assert!(config.shipping.cod_cost.is_zero());
        assert_eq!(config.shipping.local_delivery_zone.len(), 2);
        assert!(config.shipping.is_local("envigado"));
        assert!(!config.shipping.is_local("Bucaramanga"));
    }

    #[test]
    fn test_invalid_amounts_are_errors() {
        for raw in ["abc", "-1", "15.000", ""] {
            let err =
                StoreConfig::from_lookup(lookup_from(&[(ENV_STANDARD_SHIPPING_COST, raw)]))
                    .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_STANDARD_SHIPPING_COST));
        }
    }

    #[test]
    fn test_invalid_pool_size_is_an_error() {
        for raw in ["0", "-2", "many"] {
            let err = StoreConfig::from_lookup(lookup_from(&[(ENV_DB_POOL_SIZE, raw)])).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == ENV_DB_POOL_SIZE));
        }
    }

    #[test]
    fn test_empty_zone_is_an_error() {
        let err = StoreConfig::from_lookup(lookup_from(&[(ENV_LOCAL_DELIVERY_ZONE, " , ")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
