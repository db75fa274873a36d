use std::{env, fmt::Display, str::FromStr};

use log::*;
use shop_common::{parse_boolean_flag, Cents};

use crate::{
    pricing::{PricingPolicy, DEFAULT_FLAT_SHIPPING_FEE, DEFAULT_FREE_SHIPPING_THRESHOLD, DEFAULT_TAX_RATE_BPS},
    soe_api::status_machine::RestockPolicy,
};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/shop_store.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub pricing: PricingPolicy,
    pub restock: RestockPolicy,
    /// The channel capacity of each event handler
    pub event_buffer_size: usize,
    /// Admin order listings never return more than this many orders per page
    pub max_page_size: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            pricing: PricingPolicy::default(),
            restock: RestockPolicy::default(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn from_env_or_default() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Missing variables take their default, and
    /// invalid ones are logged and replaced by the default.
    pub fn from_vars<F>(lookup: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let database_url = lookup("SOE_DATABASE_URL").unwrap_or_else(|| {
            info!("🪛️ SOE_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let max_connections = parse_or_default(&lookup, "SOE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let tax_rate_bps = parse_or_default(&lookup, "SOE_TAX_RATE_BPS", DEFAULT_TAX_RATE_BPS);
        let free_shipping_threshold =
            parse_or_default(&lookup, "SOE_FREE_SHIPPING_THRESHOLD", DEFAULT_FREE_SHIPPING_THRESHOLD.value());
        let flat_shipping_fee = parse_or_default(&lookup, "SOE_FLAT_SHIPPING_FEE", DEFAULT_FLAT_SHIPPING_FEE.value());
        let pricing = PricingPolicy {
            tax_rate_bps,
            free_shipping_threshold: Cents::from(free_shipping_threshold),
            flat_shipping_fee: Cents::from(flat_shipping_fee),
        };
        let event_buffer_size = parse_or_default(&lookup, "SOE_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE);
        let max_page_size = parse_or_default(&lookup, "SOE_MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE);
        let restock_shipped_refunds = parse_boolean_flag(lookup("SOE_RESTOCK_SHIPPED_REFUNDS"), false);
        Self {
            database_url,
            max_connections,
            pricing,
            restock: RestockPolicy { restock_shipped_refunds },
            event_buffer_size,
            max_page_size,
        }
    }
}

fn parse_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display + PartialOrd + Default,
    T::Err: Display,
{
    let Some(s) = lookup(key) else {
        return default;
    };
    match s.trim().parse::<T>() {
        Ok(v) if v < T::default() => {
            warn!("🪛️ {key} cannot be negative, but {s} was given. Using the default, {default}, instead.");
            default
        },
        Ok(v) => v,
        Err(e) => {
            warn!("🪛️ {s} is not a valid value for {key}. {e}. Using the default, {default}, instead.");
            default
        },
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> EngineConfig {
        let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect::<HashMap<_, _>>();
        EngineConfig::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let config = config_from(&[]);
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.pricing.tax_rate_bps, 1000);
        assert_eq!(config.pricing.free_shipping_threshold, Cents::new(10_000));
        assert!(!config.restock.restock_shipped_refunds);
    }

    #[test]
    fn overrides() {
        let config = config_from(&[
            ("SOE_DATABASE_URL", "sqlite://shop.db"),
            ("SOE_MAX_CONNECTIONS", "12"),
            ("SOE_TAX_RATE_BPS", "1500"),
            ("SOE_FLAT_SHIPPING_FEE", "499"),
            ("SOE_RESTOCK_SHIPPED_REFUNDS", "true"),
            ("SOE_MAX_PAGE_SIZE", "25"),
        ]);
        assert_eq!(config.database_url, "sqlite://shop.db");
        assert_eq!(config.max_connections, 12);
        assert_eq!(config.pricing.tax_rate_bps, 1500);
        assert_eq!(config.pricing.flat_shipping_fee, Cents::new(499));
        assert!(config.restock.restock_shipped_refunds);
        assert_eq!(config.max_page_size, 25);
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("SOE_MAX_CONNECTIONS", "lots"),
            ("SOE_TAX_RATE_BPS", "-5"),
            ("SOE_EVENT_BUFFER_SIZE", ""),
        ]);
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.pricing.tax_rate_bps, DEFAULT_TAX_RATE_BPS);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }
}
