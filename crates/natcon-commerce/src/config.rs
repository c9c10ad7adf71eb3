//! Store configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cart::{CartLimits, DEFAULT_STORAGE_KEY, MAX_QUANTITY_PER_ITEM};
use crate::error::CommerceError;
use crate::money::Currency;

/// Environment variable overriding [`OrderApiConfig::base_url`].
pub const ENV_ORDER_API_URL: &str = "NATCON_ORDER_API_URL";
/// Environment variable overriding [`OrderApiConfig::api_key`].
pub const ENV_ORDER_API_KEY: &str = "NATCON_ORDER_API_KEY";
/// Environment variable overriding [`StoreConfig::currency`].
pub const ENV_CURRENCY: &str = "NATCON_CURRENCY";
/// Environment variable overriding [`StoreConfig::storage_key`].
pub const ENV_STORAGE_KEY: &str = "NATCON_STORAGE_KEY";

/// Store configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Currency for new carts.
    #[serde(default)]
    pub currency: Currency,

    /// Key the cart is persisted under.
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Largest quantity a single line item may hold.
    #[serde(default = "default_max_quantity")]
    pub max_quantity_per_item: i64,

    /// Order API connection.
    #[serde(default)]
    pub order_api: OrderApiConfig,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_max_quantity() -> i64 {
    MAX_QUANTITY_PER_ITEM
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            currency: Currency::default(),
            storage_key: default_storage_key(),
            max_quantity_per_item: default_max_quantity(),
            order_api: OrderApiConfig::default(),
        }
    }
}

impl StoreConfig {
    /// Load config from a file, JSON or TOML by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CommerceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CommerceError::ConfigError(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&content)?
        } else {
            Self::from_toml_str(&content)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, CommerceError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CommerceError> {
        serde_json::from_str(content).map_err(|e| CommerceError::ConfigError(e.to_string()))
    }

    /// Apply `NATCON_*` overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, CommerceError> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CommerceError> {
        if let Some(url) = lookup(ENV_ORDER_API_URL) {
            self.order_api.base_url = Some(url);
        }
        if let Some(key) = lookup(ENV_ORDER_API_KEY) {
            self.order_api.api_key = Some(key);
        }
        if let Some(code) = lookup(ENV_CURRENCY) {
            self.currency = code.parse()?;
        }
        if let Some(key) = lookup(ENV_STORAGE_KEY) {
            self.storage_key = key;
        }
        self.validate()?;
        Ok(self)
    }

    /// Reject values no cart could work with.
    pub fn validate(&self) -> Result<(), CommerceError> {
        if self.max_quantity_per_item < 1 {
            return Err(CommerceError::ConfigError(format!(
                "max_quantity_per_item must be at least 1, got {}",
                self.max_quantity_per_item
            )));
        }
        if self.storage_key.trim().is_empty() {
            return Err(CommerceError::ConfigError(
                "storage_key must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn cart_limits(&self) -> CartLimits {
        CartLimits {
            max_quantity_per_item: self.max_quantity_per_item,
        }
    }
}

/// Order API connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderApiConfig {
    /// Base URL of the commerce API, e.g. `https://api.natcon.example`.
    #[serde(default)]
    pub base_url: Option<String>,

    /// Path orders are posted to.
    #[serde(default = "default_orders_path")]
    pub orders_path: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

fn default_orders_path() -> String {
    "/orders".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for OrderApiConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            orders_path: default_orders_path(),
            timeout_secs: default_timeout_secs(),
            api_key: None,
        }
    }
}

impl OrderApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
