use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::order::GeoPoint;
use crate::utils::RetryConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Sources, later overrides earlier:
// 1. Built-in defaults (Default impls below)
// 2. `shoeshop.yaml` in the working directory (optional)
// 3. File named by SHOESHOP_CONFIG (required if the variable is set)
// 4. SHOESHOP__SECTION__KEY environment variables
//
// ============================================================================

pub const DEFAULT_CONFIG_FILE: &str = "shoeshop";
pub const CONFIG_ENV_VAR: &str = "SHOESHOP_CONFIG";
pub const CONFIG_ENV_PREFIX: &str = "SHOESHOP";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub metrics: MetricsConfig,
    pub shipping: ShippingConfig,
    pub notifications: NotificationConfig,
    pub health: HealthConfig,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        use ::config::{Config, Environment, File, FileFormat};

        let mut builder = Config::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:shoeshop.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 9090,
        }
    }
}

/// Static coordinates attached to tracking stages. Not derived from the
/// customer's shipping address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingConfig {
    pub warehouse: GeoPoint,
    pub destination: GeoPoint,
}

impl Default for ShippingConfig {
    fn default() -> Self {
        Self {
            warehouse: GeoPoint::new(45.4642, 9.1900),
            destination: GeoPoint::new(41.9028, 12.4964),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 50,
            max_delay_ms: 2_000,
        }
    }
}

impl NotificationConfig {
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts.max(1),
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub check_interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            check_interval_secs: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.metrics.port, 9090);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.shipping.warehouse, GeoPoint::new(45.4642, 9.1900));
    }

    #[test]
    fn test_retry_config_never_zero_attempts() {
        let notifications = NotificationConfig {
            max_attempts: 0,
            initial_delay_ms: 10,
            max_delay_ms: 100,
        };

        let retry = notifications.retry_config();
        assert_eq!(retry.max_attempts, 1);
        assert_eq!(retry.initial_delay, Duration::from_millis(10));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        use ::config::{Config, File, FileFormat};

        let yaml = "shipping:\n  warehouse:\n    latitude: 1.5\n    longitude: 2.5\n";
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.shipping.warehouse, GeoPoint::new(1.5, 2.5));
        assert_eq!(config.shipping.destination, ShippingConfig::default().destination);
        assert_eq!(config.metrics.port, 9090);
    }
}
