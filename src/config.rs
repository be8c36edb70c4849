//! Configuration for parkbill.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Environment variable holding the merchant identifier.
pub const MERCHANT_ID_ENV: &str = "PARKBILL_MERCHANT_ID";
/// Environment variable holding the merchant secret.
pub const MERCHANT_SECRET_ENV: &str = "PARKBILL_MERCHANT_SECRET";

/// Payment gateway behind the notification endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GatewayKind {
    /// Primary card gateway.
    #[default]
    GatewayA,
    /// Secondary card gateway.
    GatewayB,
}

/// Gateway credentials and protocol settings.
///
/// The merchant secret is required for both outbound initiation hashes and
/// inbound notification verification. It is validated at construction time;
/// an absent or empty secret is a startup failure, never a per-request one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Merchant identifier issued by the gateway.
    pub merchant_id: String,

    /// Merchant secret issued by the gateway.
    pub merchant_secret: String,

    /// Currency code sent with initiation requests.
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Which gateway these credentials belong to.
    #[serde(default)]
    pub gateway: GatewayKind,
}

impl GatewayConfig {
    /// Create a gateway configuration, validating the credentials.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the merchant id or secret is empty.
    pub fn new(merchant_id: impl Into<String>, merchant_secret: impl Into<String>) -> Result<Self> {
        let config = Self {
            merchant_id: merchant_id.into(),
            merchant_secret: merchant_secret.into(),
            currency: default_currency(),
            gateway: GatewayKind::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load gateway credentials from the process environment.
    ///
    /// Reads `PARKBILL_MERCHANT_ID` and `PARKBILL_MERCHANT_SECRET`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if either variable is unset or empty.
    pub fn from_env() -> Result<Self> {
        let merchant_id = std::env::var(MERCHANT_ID_ENV)
            .map_err(|_| Error::Config(format!("{MERCHANT_ID_ENV} is not set")))?;
        let merchant_secret = std::env::var(MERCHANT_SECRET_ENV)
            .map_err(|_| Error::Config(format!("{MERCHANT_SECRET_ENV} is not set")))?;
        Self::new(merchant_id, merchant_secret)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the merchant id or secret is empty.
    pub fn validate(&self) -> Result<()> {
        if self.merchant_id.trim().is_empty() {
            return Err(Error::Config("merchant_id must not be empty".to_string()));
        }
        if self.merchant_secret.trim().is_empty() {
            return Err(Error::Config(
                "merchant_secret must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Top-level billing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Gateway credentials and protocol settings.
    pub gateway: GatewayConfig,

    /// Timeout applied to every backing-store call, in seconds.
    #[serde(default = "default_store_timeout")]
    pub store_timeout_secs: u64,

    /// Log level.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl BillingConfig {
    /// Build a configuration around validated gateway credentials.
    #[must_use]
    pub fn new(gateway: GatewayConfig) -> Self {
        Self {
            gateway,
            store_timeout_secs: default_store_timeout(),
            log_level: default_log_level(),
        }
    }

    /// Timeout applied to every backing-store call.
    #[must_use]
    pub fn store_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.store_timeout_secs)
    }

    /// Load configuration from a TOML file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// gateway credentials fail validation.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.gateway.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn to_file(&self, path: &std::path::Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

fn default_currency() -> String {
    "LKR".to_string()
}

const fn default_store_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}
