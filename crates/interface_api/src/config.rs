//! API configuration

use core_kernel::{Timezone, UnknownTimezone, DEFAULT_DEPOSIT_PERCENT};
use serde::Deserialize;

/// API configuration
///
/// Every field except the two gateway secrets carries a default, so a
/// mostly-bare environment still deserializes; see [`ApiConfig::from_env`].
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Stripe secret API key
    pub stripe_secret_key: String,
    /// Webhook endpoint secret for signature verification
    pub webhook_secret: String,
    /// Bearer token guarding the cron trigger; unset disables the endpoint
    #[serde(default)]
    pub cron_secret: Option<String>,
    /// URL customers land on after a successful checkout
    #[serde(default = "default_success_url")]
    pub checkout_success_url: String,
    /// URL customers land on after abandoning checkout
    #[serde(default = "default_cancel_url")]
    pub checkout_cancel_url: String,
    /// IANA timezone of the venue's calendar
    #[serde(default = "default_timezone")]
    pub business_timezone: String,
    /// Days before the party that the balance-due notice goes out
    #[serde(default = "default_payment_due_days")]
    pub payment_due_days: u32,
    /// Deposit percentage applied to every order
    #[serde(default = "default_deposit_percent")]
    pub deposit_percent: u8,
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "postgres://localhost/party_palace".to_string()
}

fn default_success_url() -> String {
    "https://partypalace.example/booking/success".to_string()
}

fn default_cancel_url() -> String {
    "https://partypalace.example/booking/cancelled".to_string()
}

fn default_timezone() -> String {
    "Australia/Brisbane".to_string()
}

fn default_payment_due_days() -> u32 {
    3
}

fn default_deposit_percent() -> u8 {
    DEFAULT_DEPOSIT_PERCENT
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            database_url: default_database_url(),
            stripe_secret_key: String::new(),
            webhook_secret: String::new(),
            cron_secret: None,
            checkout_success_url: default_success_url(),
            checkout_cancel_url: default_cancel_url(),
            business_timezone: default_timezone(),
            payment_due_days: default_payment_due_days(),
            deposit_percent: default_deposit_percent(),
            log_level: default_log_level(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from environment
    ///
    /// Only `API_STRIPE_SECRET_KEY` and `API_WEBHOOK_SECRET` are required;
    /// every other field falls back to its default when unset.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the configured business timezone
    pub fn timezone(&self) -> Result<Timezone, UnknownTimezone> {
        self.business_timezone.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timezone_parses() {
        let config = ApiConfig::default();
        assert!(config.timezone().is_ok());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_unknown_timezone_is_rejected() {
        let config = ApiConfig {
            business_timezone: "Mars/Olympus_Mons".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.timezone().is_err());
    }

    #[test]
    fn test_only_the_secrets_are_required() {
        let config: ApiConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "stripe_secret_key = \"sk_test_abc\"\nwebhook_secret = \"whsec_abc\"",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.business_timezone, "Australia/Brisbane");
        assert_eq!(config.deposit_percent, DEFAULT_DEPOSIT_PERCENT);
        assert!(config.cron_secret.is_none());
        assert_eq!(config.stripe_secret_key, "sk_test_abc");
    }

    #[test]
    fn test_missing_secrets_fail_deserialization() {
        let result = config::Config::builder()
            .build()
            .unwrap()
            .try_deserialize::<ApiConfig>();
        assert!(result.is_err());
    }
}
