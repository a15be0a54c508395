//! Config module contains the top-level config for the app.
use std::env;

use config_crate::{Config as RawConfig, ConfigError, Environment, File};

/// Basic settings - HTTP binding address and number of worker threads
#[derive(Debug, Deserialize, Clone)]
pub struct Server {
    pub host: String,
    pub port: String,
    pub thread_count: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Logging {
    pub level: String,
    /// `compact` or `json`
    pub format: String,
}

/// Spreadsheet backing the durable store. When absent, rows live in memory.
#[derive(Debug, Deserialize, Clone)]
pub struct Sheets {
    pub base_url: String,
    pub spreadsheet_id: String,
    pub access_token: Option<String>,
    pub timeout_s: u64,
}

/// Names of the tables (worksheets) in the durable store
#[derive(Debug, Deserialize, Clone)]
pub struct Tables {
    pub bookings: String,
    pub payments: String,
    pub subscriptions: String,
    /// Either a dedicated coupons table or the shared payments log
    pub coupons: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Coupons {
    pub default_call_limit: u32,
    pub default_doctor_type: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AzamPay {
    pub base_url: String,
    pub app_name: String,
    pub client_id: String,
    pub client_secret: String,
    pub callback_url: String,
    pub currency: String,
    pub timeout_s: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: Server,
    pub logging: Logging,
    pub sheets: Option<Sheets>,
    pub tables: Tables,
    pub coupons: Coupons,
    pub azampay: AzamPay,
}

impl Config {
    /// Creates config from base.toml, which are overwritten by <env>.toml, where env is one of
    /// development, test, production. After that it could be overwritten by env variables like
    /// CLINIC_AZAMPAY__CLIENT_SECRET (this will override `azampay.client_secret` field in config).
    pub fn new() -> Result<Self, ConfigError> {
        let env = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        Config::with_env(env)
    }

    pub fn with_env(env: impl Into<String>) -> Result<Self, ConfigError> {
        let mut s = RawConfig::new();

        s.merge(File::with_name("config/base"))?;
        // Optional file specific for environment
        s.merge(File::with_name(&format!("config/{}", env.into())).required(false))?;
        s.merge(Environment::with_prefix("CLINIC").separator("__"))?;
        s.try_into()
    }

    pub fn address(&self, port: &Option<String>) -> String {
        let port = port.as_ref().unwrap_or(&self.server.port);
        format!("{}:{}", self.server.host, port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_config_uses_memory_store() {
        let config = Config::with_env("test").unwrap();
        assert!(config.sheets.is_none());
        assert_eq!(config.tables.coupons, "coupons");
        assert_eq!(config.coupons.default_call_limit, 15);
        assert_eq!(config.address(&Some("9000".to_string())), "0.0.0.0:9000");
    }
}
