use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub backend: BackendConfig,
    #[serde(default)]
    pub refund_policy: RefundPolicyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Idle manual bookings are dropped after this many minutes
    #[serde(default = "default_intake_ttl")]
    pub intake_ttl_minutes: u64,
}

fn default_intake_ttl() -> u64 { 60 }

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    #[default]
    Rest,
    /// Process-local data, for demos and local development
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default)]
    pub mode: BackendMode,
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    pub api_token: Option<String>,
}

fn default_timeout() -> u64 { 10 }

/// Refund tiers for automatic refunds
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RefundPolicyConfig {
    /// Strictly more days than this earns `early_percent`
    pub early_min_days: i64,
    pub early_percent: u8,
    /// At least this many days earns `late_percent`
    pub late_min_days: i64,
    pub late_percent: u8,
}

impl Default for RefundPolicyConfig {
    fn default() -> Self {
        Self {
            early_min_days: 7,
            early_percent: 90,
            late_min_days: 3,
            late_percent: 50,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg.. `TREKDESK_BACKEND__BASE_URL=http://...`
            .add_source(config::Environment::with_prefix("TREKDESK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_fill_optional_sections() {
        let config = parse(
            r#"
            [server]
            port = 8080

            [backend]
            base_url = "http://localhost:5000/api"
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.intake_ttl_minutes, 60);
        assert_eq!(config.backend.mode, BackendMode::Rest);
        assert_eq!(config.backend.timeout_seconds, 10);
        assert!(config.backend.api_token.is_none());
        assert_eq!(config.refund_policy, RefundPolicyConfig::default());
    }

    #[test]
    fn test_memory_mode_and_custom_tiers() {
        let config = parse(
            r#"
            [server]
            port = 9000

            [backend]
            mode = "memory"
            base_url = ""

            [refund_policy]
            early_min_days = 14
            early_percent = 80
            late_min_days = 5
            late_percent = 25
            "#,
        );

        assert_eq!(config.backend.mode, BackendMode::Memory);
        assert_eq!(config.refund_policy.early_min_days, 14);
        assert_eq!(config.refund_policy.late_percent, 25);
    }
}
