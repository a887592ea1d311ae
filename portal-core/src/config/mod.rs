use std::time::Duration;

use config::builder::DefaultState;
use config::{Config as Cfg, ConfigBuilder, Environment, File, FileFormat};
use secrecy::Secret;
use serde::Deserialize;

use crate::error::PortalError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PortalSettings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub master_data: MasterDataSettings,
    #[serde(default)]
    pub superiors: SuperiorSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiSettings {
    /// Candidate backend addresses, tried in order.
    #[serde(default = "default_base_urls")]
    pub base_urls: Vec<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Static bearer token, mostly for tooling. Interactive sessions plug in
    /// their own credential provider instead.
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_urls: default_base_urls(),
            request_timeout_ms: default_request_timeout_ms(),
            access_token: None,
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn default_base_urls() -> Vec<String> {
    vec![
        "http://localhost:5249".to_string(),
        "http://127.0.0.1:5249".to_string(),
    ]
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl CacheSettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

/// How an empty, successful account-name lookup treats a persisted pairing.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistoricalPolicy {
    /// An empty result is not authoritative: a persisted account name that
    /// still carries a GL code stays a normal option.
    #[default]
    TrustPersistedOnEmpty,
    /// An empty result is authoritative: anything persisted is historical.
    MarkHistoricalOnEmpty,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MasterDataSettings {
    #[serde(default)]
    pub historical_policy: HistoricalPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SuperiorSettings {
    /// Transaction code used for labels missing from the mapping table.
    #[serde(default = "default_fallback_transaction_code")]
    pub fallback_transaction_code: String,
}

impl Default for SuperiorSettings {
    fn default() -> Self {
        Self {
            fallback_transaction_code: default_fallback_transaction_code(),
        }
    }
}

fn default_fallback_transaction_code() -> String {
    "OT".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl PortalSettings {
    /// Load settings from an optional `configuration.{yaml,toml,json}` file in
    /// the working directory, overridden by `APP__SECTION__KEY` variables.
    pub fn load() -> Result<Self, PortalError> {
        dotenvy::dotenv().ok();

        Self::build(Cfg::builder().add_source(File::with_name("configuration").required(false)))
    }

    /// Load settings from an inline YAML document, still honouring environment overrides.
    pub fn from_yaml(yaml: &str) -> Result<Self, PortalError> {
        Self::build(Cfg::builder().add_source(File::from_str(yaml, FileFormat::Yaml)))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, PortalError> {
        let settings = builder
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.base_urls")
                    .try_parsing(true),
            )
            .build()?;

        let settings: PortalSettings = settings.try_deserialize()?;
        if settings.api.base_urls.is_empty() {
            return Err(PortalError::Config(
                "api.base_urls must list at least one candidate".to_string(),
            ));
        }
        Ok(settings)
    }
}
