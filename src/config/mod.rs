#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::ConfigError;
use crate::utils::validation::{self, Validate};
use toml_config::TomlConfig;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_UPSTREAM_ENDPOINT: &str = "https://api.perplexity.ai/chat/completions";
pub const DEFAULT_MODEL: &str = "sonar-pro";
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:5173", "http://localhost:3000"];
pub const API_KEY_ENV: &str = "PERPLEXITY_API_KEY";

/// Fully resolved runtime configuration, built once at startup and passed by value.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub upstream: UpstreamConfig,
}

#[derive(Clone)]
pub struct UpstreamConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
}

// api_key 不可出現在日誌
impl std::fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl UpstreamConfig {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: DEFAULT_MODEL.to_string(),
            api_key: api_key.into(),
        }
    }
}

/// Values that win over the TOML file (CLI flags and environment).
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allowed_origins: Option<Vec<String>>,
    pub upstream_endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
}

impl ServerConfig {
    /// 合併順序：overrides > TOML > 預設值
    pub fn build(file: Option<&TomlConfig>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let server = file.and_then(|f| f.server.as_ref());
        let upstream = file.and_then(|f| f.upstream.as_ref());

        let api_key = overrides
            .api_key
            .or_else(|| upstream.and_then(|u| u.api_key.clone()))
            .filter(|key| !is_unresolved_placeholder(key));
        let api_key = validation::validate_required_field(API_KEY_ENV, &api_key)?.clone();

        let config = Self {
            host: overrides
                .host
                .or_else(|| server.and_then(|s| s.host.clone()))
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: overrides
                .port
                .or_else(|| server.and_then(|s| s.port))
                .unwrap_or(DEFAULT_PORT),
            allowed_origins: overrides
                .allowed_origins
                .or_else(|| server.and_then(|s| s.allowed_origins.clone()))
                .unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()),
            upstream: UpstreamConfig {
                endpoint: overrides
                    .upstream_endpoint
                    .or_else(|| upstream.and_then(|u| u.endpoint.clone()))
                    .unwrap_or_else(|| DEFAULT_UPSTREAM_ENDPOINT.to_string()),
                model: overrides
                    .model
                    .or_else(|| upstream.and_then(|u| u.model.clone()))
                    .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                api_key,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_unresolved_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || (value.starts_with("${") && value.ends_with('}'))
}

impl Validate for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_non_empty_string("server.host", &self.host)?;
        validation::validate_positive_number("server.port", self.port as usize, 1)?;

        if self.allowed_origins.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.allowed_origins".to_string(),
                value: String::new(),
                reason: "At least one origin is required (use \"*\" to allow any)".to_string(),
            });
        }
        for origin in &self.allowed_origins {
            validation::validate_origin("server.allowed_origins", origin)?;
        }

        self.upstream.validate()
    }
}

impl Validate for UpstreamConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_url("upstream.endpoint", &self.endpoint)?;
        validation::validate_non_empty_string("upstream.model", &self.model)?;
        if is_unresolved_placeholder(&self.model) {
            return Err(ConfigError::InvalidValue {
                field: "upstream.model".to_string(),
                value: self.model.clone(),
                reason: "Environment variable is not set".to_string(),
            });
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: API_KEY_ENV.to_string(),
            });
        }
        Ok(())
    }
}
