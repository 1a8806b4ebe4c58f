use super::toml_config::TomlConfig;
use super::{ConfigOverrides, ServerConfig, API_KEY_ENV};
use crate::domain::model::PreferenceKey;
use crate::utils::error::ConfigError;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "fund-compare", version)]
#[command(about = "Mutual fund comparison proxy for a chat-completion API")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub serve: ServeArgs,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log output format
    #[arg(long, value_enum, env = "LOG_FORMAT", default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Print the prompt that would be sent upstream, without calling it
    Prompt(PromptArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone, Default, Args)]
pub struct ServeArgs {
    /// Path to TOML configuration file
    #[arg(short, long, env = "FUND_COMPARE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, env = "HOST", global = true)]
    pub host: Option<String>,

    #[arg(long, env = "PORT", global = true)]
    pub port: Option<u16>,

    /// Comma-separated list of allowed CORS origins ("*" for any)
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',', global = true)]
    pub allowed_origins: Option<Vec<String>>,

    /// Chat-completion endpoint URL
    #[arg(long, env = "UPSTREAM_ENDPOINT", global = true)]
    pub upstream_endpoint: Option<String>,

    #[arg(long, env = "UPSTREAM_MODEL", global = true)]
    pub model: Option<String>,
}

impl ServeArgs {
    /// 讀取 TOML（如有）並套用 CLI / 環境變數覆蓋。API key 只從環境變數或設定檔讀取
    pub fn load_config(&self) -> Result<ServerConfig, ConfigError> {
        let file = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                Some(TomlConfig::from_file(path)?)
            }
            None => None,
        };

        let overrides = ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            allowed_origins: self.allowed_origins.clone(),
            upstream_endpoint: self.upstream_endpoint.clone(),
            model: self.model.clone(),
            api_key: std::env::var(API_KEY_ENV).ok(),
        };

        ServerConfig::build(file.as_ref(), overrides)
    }
}

#[derive(Debug, Clone, Args)]
pub struct PromptArgs {
    /// Fund name (repeat 2-4 times, in display order)
    #[arg(long = "fund", required = true)]
    pub funds: Vec<String>,

    /// Preference as key=value, e.g. --pref risk_appetite=Moderate
    #[arg(long = "pref", value_parser = parse_preference)]
    pub preferences: Vec<(PreferenceKey, serde_json::Value)>,
}

/// `key=value`；數字值保留為數字，其餘當作字串
pub fn parse_preference(raw: &str) -> Result<(PreferenceKey, serde_json::Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;

    let key = PreferenceKey::from_wire(key.trim()).ok_or_else(|| {
        let known: Vec<&str> = PreferenceKey::ALL.iter().map(|k| k.as_str()).collect();
        format!("unknown preference '{}'. Known keys: {}", key, known.join(", "))
    })?;

    let value = value.trim();
    let value = match value.parse::<serde_json::Number>() {
        Ok(number) => serde_json::Value::Number(number),
        Err(_) => serde_json::Value::String(value.to_string()),
    };

    Ok((key, value))
}
