pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use crate::adapters::completion::HttpCompletionClient;
pub use crate::adapters::http::{build_app, router};
pub use crate::config::{ServerConfig, UpstreamConfig};
pub use crate::core::comparison::ComparisonService;
pub use crate::core::prompt::build_prompt;
pub use crate::utils::error::{ComparisonError, ConfigError, ErrorKind, Result};
