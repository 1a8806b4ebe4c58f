use axum::http::StatusCode;
use thiserror::Error;

/// 比較流程的錯誤類型，對應到 HTTP 回應的 `success: false` 封包
#[derive(Error, Debug)]
pub enum ComparisonError {
    #[error("{message}")]
    InvalidInput {
        message: String,
        detail: Option<String>,
    },

    #[error("Upstream API error: {status} {status_text}")]
    Upstream {
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("Malformed upstream response: {message}")]
    MalformedUpstreamResponse { message: String },

    #[error("{message}")]
    Internal { message: String, detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    UpstreamError,
    MalformedUpstreamResponse,
    InternalError,
}

impl ComparisonError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            detail: None,
        }
    }

    pub fn internal(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedUpstreamResponse {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
            Self::MalformedUpstreamResponse { .. } => ErrorKind::MalformedUpstreamResponse,
            Self::Internal { .. } => ErrorKind::InternalError,
        }
    }

    /// 給呼叫端看的簡短訊息
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { message, .. } => message.clone(),
            _ => "Failed to generate comparison".to_string(),
        }
    }

    /// 詳細資訊。上游回應內容只寫進日誌，不回傳給呼叫端
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::InvalidInput { detail, .. } => detail.clone(),
            Self::Upstream { .. } | Self::MalformedUpstreamResponse { .. } => {
                Some(self.to_string())
            }
            Self::Internal { detail, .. } => Some(detail.clone()),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 每種錯誤只記一次，等級依種類而定
    pub fn log_level(&self) -> tracing::Level {
        match self.kind() {
            ErrorKind::InvalidInput => tracing::Level::DEBUG,
            ErrorKind::UpstreamError | ErrorKind::MalformedUpstreamResponse => tracing::Level::WARN,
            ErrorKind::InternalError => tracing::Level::ERROR,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.kind() {
            ErrorKind::InvalidInput => "Provide between 2 and 4 non-empty fund names",
            ErrorKind::UpstreamError => {
                "Check the upstream API key, model name and account quota"
            }
            ErrorKind::MalformedUpstreamResponse => {
                "Verify the upstream endpoint speaks the chat-completion format"
            }
            ErrorKind::InternalError => "Check network connectivity to the upstream API",
        }
    }
}

impl From<reqwest::Error> for ComparisonError {
    fn from(err: reqwest::Error) -> Self {
        Self::internal("Upstream request failed", err.to_string())
    }
}

impl From<serde_json::Error> for ComparisonError {
    fn from(err: serde_json::Error) -> Self {
        Self::internal("Failed to parse upstream response", err.to_string())
    }
}

/// 啟動時的配置錯誤
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Configuration parse error: {message}")]
    Parse { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::InvalidValue { field, .. } => format!("Fix the value of '{}'", field),
            Self::Missing { field } => {
                format!("Set '{}' via environment, .env or the TOML config", field)
            }
            Self::Parse { .. } => "Check the TOML syntax of the config file".to_string(),
            Self::Io(_) => "Make sure the config file exists and is readable".to_string(),
        }
    }
}

pub type Result<T, E = ComparisonError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let err = ComparisonError::invalid_input("At least 2 fund names are required");
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "At least 2 fund names are required");
        assert!(err.detail().is_none());
    }

    #[test]
    fn test_upstream_detail_carries_status_but_not_body() {
        let err = ComparisonError::Upstream {
            status: 429,
            status_text: "Too Many Requests".to_string(),
            body: "secret-ish upstream body".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message(), "Failed to generate comparison");

        let detail = err.detail().unwrap();
        assert!(detail.contains("429"));
        assert!(detail.contains("Too Many Requests"));
        assert!(!detail.contains("secret-ish"));
    }

    #[test]
    fn test_log_level_follows_kind() {
        assert_eq!(
            ComparisonError::invalid_input("At least 2 fund names are required").log_level(),
            tracing::Level::DEBUG
        );
        assert_eq!(ComparisonError::malformed("missing model").log_level(), tracing::Level::WARN);
        assert_eq!(
            ComparisonError::internal("Upstream request failed", "timeout").log_level(),
            tracing::Level::ERROR
        );
    }

    #[test]
    fn test_json_error_becomes_internal() {
        let parse_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: ComparisonError = parse_err.into();
        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert!(err.detail().is_some());
    }
}
