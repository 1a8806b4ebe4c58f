use crate::adapters::completion::HttpCompletionClient;
use crate::config::ServerConfig;
use crate::core::comparison::ComparisonService;
use crate::domain::model::CompareFundsPayload;
use crate::domain::ports::CompletionClient;
use crate::utils::error::{ComparisonError, ConfigError};
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct CompareSuccess {
    pub success: bool,
    pub comparison: String,
    pub model: String,
    pub usage: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub struct CompareFailure {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for ComparisonError {
    fn into_response(self) -> Response {
        let body = CompareFailure {
            success: false,
            error: self.message(),
            details: self.detail(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Router with the production HTTP client.
pub fn build_app(config: &ServerConfig) -> Result<Router, ConfigError> {
    let client = HttpCompletionClient::new(config.upstream.clone());
    router(ComparisonService::new(client), &config.allowed_origins)
}

/// `/health` and `/api/compare-funds`, wrapped in CORS and request tracing.
pub fn router<C>(service: ComparisonService<C>, allowed_origins: &[String]) -> Result<Router, ConfigError>
where
    C: CompletionClient + 'static,
{
    Ok(Router::new()
        .route("/health", get(health))
        .route("/api/compare-funds", post(compare_funds::<C>))
        .with_state(Arc::new(service))
        .layer(cors_layer(allowed_origins)?)
        .layer(TraceLayer::new_for_http()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

async fn compare_funds<C: CompletionClient + 'static>(
    State(service): State<Arc<ComparisonService<C>>>,
    payload: Result<Json<CompareFundsPayload>, JsonRejection>,
) -> Response {
    // 請求格式錯誤也要回傳 JSON 封包
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::debug!("Rejected request body: {}", rejection.body_text());
            return ComparisonError::InvalidInput {
                message: "Invalid request body".to_string(),
                detail: Some(rejection.body_text()),
            }
            .into_response();
        }
    };

    match service.compare(payload).await {
        Ok(result) => Json(CompareSuccess {
            success: true,
            comparison: result.comparison_text,
            model: result.model_name,
            usage: result.usage_stats,
        })
        .into_response(),
        // 服務層已記錄過失敗
        Err(e) => e.into_response(),
    }
}

fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, ConfigError> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    // 萬用來源不能同時允許 credentials
    if allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(layer.allow_origin(AllowOrigin::any()));
    }

    let origins = allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|e| ConfigError::InvalidValue {
                field: "server.allowed_origins".to_string(),
                value: origin.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(layer
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true))
}
