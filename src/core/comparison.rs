use crate::core::prompt::{build_prompt, SYSTEM_PROMPT};
use crate::domain::model::{CompareFundsPayload, ComparisonRequest, ComparisonResult};
use crate::domain::ports::{ChatMessage, CompletionClient, CompletionReply};
use crate::utils::error::{ComparisonError, Result};

const LOGGED_BODY_LIMIT: usize = 200;

/// Validates a comparison payload, builds the prompt and calls the completion API once.
///
/// Holds no mutable state, so one instance can serve concurrent requests.
pub struct ComparisonService<C: CompletionClient> {
    client: C,
}

impl<C: CompletionClient> ComparisonService<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Parse, validate and run. Invalid input never reaches the upstream API.
    pub async fn compare(&self, payload: CompareFundsPayload) -> Result<ComparisonResult> {
        let request = payload.into_request().inspect_err(log_failure)?;
        self.compare_request(request).await
    }

    pub async fn compare_request(&self, request: ComparisonRequest) -> Result<ComparisonResult> {
        let fund_count = request.funds.len();
        let prompt = build_prompt(&request.funds, &request.preferences);

        tracing::info!(fund_count, model = self.client.model(), "Requesting fund comparison");
        tracing::debug!("Prompt:\n{}", prompt);

        let messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        let reply = self.client.send(messages).await.inspect_err(log_failure)?;
        let result = interpret_reply(reply).inspect_err(log_failure)?;

        tracing::info!(
            fund_count,
            model = %result.model_name,
            usage = %result.usage_stats,
            "✅ Comparison generated"
        );

        Ok(result)
    }
}

/// 失敗只在這裡記錄一次
fn log_failure(e: &ComparisonError) {
    let level = e.log_level();
    if level == tracing::Level::ERROR {
        tracing::error!(kind = ?e.kind(), "❌ Comparison failed: {}", e);
    } else if level == tracing::Level::WARN {
        match e {
            ComparisonError::Upstream { status, body, .. } => tracing::warn!(
                status,
                "Upstream API returned error: {}",
                truncate(body, LOGGED_BODY_LIMIT)
            ),
            _ => tracing::warn!(kind = ?e.kind(), "Comparison failed: {}", e),
        }
    } else {
        tracing::debug!(kind = ?e.kind(), "Rejected comparison request: {}", e);
    }
}

/// 把上游回覆轉成結果或錯誤
pub fn interpret_reply(reply: CompletionReply) -> Result<ComparisonResult> {
    if !reply.is_success() {
        return Err(ComparisonError::Upstream {
            status: reply.status,
            status_text: reply.status_text,
            body: reply.body,
        });
    }

    let data: serde_json::Value = serde_json::from_str(&reply.body)?;

    let comparison_text = data
        .pointer("/choices/0/message/content")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ComparisonError::malformed("missing choices[0].message.content"))?
        .to_string();

    let model_name = data
        .get("model")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ComparisonError::malformed("missing model"))?
        .to_string();

    let usage_stats = data
        .get("usage")
        .filter(|v| v.is_object())
        .cloned()
        .ok_or_else(|| ComparisonError::malformed("missing usage"))?;

    Ok(ComparisonResult {
        comparison_text,
        model_name,
        usage_stats,
    })
}

fn truncate(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ErrorKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// 記錄收到的訊息並回傳固定結果
    #[derive(Clone)]
    struct MockClient {
        reply: Arc<Mutex<Option<Result<CompletionReply>>>>,
        calls: Arc<AtomicUsize>,
        last_messages: Arc<Mutex<Vec<ChatMessage>>>,
    }

    impl MockClient {
        fn new(reply: Result<CompletionReply>) -> Self {
            Self {
                reply: Arc::new(Mutex::new(Some(reply))),
                calls: Arc::new(AtomicUsize::new(0)),
                last_messages: Arc::new(Mutex::new(vec![])),
            }
        }

        fn ok(status: u16, body: serde_json::Value) -> Self {
            Self::new(Ok(CompletionReply {
                status,
                status_text: "OK".to_string(),
                body: body.to_string(),
            }))
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CompletionClient for MockClient {
        async fn send(&self, messages: Vec<ChatMessage>) -> Result<CompletionReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_messages.lock().unwrap() = messages;
            self.reply
                .lock()
                .unwrap()
                .take()
                .expect("mock client called more than once")
        }

        fn model(&self) -> &str {
            "sonar-pro"
        }
    }

    fn payload(value: serde_json::Value) -> CompareFundsPayload {
        serde_json::from_value(value).unwrap()
    }

    fn success_body(content: &str) -> serde_json::Value {
        json!({
            "model": "sonar-pro",
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 321, "completion_tokens": 654, "total_tokens": 975}
        })
    }

    #[tokio::test]
    async fn test_single_fund_never_calls_upstream() {
        let client = MockClient::ok(200, success_body("unused"));
        let service = ComparisonService::new(client.clone());

        let err = service
            .compare(payload(json!({"fund1": "Fund X", "preferences": {}})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.to_string(), "At least 2 fund names are required");
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn test_success_returns_upstream_content() {
        let client = MockClient::ok(200, success_body("Analysis...\nRecommendation: Fund X"));
        let service = ComparisonService::new(client.clone());

        let result = service
            .compare(payload(json!({
                "fund1": "Fund X",
                "fund2": "Fund Y",
                "preferences": {"risk_appetite": "Moderate"}
            })))
            .await
            .unwrap();

        assert_eq!(result.comparison_text, "Analysis...\nRecommendation: Fund X");
        assert_eq!(result.model_name, "sonar-pro");
        assert_eq!(result.usage_stats["total_tokens"], 975);
        assert_eq!(client.calls(), 1);

        let messages = client.last_messages.lock().unwrap().clone();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, SYSTEM_PROMPT);
        assert_eq!(messages[1].role, "user");
        assert!(messages[1].content.contains("Fund A: Fund X"));
        assert!(messages[1].content.contains("- Risk Appetite: Moderate"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let client = MockClient::new(Ok(CompletionReply {
            status: 401,
            status_text: "Unauthorized".to_string(),
            body: r#"{"error":"invalid api key"}"#.to_string(),
        }));
        let service = ComparisonService::new(client.clone());

        let err = service
            .compare(payload(json!({"funds": ["Fund X", "Fund Y"]})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert!(err.detail().unwrap().contains("401"));
        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_is_passed_through() {
        let client = MockClient::new(Err(ComparisonError::internal(
            "Upstream request failed",
            "connection refused",
        )));
        let service = ComparisonService::new(client);

        let err = service
            .compare(payload(json!({"funds": ["Fund X", "Fund Y"]})))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InternalError);
        assert_eq!(err.detail().as_deref(), Some("connection refused"));
    }

    #[test]
    fn test_missing_fields_are_malformed() {
        let cases = [
            json!({"model": "m", "choices": [], "usage": {}}),
            json!({"choices": [{"message": {"content": "x"}}], "usage": {}}),
            json!({"model": "m", "choices": [{"message": {"content": "x"}}]}),
            json!({"model": "m", "choices": [{"message": {"content": null}}], "usage": {}}),
        ];

        for body in cases {
            let reply = CompletionReply {
                status: 200,
                status_text: "OK".to_string(),
                body: body.to_string(),
            };
            let err = interpret_reply(reply).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::MalformedUpstreamResponse, "{body}");
        }
    }

    #[test]
    fn test_non_json_success_is_internal() {
        let reply = CompletionReply {
            status: 200,
            status_text: "OK".to_string(),
            body: "<html>gateway</html>".to_string(),
        };
        let err = interpret_reply(reply).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalError);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        assert_eq!(truncate("abc", 10), "abc");
        assert_eq!(truncate("0–100", 2), "0–");
    }
}
