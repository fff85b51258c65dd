use std::time::Duration;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::truncation::{shrink_largest_user_message, shrink_token_budget};
use crate::{
    core::config::PlannerConfig,
    error::{PlannerError, Result},
};

const CONTEXT_LENGTH_MARKERS: [&str; 5] = [
    "context_length_exceeded",
    "context length",
    "maximum context",
    "too many tokens",
    "reduce the length",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Role-tagged chat message in OpenAI wire format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Client for an OpenAI-compatible chat completion endpoint.
///
/// Rate limits, per-attempt timeouts and context-length rejections are
/// retried up to `max_retries` times; anything else fails immediately.
#[derive(Clone, Debug)]
pub struct CompletionClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    timeout: Duration,
    max_retries: usize,
    backoff_base: Duration,
}

impl CompletionClient {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.completion_api_key.clone().unwrap_or_default(),
            base_url: config.completion_base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            timeout: config.request_timeout,
            max_retries: config.max_retries,
            backoff_base: config.backoff_base,
        }
    }

    /// Send `messages` and return the raw completion payload.
    ///
    /// `json_mode` adds the `json_object` response-format hint, which only
    /// allows a top-level object in the reply.
    pub async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        json_mode: bool,
    ) -> Result<Value> {
        let request_url = build_chat_url(&self.base_url);
        let mut messages = messages;
        let mut max_tokens = max_tokens;
        let mut attempt = 0;

        loop {
            let mut request = ChatCompletionRequest::new(self.model.as_str(), messages.clone())
                .with_temperature(self.temperature)
                .with_max_tokens(max_tokens);
            if json_mode {
                request = request.with_response_format(json!({ "type": "json_object" }));
            }
            let body = request.into_value();

            let (status, response_text) =
                match timeout(self.timeout, self.send(&request_url, &body)).await {
                    Ok(outcome) => outcome?,
                    Err(_) => {
                        if attempt < self.max_retries {
                            let delay = backoff_delay(self.backoff_base, attempt);
                            warn!(
                                target: "trip_planner::completion",
                                attempt,
                                delay_ms = delay.as_millis() as u64,
                                "completion request timed out, retrying"
                            );
                            tokio::time::sleep(delay).await;
                            attempt += 1;
                            continue;
                        }

                        return Err(PlannerError::Timeout(format!(
                            "completion API did not answer within {}s on {} attempts",
                            self.timeout.as_secs_f64(),
                            attempt + 1
                        )));
                    }
                };

            if status == StatusCode::TOO_MANY_REQUESTS {
                if attempt < self.max_retries {
                    let delay = backoff_delay(self.backoff_base, attempt);
                    warn!(
                        target: "trip_planner::completion",
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "rate limited by completion API, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }

                return Err(PlannerError::RateLimit {
                    attempts: attempt + 1,
                });
            }

            if status == StatusCode::BAD_REQUEST && is_context_length_error(&response_text) {
                if attempt < self.max_retries {
                    max_tokens = shrink_token_budget(max_tokens);
                    let truncated = shrink_largest_user_message(&mut messages);
                    warn!(
                        target: "trip_planner::completion",
                        attempt,
                        max_tokens,
                        truncated,
                        "prompt exceeded model context, shrinking and retrying"
                    );
                    attempt += 1;
                    continue;
                }

                return Err(PlannerError::ContextLength {
                    attempts: attempt + 1,
                });
            }

            if !status.is_success() {
                return Err(PlannerError::Upstream {
                    service: "completion",
                    status: status.as_u16(),
                    body: response_text,
                });
            }

            let response_json: Value = serde_json::from_str(&response_text)?;

            if let Some(error) = response_json.get("error") {
                let error_message = error
                    .get("message")
                    .and_then(|value| value.as_str())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| error.to_string());
                return Err(PlannerError::Upstream {
                    service: "completion",
                    status: status.as_u16(),
                    body: error_message,
                });
            }

            debug!(
                target: "trip_planner::completion",
                attempts = attempt + 1,
                "completion succeeded"
            );
            return Ok(response_json);
        }
    }

    async fn send(&self, url: &str, body: &Value) -> Result<(StatusCode, String)> {
        let response = self
            .http
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|err| PlannerError::Transport(format!("completion request failed: {err}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| PlannerError::Transport(format!("failed to read completion: {err}")))?;

        Ok((status, text))
    }
}

/// Delay before retry number `attempt + 1`: `base * 2^attempt`
pub fn backoff_delay(base: Duration, attempt: usize) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt as u32))
}

/// Whether a 400 response body describes a prompt that is too long
pub fn is_context_length_error(body: &str) -> bool {
    let haystack = match serde_json::from_str::<Value>(body) {
        Ok(value) => {
            let error = value.get("error").unwrap_or(&value);
            let code = error.get("code").and_then(Value::as_str).unwrap_or_default();
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default();
            format!("{code} {message}")
        }
        Err(_) => body.to_string(),
    }
    .to_lowercase();

    CONTEXT_LENGTH_MARKERS
        .iter()
        .any(|marker| haystack.contains(marker))
}

/// Extract `choices[0].message.content` from a completion payload
pub fn first_choice_content(payload: &Value) -> Result<String> {
    payload
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .filter(|content| !content.trim().is_empty())
        .map(str::to_string)
        .ok_or(PlannerError::EmptyCompletion)
}

fn build_chat_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    if trimmed.ends_with("/chat/completions") {
        trimmed.to_string()
    } else {
        format!("{}/chat/completions", trimmed)
    }
}

#[derive(Clone, Debug)]
pub struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    response_format: Option<Value>,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_tokens: None,
            response_format: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_response_format(mut self, response_format: Value) -> Self {
        self.response_format = Some(response_format);
        self
    }

    pub fn into_value(self) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": self.messages,
        });

        if let Some(temperature) = self.temperature {
            body["temperature"] = json!(temperature);
        }

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if let Some(response_format) = self.response_format {
            body["response_format"] = response_format;
        }

        body
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_is_exponential() {
        let base = Duration::from_millis(100);
        assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
        assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
        assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
    }

    #[test]
    fn test_context_length_classification() {
        let groq = r#"{"error":{"message":"Please reduce the length of the messages or completion.","type":"invalid_request_error","code":"context_length_exceeded"}}"#;
        assert!(is_context_length_error(groq));

        let plain = "This model's maximum context length is 8192 tokens";
        assert!(is_context_length_error(plain));

        let other = r#"{"error":{"message":"Invalid model","type":"invalid_request_error","code":"model_not_found"}}"#;
        assert!(!is_context_length_error(other));
    }

    #[test]
    fn test_first_choice_content() {
        let payload = json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"a\":1}" } }]
        });
        assert_eq!(first_choice_content(&payload).unwrap(), "{\"a\":1}");

        let empty = json!({ "choices": [] });
        assert!(matches!(
            first_choice_content(&empty),
            Err(PlannerError::EmptyCompletion)
        ));

        let blank = json!({ "choices": [{ "message": { "content": "  " } }] });
        assert!(first_choice_content(&blank).is_err());
    }

    #[test]
    fn test_request_body() {
        let body = ChatCompletionRequest::new("model-x", vec![ChatMessage::user("hi")])
            .with_temperature(0.5)
            .with_max_tokens(100)
            .with_response_format(json!({ "type": "json_object" }))
            .into_value();

        assert_eq!(body["model"], "model-x");
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["max_tokens"], 100);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_build_chat_url() {
        assert_eq!(
            build_chat_url("https://api.groq.com/openai/v1/"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(
            build_chat_url("http://localhost/chat/completions"),
            "http://localhost/chat/completions"
        );
    }
}
