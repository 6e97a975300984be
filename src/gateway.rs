//! Backend gateway client for chat-completion-shaped requests.
//!
//! Wraps outbound POSTs to the knowledge-jar backend (`{base_url}/api{path}`)
//! or, when `use_local_backend` is off, straight to an Azure OpenAI
//! deployment. Normalizes error bodies (preferring the backend's `detail`
//! field) and decodes the reply's `content` field, which may arrive either
//! as a structured object or as JSON-encoded text.
//!
//! The decode contract is deliberately best-effort and surfaced as a tagged
//! [`Reply`]: callers pattern-match instead of runtime-checking the shape.
//! No retry anywhere — network failure, non-2xx status, and malformed
//! bodies all surface as a single error with a human-readable message.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::config::BackendConfig;
use crate::models::ChatMessage;

/// Shown when a chat reply carries neither `content` nor `response`.
const NO_REPLY_FALLBACK: &str = "no response received";

/// Decoded gateway reply.
///
/// `Structured` carries a JSON value — either because the backend sent an
/// object directly or because its string content parsed as JSON. `Raw` is
/// the fallback for content that is plain text.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Structured(Value),
    Raw(String),
}

/// Chat-completion-shaped request payload.
#[derive(Debug, Clone, Serialize)]
pub struct ChatPayload {
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

impl ChatPayload {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            response_format: None,
        }
    }

    /// Ask the backend for a JSON object reply.
    pub fn json_object(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            response_format: Some(serde_json::json!({ "type": "json_object" })),
        }
    }
}

pub struct Gateway {
    client: reqwest::Client,
    config: BackendConfig,
}

impl Gateway {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// POST a chat-completion payload to `{base_url}/api{path}` and decode
    /// the reply's `content` (falling back to `response`).
    ///
    /// In Azure direct mode the request goes to the configured deployment's
    /// `chat/completions` endpoint instead and the reply text is read from
    /// `choices[0].message.content`; the same decode rule applies.
    pub async fn send(&self, path: &str, payload: &ChatPayload) -> Result<Reply> {
        let request = if self.config.use_local_backend {
            let url = format!("{}/api{}", self.config.base_url, path);
            tracing::debug!(%url, "gateway request");
            self.client.post(&url).json(payload)
        } else {
            let azure = self
                .config
                .azure
                .as_ref()
                .context("Azure settings missing while use_local_backend = false")?;
            let url = format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                azure.endpoint, azure.deployment_name, azure.api_version
            );
            tracing::debug!(%url, "gateway request (azure)");
            let body = serde_json::json!({
                "messages": payload.messages,
                "response_format": payload.response_format,
                "temperature": 0.7,
            });
            self.client
                .post(&url)
                .header("api-key", azure.key.as_str())
                .json(&body)
        };

        let resp = request
            .send()
            .await
            .with_context(|| format!("gateway request failed: {}", path))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            match error_detail(&text) {
                Some(detail) => bail!("API error ({}): {}", status.as_u16(), detail),
                None => bail!("API error ({}): {}", status.as_u16(), text),
            }
        }

        let body: Value = resp.json().await.context("gateway response was not JSON")?;

        let content = if self.config.use_local_backend {
            pick_content(&body)
        } else {
            body.pointer("/choices/0/message/content").cloned()
        };

        let content = content.context("gateway response carried no content")?;
        Ok(interpret_content(content))
    }

    /// Plain-text chat against `POST /api/chat`.
    ///
    /// Chat replies are strings in `content` or `response`; a fixed fallback
    /// stands in when the backend sends neither.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/api/chat", self.config.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "messages": messages }))
            .send()
            .await
            .context("chat request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("chat API error: {}", status.as_u16());
        }

        let body: Value = resp.json().await.context("chat response was not JSON")?;
        let text = non_empty_str(body.get("content"))
            .or_else(|| non_empty_str(body.get("response")))
            .unwrap_or(NO_REPLY_FALLBACK);
        Ok(text.to_string())
    }
}

/// `content`, falling back to `response`; absent, null, and empty-string
/// values all defer to the fallback field.
fn pick_content(body: &Value) -> Option<Value> {
    let present = |v: &Value| !v.is_null() && v.as_str() != Some("");
    body.get("content")
        .filter(|v| present(v))
        .or_else(|| body.get("response").filter(|v| present(v)))
        .cloned()
}

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value.and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

/// Extract the backend's `detail` field from an error body, if it is JSON.
fn error_detail(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("detail")
        .map(|d| match d {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
}

/// Objects pass through unchanged; strings get one JSON-parse attempt and
/// fall back to raw text with a warning.
fn interpret_content(content: Value) -> Reply {
    match content {
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed) => Reply::Structured(parsed),
            Err(_) => {
                let preview: String = s.chars().take(200).collect();
                tracing::warn!(%preview, "content is not JSON, returning raw text");
                Reply::Raw(s)
            }
        },
        other => Reply::Structured(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_content_passes_through() {
        let reply = interpret_content(json!({"overview": {}}));
        assert_eq!(reply, Reply::Structured(json!({"overview": {}})));
    }

    #[test]
    fn json_encoded_string_is_parsed() {
        let reply = interpret_content(json!("{\"a\": 1}"));
        assert_eq!(reply, Reply::Structured(json!({"a": 1})));
    }

    #[test]
    fn plain_string_stays_raw() {
        let reply = interpret_content(json!("hello there"));
        assert_eq!(reply, Reply::Raw("hello there".to_string()));
    }

    #[test]
    fn numeric_string_parses_as_json() {
        let reply = interpret_content(json!("123"));
        assert_eq!(reply, Reply::Structured(json!(123)));
    }

    #[test]
    fn detail_field_extracted_from_json_error() {
        assert_eq!(
            error_detail("{\"detail\": \"index not found\"}"),
            Some("index not found".to_string())
        );
    }

    #[test]
    fn non_json_error_body_has_no_detail() {
        assert_eq!(error_detail("Internal Server Error"), None);
    }

    #[test]
    fn empty_content_defers_to_response() {
        let body = json!({"content": "", "response": "fallback text"});
        assert_eq!(pick_content(&body), Some(json!("fallback text")));
    }

    #[test]
    fn null_content_defers_to_response() {
        let body = json!({"content": null, "response": {"k": 1}});
        assert_eq!(pick_content(&body), Some(json!({"k": 1})));
    }

    #[test]
    fn missing_both_fields_is_none() {
        assert_eq!(pick_content(&json!({"other": true})), None);
    }
}
