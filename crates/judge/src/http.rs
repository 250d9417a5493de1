//! HTTP transport for judge services.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::JudgeError;
use crate::judge::SemanticJudge;
use crate::response::{parse_verdict, parse_verdict_text};
use crate::types::{JudgeRequest, JudgeVerdict};

const SYSTEM_PROMPT: &str = "You assess document changes for business risk. \
Classify the edit by its impact on business operations.

CRITICAL:
- directly affects money, contractual obligations, or creates legal or financial exposure
- changes important dates (deadlines, effective dates, payment dates)
- changes names of organizations or people party to an agreement
- changes legally binding terms
- adds or removes a negation that reverses the meaning

MEDIUM:
- changes understanding without direct financial or legal effect
- adds or removes explanatory text
- wording changes that shift the nuance of the meaning
- sentence restructuring that affects interpretation

LOW:
- no effect on business operations
- spelling fixes
- formatting changes
- synonyms with the same meaning

Reply with a single JSON object: \
{\"impact\": \"critical|medium|low\", \"rationale\": \"<one sentence>\", \"confidence\": <0..1>}";

/// Wire format spoken by the judge endpoint.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JudgeProvider {
    /// POST the request as JSON, read a verdict object back.
    #[default]
    #[serde(rename = "custom")]
    Custom,
    /// OpenAI-compatible chat completions.
    #[serde(rename = "openai")]
    OpenAi,
}

impl fmt::Display for JudgeProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            JudgeProvider::Custom => "custom",
            JudgeProvider::OpenAi => "openai",
        })
    }
}

impl FromStr for JudgeProvider {
    type Err = JudgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "custom" => Ok(JudgeProvider::Custom),
            "openai" => Ok(JudgeProvider::OpenAi),
            other => Err(JudgeError::InvalidConfig(format!(
                "unknown judge provider `{other}`"
            ))),
        }
    }
}

/// Endpoint settings for [`HttpJudge`].
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HttpJudgeConfig {
    pub url: String,
    /// Sent as `Authorization: Bearer <key>`.
    pub api_key: Option<String>,
    pub model: String,
    pub provider: JudgeProvider,
    pub max_tokens: u32,
}

impl Default for HttpJudgeConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: None,
            model: "gpt-4o".into(),
            provider: JudgeProvider::Custom,
            max_tokens: 300,
        }
    }
}

impl fmt::Debug for HttpJudgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpJudgeConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider", &self.provider)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// Judge backed by a remote service.
///
/// One attempt per call with no client-side deadline; wrap it in
/// [`crate::ResilientJudge`] for timeouts and retries.
#[derive(Debug, Clone)]
pub struct HttpJudge {
    client: reqwest::Client,
    config: HttpJudgeConfig,
}

impl HttpJudge {
    pub fn new(config: HttpJudgeConfig) -> Result<Self, JudgeError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .build()
            .map_err(|e| JudgeError::InvalidConfig(format!("http client: {e}")))?;
        Self::with_client(config, client)
    }

    /// Reuses an existing connection pool.
    pub fn with_client(config: HttpJudgeConfig, client: reqwest::Client) -> Result<Self, JudgeError> {
        if config.url.trim().is_empty() {
            return Err(JudgeError::InvalidConfig("judge url is required".into()));
        }
        reqwest::Url::parse(&config.url)
            .map_err(|e| JudgeError::InvalidConfig(format!("judge url `{}`: {e}", config.url)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &HttpJudgeConfig {
        &self.config
    }

    fn payload(&self, request: &JudgeRequest) -> Value {
        match self.config.provider {
            JudgeProvider::Custom => json!({
                "old_text": request.old_text,
                "new_text": request.new_text,
                "block_type": request.block_type,
                "document_type": request.document_type,
            }),
            JudgeProvider::OpenAi => json!({
                "model": self.config.model,
                "max_tokens": self.config.max_tokens,
                "temperature": 0,
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": user_prompt(request) },
                ],
            }),
        }
    }

    async fn send(&self, payload: &Value) -> Result<Value, JudgeError> {
        let mut request = self.client.post(&self.config.url).json(payload);
        if let Some(key) = self.config.api_key.as_deref() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| JudgeError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(JudgeError::Rejected {
                status: status.as_u16(),
                message: truncate(&body, 200),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| JudgeError::Transport(format!("reading body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| JudgeError::MalformedResponse(format!("invalid JSON body: {e}")))
    }
}

#[async_trait]
impl SemanticJudge for HttpJudge {
    async fn classify(&self, request: &JudgeRequest) -> Result<JudgeVerdict, JudgeError> {
        let payload = self.payload(request);
        let body = self.send(&payload).await?;
        debug!(provider = %self.config.provider, "judge_response_received");

        match self.config.provider {
            JudgeProvider::Custom => parse_verdict(&body),
            JudgeProvider::OpenAi => parse_verdict_text(chat_content(&body)?),
        }
    }

    fn name(&self) -> &str {
        match self.config.provider {
            JudgeProvider::Custom => "http",
            JudgeProvider::OpenAi => "openai",
        }
    }
}

fn user_prompt(request: &JudgeRequest) -> String {
    let document_type = request.document_type.as_deref().unwrap_or("general");
    format!(
        "Document type: {document_type}\nBlock type: {}\n\nOriginal:\n{}\n\nRevised:\n{}",
        request.block_type,
        if request.old_text.is_empty() { "(none)" } else { request.old_text.as_str() },
        if request.new_text.is_empty() { "(none)" } else { request.new_text.as_str() },
    )
}

/// `choices[0].message.content` of a chat completion.
fn chat_content(body: &Value) -> Result<&str, JudgeError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| JudgeError::MalformedResponse("missing choices[0].message.content".into()))
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImpactLevel;

    fn judge(provider: JudgeProvider) -> HttpJudge {
        HttpJudge::new(HttpJudgeConfig {
            url: "http://127.0.0.1:9/judge".into(),
            provider,
            ..HttpJudgeConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn rejects_missing_or_bad_url() {
        assert!(matches!(
            HttpJudge::new(HttpJudgeConfig::default()),
            Err(JudgeError::InvalidConfig(_))
        ));
        let bad = HttpJudgeConfig {
            url: "not a url".into(),
            ..HttpJudgeConfig::default()
        };
        assert!(matches!(HttpJudge::new(bad), Err(JudgeError::InvalidConfig(_))));
    }

    #[test]
    fn custom_payload_carries_request_fields() {
        let request = JudgeRequest::new("pay monthly", "pay weekly", "paragraph")
            .with_document_type("contract");
        let payload = judge(JudgeProvider::Custom).payload(&request);
        assert_eq!(payload["old_text"], "pay monthly");
        assert_eq!(payload["new_text"], "pay weekly");
        assert_eq!(payload["block_type"], "paragraph");
        assert_eq!(payload["document_type"], "contract");
    }

    #[test]
    fn openai_payload_is_deterministic_chat() {
        let request = JudgeRequest::new("", "New clause", "heading");
        let payload = judge(JudgeProvider::OpenAi).payload(&request);
        assert_eq!(payload["model"], "gpt-4o");
        assert_eq!(payload["temperature"], 0);
        assert_eq!(payload["messages"][0]["role"], "system");
        let user = payload["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Document type: general"));
        assert!(user.contains("Original:\n(none)"));
        assert!(user.contains("New clause"));
    }

    #[test]
    fn chat_content_is_extracted() {
        let body = json!({
            "choices": [{ "message": { "content": "```json\n{\"impact\":\"low\"}\n```" } }]
        });
        let verdict = parse_verdict_text(chat_content(&body).unwrap()).unwrap();
        assert_eq!(verdict.impact, ImpactLevel::Low);
        assert!(chat_content(&json!({ "choices": [] })).is_err());
    }

    #[test]
    fn provider_names() {
        assert_eq!("OpenAI".parse::<JudgeProvider>().unwrap(), JudgeProvider::OpenAi);
        assert_eq!(JudgeProvider::Custom.to_string(), "custom");
        assert!("bedrock".parse::<JudgeProvider>().is_err());
        assert!(!format!("{:?}", HttpJudgeConfig {
            api_key: Some("sk-secret".into()),
            ..HttpJudgeConfig::default()
        })
        .contains("sk-secret"));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        let err = judge(JudgeProvider::Custom)
            .classify(&JudgeRequest::new("a", "b", "paragraph"))
            .await
            .unwrap_err();
        assert!(matches!(err, JudgeError::Transport(_)), "{err:?}");
        assert!(err.is_retryable());
    }
}
