use super::error::InsightError;
use super::schema::{INSIGHT_PARAMETERS, TOOL_DESCRIPTION, TOOL_NAME};
use crate::config::InsightsConfig;
use anyhow::{Context, Result};
use log::{debug, warn};
use reqwest::{Client, StatusCode, Url};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Clone)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Clone)]
pub struct InsightClient {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl InsightClient {
    pub fn new(cfg: &InsightsConfig) -> Result<Self> {
        let endpoint = Url::parse(cfg.endpoint.trim()).context("invalid insights endpoint URL")?;
        let timeout = cfg.timeout();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;
        Ok(Self {
            client,
            endpoint,
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send one forced-tool-call completion and return the decoded body.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Value, InsightError> {
        let api_key = self.api_key.as_deref().ok_or(InsightError::NotConfigured)?;
        let payload = build_request(&self.model, messages);

        let resp = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(InsightError::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => InsightError::RateLimited,
                StatusCode::PAYMENT_REQUIRED => InsightError::QuotaExhausted,
                other => {
                    let body = resp.text().await.unwrap_or_default();
                    warn!("[insights] backend returned {other}: {body}");
                    InsightError::Upstream(other.as_u16())
                }
            });
        }

        let value: Value = resp.json().await.map_err(InsightError::Transport)?;
        debug!("[insights] completion received");
        Ok(value)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<MessagePayload<'a>>,
    tools: Vec<ToolDefinition<'a>>,
    tool_choice: ToolChoice<'a>,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ToolDefinition<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: FunctionDefinition<'a>,
}

#[derive(Serialize)]
struct FunctionDefinition<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Serialize)]
struct ToolChoice<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ToolChoiceFunction<'a>,
}

#[derive(Serialize)]
struct ToolChoiceFunction<'a> {
    name: &'a str,
}

fn build_request<'a>(model: &'a str, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
    let payload = messages
        .iter()
        .map(|m| MessagePayload {
            role: m.role,
            content: m.content.as_str(),
        })
        .collect();
    ChatRequest {
        model,
        messages: payload,
        tools: vec![ToolDefinition {
            kind: "function",
            function: FunctionDefinition {
                name: TOOL_NAME,
                description: TOOL_DESCRIPTION,
                parameters: &*INSIGHT_PARAMETERS,
            },
        }],
        tool_choice: ToolChoice {
            kind: "function",
            function: ToolChoiceFunction { name: TOOL_NAME },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_forces_insight_tool() {
        let messages = [ChatMessage {
            role: "user",
            content: "test".to_string(),
        }];
        let value = serde_json::to_value(build_request("test-model", &messages)).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["tools"][0]["type"], "function");
        assert_eq!(value["tools"][0]["function"]["name"], TOOL_NAME);
        assert_eq!(
            value["tools"][0]["function"]["parameters"]["required"],
            serde_json::json!(["summary", "recommendation"])
        );
        assert_eq!(value["tool_choice"]["function"]["name"], TOOL_NAME);
    }

    #[test]
    fn rejects_invalid_endpoint() {
        let cfg = InsightsConfig {
            endpoint: "not a url".to_string(),
            ..InsightsConfig::default()
        };
        assert!(InsightClient::new(&cfg).is_err());
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let cfg = InsightsConfig {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            api_key: Some("  ".to_string()),
            ..InsightsConfig::default()
        };
        let client = InsightClient::new(&cfg).unwrap();
        assert!(!client.is_configured());
        let err = client.complete(&[]).await.unwrap_err();
        assert!(matches!(err, InsightError::NotConfigured));
    }
}
