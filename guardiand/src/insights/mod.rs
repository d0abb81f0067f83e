//! On-demand AI health insights
//!
//! One request per call: the member's profile and current vitals are folded
//! into a prompt, the backend is forced to answer through the
//! `provide_health_insights` tool, and the tool arguments are validated
//! against the schema that was sent. No caching, no retries.

use crate::config::InsightsConfig;
use crate::metrics::Metrics;
use crate::types::Member;
use client::{ChatMessage, InsightClient};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod client;
pub mod error;
pub mod schema;

pub use error::InsightError;
pub use schema::Insight;

const SYSTEM_PROMPT: &str = "You are a professional health advisor. Provide clear, actionable health insights for caregivers monitoring their family members.";

/// Member fields the prompt is built from, in the shape the dashboard posts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberData {
    pub name: String,
    pub age: u32,
    pub relationship: String,
    #[serde(default)]
    pub health_history: String,
    pub heart_rate: u32,
    pub bp_systolic: u32,
    pub bp_diastolic: u32,
    pub steps: u64,
}

impl From<&Member> for MemberData {
    fn from(member: &Member) -> Self {
        Self {
            name: member.profile.name.clone(),
            age: member.profile.age,
            relationship: member.profile.relationship.clone(),
            health_history: member.profile.health_history.clone(),
            heart_rate: member.vitals.heart_rate,
            bp_systolic: member.vitals.bp_systolic,
            bp_diastolic: member.vitals.bp_diastolic,
            steps: member.vitals.steps,
        }
    }
}

/// Body of the proxy endpoint: `{"memberData": {...}}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub member_data: MemberData,
}

pub struct InsightRequester {
    client: InsightClient,
    metrics: Arc<Metrics>,
}

impl InsightRequester {
    pub fn new(cfg: &InsightsConfig, metrics: Arc<Metrics>) -> anyhow::Result<Self> {
        let client = InsightClient::new(cfg)?;
        if !client.is_configured() {
            warn!("[insights] no API key configured; insight requests will fail");
        }
        Ok(Self { client, metrics })
    }

    pub fn client(&self) -> &InsightClient {
        &self.client
    }

    pub async fn request(&self, member: &MemberData) -> Result<Insight, InsightError> {
        self.metrics.inc_insight_requests();
        info!("[insights] generating insights for {}", member.name);

        let result = self.request_once(member).await;
        if let Err(err) = &result {
            self.metrics.inc_insight_failures();
            match err {
                InsightError::RateLimited => self.metrics.inc_insight_rate_limited(),
                InsightError::QuotaExhausted => self.metrics.inc_insight_quota_exhausted(),
                _ => {}
            }
            warn!("[insights] request for {} failed: {err:?}", member.name);
        }
        result
    }

    async fn request_once(&self, member: &MemberData) -> Result<Insight, InsightError> {
        let messages = [
            ChatMessage {
                role: "system",
                content: SYSTEM_PROMPT.to_string(),
            },
            ChatMessage {
                role: "user",
                content: build_prompt(member),
            },
        ];
        let completion = self.client.complete(&messages).await?;
        schema::extract_insight(&completion)
    }
}

pub fn build_prompt(member: &MemberData) -> String {
    let history = if member.health_history.trim().is_empty() {
        "None reported"
    } else {
        member.health_history.trim()
    };
    format!(
        r#"You are reviewing real-time wearable data for a family member on behalf of their caregiver.

Member Information:
- Name: {}
- Age: {}
- Relationship: {}
- Health History: {}

Current Vitals:
- Heart Rate: {} BPM
- Blood Pressure: {}/{} mmHg
- Steps Today: {}

Provide:
1. A brief summary of their current health status
2. Specific, actionable recommendations for the caregiver

Keep the response professional, clear, and focused on what the caregiver can do next."#,
        member.name,
        member.age,
        member.relationship,
        history,
        member.heart_rate,
        member.bp_systolic,
        member.bp_diastolic,
        member.steps
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockBackend, tool_call_completion};
    use axum::http::StatusCode;
    use serde_json::json;

    fn mary() -> MemberData {
        MemberData {
            name: "Mary Johnson".to_string(),
            age: 78,
            relationship: "Mother".to_string(),
            health_history: "Hypertension".to_string(),
            heart_rate: 98,
            bp_systolic: 130,
            bp_diastolic: 85,
            steps: 1200,
        }
    }

    fn requester_for(backend: &MockBackend) -> (InsightRequester, Arc<Metrics>) {
        let metrics = Arc::new(Metrics::new());
        let requester =
            InsightRequester::new(&backend.insights_config(), Arc::clone(&metrics)).unwrap();
        (requester, metrics)
    }

    #[test]
    fn prompt_embeds_member_and_vitals() {
        let prompt = build_prompt(&mary());
        assert!(prompt.contains("Name: Mary Johnson"));
        assert!(prompt.contains("Age: 78"));
        assert!(prompt.contains("Heart Rate: 98 BPM"));
        assert!(prompt.contains("Blood Pressure: 130/85 mmHg"));
        assert!(prompt.contains("Steps Today: 1200"));
        assert!(prompt.contains("Health History: Hypertension"));
    }

    #[test]
    fn prompt_marks_empty_history() {
        let mut data = mary();
        data.health_history = " ".to_string();
        assert!(build_prompt(&data).contains("Health History: None reported"));
    }

    #[test]
    fn proxy_body_uses_camel_case() {
        let req: InsightRequest = serde_json::from_value(json!({
            "memberData": {
                "name": "Mary Johnson", "age": 78, "relationship": "Mother",
                "healthHistory": "Hypertension", "heartRate": 98,
                "bpSystolic": 130, "bpDiastolic": 85, "steps": 1200
            }
        }))
        .unwrap();
        assert_eq!(req.member_data, mary());
    }

    #[tokio::test]
    async fn returns_insight_from_tool_call() {
        let backend = MockBackend::start(
            StatusCode::OK,
            tool_call_completion("Heart rate is elevated but stable.", "Encourage rest and fluids."),
        )
        .await;
        let (requester, metrics) = requester_for(&backend);

        let insight = requester.request(&mary()).await.unwrap();
        assert!(!insight.summary.is_empty());
        assert!(!insight.recommendation.is_empty());
        assert_eq!(metrics.insight_requests(), 1);
        assert_eq!(metrics.insight_failures(), 0);
        assert_eq!(backend.request_count().await, 1);

        let sent = backend.last_request().await.expect("backend saw a request");
        assert_eq!(sent["tool_choice"]["function"]["name"], schema::TOOL_NAME);
        assert_eq!(sent["messages"][0]["role"], "system");
        let user = sent["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("Mary Johnson"));
        assert_eq!(backend.last_authorization().await.as_deref(), Some("Bearer test-key"));
    }

    #[tokio::test]
    async fn rate_limit_maps_to_its_own_message() {
        let backend =
            MockBackend::start(StatusCode::TOO_MANY_REQUESTS, json!({"error": "slow down"})).await;
        let (requester, metrics) = requester_for(&backend);

        let err = requester.request(&mary()).await.unwrap_err();
        assert!(matches!(err, InsightError::RateLimited));
        assert_eq!(
            err.to_string(),
            "Rate limit exceeded. Please try again in a moment."
        );
        assert_eq!(metrics.snapshot().insight_rate_limited, 1);
    }

    #[tokio::test]
    async fn payment_required_maps_to_quota_message() {
        let backend =
            MockBackend::start(StatusCode::PAYMENT_REQUIRED, json!({"error": "no credits"})).await;
        let (requester, metrics) = requester_for(&backend);

        let err = requester.request(&mary()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "AI credits depleted. Please add credits to continue."
        );
        assert_eq!(metrics.snapshot().insight_quota_exhausted, 1);
    }

    #[tokio::test]
    async fn other_failures_carry_status_code() {
        let backend =
            MockBackend::start(StatusCode::SERVICE_UNAVAILABLE, json!({"error": "down"})).await;
        let (requester, _) = requester_for(&backend);

        let err = requester.request(&mary()).await.unwrap_err();
        assert_eq!(err.to_string(), "AI API error: 503");
    }

    #[tokio::test]
    async fn reply_without_tool_call_generates_nothing() {
        let backend = MockBackend::start(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "All good"}}]}),
        )
        .await;
        let (requester, metrics) = requester_for(&backend);

        let err = requester.request(&mary()).await.unwrap_err();
        assert_eq!(err.to_string(), "No insights generated");
        assert_eq!(metrics.insight_failures(), 1);
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let backend = MockBackend::start(
            StatusCode::OK,
            tool_call_completion("Stable.", "Keep walking."),
        )
        .await;
        let cfg = InsightsConfig {
            api_key: None,
            ..backend.insights_config()
        };
        let requester = InsightRequester::new(&cfg, Arc::new(Metrics::new())).unwrap();

        let err = requester.request(&mary()).await.unwrap_err();
        assert!(matches!(err, InsightError::NotConfigured));
        assert_eq!(backend.request_count().await, 0);
    }

    #[tokio::test]
    async fn unreachable_backend_is_a_transport_failure() {
        let cfg = InsightsConfig {
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            api_key: Some("test-key".to_string()),
            timeout_ms: 500,
            ..InsightsConfig::default()
        };
        let requester = InsightRequester::new(&cfg, Arc::new(Metrics::new())).unwrap();
        let err = requester.request(&mary()).await.unwrap_err();
        assert!(matches!(err, InsightError::Transport(_)));
        assert_eq!(err.to_string(), "Failed to generate insights");
    }
}
