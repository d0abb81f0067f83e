//! Dashboard HTTP API
//!
//! Every route answers JSON. Failures are `{"error": message}` with the
//! status that fits; nothing here mutates state before validation passes.

use crate::alerts::{AlertAction, AlertActionLog, AlertActionRecord};
use crate::config::Config;
use crate::insights::{Insight, InsightError, InsightRequest, InsightRequester, MemberData};
use crate::metrics::{Metrics, MetricsSnapshot};
use crate::pairing::DevicePairer;
use crate::roster::Roster;
use crate::store::MemberStore;
use crate::types::{Member, NewMember, Vitals};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use uuid::Uuid;

const DEFAULT_ACTION_LIMIT: usize = 50;

pub struct AppState {
    pub config: Config,
    pub store: MemberStore,
    pub roster: Arc<Roster>,
    pub insights: InsightRequester,
    pub pairer: DevicePairer,
    pub alert_log: AlertActionLog,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: MemberStore,
        roster: Arc<Roster>,
        metrics: Arc<Metrics>,
    ) -> anyhow::Result<Self> {
        let insights = InsightRequester::new(&config.insights, Arc::clone(&metrics))?;
        let pairer = DevicePairer::new(&config.pairing);
        Ok(Self {
            config,
            store,
            roster,
            insights,
            pairer,
            alert_log: AlertActionLog::new(),
            metrics,
        })
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        Self {
            status: StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/healthz", get(healthz))
        .route("/status", get(status))
        .route("/members", get(list_members).post(create_member))
        .route("/members/{id}", get(get_member))
        .route("/members/{id}/insights", post(member_insights))
        .route("/members/{id}/alert-actions", post(record_alert_action))
        .route("/insights", post(proxy_insights))
        .route("/devices/pair", post(pair_device))
        .route("/alert-actions", get(list_alert_actions))
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: &'static str,
    member_count: usize,
    insights_configured: bool,
    insights_endpoint: String,
    simulator_interval_secs: u64,
    #[serde(flatten)]
    metrics: MetricsSnapshot,
}

async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let client = state.insights.client();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION"),
        member_count: state.roster.len().await,
        insights_configured: client.is_configured(),
        insights_endpoint: client.endpoint().to_string(),
        simulator_interval_secs: state.config.simulator.interval_secs,
        metrics: state.metrics.snapshot(),
    })
}

async fn list_members(State(state): State<Arc<AppState>>) -> Json<Vec<Member>> {
    Json(state.roster.list().await)
}

async fn create_member(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewMember>, JsonRejection>,
) -> Result<(StatusCode, Json<Member>), ApiError> {
    let Json(new_member) = payload?;
    new_member.validate().map_err(ApiError::bad_request)?;

    let profile = state
        .store
        .insert(&new_member, &state.config.store.default_user_id)
        .await
        .map_err(|e| {
            error!("[api] failed to store member: {e}");
            ApiError::internal("Failed to add member")
        })?;

    let member = Member::new(profile, Vitals::baseline());
    state.roster.push_front(member.clone()).await;
    info!(
        "[api] added {} ({}) with device {}",
        member.profile.name,
        member.id(),
        member.profile.device_id.as_deref().unwrap_or("-")
    );
    Ok((StatusCode::CREATED, Json(member)))
}

#[derive(Debug, Serialize)]
struct MemberDetail {
    #[serde(flatten)]
    member: Member,
    alert: Option<String>,
    alert_actions: Vec<AlertActionRecord>,
}

async fn get_member(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<MemberDetail>, ApiError> {
    let Path(id) = id?;
    let member = live_member(&state, id).await?;
    let alert_actions = state.alert_log.for_member(id).await;
    Ok(Json(MemberDetail {
        alert: member.alert_summary(),
        member,
        alert_actions,
    }))
}

async fn member_insights(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Insight>, ApiError> {
    let Path(id) = id?;
    let member = live_member(&state, id).await?;
    generate(&state, &MemberData::from(&member)).await
}

async fn proxy_insights(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<InsightRequest>, JsonRejection>,
) -> Result<Json<Insight>, ApiError> {
    let Json(request) = payload?;
    generate(&state, &request.member_data).await
}

async fn generate(state: &AppState, data: &MemberData) -> Result<Json<Insight>, ApiError> {
    match state.insights.request(data).await {
        Ok(insight) => Ok(Json(insight)),
        Err(err) => {
            if !err.is_transient() {
                error!("[api] insight generation failed: {err}");
            }
            Err(err.into())
        }
    }
}

async fn pair_device(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let device_id = state.pairer.pair().await;
    Json(json!({ "device_id": device_id }))
}

#[derive(Debug, Deserialize)]
struct AlertActionBody {
    action: AlertAction,
}

async fn record_alert_action(
    State(state): State<Arc<AppState>>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AlertActionBody>, JsonRejection>,
) -> Result<Json<AlertActionRecord>, ApiError> {
    let Path(id) = id?;
    let Json(body) = payload?;
    let member = live_member(&state, id).await?;
    let record = state.alert_log.record(&member, body.action).await;
    state.metrics.inc_alert_actions();
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct ActionsQuery {
    limit: Option<usize>,
}

async fn list_alert_actions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ActionsQuery>,
) -> Json<Vec<AlertActionRecord>> {
    let limit = query.limit.unwrap_or(DEFAULT_ACTION_LIMIT);
    Json(state.alert_log.recent(limit).await)
}

async fn live_member(state: &AppState, id: Uuid) -> Result<Member, ApiError> {
    state.roster.get(id).await.ok_or_else(|| {
        warn!("[api] unknown member {id}");
        ApiError::not_found(format!("Member {id} not found"))
    })
}
