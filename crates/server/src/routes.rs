//! JSON API over the recommendation service.
//!
//! Endpoints (caller identity comes from the `x-user-id` header; auth is an
//! upstream concern):
//! - `POST /api/recommendations/generate`        — run the engine for the caller
//! - `GET  /api/recommendations`                 — list active recommendations
//! - `POST /api/recommendations/{id}/action`     — record view/click/accept/dismiss/snooze
//! - `GET  /api/preferences`                     — fetch the caller's profile
//! - `PUT  /api/preferences`                     — patch the profile and regenerate
//! - `GET  /api/analytics/recommendations`       — aggregate counts and rates

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use upkeep_core::domain::analytics::{AnalyticsFilter, AnalyticsReport};
use upkeep_core::domain::profile::{ProfilePatch, UserProfile};
use upkeep_core::domain::recommendation::{Priority, Recommendation, RecommendationKind};
use upkeep_core::engine::urgency_score;
use upkeep_core::errors::{ApplicationError, InterfaceError};
use upkeep_db::repositories::ActiveFilter;
use upkeep_engine::RecommendationService;

#[derive(Clone)]
pub struct ApiState {
    service: Arc<RecommendationService>,
}

pub fn router(service: Arc<RecommendationService>) -> Router {
    Router::new()
        .route("/api/recommendations", get(list_recommendations))
        .route("/api/recommendations/generate", post(generate_recommendations))
        .route("/api/recommendations/{id}/action", post(record_action))
        .route("/api/preferences", get(get_preferences).put(update_preferences))
        .route("/api/analytics/recommendations", get(analytics))
        .with_state(ApiState { service })
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

pub struct ApiError(InterfaceError);

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self(InterfaceError::BadRequest {
            message: message.into(),
            correlation_id: Uuid::new_v4().to_string(),
        })
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(Uuid::new_v4().to_string()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, correlation_id) = match &self.0 {
            InterfaceError::BadRequest { correlation_id, .. } => {
                (StatusCode::BAD_REQUEST, correlation_id.clone())
            }
            InterfaceError::NotFound { correlation_id, .. } => {
                (StatusCode::NOT_FOUND, correlation_id.clone())
            }
            InterfaceError::ServiceUnavailable { correlation_id, .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, correlation_id.clone())
            }
            InterfaceError::Internal { correlation_id, .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, correlation_id.clone())
            }
        };

        let body = Json(json!({
            "error": self.0.user_message(),
            "correlation_id": correlation_id,
        }));
        (status, body).into_response()
    }
}

fn require_user(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get("x-user-id")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| ApiError::bad_request("missing x-user-id header"))
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub force_regenerate: bool,
}

#[derive(Debug, Serialize)]
pub struct RecommendationView {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub urgency_score: f64,
    pub days_until: i64,
    pub is_overdue: bool,
}

impl RecommendationView {
    fn new(recommendation: Recommendation, now: DateTime<Utc>) -> Self {
        let days_until = recommendation.days_until(now);
        let urgency =
            urgency_score(recommendation.confidence, recommendation.priority, days_until);
        let is_overdue = recommendation.is_overdue(now);
        Self { recommendation, urgency_score: urgency, days_until, is_overdue }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub recommendations: Vec<RecommendationView>,
    pub total_count: usize,
    pub generated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub kind: Option<String>,
    pub priority: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListMetadata {
    pub has_urgent: bool,
    pub has_overdue: bool,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub recommendations: Vec<RecommendationView>,
    pub total_count: usize,
    pub metadata: ListMetadata,
}

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub reason: Option<String>,
    pub snooze_until: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    pub recommendation: RecommendationView,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub preferences: Option<UserProfile>,
}

#[derive(Debug, Serialize)]
pub struct UpdatePreferencesResponse {
    pub preferences: UserProfile,
    pub new_recommendations: usize,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub analytics: AnalyticsReport,
    pub generated_at: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn generate_recommendations(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let user_id = require_user(&headers)?;

    let records = state.service.generate(&user_id, request.force_regenerate).await?;
    let now = Utc::now();

    info!(
        event_name = "api.recommendations.generated",
        user_id = %user_id,
        count = records.len(),
        force = request.force_regenerate,
        "generation requested over the API"
    );

    Ok(Json(GenerateResponse {
        total_count: records.len(),
        recommendations: records
            .into_iter()
            .map(|record| RecommendationView::new(record, now))
            .collect(),
        generated_at: now.to_rfc3339(),
    }))
}

async fn list_recommendations(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let user_id = require_user(&headers)?;

    let kind = query
        .kind
        .map(|raw| raw.parse::<RecommendationKind>())
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let priority = query
        .priority
        .map(|raw| raw.parse::<Priority>())
        .transpose()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let filter = ActiveFilter {
        kind,
        priority,
        limit: query.limit.unwrap_or(10).clamp(1, 100),
    };

    let records = state.service.list_active(&user_id, &filter).await?;
    let now = Utc::now();
    let views: Vec<RecommendationView> =
        records.into_iter().map(|record| RecommendationView::new(record, now)).collect();

    Ok(Json(ListResponse {
        total_count: views.len(),
        metadata: ListMetadata {
            has_urgent: views
                .iter()
                .any(|view| view.recommendation.priority == Priority::Urgent),
            has_overdue: views.iter().any(|view| view.is_overdue),
        },
        recommendations: views,
    }))
}

async fn record_action(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(recommendation_id): Path<String>,
    Json(request): Json<ActionRequest>,
) -> Result<Json<ActionResponse>, ApiError> {
    let user_id = require_user(&headers)?;

    let mut metadata = serde_json::Map::new();
    if let Some(reason) = request.reason {
        metadata.insert("reason".to_owned(), json!(reason));
    }
    if let Some(snooze_until) = request.snooze_until {
        metadata.insert("snooze_until".to_owned(), json!(snooze_until));
    }
    let metadata =
        if metadata.is_empty() { None } else { Some(serde_json::Value::Object(metadata)) };

    let record = state
        .service
        .record_action(&recommendation_id, &user_id, &request.action, metadata)
        .await?;

    Ok(Json(ActionResponse {
        success: true,
        recommendation: RecommendationView::new(record, Utc::now()),
    }))
}

async fn get_preferences(
    State(state): State<ApiState>,
    headers: HeaderMap,
) -> Result<Json<PreferencesResponse>, ApiError> {
    let user_id = require_user(&headers)?;
    let preferences = state.service.get_profile(&user_id).await?;
    Ok(Json(PreferencesResponse { preferences }))
}

async fn update_preferences(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<UpdatePreferencesResponse>, ApiError> {
    let user_id = require_user(&headers)?;

    let preferences = state.service.update_profile(&user_id, patch).await?;
    // A changed profile shifts generator inputs; refresh the active set.
    let records = state.service.generate(&user_id, true).await?;

    Ok(Json(UpdatePreferencesResponse {
        preferences,
        new_recommendations: records.len(),
    }))
}

async fn analytics(
    State(state): State<ApiState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let parse_date = |raw: Option<String>| -> Result<Option<DateTime<Utc>>, ApiError> {
        raw.map(|value| {
            DateTime::parse_from_rfc3339(&value)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|_| ApiError::bad_request(format!("invalid date `{value}`")))
        })
        .transpose()
    };

    let filter = AnalyticsFilter {
        start: parse_date(query.start_date)?,
        end: parse_date(query.end_date)?,
        user_id: query.user_id,
    };

    let report = state.service.analytics(&filter).await?;
    Ok(Json(AnalyticsResponse { analytics: report, generated_at: Utc::now().to_rfc3339() }))
}
