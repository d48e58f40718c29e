use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use upkeep_core::domain::analytics::{AnalyticsFilter, AnalyticsReport};
use upkeep_core::domain::history::{ActiveService, CompletedService, PendingRequest};
use upkeep_core::domain::profile::UserProfile;
use upkeep_core::domain::recommendation::{Priority, Recommendation, RecommendationKind};
use upkeep_core::domain::service_type::ServiceType;

pub mod history;
pub mod profile;
pub mod recommendation;

pub use history::SqlHistoryRepository;
pub use profile::SqlProfileRepository;
pub use recommendation::SqlRecommendationRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Filters for listing a user's active recommendations.
#[derive(Clone, Debug)]
pub struct ActiveFilter {
    pub kind: Option<RecommendationKind>,
    pub priority: Option<Priority>,
    pub limit: u32,
}

impl Default for ActiveFilter {
    fn default() -> Self {
        Self { kind: None, priority: None, limit: 10 }
    }
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find(&self, user_id: &str) -> Result<Option<UserProfile>, RepositoryError>;
    /// Insert-or-replace keyed by user id; one profile per user.
    async fn save(&self, profile: &UserProfile) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn completed_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<CompletedService>, RepositoryError>;

    async fn pending_for_user(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<Vec<PendingRequest>, RepositoryError>;

    async fn active_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<ActiveService>, RepositoryError>;

    async fn record_completed(&self, service: &CompletedService)
        -> Result<(), RepositoryError>;

    async fn record_request(&self, request: &PendingRequest) -> Result<(), RepositoryError>;

    async fn record_active(&self, service: &ActiveService) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: &str,
        user_id: &str,
    ) -> Result<Option<Recommendation>, RepositoryError>;

    /// The single active record for a (user, service type, kind) triple,
    /// when one exists.
    async fn find_active_triple(
        &self,
        user_id: &str,
        service_type: ServiceType,
        kind: RecommendationKind,
    ) -> Result<Option<Recommendation>, RepositoryError>;

    /// Insert-or-update keyed by record id.
    async fn save(&self, recommendation: &Recommendation) -> Result<(), RepositoryError>;

    async fn list_active(
        &self,
        user_id: &str,
        filter: &ActiveFilter,
    ) -> Result<Vec<Recommendation>, RepositoryError>;

    async fn count_active_created_since(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Active, never accepted, never dismissed records created before the
    /// cutoff; the caller filters out already-viewed ones.
    async fn list_reminder_candidates(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<Vec<Recommendation>, RepositoryError>;

    async fn delete_dismissed_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    async fn deactivate_stale(
        &self,
        predicted_before: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<u64, RepositoryError>;

    /// Distinct ids of users with a recommendation or a completed service
    /// since the cutoff; the bulk sweep population.
    async fn sweep_user_ids(&self, since: DateTime<Utc>)
        -> Result<Vec<String>, RepositoryError>;

    async fn analytics(
        &self,
        filter: &AnalyticsFilter,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsReport, RepositoryError>;
}
