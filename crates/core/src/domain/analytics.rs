use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::recommendation::RecommendationKind;
use crate::domain::service_type::ServiceType;

/// Optional constraints on an analytics query.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnalyticsFilter {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub user_id: Option<String>,
}

/// Per-service-type aggregate row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceTypeBreakdown {
    pub service_type: ServiceType,
    pub count: u64,
    pub accepted: u64,
    pub dismissed: u64,
    pub avg_confidence: f64,
}

/// Per-recommendation-kind aggregate row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KindBreakdown {
    pub kind: RecommendationKind,
    pub count: u64,
    pub accepted: u64,
    pub avg_confidence: f64,
}

/// Aggregate view over recommendation records.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub total: u64,
    pub accepted: u64,
    pub dismissed: u64,
    pub overdue: u64,
    pub avg_confidence: f64,
    /// Share of records accepted, in [0, 1].
    pub acceptance_rate: f64,
    /// Share of records dismissed, in [0, 1].
    pub dismissal_rate: f64,
    pub by_service_type: Vec<ServiceTypeBreakdown>,
    pub by_kind: Vec<KindBreakdown>,
}

impl AnalyticsReport {
    /// Derives the acceptance/dismissal rates from the counters.
    pub fn with_rates(mut self) -> Self {
        if self.total > 0 {
            self.acceptance_rate = self.accepted as f64 / self.total as f64;
            self.dismissal_rate = self.dismissed as f64 / self.total as f64;
        }
        self
    }
}
