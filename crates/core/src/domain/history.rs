use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::service_type::ServiceType;

/// A completed service instance. Immutable; read-only engine input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletedService {
    pub id: String,
    pub user_id: String,
    pub service_type: ServiceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub completed_at: DateTime<Utc>,
}

/// An open service request awaiting fulfillment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingRequest {
    pub id: String,
    pub user_id: String,
    pub service_type: ServiceType,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// A service currently in progress; suppresses matching candidates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveService {
    pub id: String,
    pub user_id: String,
    pub service_type: ServiceType,
    pub started_at: DateTime<Utc>,
}

/// A user's aggregated history as read from the store. A user with no
/// history yields empty collections, never an error.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ServiceHistory {
    pub completed: Vec<CompletedService>,
    pub pending: Vec<PendingRequest>,
}
