//! Rule-driven recommendation generation.
//!
//! Four independent signal generators (interval regularity, season, usage
//! frequency, emergency risk) produce candidates from one user's aggregated
//! history; the ranker dedupes, gates, scores, and truncates them.

pub mod emergency;
pub mod history;
pub mod predictive;
pub mod ranker;
pub mod reference;
pub mod seasonal;
pub mod usage;

pub use history::{aggregate_history, HistorySnapshot, ServiceTypeStats};
pub use ranker::{rank_candidates, should_receive, urgency_score};

use chrono::{DateTime, Utc};

use crate::config::EngineTuning;
use crate::domain::history::CompletedService;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{CostRange, Priority, RecommendationKind};
use crate::domain::service_type::ServiceType;

/// An unranked, not-yet-persisted recommendation produced by one signal
/// generator.
#[derive(Clone, Debug, PartialEq)]
pub struct Candidate {
    pub service_type: ServiceType,
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub predicted_date: DateTime<Utc>,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub estimated_cost: CostRange,
}

/// Runs all four signal generators over one user's history snapshot.
///
/// The generators have no data dependency on each other; they all complete
/// before the ranker sees the combined set, and their order fixes the
/// tie-break order for equal urgency scores.
pub fn generate_candidates(
    profile: &UserProfile,
    completed: &[CompletedService],
    tuning: &EngineTuning,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let snapshot = history::aggregate_history(completed, now);

    let mut candidates = predictive::generate(&snapshot, profile, tuning, now);
    candidates.extend(seasonal::generate(completed, profile, tuning, now));
    candidates.extend(usage::generate(&snapshot, profile, tuning, now));
    candidates.extend(emergency::generate(&snapshot, profile, tuning, now));
    candidates
}
