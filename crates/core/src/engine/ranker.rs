//! Merges candidates from all generators into the final ranked set.

use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::config::EngineTuning;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::Priority;
use crate::domain::service_type::ServiceType;
use crate::engine::Candidate;

const URGENCY_CAP: f64 = 10.0;

/// Confidence scaled by priority weight and time-to-due, saturating at 10.
/// Used purely for ranking.
pub fn urgency_score(confidence: f64, priority: Priority, days_until_due: i64) -> f64 {
    let mut score = confidence * priority.weight();
    if days_until_due <= 0 {
        score *= 2.0;
    } else if days_until_due <= 7 {
        score *= 1.5;
    } else if days_until_due <= 30 {
        score *= 1.2;
    }
    score.min(URGENCY_CAP)
}

/// The user-preference gate: a pure predicate deciding whether a candidate
/// for this service type should reach the user at all.
///
/// Vetoes when the user's trailing-window dismissal rate for the type
/// exceeds the configured threshold. Urgent candidates are never vetoed.
pub fn should_receive(
    profile: &UserProfile,
    service_type: ServiceType,
    priority: Priority,
    tuning: &EngineTuning,
    now: DateTime<Utc>,
) -> bool {
    if priority == Priority::Urgent {
        return true;
    }
    let rate =
        profile.learning.dismissal_rate(service_type, now, tuning.dismissal_window_days);
    rate <= tuning.dismissal_veto_rate
}

fn days_until(predicted_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let seconds = (predicted_date - now).num_seconds();
    (seconds as f64 / 86_400.0).ceil() as i64
}

/// Deduplicates, filters, scores, and truncates the combined candidate set.
///
/// Order of operations is significant: duplicates are removed first
/// (earliest generator wins), then active services and the preference gate
/// are applied, then low-confidence candidates are dropped, and the
/// survivors are stably sorted by descending urgency before the top-N cut.
pub fn rank_candidates(
    candidates: Vec<Candidate>,
    profile: &UserProfile,
    active_types: &HashSet<ServiceType>,
    tuning: &EngineTuning,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut survivors: Vec<Candidate> = candidates
        .into_iter()
        .filter(|candidate| seen.insert((candidate.service_type, candidate.kind)))
        .filter(|candidate| !active_types.contains(&candidate.service_type))
        .filter(|candidate| {
            should_receive(profile, candidate.service_type, candidate.priority, tuning, now)
        })
        .filter(|candidate| candidate.confidence >= tuning.min_confidence)
        .collect();

    survivors.sort_by(|a, b| {
        let a_score = urgency_score(a.confidence, a.priority, days_until(a.predicted_date, now));
        let b_score = urgency_score(b.confidence, b.priority, days_until(b.predicted_date, now));
        b_score.partial_cmp(&a_score).unwrap_or(std::cmp::Ordering::Equal)
    });

    survivors.truncate(tuning.max_recommendations);
    survivors
}
