//! Usage-frequency signal: trades the user books on a rhythm of their own,
//! independent of any reference cadence.

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineTuning;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{Priority, RecommendationKind};
use crate::engine::history::HistorySnapshot;
use crate::engine::{reference, Candidate};

const MIN_COMPLETIONS: usize = 3;
const BASE_CONFIDENCE: f64 = 0.4;
const CONFIDENCE_CAP: f64 = 0.9;
const LEAD_DAYS: i64 = 7;
/// Reference rhythm the consistency term rewards proximity to.
const IDEAL_INTERVAL_DAYS: f64 = 90.0;

pub fn generate(
    snapshot: &HistorySnapshot,
    profile: &UserProfile,
    tuning: &EngineTuning,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for stats in snapshot.iter() {
        if stats.count() < MIN_COMPLETIONS {
            continue;
        }
        let Some(average) = stats.average_interval().filter(|avg| *avg > 0.0) else {
            continue;
        };
        let Some(days_since_last) = stats.days_since_last else {
            continue;
        };
        if (days_since_last as f64) < tuning.usage_trigger_ratio * average {
            continue;
        }

        let confidence = confidence(stats.count(), average, profile);
        if confidence < tuning.usage_min_confidence {
            continue;
        }

        let label = stats.service_type.label();
        let average_days = average.round() as i64;
        candidates.push(Candidate {
            service_type: stats.service_type,
            kind: RecommendationKind::UsageBased,
            priority: Priority::Medium,
            title: format!("Regular {} service", label.to_lowercase()),
            description: format!(
                "Based on your service history, you typically request {} every \
                 {average_days} days. It has been {days_since_last} days since your last \
                 service.",
                label.to_lowercase()
            ),
            predicted_date: now + Duration::days(LEAD_DAYS),
            confidence,
            reasons: vec![
                format!(
                    "You typically request {} every {average_days} days",
                    label.to_lowercase()
                ),
                format!("It has been {days_since_last} days since your last service"),
                "Based on your usage patterns, you may need this service soon".to_owned(),
            ],
            estimated_cost: reference::estimated_cost(stats.service_type, &profile.budgets),
        });
    }

    candidates
}

/// Usage confidence: base 0.4, plus occurrence-count credit, plus an
/// interval-consistency term rewarding rhythms near 90 days, plus a
/// maintenance-style bonus; capped at 0.9.
fn confidence(count: usize, average_interval: f64, profile: &UserProfile) -> f64 {
    let mut confidence = BASE_CONFIDENCE;

    if count >= 5 {
        confidence += 0.2;
    } else if count >= 3 {
        confidence += 0.1;
    }

    confidence += consistency_term(average_interval) * 0.2;
    confidence += profile.behavior.maintenance_style.usage_bonus();

    confidence.min(CONFIDENCE_CAP)
}

/// `min(1, 30 / |avg − 90|)`, with full credit inside a day of the
/// reference rhythm where the quotient blows up.
fn consistency_term(average_interval: f64) -> f64 {
    let delta = (average_interval - IDEAL_INTERVAL_DAYS).abs();
    if delta < 1.0 {
        1.0
    } else {
        (30.0 / delta).min(1.0)
    }
}
