//! Predictive-maintenance signal: interval regularity per service type.

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineTuning;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{Priority, RecommendationKind};
use crate::engine::history::{HistorySnapshot, ServiceTypeStats};
use crate::engine::{reference, Candidate};

const MIN_COMPLETIONS: usize = 2;
const FALLBACK_CONFIDENCE: f64 = 0.3;
const CONFIDENCE_CAP: f64 = 0.95;
const MIN_LEAD_DAYS: i64 = 7;

/// Emits one candidate per service type whose elapsed time since the last
/// completion has reached the due-trigger share of the expected interval.
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
        let Some(average) = stats.average_interval() else {
            continue;
        };
        let Some(days_since_last) = stats.days_since_last else {
            continue;
        };

        let expected = reference::lifespan(stats.service_type)
            .map_or(average, |lifespan| lifespan.min_days);
        let elapsed = days_since_last as f64;
        if elapsed < tuning.due_trigger_ratio * expected {
            continue;
        }

        let mut priority = Priority::Medium;
        if elapsed >= tuning.high_priority_ratio * expected {
            priority = Priority::High;
        }
        if elapsed >= tuning.urgent_priority_ratio * expected {
            priority = Priority::Urgent;
        }

        let lead_days = (expected - elapsed).round() as i64;
        let predicted_date = now + Duration::days(lead_days.max(MIN_LEAD_DAYS));

        let label = stats.service_type.label();
        candidates.push(Candidate {
            service_type: stats.service_type,
            kind: RecommendationKind::PredictiveMaintenance,
            priority,
            title: format!("{label} maintenance due"),
            description: reference::predictive_description(
                stats.service_type,
                days_since_last,
                average,
            ),
            predicted_date,
            confidence: confidence(stats),
            reasons: vec![
                format!(
                    "Last {} service was {days_since_last} days ago",
                    label.to_lowercase()
                ),
                format!("Average interval between services: {} days", average.round() as i64),
                format!(
                    "Recommended maintenance frequency: {} days",
                    expected.round() as i64
                ),
            ],
            estimated_cost: reference::estimated_cost(stats.service_type, &profile.budgets),
        });
    }

    candidates
}

/// Interval-regularity confidence: `consistency × reliability`, capped at
/// 0.95. With fewer than two usable intervals the history is too thin to
/// measure regularity, so a fixed fallback applies.
fn confidence(stats: &ServiceTypeStats) -> f64 {
    if stats.intervals.len() < 2 {
        return FALLBACK_CONFIDENCE;
    }
    let mean = stats.average_interval().unwrap_or(0.0);
    if mean <= 0.0 {
        return FALLBACK_CONFIDENCE;
    }
    let stddev = stats.interval_stddev().unwrap_or(0.0);
    let consistency = (1.0 - stddev / mean).max(0.0);
    let reliability = reference::reliability_factor(stats.service_type);
    (consistency * reliability).min(CONFIDENCE_CAP)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use crate::config::EngineTuning;
    use crate::domain::history::CompletedService;
    use crate::domain::profile::UserProfile;
    use crate::domain::recommendation::Priority;
    use crate::domain::service_type::ServiceType;
    use crate::engine::history::aggregate_history;

    use super::*;

    fn completion(ty: ServiceType, days_ago: i64) -> CompletedService {
        CompletedService {
            id: format!("svc-{days_ago}"),
            user_id: "user-1".to_owned(),
            service_type: ty,
            request_id: None,
            completed_at: Utc::now() - Duration::days(days_ago),
        }
    }

    fn run(completed: &[CompletedService]) -> Vec<Candidate> {
        let now = Utc::now();
        let snapshot = aggregate_history(completed, now);
        let profile = UserProfile::with_defaults("user-1", now);
        generate(&snapshot, &profile, &EngineTuning::default(), now)
    }

    #[test]
    fn hvac_overdue_at_eighty_percent_of_expected_interval() {
        // Completions 200 and 410 days ago: intervals 210 and 200, average
        // 205, days since last 200. HVAC expected interval is 180, so the
        // 0.8x trigger (144) fires but the 1.2x escalation (216) does not.
        let completed = vec![
            completion(ServiceType::Hvac, 200),
            completion(ServiceType::Hvac, 410),
            completion(ServiceType::Hvac, 610),
        ];
        let candidates = run(&completed);

        assert_eq!(candidates.len(), 1);
        let candidate = &candidates[0];
        assert_eq!(candidate.service_type, ServiceType::Hvac);
        assert_eq!(candidate.priority, Priority::Medium);
        assert!(candidate.reasons.iter().any(|r| r.contains("200 days ago")));
        assert!(candidate.reasons.iter().any(|r| r.contains("205 days")));
    }

    #[test]
    fn single_completion_never_qualifies() {
        let completed = vec![completion(ServiceType::Hvac, 500)];
        assert!(run(&completed).is_empty());
    }

    #[test]
    fn priority_escalates_with_overdue_ratio() {
        // Cleaning expected interval is 30 days; 46 days elapsed is past
        // the 1.5x urgent threshold (45).
        let completed = vec![
            completion(ServiceType::Cleaning, 46),
            completion(ServiceType::Cleaning, 76),
            completion(ServiceType::Cleaning, 106),
        ];
        let candidates = run(&completed);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].priority, Priority::Urgent);
    }

    #[test]
    fn not_due_yet_emits_nothing() {
        let completed = vec![
            completion(ServiceType::Hvac, 30),
            completion(ServiceType::Hvac, 230),
        ];
        assert!(run(&completed).is_empty());
    }

    #[test]
    fn predicted_date_keeps_a_minimum_lead_time() {
        let now = Utc::now();
        let completed = vec![
            completion(ServiceType::Cleaning, 46),
            completion(ServiceType::Cleaning, 76),
            completion(ServiceType::Cleaning, 106),
        ];
        let candidates = run(&completed);
        let lead = (candidates[0].predicted_date - now).num_days();
        assert!(lead >= 6, "expected at least a week of lead time, got {lead}");
    }

    #[test]
    fn confidence_rewards_regular_intervals_and_stays_capped() {
        let now = Utc::now();
        // Perfectly regular cleaning history: consistency 1.0, reliability
        // 0.9.
        let completed = vec![
            completion(ServiceType::Cleaning, 40),
            completion(ServiceType::Cleaning, 70),
            completion(ServiceType::Cleaning, 100),
        ];
        let snapshot = aggregate_history(&completed, now);
        let stats = snapshot.stats(ServiceType::Cleaning).expect("stats");
        let value = confidence(stats);
        assert!((value - 0.9).abs() < 1e-9);
        assert!(value <= CONFIDENCE_CAP);
    }

    #[test]
    fn confidence_falls_back_with_one_usable_interval() {
        let now = Utc::now();
        let completed = vec![
            completion(ServiceType::Hvac, 200),
            completion(ServiceType::Hvac, 400),
        ];
        let snapshot = aggregate_history(&completed, now);
        let stats = snapshot.stats(ServiceType::Hvac).expect("stats");
        assert_eq!(confidence(stats), FALLBACK_CONFIDENCE);
    }
}
