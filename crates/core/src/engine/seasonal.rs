//! Seasonal signal: trades relevant to the current season that have not
//! been serviced inside this year's seasonal window.

use chrono::{DateTime, Datelike, Duration, Utc};

use crate::config::EngineTuning;
use crate::domain::history::CompletedService;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{Priority, RecommendationKind};
use crate::domain::service_type::{Season, ServiceType};
use crate::engine::{reference, Candidate};

const CONFIDENCE_FLOOR: f64 = 0.1;
const CONFIDENCE_CEIL: f64 = 0.9;
const LEAD_DAYS: i64 = 14;

pub fn generate(
    completed: &[CompletedService],
    profile: &UserProfile,
    tuning: &EngineTuning,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let season = Season::for_date(now);
    let year = now.year();
    let mut candidates = Vec::new();

    for &service_type in reference::seasonal_services(season) {
        let serviced_this_season = completed.iter().any(|service| {
            service.service_type == service_type && season.contains(service.completed_at, year)
        });
        if serviced_this_season {
            continue;
        }

        let confidence = confidence(service_type, season, profile);
        if confidence < tuning.seasonal_min_confidence {
            continue;
        }

        let label = service_type.label();
        candidates.push(Candidate {
            service_type,
            kind: RecommendationKind::SeasonalRecommendation,
            priority: Priority::Medium,
            title: format!("Seasonal {} service", label.to_lowercase()),
            description: reference::seasonal_description(service_type, season),
            predicted_date: now + Duration::days(LEAD_DAYS),
            confidence,
            reasons: vec![
                format!(
                    "{} is the optimal time for {}",
                    season.label(),
                    label.to_lowercase()
                ),
                format!("No recent {} service in your history", label.to_lowercase()),
                "Weather and seasonal conditions favor this service type".to_owned(),
            ],
            estimated_cost: reference::estimated_cost(service_type, &profile.budgets),
        });
    }

    candidates
}

/// Seasonal base weight shifted by maintenance style, clamped to [0.1, 0.9].
fn confidence(service_type: ServiceType, season: Season, profile: &UserProfile) -> f64 {
    let base = reference::seasonal_weight(service_type, season);
    let bonus = profile.behavior.maintenance_style.seasonal_bonus();
    (base + bonus).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL)
}
