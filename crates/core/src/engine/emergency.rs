//! Emergency-risk signal: static domain heuristics over the home profile
//! rather than interval statistics.

use chrono::{DateTime, Duration, Utc};

use crate::config::EngineTuning;
use crate::domain::profile::UserProfile;
use crate::domain::recommendation::{Priority, RecommendationKind};
use crate::domain::service_type::ServiceType;
use crate::engine::history::HistorySnapshot;
use crate::engine::{reference, Candidate};

const EMIT_THRESHOLD: f64 = 0.6;
const HIGH_THRESHOLD: f64 = 0.8;
const URGENT_THRESHOLD: f64 = 0.9;
const MIN_LEAD_DAYS: f64 = 3.0;

/// One assessed risk, before the emission threshold is applied.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskFinding {
    pub service_type: ServiceType,
    pub emergency_label: String,
    pub risk_level: f64,
    pub urgency_window_days: f64,
    pub description: String,
    pub reasons: Vec<String>,
}

/// Assesses all emergency risks for the user. Every finding is returned;
/// `generate` applies the emission threshold.
pub fn assess(
    snapshot: &HistorySnapshot,
    profile: &UserProfile,
    tuning: &EngineTuning,
    now: DateTime<Utc>,
) -> Vec<RiskFinding> {
    let mut findings = Vec::new();
    let home_age = f64::from(profile.home.age_years);

    if snapshot.completions_for(ServiceType::Hvac) == 0
        && profile.home.age_years > tuning.hvac_risk_age_years
    {
        findings.push(RiskFinding {
            service_type: ServiceType::Hvac,
            emergency_label: "system failure".to_owned(),
            risk_level: (0.3 + 0.05 * home_age).min(0.9),
            urgency_window_days: (90.0 - 2.0 * home_age).max(7.0),
            description: "Your HVAC system may need maintenance to prevent costly \
                          emergency repairs."
                .to_owned(),
            reasons: vec![
                format!("Home is {} years old", profile.home.age_years),
                "No HVAC maintenance in service history".to_owned(),
                "Preventive maintenance avoids most HVAC emergencies".to_owned(),
            ],
        });
    }

    if snapshot.completions_for(ServiceType::Plumbing) == 0
        && profile.home.age_years > tuning.plumbing_risk_age_years
    {
        let over = home_age - f64::from(tuning.plumbing_risk_age_years);
        findings.push(RiskFinding {
            service_type: ServiceType::Plumbing,
            emergency_label: "pipe burst or major leak".to_owned(),
            risk_level: (0.4 + 0.03 * over).min(0.8),
            urgency_window_days: 60.0,
            description: "Older plumbing systems benefit from regular inspections to \
                          prevent water damage."
                .to_owned(),
            reasons: vec![
                format!("Home is {} years old", profile.home.age_years),
                format!(
                    "Plumbing systems typically need attention after {} years",
                    tuning.plumbing_risk_age_years
                ),
                "No plumbing service history on record".to_owned(),
            ],
        });
    }

    for appliance in &profile.home.appliances {
        // Appliances without an install date have no measurable age and
        // never qualify.
        let Some(age) = appliance.age_years(now) else {
            continue;
        };
        if age <= tuning.appliance_risk_age_years
            || !appliance.maintenance_lapsed(now, tuning.appliance_maintenance_lapse_days)
        {
            continue;
        }
        let label = appliance.kind.label();
        findings.push(RiskFinding {
            service_type: ServiceType::ApplianceRepair,
            emergency_label: format!("{label} failure"),
            risk_level: (0.3 + 0.04 * age as f64).min(0.7),
            urgency_window_days: 30.0,
            description: format!(
                "Your {label} may need maintenance to prevent unexpected breakdowns."
            ),
            reasons: vec![
                format!("{label} is {age} years old"),
                "No recent maintenance recorded".to_owned(),
                "Regular maintenance extends appliance life".to_owned(),
            ],
        });
    }

    findings
}

/// Emits a candidate for each finding at or above the 0.6 risk threshold.
/// Confidence is the risk level verbatim.
pub fn generate(
    snapshot: &HistorySnapshot,
    profile: &UserProfile,
    tuning: &EngineTuning,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    assess(snapshot, profile, tuning, now)
        .into_iter()
        .filter(|finding| finding.risk_level >= EMIT_THRESHOLD)
        .map(|finding| {
            let priority = if finding.risk_level >= URGENT_THRESHOLD {
                Priority::Urgent
            } else if finding.risk_level >= HIGH_THRESHOLD {
                Priority::High
            } else {
                Priority::Medium
            };
            let lead_days =
                (30.0 - finding.urgency_window_days).max(MIN_LEAD_DAYS).round() as i64;

            Candidate {
                service_type: finding.service_type,
                kind: RecommendationKind::EmergencyPrevention,
                priority,
                title: format!("Prevent {}", finding.emergency_label),
                description: finding.description,
                predicted_date: now + Duration::days(lead_days),
                confidence: finding.risk_level,
                reasons: finding.reasons,
                estimated_cost: reference::estimated_cost(
                    finding.service_type,
                    &profile.budgets,
                ),
            }
        })
        .collect()
}
