use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::service_type::ServiceType;
use crate::engine::Candidate;
use crate::errors::DomainError;

/// Which signal produced a recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationKind {
    PredictiveMaintenance,
    SeasonalRecommendation,
    UsageBased,
    EmergencyPrevention,
}

impl RecommendationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecommendationKind::PredictiveMaintenance => "predictive_maintenance",
            RecommendationKind::SeasonalRecommendation => "seasonal_recommendation",
            RecommendationKind::UsageBased => "usage_based",
            RecommendationKind::EmergencyPrevention => "emergency_prevention",
        }
    }
}

impl std::fmt::Display for RecommendationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecommendationKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "predictive_maintenance" => Ok(Self::PredictiveMaintenance),
            "seasonal_recommendation" => Ok(Self::SeasonalRecommendation),
            "usage_based" => Ok(Self::UsageBased),
            "emergency_prevention" => Ok(Self::EmergencyPrevention),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown recommendation kind `{other}`"
            ))),
        }
    }
}

/// Ranked from least to most pressing; ordering is load-bearing for sorts.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Multiplier used by the urgency score.
    pub fn weight(&self) -> f64 {
        match self {
            Priority::Low => 1.0,
            Priority::Medium => 2.0,
            Priority::High => 3.0,
            Priority::Urgent => 4.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => {
                Err(DomainError::InvariantViolation(format!("unknown priority `{other}`")))
            }
        }
    }
}

/// User action on a recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Viewed,
    Clicked,
    Accepted,
    Dismissed,
    Snoozed,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Viewed => "viewed",
            ActionKind::Clicked => "clicked",
            ActionKind::Accepted => "accepted",
            ActionKind::Dismissed => "dismissed",
            ActionKind::Snoozed => "snoozed",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "view" | "viewed" => Ok(Self::Viewed),
            "click" | "clicked" => Ok(Self::Clicked),
            "accept" | "accepted" => Ok(Self::Accepted),
            "dismiss" | "dismissed" => Ok(Self::Dismissed),
            "snooze" | "snoozed" => Ok(Self::Snoozed),
            other => Err(DomainError::UnknownAction(other.to_owned())),
        }
    }
}

/// One entry in a recommendation's append-only action log.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub action: ActionKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Sms,
    Push,
    Webhook,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Sent,
    Delivered,
    Failed,
}

/// Delivery attempt recorded against a recommendation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotificationEntry {
    pub channel: NotificationChannel,
    pub sent_at: DateTime<Utc>,
    pub status: NotificationStatus,
}

/// Estimated cost window in the marketplace's currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl CostRange {
    pub fn new(min: Decimal, max: Decimal) -> Self {
        Self { min, max }
    }

    /// Narrows this range to the overlap with a budget range, keeping the
    /// original bounds where the budget is wider.
    pub fn clamped_to(&self, budget: &CostRange) -> CostRange {
        CostRange { min: self.min.max(budget.min), max: self.max.min(budget.max) }
    }
}

const SNOOZE_DEFAULT_DAYS: i64 = 7;

/// A persisted "you may need this service" suggestion.
///
/// Created by the reconciler from ranked candidates; mutated only by the
/// action recorder, the reminder sweep, and periodic cleanup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: String,
    pub user_id: String,
    pub service_type: ServiceType,
    pub kind: RecommendationKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub predicted_date: DateTime<Utc>,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub estimated_cost: CostRange,
    pub is_active: bool,
    pub is_accepted: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub is_dismissed: bool,
    pub dismissed_at: Option<DateTime<Utc>>,
    pub dismiss_reason: Option<String>,
    pub actions: Vec<ActionEntry>,
    pub notifications: Vec<NotificationEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Recommendation {
    pub fn from_candidate(user_id: &str, candidate: Candidate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_owned(),
            service_type: candidate.service_type,
            kind: candidate.kind,
            priority: candidate.priority,
            title: candidate.title,
            description: candidate.description,
            predicted_date: candidate.predicted_date,
            confidence: candidate.confidence.clamp(0.0, 1.0),
            reasons: candidate.reasons,
            estimated_cost: candidate.estimated_cost,
            is_active: true,
            is_accepted: false,
            accepted_at: None,
            is_dismissed: false,
            dismissed_at: None,
            dismiss_reason: None,
            actions: Vec::new(),
            notifications: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconciler update: overwrite the fields a fresh generation may change,
    /// leaving identity, flags, and the action log untouched.
    pub fn apply_candidate(&mut self, candidate: Candidate, now: DateTime<Utc>) {
        self.priority = candidate.priority;
        self.title = candidate.title;
        self.description = candidate.description;
        self.predicted_date = candidate.predicted_date;
        self.confidence = candidate.confidence.clamp(0.0, 1.0);
        self.reasons = candidate.reasons;
        self.estimated_cost = candidate.estimated_cost;
        self.updated_at = now;
    }

    /// Whole days until the predicted date, rounded up; negative when past.
    pub fn days_until(&self, now: DateTime<Utc>) -> i64 {
        let seconds = (self.predicted_date - now).num_seconds();
        (seconds as f64 / 86_400.0).ceil() as i64
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.predicted_date < now && self.is_active && !self.is_accepted
    }

    fn state_name(&self) -> &'static str {
        if self.is_dismissed {
            "dismissed"
        } else if self.is_accepted {
            "accepted"
        } else {
            "active"
        }
    }

    /// Applies a user action, appending to the action log on success.
    ///
    /// `viewed`/`clicked` are always recordable. `snoozed` moves the
    /// predicted date and keeps the record active. `accepted` and
    /// `dismissed` are terminal and mutually exclusive; dismissing also
    /// deactivates the record permanently.
    pub fn apply_action(
        &mut self,
        action: ActionKind,
        metadata: Option<serde_json::Value>,
        now: DateTime<Utc>,
    ) -> Result<(), DomainError> {
        match action {
            ActionKind::Viewed | ActionKind::Clicked => {}
            ActionKind::Accepted => {
                if self.is_dismissed || self.is_accepted {
                    return Err(self.invalid_transition(action));
                }
                self.is_accepted = true;
                self.accepted_at = Some(now);
            }
            ActionKind::Dismissed => {
                if self.is_dismissed || self.is_accepted {
                    return Err(self.invalid_transition(action));
                }
                self.is_dismissed = true;
                self.dismissed_at = Some(now);
                self.is_active = false;
                self.dismiss_reason = metadata
                    .as_ref()
                    .and_then(|meta| meta.get("reason"))
                    .and_then(|reason| reason.as_str())
                    .map(str::to_owned);
            }
            ActionKind::Snoozed => {
                if self.is_dismissed {
                    return Err(self.invalid_transition(action));
                }
                self.predicted_date = metadata
                    .as_ref()
                    .and_then(|meta| meta.get("snooze_until"))
                    .and_then(|value| value.as_str())
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                    .map(|parsed| parsed.with_timezone(&Utc))
                    .unwrap_or_else(|| now + Duration::days(SNOOZE_DEFAULT_DAYS));
            }
        }

        self.actions.push(ActionEntry { action, timestamp: now, metadata });
        self.updated_at = now;
        Ok(())
    }

    fn invalid_transition(&self, action: ActionKind) -> DomainError {
        DomainError::InvalidActionTransition { action, state: self.state_name().to_owned() }
    }

    /// Records a notification delivery attempt.
    pub fn record_notification(&mut self, entry: NotificationEntry, now: DateTime<Utc>) {
        self.notifications.push(entry);
        self.updated_at = now;
    }

    /// True when the user has never opened or interacted with this record.
    pub fn is_unacted(&self) -> bool {
        !self.is_accepted
            && !self.is_dismissed
            && !self
                .actions
                .iter()
                .any(|entry| matches!(entry.action, ActionKind::Viewed | ActionKind::Clicked))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal::Decimal;
    use serde_json::json;

    use crate::domain::service_type::ServiceType;
    use crate::engine::Candidate;

    use super::*;

    fn candidate() -> Candidate {
        Candidate {
            service_type: ServiceType::Hvac,
            kind: RecommendationKind::PredictiveMaintenance,
            priority: Priority::Medium,
            title: "HVAC maintenance due".to_owned(),
            description: "Interval-based maintenance suggestion".to_owned(),
            predicted_date: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap(),
            confidence: 0.8,
            reasons: vec!["Last service was 200 days ago".to_owned()],
            estimated_cost: CostRange::new(Decimal::new(150, 0), Decimal::new(400, 0)),
        }
    }

    fn recommendation() -> Recommendation {
        let now = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
        Recommendation::from_candidate("user-1", candidate(), now)
    }

    #[test]
    fn dismiss_is_terminal() {
        let mut rec = recommendation();
        let now = Utc::now();

        rec.apply_action(ActionKind::Dismissed, Some(json!({"reason": "not needed"})), now)
            .expect("dismiss from active");

        assert!(rec.is_dismissed);
        assert!(!rec.is_active);
        assert_eq!(rec.dismiss_reason.as_deref(), Some("not needed"));

        for action in [ActionKind::Accepted, ActionKind::Dismissed, ActionKind::Snoozed] {
            let error = rec.apply_action(action, None, now).expect_err("terminal state");
            assert!(matches!(error, DomainError::InvalidActionTransition { .. }));
        }
        assert!(!rec.is_active, "nothing reactivates a dismissed record");
    }

    #[test]
    fn accept_keeps_record_active_and_blocks_dismiss() {
        let mut rec = recommendation();
        let now = Utc::now();

        rec.apply_action(ActionKind::Accepted, None, now).expect("accept from active");
        assert!(rec.is_accepted);
        assert!(rec.is_active);
        assert!(rec.accepted_at.is_some());

        let error =
            rec.apply_action(ActionKind::Dismissed, None, now).expect_err("accepted is terminal");
        assert!(matches!(error, DomainError::InvalidActionTransition { .. }));
        assert!(!rec.is_dismissed, "accepted and dismissed are mutually exclusive");
    }

    #[test]
    fn snooze_moves_predicted_date_and_stays_active() {
        let mut rec = recommendation();
        let now = Utc.with_ymd_and_hms(2026, 2, 10, 0, 0, 0).unwrap();

        rec.apply_action(
            ActionKind::Snoozed,
            Some(json!({"snooze_until": "2026-04-01T00:00:00Z"})),
            now,
        )
        .expect("snooze from active");

        assert!(rec.is_active);
        assert_eq!(rec.predicted_date, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());

        // Without a target date the snooze defaults to a week out.
        rec.apply_action(ActionKind::Snoozed, None, now).expect("snooze again");
        assert_eq!(rec.predicted_date, now + Duration::days(7));
    }

    #[test]
    fn viewed_and_clicked_only_append_to_the_log() {
        let mut rec = recommendation();
        let now = Utc::now();

        rec.apply_action(ActionKind::Viewed, None, now).expect("viewed");
        rec.apply_action(ActionKind::Clicked, None, now).expect("clicked");

        assert_eq!(rec.actions.len(), 2);
        assert!(rec.is_active);
        assert!(!rec.is_accepted);
        assert!(!rec.is_dismissed);
        assert!(!rec.is_unacted());
    }

    #[test]
    fn action_names_parse_in_both_tenses() {
        assert_eq!("accept".parse::<ActionKind>().unwrap(), ActionKind::Accepted);
        assert_eq!("dismissed".parse::<ActionKind>().unwrap(), ActionKind::Dismissed);
        assert_eq!("snooze".parse::<ActionKind>().unwrap(), ActionKind::Snoozed);
        assert!("archive".parse::<ActionKind>().is_err());
    }

    #[test]
    fn days_until_rounds_up_partial_days() {
        let mut rec = recommendation();
        let now = Utc.with_ymd_and_hms(2026, 2, 27, 12, 0, 0).unwrap();
        rec.predicted_date = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(rec.days_until(now), 2);
        assert!(!rec.is_overdue(now));

        rec.predicted_date = now - Duration::hours(1);
        assert!(rec.is_overdue(now));
    }

    #[test]
    fn reconciler_update_preserves_identity_and_log() {
        let mut rec = recommendation();
        let now = Utc::now();
        rec.apply_action(ActionKind::Viewed, None, now).expect("viewed");
        let id = rec.id.clone();
        let created = rec.created_at;

        let mut updated = candidate();
        updated.priority = Priority::High;
        updated.confidence = 0.9;
        rec.apply_candidate(updated, now);

        assert_eq!(rec.id, id);
        assert_eq!(rec.created_at, created);
        assert_eq!(rec.priority, Priority::High);
        assert_eq!(rec.actions.len(), 1);
    }

    #[test]
    fn cost_range_clamps_to_budget_overlap() {
        let base = CostRange::new(Decimal::new(150, 0), Decimal::new(400, 0));
        let budget = CostRange::new(Decimal::new(200, 0), Decimal::new(300, 0));
        let clamped = base.clamped_to(&budget);
        assert_eq!(clamped.min, Decimal::new(200, 0));
        assert_eq!(clamped.max, Decimal::new(300, 0));
    }
}
