use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::recommendation::{ActionKind, CostRange};
use crate::domain::service_type::ServiceType;

/// Most recent recommendation actions retained per profile.
pub const FEEDBACK_LOG_CAP: usize = 100;
/// Most recent service outcomes retained per profile.
pub const OUTCOME_LOG_CAP: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HomeType {
    Apartment,
    House,
    Condo,
    Townhouse,
    Other,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Climate {
    Tropical,
    Dry,
    Temperate,
    Continental,
    Polar,
}

/// How the user approaches home maintenance; shifts generator confidence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaintenanceStyle {
    Reactive,
    Proactive,
    Preventive,
}

impl MaintenanceStyle {
    /// Seasonal confidence adjustment.
    pub fn seasonal_bonus(&self) -> f64 {
        match self {
            MaintenanceStyle::Preventive => 0.2,
            MaintenanceStyle::Proactive => 0.1,
            MaintenanceStyle::Reactive => -0.1,
        }
    }

    /// Usage-based confidence adjustment.
    pub fn usage_bonus(&self) -> f64 {
        match self {
            MaintenanceStyle::Preventive => 0.1,
            MaintenanceStyle::Proactive => 0.05,
            MaintenanceStyle::Reactive => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceFrequency {
    VeryLow,
    Low,
    Moderate,
    High,
    VeryHigh,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSensitivity {
    Low,
    Medium,
    High,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplianceKind {
    Hvac,
    WaterHeater,
    Washer,
    Dryer,
    Dishwasher,
    Refrigerator,
    Oven,
    Other,
}

impl ApplianceKind {
    pub fn label(&self) -> &'static str {
        match self {
            ApplianceKind::Hvac => "HVAC unit",
            ApplianceKind::WaterHeater => "water heater",
            ApplianceKind::Washer => "washer",
            ApplianceKind::Dryer => "dryer",
            ApplianceKind::Dishwasher => "dishwasher",
            ApplianceKind::Refrigerator => "refrigerator",
            ApplianceKind::Oven => "oven",
            ApplianceKind::Other => "appliance",
        }
    }
}

/// An inventoried appliance on the home profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appliance {
    pub kind: ApplianceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub install_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_maintenance: Option<DateTime<Utc>>,
}

impl Appliance {
    /// Whole years since installation, when an install date is known.
    pub fn age_years(&self, now: DateTime<Utc>) -> Option<i64> {
        self.install_date.map(|installed| (now - installed).num_days() / 365)
    }

    /// Whether maintenance is missing or older than `lapse_days`.
    pub fn maintenance_lapsed(&self, now: DateTime<Utc>, lapse_days: i64) -> bool {
        match self.last_maintenance {
            None => true,
            Some(last) => now - last > Duration::days(lapse_days),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeSize {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub square_feet: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bathrooms: Option<u8>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub climate: Option<Climate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HomeProfile {
    pub home_type: HomeType,
    pub age_years: u32,
    #[serde(default)]
    pub size: HomeSize,
    #[serde(default)]
    pub location: HomeLocation,
    #[serde(default)]
    pub appliances: Vec<Appliance>,
}

impl Default for HomeProfile {
    fn default() -> Self {
        Self {
            home_type: HomeType::House,
            age_years: 10,
            size: HomeSize::default(),
            location: HomeLocation::default(),
            appliances: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub service_frequency: ServiceFrequency,
    pub maintenance_style: MaintenanceStyle,
    pub risk_tolerance: RiskTolerance,
    pub price_sensitivity: PriceSensitivity,
}

impl Default for BehaviorProfile {
    fn default() -> Self {
        Self {
            service_frequency: ServiceFrequency::Moderate,
            maintenance_style: MaintenanceStyle::Reactive,
            risk_tolerance: RiskTolerance::Medium,
            price_sensitivity: PriceSensitivity::Medium,
        }
    }
}

/// Budget windows used to clamp estimated service costs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetProfile {
    pub routine: CostRange,
    pub emergency: CostRange,
    pub upgrade: CostRange,
}

impl Default for BudgetProfile {
    fn default() -> Self {
        Self {
            routine: CostRange::new(Decimal::ZERO, Decimal::new(500, 0)),
            emergency: CostRange::new(Decimal::ZERO, Decimal::new(1000, 0)),
            upgrade: CostRange::new(Decimal::ZERO, Decimal::new(2000, 0)),
        }
    }
}

/// A recommendation action folded back into the profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub recommendation_id: String,
    pub service_type: ServiceType,
    pub action: ActionKind,
    pub timestamp: DateTime<Utc>,
}

/// A completed-service outcome folded back into the profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceOutcome {
    pub service_type: ServiceType,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub was_emergency: bool,
    #[serde(default)]
    pub was_recommended: bool,
}

/// Bounded behavioral history; eviction is FIFO at the caps.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningData {
    #[serde(default)]
    pub feedback: Vec<FeedbackEntry>,
    #[serde(default)]
    pub outcomes: Vec<ServiceOutcome>,
}

impl LearningData {
    pub fn record_feedback(&mut self, entry: FeedbackEntry) {
        self.feedback.push(entry);
        if self.feedback.len() > FEEDBACK_LOG_CAP {
            let excess = self.feedback.len() - FEEDBACK_LOG_CAP;
            self.feedback.drain(..excess);
        }
    }

    pub fn record_outcome(&mut self, outcome: ServiceOutcome) {
        self.outcomes.push(outcome);
        if self.outcomes.len() > OUTCOME_LOG_CAP {
            let excess = self.outcomes.len() - OUTCOME_LOG_CAP;
            self.outcomes.drain(..excess);
        }
    }

    /// Share of this service type's logged actions in the trailing window
    /// that were dismissals. Zero when the window holds no entries.
    pub fn dismissal_rate(
        &self,
        service_type: ServiceType,
        now: DateTime<Utc>,
        window_days: i64,
    ) -> f64 {
        let cutoff = now - Duration::days(window_days);
        let mut total = 0u32;
        let mut dismissed = 0u32;
        for entry in &self.feedback {
            if entry.service_type == service_type && entry.timestamp >= cutoff {
                total += 1;
                if entry.action == ActionKind::Dismissed {
                    dismissed += 1;
                }
            }
        }
        if total == 0 {
            0.0
        } else {
            f64::from(dismissed) / f64::from(total)
        }
    }
}

/// One profile per user; synthesized with defaults on first engine touch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub home: HomeProfile,
    pub behavior: BehaviorProfile,
    pub budgets: BudgetProfile,
    pub learning: LearningData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn with_defaults(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_owned(),
            home: HomeProfile::default(),
            behavior: BehaviorProfile::default(),
            budgets: BudgetProfile::default(),
            learning: LearningData::default(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn record_feedback(
        &mut self,
        recommendation_id: &str,
        service_type: ServiceType,
        action: ActionKind,
        now: DateTime<Utc>,
    ) {
        self.learning.record_feedback(FeedbackEntry {
            recommendation_id: recommendation_id.to_owned(),
            service_type,
            action,
            timestamp: now,
        });
        self.updated_at = now;
    }

    pub fn record_outcome(&mut self, outcome: ServiceOutcome, now: DateTime<Utc>) {
        self.learning.record_outcome(outcome);
        self.updated_at = now;
    }

    pub fn apply_patch(&mut self, patch: ProfilePatch, now: DateTime<Utc>) {
        if let Some(home) = patch.home {
            self.home = home;
        }
        if let Some(behavior) = patch.behavior {
            self.behavior = behavior;
        }
        if let Some(budgets) = patch.budgets {
            self.budgets = budgets;
        }
        self.updated_at = now;
    }
}

/// Partial profile update; absent sections are left untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub home: Option<HomeProfile>,
    #[serde(default)]
    pub behavior: Option<BehaviorProfile>,
    #[serde(default)]
    pub budgets: Option<BudgetProfile>,
}
