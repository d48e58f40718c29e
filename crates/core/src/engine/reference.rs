//! Immutable reference tables keyed by the closed service-type catalog.
//!
//! Every lookup has a defined fallback so an unlisted trade degrades to a
//! neutral default instead of failing.

use rust_decimal::Decimal;

use crate::domain::profile::BudgetProfile;
use crate::domain::recommendation::CostRange;
use crate::domain::service_type::{Season, ServiceType};

/// Recommended maintenance cadence for a trade, in days.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lifespan {
    /// Minimum recommended interval between services.
    pub min_days: f64,
    /// Typical upper bound of the service interval.
    pub max_days: f64,
    /// Interval past which deferral is considered urgent.
    pub urgent_days: f64,
}

/// Reference cadence per trade. `None` for trades without an established
/// maintenance rhythm; callers fall back to the user's measured average.
pub fn lifespan(service_type: ServiceType) -> Option<Lifespan> {
    let entry = |min_days: f64, max_days: f64, urgent_days: f64| {
        Some(Lifespan { min_days, max_days, urgent_days })
    };
    match service_type {
        ServiceType::Hvac => entry(180.0, 365.0, 400.0),
        ServiceType::Plumbing => entry(365.0, 730.0, 1095.0),
        ServiceType::Electrical => entry(1095.0, 1825.0, 2555.0),
        ServiceType::ApplianceRepair => entry(90.0, 365.0, 450.0),
        ServiceType::PestControl => entry(90.0, 180.0, 270.0),
        ServiceType::Cleaning => entry(30.0, 90.0, 180.0),
        ServiceType::Landscaping => entry(30.0, 90.0, 180.0),
        ServiceType::Roofing => entry(1825.0, 3650.0, 5475.0),
        ServiceType::Flooring => entry(1825.0, 5475.0, 7300.0),
        ServiceType::Painting => entry(1095.0, 1825.0, 2555.0),
        ServiceType::Carpentry => entry(1825.0, 3650.0, 5475.0),
        ServiceType::HomeSecurity => entry(365.0, 730.0, 1095.0),
    }
}

pub const DEFAULT_RELIABILITY: f64 = 0.6;

/// How reliably interval history predicts the next need for a trade.
pub fn reliability_factor(service_type: ServiceType) -> f64 {
    match service_type {
        ServiceType::Hvac | ServiceType::Cleaning => 0.9,
        ServiceType::Plumbing | ServiceType::PestControl => 0.8,
        ServiceType::ApplianceRepair => 0.7,
        _ => DEFAULT_RELIABILITY,
    }
}

/// Trades relevant to each season.
pub fn seasonal_services(season: Season) -> &'static [ServiceType] {
    match season {
        Season::Spring => &[
            ServiceType::Plumbing,
            ServiceType::Hvac,
            ServiceType::Landscaping,
            ServiceType::PestControl,
            ServiceType::Roofing,
        ],
        Season::Summer => &[
            ServiceType::Hvac,
            ServiceType::Landscaping,
            ServiceType::PestControl,
            ServiceType::Electrical,
            ServiceType::ApplianceRepair,
        ],
        Season::Fall => &[
            ServiceType::Hvac,
            ServiceType::Roofing,
            ServiceType::Landscaping,
            ServiceType::Cleaning,
            ServiceType::PestControl,
        ],
        Season::Winter => &[
            ServiceType::Hvac,
            ServiceType::Plumbing,
            ServiceType::Electrical,
            ServiceType::HomeSecurity,
            ServiceType::ApplianceRepair,
        ],
    }
}

pub const DEFAULT_SEASONAL_WEIGHT: f64 = 0.5;

/// Base confidence that a trade is worth suggesting in a given season.
pub fn seasonal_weight(service_type: ServiceType, season: Season) -> f64 {
    match (service_type, season) {
        (ServiceType::Hvac, Season::Spring) => 0.8,
        (ServiceType::Hvac, Season::Summer) => 0.9,
        (ServiceType::Hvac, Season::Fall) => 0.8,
        (ServiceType::Hvac, Season::Winter) => 0.7,
        (ServiceType::Landscaping, Season::Spring) => 0.9,
        (ServiceType::Landscaping, Season::Summer) => 0.8,
        (ServiceType::Landscaping, Season::Fall) => 0.7,
        (ServiceType::Landscaping, Season::Winter) => 0.2,
        (ServiceType::PestControl, Season::Spring) => 0.8,
        (ServiceType::PestControl, Season::Summer) => 0.9,
        (ServiceType::PestControl, Season::Fall) => 0.6,
        (ServiceType::PestControl, Season::Winter) => 0.3,
        (ServiceType::Roofing, Season::Spring) => 0.7,
        (ServiceType::Roofing, Season::Summer) => 0.5,
        (ServiceType::Roofing, Season::Fall) => 0.8,
        (ServiceType::Roofing, Season::Winter) => 0.4,
        _ => DEFAULT_SEASONAL_WEIGHT,
    }
}

/// Typical cost window for one service visit.
pub fn base_cost(service_type: ServiceType) -> CostRange {
    let range = |min: i64, max: i64| {
        CostRange::new(Decimal::new(min, 0), Decimal::new(max, 0))
    };
    match service_type {
        ServiceType::Hvac => range(150, 400),
        ServiceType::Plumbing => range(100, 350),
        ServiceType::Electrical => range(120, 300),
        ServiceType::Cleaning => range(80, 200),
        ServiceType::Landscaping => range(100, 250),
        ServiceType::PestControl => range(80, 180),
        ServiceType::ApplianceRepair => range(90, 250),
        ServiceType::Carpentry => range(150, 400),
        ServiceType::Painting => range(200, 500),
        ServiceType::Roofing => range(300, 800),
        ServiceType::Flooring => range(250, 600),
        ServiceType::HomeSecurity => range(100, 300),
    }
}

/// Base cost narrowed to the user's routine budget window.
pub fn estimated_cost(service_type: ServiceType, budgets: &BudgetProfile) -> CostRange {
    base_cost(service_type).clamped_to(&budgets.routine)
}

/// Copy for predictive-maintenance descriptions.
pub fn predictive_description(
    service_type: ServiceType,
    days_since_last: i64,
    average_interval: f64,
) -> String {
    let average = average_interval.round() as i64;
    match service_type {
        ServiceType::Hvac => format!(
            "Based on your service history, your HVAC system typically needs attention \
             every {average} days. It has been {days_since_last} days since your last service."
        ),
        ServiceType::Plumbing => format!(
            "Regular plumbing maintenance helps prevent costly emergency repairs. \
             Your average service interval is {average} days."
        ),
        ServiceType::Cleaning => format!(
            "Maintain a healthy home environment with regular cleaning. \
             You typically schedule cleaning every {average} days."
        ),
        ServiceType::PestControl => format!(
            "Preventive pest control is most effective when done regularly. \
             Your typical service interval is {average} days."
        ),
        other => format!(
            "Based on your service patterns, you may need {} maintenance soon.",
            other.label().to_lowercase()
        ),
    }
}

/// Copy for seasonal descriptions.
pub fn seasonal_description(service_type: ServiceType, season: Season) -> String {
    match (service_type, season) {
        (ServiceType::Hvac, Season::Spring) => {
            "Spring is the right time for HVAC maintenance before the busy summer season."
                .to_owned()
        }
        (ServiceType::Hvac, Season::Summer) => {
            "Keep your cooling system running efficiently during peak summer months.".to_owned()
        }
        (ServiceType::Hvac, Season::Fall) => {
            "Prepare your heating system for the upcoming winter season.".to_owned()
        }
        (ServiceType::Hvac, Season::Winter) => {
            "Ensure your heating system is working optimally during cold weather.".to_owned()
        }
        (ServiceType::Landscaping, Season::Spring) => {
            "Spring landscaping prepares your outdoor spaces for the growing season.".to_owned()
        }
        (ServiceType::Landscaping, Season::Fall) => {
            "Fall cleanup protects your landscape through winter.".to_owned()
        }
        (other, season) => format!(
            "{} is a good time for {} services.",
            season.label(),
            other.label().to_lowercase()
        ),
    }
}
