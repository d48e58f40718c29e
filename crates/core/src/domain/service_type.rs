use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Closed catalog of marketplace trades.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Plumbing,
    Electrical,
    Cleaning,
    Carpentry,
    Painting,
    Hvac,
    Landscaping,
    PestControl,
    ApplianceRepair,
    HomeSecurity,
    Roofing,
    Flooring,
}

impl ServiceType {
    pub const ALL: [ServiceType; 12] = [
        ServiceType::Plumbing,
        ServiceType::Electrical,
        ServiceType::Cleaning,
        ServiceType::Carpentry,
        ServiceType::Painting,
        ServiceType::Hvac,
        ServiceType::Landscaping,
        ServiceType::PestControl,
        ServiceType::ApplianceRepair,
        ServiceType::HomeSecurity,
        ServiceType::Roofing,
        ServiceType::Flooring,
    ];

    /// Stable wire/storage name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Plumbing => "plumbing",
            ServiceType::Electrical => "electrical",
            ServiceType::Cleaning => "cleaning",
            ServiceType::Carpentry => "carpentry",
            ServiceType::Painting => "painting",
            ServiceType::Hvac => "hvac",
            ServiceType::Landscaping => "landscaping",
            ServiceType::PestControl => "pest_control",
            ServiceType::ApplianceRepair => "appliance_repair",
            ServiceType::HomeSecurity => "home_security",
            ServiceType::Roofing => "roofing",
            ServiceType::Flooring => "flooring",
        }
    }

    /// Human-readable label for titles and reasons.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceType::Plumbing => "Plumbing",
            ServiceType::Electrical => "Electrical",
            ServiceType::Cleaning => "Cleaning",
            ServiceType::Carpentry => "Carpentry",
            ServiceType::Painting => "Painting",
            ServiceType::Hvac => "HVAC",
            ServiceType::Landscaping => "Landscaping",
            ServiceType::PestControl => "Pest control",
            ServiceType::ApplianceRepair => "Appliance repair",
            ServiceType::HomeSecurity => "Home security",
            ServiceType::Roofing => "Roofing",
            ServiceType::Flooring => "Flooring",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceType {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plumbing" => Ok(Self::Plumbing),
            "electrical" => Ok(Self::Electrical),
            "cleaning" => Ok(Self::Cleaning),
            "carpentry" => Ok(Self::Carpentry),
            "painting" => Ok(Self::Painting),
            "hvac" => Ok(Self::Hvac),
            "landscaping" => Ok(Self::Landscaping),
            "pest_control" => Ok(Self::PestControl),
            "appliance_repair" => Ok(Self::ApplianceRepair),
            "home_security" => Ok(Self::HomeSecurity),
            "roofing" => Ok(Self::Roofing),
            "flooring" => Ok(Self::Flooring),
            other => Err(DomainError::UnknownServiceType(other.to_owned())),
        }
    }
}

/// Calendar season, fixed three-month buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    Spring,
    Summer,
    Fall,
    Winter,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    pub fn for_date(date: DateTime<Utc>) -> Self {
        Self::from_month(date.month())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "spring",
            Season::Summer => "summer",
            Season::Fall => "fall",
            Season::Winter => "winter",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Fall => "Fall",
            Season::Winter => "Winter",
        }
    }

    /// Inclusive date window for this season anchored to `year`.
    ///
    /// Winter is anchored to December of `year` and wraps into January and
    /// February of the following year.
    pub fn window(&self, year: i32) -> (NaiveDate, NaiveDate) {
        let date = |y: i32, m: u32, d: u32| {
            NaiveDate::from_ymd_opt(y, m, d).expect("static season boundary")
        };
        match self {
            Season::Spring => (date(year, 3, 1), date(year, 5, 31)),
            Season::Summer => (date(year, 6, 1), date(year, 8, 31)),
            Season::Fall => (date(year, 9, 1), date(year, 11, 30)),
            Season::Winter => {
                let end = date(year + 1, 3, 1).pred_opt().expect("last day of february");
                (date(year, 12, 1), end)
            }
        }
    }

    /// Whether `moment` falls inside this season's window for `year`.
    pub fn contains(&self, moment: DateTime<Utc>, year: i32) -> bool {
        let (start, end) = self.window(year);
        let day = moment.date_naive();
        day >= start && day <= end
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
