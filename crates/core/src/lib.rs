pub mod config;
pub mod domain;
pub mod engine;
pub mod errors;

pub use domain::analytics::{AnalyticsFilter, AnalyticsReport, KindBreakdown, ServiceTypeBreakdown};
pub use domain::history::{ActiveService, CompletedService, PendingRequest, ServiceHistory};
pub use domain::profile::{
    Appliance, BehaviorProfile, BudgetProfile, HomeProfile, LearningData, MaintenanceStyle,
    ProfilePatch, ServiceOutcome, UserProfile,
};
pub use domain::recommendation::{
    ActionEntry, ActionKind, CostRange, NotificationChannel, NotificationEntry,
    NotificationStatus, Priority, Recommendation, RecommendationKind,
};
pub use domain::service_type::{Season, ServiceType};
pub use engine::{generate_candidates, Candidate};
pub use errors::{ApplicationError, DomainError, InterfaceError};
