pub mod notify;
pub mod service;

pub use notify::{Notifier, NotifyError, TracingNotifier};
pub use service::{
    CleanupReport, RecommendationService, ReminderReport, SweepReport, UserGeneration,
};
