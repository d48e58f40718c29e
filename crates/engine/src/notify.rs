use async_trait::async_trait;
use thiserror::Error;

use upkeep_core::domain::recommendation::{NotificationChannel, Recommendation};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

/// Outbound reminder transport. Implementations deliver a recommendation
/// summary to the user; the engine records the attempt either way and never
/// retries synchronously.
#[async_trait]
pub trait Notifier: Send + Sync {
    fn channel(&self) -> NotificationChannel;

    async fn send(
        &self,
        user_id: &str,
        recommendation: &Recommendation,
    ) -> Result<(), NotifyError>;
}

/// Default transport: logs the reminder instead of delivering it.
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Push
    }

    async fn send(
        &self,
        user_id: &str,
        recommendation: &Recommendation,
    ) -> Result<(), NotifyError> {
        tracing::info!(
            event_name = "notify.reminder",
            user_id,
            recommendation_id = %recommendation.id,
            service_type = %recommendation.service_type,
            priority = %recommendation.priority,
            "reminder dispatched to log transport"
        );
        Ok(())
    }
}
