use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use upkeep_core::config::NotifierConfig;
use upkeep_core::domain::recommendation::{NotificationChannel, Recommendation};
use upkeep_engine::{Notifier, NotifyError, TracingNotifier};

/// Reminder payload posted to the configured webhook.
#[derive(Debug, Serialize)]
struct ReminderPayload<'a> {
    user_id: &'a str,
    recommendation_id: &'a str,
    service_type: &'a str,
    title: &'a str,
    priority: &'a str,
    predicted_date: String,
}

/// Delivers reminders to an external webhook endpoint. The receiving side
/// owns the actual email/SMS/push fan-out.
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    auth_token: Option<SecretString>,
}

impl WebhookNotifier {
    pub fn new(url: String, auth_token: Option<SecretString>) -> Self {
        Self { client: reqwest::Client::new(), url, auth_token }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Webhook
    }

    async fn send(
        &self,
        user_id: &str,
        recommendation: &Recommendation,
    ) -> Result<(), NotifyError> {
        let payload = ReminderPayload {
            user_id,
            recommendation_id: &recommendation.id,
            service_type: recommendation.service_type.as_str(),
            title: &recommendation.title,
            priority: recommendation.priority.as_str(),
            predicted_date: recommendation.predicted_date.to_rfc3339(),
        };

        let mut request = self.client.post(&self.url).json(&payload);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response =
            request.send().await.map_err(|e| NotifyError::Dispatch(e.to_string()))?;
        if !response.status().is_success() {
            return Err(NotifyError::Dispatch(format!(
                "webhook returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Webhook transport when configured and enabled, log transport otherwise.
pub fn build_notifier(config: &NotifierConfig) -> Arc<dyn Notifier> {
    match (config.enabled, &config.webhook_url) {
        (true, Some(url)) => {
            Arc::new(WebhookNotifier::new(url.clone(), config.auth_token.clone()))
        }
        _ => Arc::new(TracingNotifier),
    }
}
