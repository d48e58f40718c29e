use secrecy::ExposeSecret;

use upkeep_core::config::{AppConfig, LoadOptions};

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let mut lines =
        vec!["effective config (source precedence: overrides > env > file > default):".to_string()];

    lines.push(format!("  database.url = {}", config.database.url));
    lines.push(format!("  database.max_connections = {}", config.database.max_connections));
    lines.push(format!("  database.timeout_secs = {}", config.database.timeout_secs));

    lines.push(format!("  engine.due_trigger_ratio = {}", config.engine.due_trigger_ratio));
    lines.push(format!(
        "  engine.high_priority_ratio = {}",
        config.engine.high_priority_ratio
    ));
    lines.push(format!(
        "  engine.urgent_priority_ratio = {}",
        config.engine.urgent_priority_ratio
    ));
    lines.push(format!("  engine.usage_trigger_ratio = {}", config.engine.usage_trigger_ratio));
    lines.push(format!("  engine.min_confidence = {}", config.engine.min_confidence));
    lines.push(format!("  engine.max_recommendations = {}", config.engine.max_recommendations));
    lines.push(format!("  engine.recent_window_days = {}", config.engine.recent_window_days));
    lines.push(format!("  engine.dismissal_veto_rate = {}", config.engine.dismissal_veto_rate));
    lines.push(format!(
        "  engine.dismissed_retention_days = {}",
        config.engine.dismissed_retention_days
    ));
    lines.push(format!(
        "  engine.stale_deactivation_days = {}",
        config.engine.stale_deactivation_days
    ));
    lines.push(format!("  engine.reminder_after_days = {}", config.engine.reminder_after_days));

    lines.push(format!("  notifier.enabled = {}", config.notifier.enabled));
    lines.push(format!(
        "  notifier.webhook_url = {}",
        config.notifier.webhook_url.as_deref().unwrap_or("(unset)")
    ));
    lines.push(format!(
        "  notifier.auth_token = {}",
        config
            .notifier
            .auth_token
            .as_ref()
            .map(|token| redact_token(token.expose_secret()))
            .unwrap_or_else(|| "(unset)".to_string())
    ));

    lines.push(format!("  server.bind_address = {}", config.server.bind_address));
    lines.push(format!("  server.port = {}", config.server.port));

    lines.push(format!("  logging.level = {}", config.logging.level));
    lines.push(format!("  logging.format = {:?}", config.logging.format));

    lines.join("\n")
}

fn redact_token(token: &str) -> String {
    if token.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &token[..4])
    }
}
