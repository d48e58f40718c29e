use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub engine: EngineTuning,
    pub notifier: NotifierConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

/// Hand-tuned thresholds of the recommendation engine.
///
/// Defaults are the production constants; every value is deliberately
/// configurable rather than baked into the generators.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineTuning {
    /// Share of the expected interval after which a predictive candidate
    /// triggers.
    pub due_trigger_ratio: f64,
    /// Share of the expected interval that escalates priority to high.
    pub high_priority_ratio: f64,
    /// Share of the expected interval that escalates priority to urgent.
    pub urgent_priority_ratio: f64,
    /// Share of the measured average interval that triggers a usage-based
    /// candidate.
    pub usage_trigger_ratio: f64,
    /// Ranker-wide confidence floor.
    pub min_confidence: f64,
    /// Emission floor for seasonal candidates.
    pub seasonal_min_confidence: f64,
    /// Emission floor for usage-based candidates.
    pub usage_min_confidence: f64,
    /// Ranked set size after truncation.
    pub max_recommendations: usize,
    /// Fresh active records younger than this suppress regeneration.
    pub recent_window_days: i64,
    /// Dismissal rate above which the preference gate vetoes a candidate.
    pub dismissal_veto_rate: f64,
    /// Trailing window for the dismissal rate.
    pub dismissal_window_days: i64,
    /// Home age past which a never-serviced HVAC system is a risk.
    pub hvac_risk_age_years: u32,
    /// Home age past which never-serviced plumbing is a risk.
    pub plumbing_risk_age_years: u32,
    /// Appliance age past which lapsed maintenance is a risk.
    pub appliance_risk_age_years: i64,
    /// Maintenance gap that counts as lapsed for an appliance.
    pub appliance_maintenance_lapse_days: i64,
    /// Dismissed records older than this are hard-deleted.
    pub dismissed_retention_days: i64,
    /// Active, never-accepted records this far past due are deactivated.
    pub stale_deactivation_days: i64,
    /// Unacted records older than this receive a reminder.
    pub reminder_after_days: i64,
    /// Activity window defining "active users" for the bulk sweep.
    pub sweep_activity_window_days: i64,
}

impl Default for EngineTuning {
    fn default() -> Self {
        Self {
            due_trigger_ratio: 0.8,
            high_priority_ratio: 1.2,
            urgent_priority_ratio: 1.5,
            usage_trigger_ratio: 0.9,
            min_confidence: 0.3,
            seasonal_min_confidence: 0.3,
            usage_min_confidence: 0.4,
            max_recommendations: 10,
            recent_window_days: 7,
            dismissal_veto_rate: 0.7,
            dismissal_window_days: 30,
            hvac_risk_age_years: 5,
            plumbing_risk_age_years: 15,
            appliance_risk_age_years: 8,
            appliance_maintenance_lapse_days: 730,
            dismissed_retention_days: 90,
            stale_deactivation_days: 60,
            reminder_after_days: 3,
            sweep_activity_window_days: 180,
        }
    }
}

#[derive(Clone, Debug)]
pub struct NotifierConfig {
    pub enabled: bool,
    pub webhook_url: Option<String>,
    pub auth_token: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub notifier_enabled: Option<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://upkeep.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            engine: EngineTuning::default(),
            notifier: NotifierConfig { enabled: false, webhook_url: None, auth_token: None },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("upkeep.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(engine) = patch.engine {
            let tuning = &mut self.engine;
            macro_rules! patch_field {
                ($field:ident) => {
                    if let Some(value) = engine.$field {
                        tuning.$field = value;
                    }
                };
            }
            patch_field!(due_trigger_ratio);
            patch_field!(high_priority_ratio);
            patch_field!(urgent_priority_ratio);
            patch_field!(usage_trigger_ratio);
            patch_field!(min_confidence);
            patch_field!(seasonal_min_confidence);
            patch_field!(usage_min_confidence);
            patch_field!(max_recommendations);
            patch_field!(recent_window_days);
            patch_field!(dismissal_veto_rate);
            patch_field!(dismissal_window_days);
            patch_field!(hvac_risk_age_years);
            patch_field!(plumbing_risk_age_years);
            patch_field!(appliance_risk_age_years);
            patch_field!(appliance_maintenance_lapse_days);
            patch_field!(dismissed_retention_days);
            patch_field!(stale_deactivation_days);
            patch_field!(reminder_after_days);
            patch_field!(sweep_activity_window_days);
        }

        if let Some(notifier) = patch.notifier {
            if let Some(enabled) = notifier.enabled {
                self.notifier.enabled = enabled;
            }
            if let Some(webhook_url) = notifier.webhook_url {
                self.notifier.webhook_url = Some(webhook_url);
            }
            if let Some(token) = notifier.auth_token {
                self.notifier.auth_token = Some(token.into());
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("UPKEEP_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("UPKEEP_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("UPKEEP_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("UPKEEP_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("UPKEEP_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("UPKEEP_ENGINE_MAX_RECOMMENDATIONS") {
            self.engine.max_recommendations =
                parse_u32("UPKEEP_ENGINE_MAX_RECOMMENDATIONS", &value)? as usize;
        }
        if let Some(value) = read_env("UPKEEP_ENGINE_RECENT_WINDOW_DAYS") {
            self.engine.recent_window_days =
                parse_i64("UPKEEP_ENGINE_RECENT_WINDOW_DAYS", &value)?;
        }

        if let Some(value) = read_env("UPKEEP_NOTIFIER_ENABLED") {
            self.notifier.enabled = parse_bool("UPKEEP_NOTIFIER_ENABLED", &value)?;
        }
        if let Some(value) = read_env("UPKEEP_NOTIFIER_WEBHOOK_URL") {
            self.notifier.webhook_url = Some(value);
        }
        if let Some(value) = read_env("UPKEEP_NOTIFIER_AUTH_TOKEN") {
            self.notifier.auth_token = Some(value.into());
        }

        if let Some(value) = read_env("UPKEEP_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("UPKEEP_SERVER_PORT") {
            self.server.port = parse_u16("UPKEEP_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("UPKEEP_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("UPKEEP_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("UPKEEP_LOGGING_LEVEL").or_else(|| read_env("UPKEEP_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("UPKEEP_LOGGING_FORMAT").or_else(|| read_env("UPKEEP_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.notifier_enabled {
            self.notifier.enabled = enabled;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_engine(&self.engine)?;
        validate_notifier(&self.notifier)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("upkeep.toml"), PathBuf::from("config/upkeep.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_engine(engine: &EngineTuning) -> Result<(), ConfigError> {
    let positive_ratios = [
        ("engine.due_trigger_ratio", engine.due_trigger_ratio),
        ("engine.high_priority_ratio", engine.high_priority_ratio),
        ("engine.urgent_priority_ratio", engine.urgent_priority_ratio),
        ("engine.usage_trigger_ratio", engine.usage_trigger_ratio),
    ];
    for (name, value) in positive_ratios {
        if value <= 0.0 {
            return Err(ConfigError::Validation(format!("{name} must be positive")));
        }
    }
    if engine.high_priority_ratio > engine.urgent_priority_ratio {
        return Err(ConfigError::Validation(
            "engine.high_priority_ratio must not exceed engine.urgent_priority_ratio"
                .to_string(),
        ));
    }

    let unit_range = [
        ("engine.min_confidence", engine.min_confidence),
        ("engine.seasonal_min_confidence", engine.seasonal_min_confidence),
        ("engine.usage_min_confidence", engine.usage_min_confidence),
        ("engine.dismissal_veto_rate", engine.dismissal_veto_rate),
    ];
    for (name, value) in unit_range {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!("{name} must be in range 0..=1")));
        }
    }

    if engine.max_recommendations == 0 || engine.max_recommendations > 100 {
        return Err(ConfigError::Validation(
            "engine.max_recommendations must be in range 1..=100".to_string(),
        ));
    }

    let positive_days = [
        ("engine.recent_window_days", engine.recent_window_days),
        ("engine.dismissal_window_days", engine.dismissal_window_days),
        ("engine.appliance_maintenance_lapse_days", engine.appliance_maintenance_lapse_days),
        ("engine.dismissed_retention_days", engine.dismissed_retention_days),
        ("engine.stale_deactivation_days", engine.stale_deactivation_days),
        ("engine.reminder_after_days", engine.reminder_after_days),
        ("engine.sweep_activity_window_days", engine.sweep_activity_window_days),
    ];
    for (name, value) in positive_days {
        if value <= 0 {
            return Err(ConfigError::Validation(format!("{name} must be positive")));
        }
    }

    Ok(())
}

fn validate_notifier(notifier: &NotifierConfig) -> Result<(), ConfigError> {
    if notifier.enabled {
        match &notifier.webhook_url {
            None => {
                return Err(ConfigError::Validation(
                    "notifier.enabled is true but notifier.webhook_url is not set".to_string(),
                ));
            }
            Some(url) if !url.starts_with("http://") && !url.starts_with("https://") => {
                return Err(ConfigError::Validation(
                    "notifier.webhook_url must start with http:// or https://".to_string(),
                ));
            }
            Some(_) => {}
        }
    }
    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i64(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.parse::<i64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    engine: Option<EnginePatch>,
    notifier: Option<NotifierPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    due_trigger_ratio: Option<f64>,
    high_priority_ratio: Option<f64>,
    urgent_priority_ratio: Option<f64>,
    usage_trigger_ratio: Option<f64>,
    min_confidence: Option<f64>,
    seasonal_min_confidence: Option<f64>,
    usage_min_confidence: Option<f64>,
    max_recommendations: Option<usize>,
    recent_window_days: Option<i64>,
    dismissal_veto_rate: Option<f64>,
    dismissal_window_days: Option<i64>,
    hvac_risk_age_years: Option<u32>,
    plumbing_risk_age_years: Option<u32>,
    appliance_risk_age_years: Option<i64>,
    appliance_maintenance_lapse_days: Option<i64>,
    dismissed_retention_days: Option<i64>,
    stale_deactivation_days: Option<i64>,
    reminder_after_days: Option<i64>,
    sweep_activity_window_days: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct NotifierPatch {
    enabled: Option<bool>,
    webhook_url: Option<String>,
    auth_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_carry_the_engine_constants() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let config = AppConfig::load(LoadOptions::default())
            .map_err(|err| format!("config load failed: {err}"))?;

        ensure(config.engine.due_trigger_ratio == 0.8, "due trigger defaults to 0.8")?;
        ensure(config.engine.urgent_priority_ratio == 1.5, "urgent ratio defaults to 1.5")?;
        ensure(config.engine.max_recommendations == 10, "top-N defaults to 10")?;
        ensure(config.engine.dismissal_veto_rate == 0.7, "veto rate defaults to 0.7")?;
        ensure(config.engine.dismissed_retention_days == 90, "retention defaults to 90")?;
        Ok(())
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("TEST_UPKEEP_WEBHOOK", "https://hooks.example.com/upkeep");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("upkeep.toml");
            fs::write(
                &path,
                r#"
[notifier]
enabled = true
webhook_url = "${TEST_UPKEEP_WEBHOOK}"
auth_token = "token-from-file"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.notifier.webhook_url.as_deref()
                    == Some("https://hooks.example.com/upkeep"),
                "webhook url should be interpolated from the environment",
            )?;
            ensure(
                config
                    .notifier
                    .auth_token
                    .as_ref()
                    .map(|token| token.expose_secret() == "token-from-file")
                    .unwrap_or(false),
                "auth token should be loaded from the file",
            )?;
            Ok(())
        })();

        clear_vars(&["TEST_UPKEEP_WEBHOOK"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("UPKEEP_DATABASE_URL", "sqlite://from-env.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("upkeep.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[engine]
max_recommendations = 5

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "override database url should win over env and file",
            )?;
            ensure(config.logging.level == "debug", "overridden log level should be debug")?;
            ensure(
                config.engine.max_recommendations == 5,
                "engine tuning should be patched from the file",
            )?;
            Ok(())
        })();

        clear_vars(&["UPKEEP_DATABASE_URL"]);
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("UPKEEP_LOG_LEVEL", "warn");
        env::set_var("UPKEEP_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should come from env alias")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "log format should come from env alias",
            )?;
            Ok(())
        })();

        clear_vars(&["UPKEEP_LOG_LEVEL", "UPKEEP_LOG_FORMAT"]);
        result
    }

    #[test]
    fn enabled_notifier_without_webhook_fails_validation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("UPKEEP_NOTIFIER_ENABLED", "true");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let has_message = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("notifier.webhook_url")
            );
            ensure(has_message, "validation failure should mention notifier.webhook_url")
        })();

        clear_vars(&["UPKEEP_NOTIFIER_ENABLED"]);
        result
    }

    #[test]
    fn tuning_bounds_are_enforced() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        let mut config = AppConfig::default();
        config.engine.dismissal_veto_rate = 1.3;
        let error = match config.validate() {
            Ok(()) => return Err("expected veto rate validation failure".to_string()),
            Err(error) => error,
        };
        ensure(
            matches!(error, ConfigError::Validation(ref message) if message.contains("dismissal_veto_rate")),
            "validation failure should mention the offending field",
        )
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;

        env::set_var("UPKEEP_NOTIFIER_AUTH_TOKEN", "super-secret-token");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("super-secret-token"),
                "debug output should not contain the notifier token",
            )?;
            Ok(())
        })();

        clear_vars(&["UPKEEP_NOTIFIER_AUTH_TOKEN"]);
        result
    }
}
