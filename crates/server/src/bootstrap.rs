use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use upkeep_core::config::{AppConfig, ConfigError, LoadOptions};
use upkeep_db::{connect_with_settings, migrations, DbPool};
use upkeep_engine::RecommendationService;

use crate::notify::build_notifier;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub service: Arc<RecommendationService>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let notifier = build_notifier(&config.notifier);
    let service = Arc::new(
        RecommendationService::with_sql_store(db_pool.clone(), config.engine.clone())
            .with_notifier(notifier),
    );

    Ok(Application { config, db_pool, service })
}
