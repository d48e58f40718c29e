mod bootstrap;
mod health;
pub mod notify;
pub mod routes;

use anyhow::Result;

use upkeep_core::config::{AppConfig, LoadOptions};

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use upkeep_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations.
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;

    let router = routes::router(app.service.clone()).merge(health::router(app.db_pool.clone()));

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        bind_address = %address,
        "upkeep-server listening"
    );

    axum::serve(listener, router).with_graceful_shutdown(wait_for_shutdown()).await?;

    tracing::info!(event_name = "system.server.stopping", "upkeep-server stopping");
    app.db_pool.close().await;

    Ok(())
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %error, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(error = %error, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
