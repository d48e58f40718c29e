use upkeep_engine::{CleanupReport, RecommendationService};

use crate::commands::{build_runtime, connect_migrated, load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("cleanup") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("cleanup") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_migrated(&config).await?;
        let service = RecommendationService::with_sql_store(pool.clone(), config.engine.clone());
        let report =
            service.cleanup().await.map_err(|error| ("engine", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<CleanupReport, crate::commands::CommandFailure>(report)
    });

    match result {
        Ok(report) => CommandResult::success(
            "cleanup",
            format!("deleted {}, deactivated {}", report.deleted, report.deactivated),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("cleanup", error_class, message, exit_code)
        }
    }
}
