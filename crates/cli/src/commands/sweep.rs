use upkeep_engine::{RecommendationService, SweepReport};

use crate::commands::{build_runtime, connect_migrated, load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("sweep") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("sweep") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_migrated(&config).await?;
        let service = RecommendationService::with_sql_store(pool.clone(), config.engine.clone());
        let report = service
            .generate_for_all()
            .await
            .map_err(|error| ("engine", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<SweepReport, crate::commands::CommandFailure>(report)
    });

    match result {
        Ok(report) => CommandResult::success(
            "sweep",
            format!(
                "attempted {}, generated for {}, failed {}",
                report.attempted,
                report.generated.len(),
                report.failed
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("sweep", error_class, message, exit_code)
        }
    }
}
