use upkeep_engine::{RecommendationService, ReminderReport};

use crate::commands::{build_runtime, connect_migrated, load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("remind") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("remind") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_migrated(&config).await?;
        let service = RecommendationService::with_sql_store(pool.clone(), config.engine.clone());
        let report = service
            .send_reminders()
            .await
            .map_err(|error| ("engine", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<ReminderReport, crate::commands::CommandFailure>(report)
    });

    match result {
        Ok(report) => CommandResult::success(
            "remind",
            format!(
                "{} candidates, {} sent, {} failed",
                report.candidates, report.sent, report.failed
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("remind", error_class, message, exit_code)
        }
    }
}
