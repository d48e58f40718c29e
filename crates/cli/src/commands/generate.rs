use upkeep_engine::RecommendationService;

use crate::commands::{build_runtime, connect_migrated, load_config, CommandResult};

pub fn run(user: &str, force: bool) -> CommandResult {
    let config = match load_config("generate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("generate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_migrated(&config).await?;
        let service = RecommendationService::with_sql_store(pool.clone(), config.engine.clone());
        let records = service
            .generate(user, force)
            .await
            .map_err(|error| ("engine", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<usize, crate::commands::CommandFailure>(records.len())
    });

    match result {
        Ok(count) => CommandResult::success(
            "generate",
            format!("generated {count} recommendations for {user}"),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("generate", error_class, message, exit_code)
        }
    }
}
