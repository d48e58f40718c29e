use upkeep_db::fixtures;

use crate::commands::{build_runtime, connect_migrated, load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("seed") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("seed") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_migrated(&config).await?;
        let seeded = fixtures::seed(&pool)
            .await
            .map_err(|error| ("seed", error.to_string(), 6u8))?;
        pool.close().await;
        Ok::<fixtures::SeedResult, crate::commands::CommandFailure>(seeded)
    });

    match result {
        Ok(seeded) => CommandResult::success(
            "seed",
            format!(
                "loaded {} demo users with {} completed services",
                seeded.users, seeded.completed_services
            ),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
