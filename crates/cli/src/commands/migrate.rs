use crate::commands::{build_runtime, connect_migrated, load_config, CommandResult};

pub fn run() -> CommandResult {
    let config = match load_config("migrate") {
        Ok(config) => config,
        Err(result) => return result,
    };
    let runtime = match build_runtime("migrate") {
        Ok(runtime) => runtime,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = connect_migrated(&config).await?;
        pool.close().await;
        Ok::<(), crate::commands::CommandFailure>(())
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}
