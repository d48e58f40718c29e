pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "upkeep",
    about = "Upkeep operator CLI",
    long_about = "Operate the recommendation engine: migrations, demo fixtures, readiness \
                  checks, per-user generation, and the scheduled sweeps.",
    after_help = "Examples:\n  upkeep doctor --json\n  upkeep generate --user demo-interval-hvac\n  upkeep sweep"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo dataset (profiles and service history)")]
    Seed,
    #[command(about = "Validate config, database connectivity, and schema readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Inspect effective configuration values with secret redaction")]
    Config,
    #[command(about = "Generate recommendations for one user")]
    Generate {
        #[arg(long, help = "User id to generate for")]
        user: String,
        #[arg(long, help = "Regenerate even when fresh recommendations exist")]
        force: bool,
    },
    #[command(about = "Generate recommendations for all users with recent activity")]
    Sweep,
    #[command(about = "Send reminders for stale unacted recommendations")]
    Remind,
    #[command(about = "Delete old dismissed records and deactivate stale ones")]
    Cleanup,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Generate { user, force } => commands::generate::run(&user, force),
        Command::Sweep => commands::sweep::run(),
        Command::Remind => commands::remind::run(),
        Command::Cleanup => commands::cleanup::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
