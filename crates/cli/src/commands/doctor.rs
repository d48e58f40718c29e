use serde::Serialize;
use sqlx::Row;

use upkeep_core::config::{AppConfig, LoadOptions};
use upkeep_db::connect_with_settings;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                error.to_string().replace('"', "\\\"")
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            let (connectivity, schema) = check_database(&config);
            checks.push(connectivity);
            checks.push(schema);
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "schema_readiness",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_database(config: &AppConfig) -> (DoctorCheck, DoctorCheck) {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            let details = format!("failed to initialize async runtime: {error}");
            return (
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: details.clone(),
                },
                DoctorCheck { name: "schema_readiness", status: CheckStatus::Skipped, details },
            );
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        {
            Ok(pool) => pool,
            Err(error) => {
                return (
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    DoctorCheck {
                        name: "schema_readiness",
                        status: CheckStatus::Skipped,
                        details: "skipped because the database is unreachable".to_string(),
                    },
                );
            }
        };

        let connectivity = DoctorCheck {
            name: "database_connectivity",
            status: CheckStatus::Pass,
            details: "database connection established".to_string(),
        };

        let schema = match sqlx::query(
            "SELECT COUNT(*) AS count FROM sqlite_master \
             WHERE type = 'table' AND name = 'recommendations'",
        )
        .fetch_one(&pool)
        .await
        {
            Ok(row) if row.get::<i64, _>("count") == 1 => DoctorCheck {
                name: "schema_readiness",
                status: CheckStatus::Pass,
                details: "recommendation tables present".to_string(),
            },
            Ok(_) => DoctorCheck {
                name: "schema_readiness",
                status: CheckStatus::Fail,
                details: "recommendation tables missing; run `upkeep migrate`".to_string(),
            },
            Err(error) => DoctorCheck {
                name: "schema_readiness",
                status: CheckStatus::Fail,
                details: format!("schema probe failed: {error}"),
            },
        };

        pool.close().await;
        (connectivity, schema)
    })
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("  [{marker}] {} - {}", check.name, check.details));
    }
    lines.join("\n")
}
