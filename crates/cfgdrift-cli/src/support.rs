use crate::config::Config;
use crate::logging::init_tracing;
use cfgdrift_kernel::{DriftReport, ValidationError};
use serde_json::{Value, json};
use std::path::Path;

pub const EXIT_DRIFT: i32 = 1;
pub const EXIT_FATAL: i32 = 2;

/// Load the config and install logging; exits with [`EXIT_FATAL`] on a bad
/// config file.
pub fn setup_or_exit(config_path: Option<&Path>) -> Config {
    let config = Config::load(config_path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(EXIT_FATAL);
    });
    init_tracing(&config.log);
    config
}

fn counts_payload(report: &DriftReport) -> Value {
    json!({
        "db_cfg": report.databases.len(),
        "dbm_cfg": report.dbm.len(),
        "registry_cfg": report.registry.len(),
    })
}

/// Print the outcome of one run and exit with its status code.
///
/// `0` no drift, `1` drift, `2` the run was aborted.
pub fn finish(title: &str, outcome: Result<DriftReport, ValidationError>, json_output: bool) -> ! {
    let report = match outcome {
        Ok(report) => report,
        Err(err) => {
            if json_output {
                print_json(&json!({
                    "result": "error",
                    "message": err.to_string(),
                    "counts": Value::Null,
                    "details": [],
                }));
            } else {
                eprintln!("error: {err}");
            }
            std::process::exit(EXIT_FATAL);
        }
    };

    report.log_summary();
    let clean = report.is_clean();
    let (message, details) = match report.clone().into_result() {
        Ok(()) => ("all checks passed".to_string(), Vec::new()),
        Err(failure) => (failure.message, failure.details),
    };

    if json_output {
        print_json(&json!({
            "result": if clean { "accepted" } else { "drift" },
            "message": message,
            "counts": counts_payload(&report),
            "details": details,
            "records": report.records().collect::<Vec<_>>(),
        }));
    } else {
        println!("{title}");
        println!("  db cfg: {} failed", report.databases.len());
        println!("  dbm cfg: {} failed", report.dbm.len());
        println!("  registry cfg: {} failed", report.registry.len());
        println!("  Result: {message}");
        for line in &details {
            println!("    - {line}");
        }
    }

    std::process::exit(if clean { 0 } else { EXIT_DRIFT });
}

fn print_json(payload: &Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(payload).expect("json serialization")
    );
}
