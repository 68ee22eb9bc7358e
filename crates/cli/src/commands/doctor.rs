use serde::Serialize;
use smartcart_core::catalog::Catalog;
use smartcart_core::config::{AppConfig, LoadOptions};
use smartcart_core::ml::Artifacts;
use smartcart_core::storefront::Storefront;

use crate::commands::CommandResult;

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

pub fn run(options: &LoadOptions, json_output: bool) -> CommandResult {
    let report = build_report(options);
    let exit_code = if report.overall_status == CheckStatus::Pass { 0 } else { 1 };

    let output = if json_output {
        serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        })
    } else {
        render_human(&report)
    };

    CommandResult { exit_code, output }
}

fn build_report(options: &LoadOptions) -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(options.clone()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            check_runtime_inputs(&config, &mut checks);
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["catalog_load", "artifacts_load", "vocabulary_coverage"] {
                checks.push(skipped(name, "configuration did not load"));
            }
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

fn check_runtime_inputs(config: &AppConfig, checks: &mut Vec<DoctorCheck>) {
    let catalog = match Catalog::load(&config.catalog.path, config.catalog.options()) {
        Ok(catalog) => {
            checks.push(DoctorCheck {
                name: "catalog_load",
                status: CheckStatus::Pass,
                details: format!(
                    "{} products loaded from `{}`",
                    catalog.len(),
                    config.catalog.path.display()
                ),
            });
            Some(catalog)
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "catalog_load",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            None
        }
    };

    let artifacts = match Artifacts::load(&config.artifacts.paths()) {
        Ok(artifacts) => {
            checks.push(DoctorCheck {
                name: "artifacts_load",
                status: CheckStatus::Pass,
                details: format!(
                    "artifacts in `{}` trained at {} with {} known products",
                    config.artifacts.dir.display(),
                    artifacts.trained_at().to_rfc3339(),
                    artifacts.encoder().len()
                ),
            });
            Some(artifacts)
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "artifacts_load",
                status: CheckStatus::Fail,
                details: format!("{error}; run `smartcart train` to produce them"),
            });
            None
        }
    };

    match (catalog, artifacts) {
        (Some(catalog), Some(artifacts)) => {
            checks.push(check_coverage(&Storefront::new(catalog, artifacts)));
        }
        _ => checks.push(skipped("vocabulary_coverage", "catalog or artifacts did not load")),
    }
}

fn check_coverage(storefront: &Storefront) -> DoctorCheck {
    let uncovered = storefront.uncovered_products();
    if uncovered.is_empty() {
        return DoctorCheck {
            name: "vocabulary_coverage",
            status: CheckStatus::Pass,
            details: "every catalog product is known to the model".to_string(),
        };
    }

    DoctorCheck {
        name: "vocabulary_coverage",
        status: CheckStatus::Fail,
        details: format!(
            "{} catalog products are unknown to the model and will only echo: {}; retrain",
            uncovered.len(),
            uncovered.join(", ")
        ),
    }
}

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
