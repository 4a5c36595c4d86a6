use estimo_core::config::{AppConfig, LoadOptions};
use estimo_core::estimator::export::{contact_link, whatsapp_link, QuoteDocument};
use estimo_core::estimator::pricing::compute_quote;
use estimo_core::Catalog;
use estimo_db::{connect_with_settings, migrations};
use serde::Serialize;

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
                escape_json(&error.to_string())
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
            match config.estimator.load_catalog() {
                Ok(catalog) => {
                    checks.push(DoctorCheck {
                        name: "catalog",
                        status: CheckStatus::Pass,
                        details: catalog_details(&config, &catalog),
                    });
                    checks.push(check_contact_links(&config, &catalog));
                }
                Err(error) => {
                    checks.push(DoctorCheck {
                        name: "catalog",
                        status: CheckStatus::Fail,
                        details: error.to_string(),
                    });
                    checks.push(skipped("contact_links", "catalog did not load"));
                }
            }
            checks.push(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(skipped("catalog", "configuration did not load"));
            checks.push(skipped("contact_links", "configuration did not load"));
            checks.push(skipped("database", "configuration did not load"));
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

fn skipped(name: &'static str, reason: &str) -> DoctorCheck {
    DoctorCheck { name, status: CheckStatus::Skipped, details: format!("skipped because {reason}") }
}

fn catalog_details(config: &AppConfig, catalog: &Catalog) -> String {
    let source = config
        .estimator
        .catalog_path
        .as_ref()
        .map(|path| format!("`{}`", path.display()))
        .unwrap_or_else(|| "builtin".to_string());
    format!(
        "{source} catalog with {} project types and {} regions ({})",
        catalog.project_types.len(),
        catalog.regions.len(),
        catalog.currency
    )
}

fn check_contact_links(config: &AppConfig, catalog: &Catalog) -> DoctorCheck {
    let state = catalog.initial_state(config.estimator.default_region);
    let breakdown = compute_quote(catalog, &state);
    let document = QuoteDocument::build(catalog, &state, &breakdown, chrono::Utc::now());

    let result = whatsapp_link(&config.contact.whatsapp_phone, "doctor")
        .and_then(|_| contact_link(&config.contact.contact_url, &document));

    match result {
        Ok(_) => DoctorCheck {
            name: "contact_links",
            status: CheckStatus::Pass,
            details: "whatsapp and contact links build from configured values".to_string(),
        },
        Err(error) => {
            DoctorCheck { name: "contact_links", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn check_database(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "database",
                status: CheckStatus::Fail,
                details: format!("failed to initialize async runtime: {error}"),
            };
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

        let applied = migrations::MIGRATOR.iter().count();
        migrations::run_pending(&pool)
            .await
            .map_err(|error| format!("failed to apply migrations: {error}"))?;

        pool.close().await;
        Ok::<usize, String>(applied)
    });

    match result {
        Ok(migration_count) => DoctorCheck {
            name: "database",
            status: CheckStatus::Pass,
            details: format!(
                "connected using `{}`; {migration_count} migration(s) up to date",
                config.database.url
            ),
        },
        Err(error) => DoctorCheck { name: "database", status: CheckStatus::Fail, details: error },
    }
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
