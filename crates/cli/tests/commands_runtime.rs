use std::env;
use std::fs;
use std::sync::{Mutex, OnceLock};

use estimo_cli::commands::quote::{self, OutputFormat, QuoteArgs};
use estimo_cli::commands::{catalog, doctor, migrate};
use estimo_core::{ProjectType, Region};
use serde_json::Value;

const MEMORY_DB: (&str, &str) = ("ESTIMO_DATABASE_URL", "sqlite::memory:");

#[test]
fn quote_defaults_to_landing_page_pricing() {
    with_env(&[MEMORY_DB], || {
        let result = quote::run(json_args());
        assert_eq!(result.exit_code, 0, "expected quote success: {}", result.output);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["project_type"]["key"], "landing");
        assert_eq!(amount(&payload["breakdown"]["one_time_total"]), 150.0);
        assert_eq!(amount(&payload["breakdown"]["upfront_installment"]), 75.0);
        assert_eq!(amount(&payload["breakdown"]["delivery_installment"]), 75.0);
    });
}

#[test]
fn quote_applies_recognized_coupon() {
    with_env(&[MEMORY_DB], || {
        let result =
            quote::run(QuoteArgs { coupon: Some(" first20 ".to_string()), ..json_args() });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["discount"]["active"], true);
        assert_eq!(amount(&payload["breakdown"]["discount_amount"]), 30.0);
        assert_eq!(amount(&payload["breakdown"]["one_time_total"]), 120.0);
    });
}

#[test]
fn quote_clamps_out_of_range_pages() {
    with_env(&[MEMORY_DB], || {
        let result = quote::run(QuoteArgs { pages: Some(-4), ..json_args() });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["scope"]["pages"], 1);
        assert_eq!(payload["scope"]["extra_pages"], 0);
    });
}

#[test]
fn table_output_lists_totals() {
    with_env(&[MEMORY_DB], || {
        let result = quote::run(QuoteArgs { no_save: true, ..QuoteArgs::default() });
        assert_eq!(result.exit_code, 0);
        assert!(result.output.contains("Landing Page"));
        assert!(result.output.contains("$150"));
        assert!(result.output.contains("Upfront"));
    });
}

#[test]
fn whatsapp_format_renders_deep_link() {
    with_env(&[MEMORY_DB, ("ESTIMO_CONTACT_WHATSAPP_PHONE", "+573001234567")], || {
        let result = quote::run(QuoteArgs {
            format: OutputFormat::Whatsapp,
            no_save: true,
            ..QuoteArgs::default()
        });
        assert_eq!(result.exit_code, 0, "{}", result.output);
        assert!(result.output.starts_with("https://wa.me/573001234567?text="));
    });
}

#[test]
fn contact_format_carries_quote_document() {
    with_env(&[MEMORY_DB, ("ESTIMO_CONTACT_URL", "https://studio.example/contact")], || {
        let result = quote::run(QuoteArgs {
            format: OutputFormat::Contact,
            no_save: true,
            ..QuoteArgs::default()
        });
        assert_eq!(result.exit_code, 0);
        assert!(result.output.starts_with("https://studio.example/contact?quote="));
    });
}

#[test]
fn quote_output_is_written_to_file() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = temp_dir.path().join("quote.json");

    with_env(&[MEMORY_DB], || {
        let result = quote::run(QuoteArgs { output: Some(path.clone()), ..json_args() });
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "ok");

        let written = fs::read_to_string(&path).expect("quote file should exist");
        let document = parse_payload(&written);
        assert!(document["reference"].as_str().unwrap_or("").starts_with("Q-"));
    });
}

#[test]
fn quote_output_write_failure_returns_output_code() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let path = temp_dir.path().join("missing").join("quote.json");

    with_env(&[MEMORY_DB], || {
        let result = quote::run(QuoteArgs { output: Some(path.clone()), ..json_args() });
        assert_eq!(result.exit_code, 8);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["error_class"], "output");
    });
}

#[test]
fn saved_state_carries_over_between_runs() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("estimo.db").display());

    with_env(&[("ESTIMO_DATABASE_URL", url.as_str())], || {
        let first = quote::run(QuoteArgs {
            region: Some(Region::Co),
            project_type: Some(ProjectType::Corporate),
            pages: Some(7),
            ..json_args()
        });
        assert_eq!(first.exit_code, 0, "{}", first.output);

        let second = parse_payload(&quote::run(json_args()).output);
        assert_eq!(second["region"]["key"], "co");
        assert_eq!(second["project_type"]["key"], "corporate");
        assert_eq!(second["scope"]["pages"], 7);

        let reselected = parse_payload(
            &quote::run(QuoteArgs { project_type: Some(ProjectType::Corporate), ..json_args() })
                .output,
        );
        assert_eq!(reselected["scope"]["pages"], 7);

        let fresh = parse_payload(&quote::run(QuoteArgs { fresh: true, ..json_args() }).output);
        assert_eq!(fresh["project_type"]["key"], "landing");
    });
}

#[test]
fn no_save_leaves_saved_state_untouched() {
    let temp_dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}?mode=rwc", temp_dir.path().join("estimo.db").display());

    with_env(&[("ESTIMO_DATABASE_URL", url.as_str())], || {
        quote::run(QuoteArgs { project_type: Some(ProjectType::Ecommerce), ..json_args() });
        quote::run(QuoteArgs {
            project_type: Some(ProjectType::SaasMvp),
            no_save: true,
            ..json_args()
        });

        let restored = parse_payload(&quote::run(json_args()).output);
        assert_eq!(restored["project_type"]["key"], "ecommerce");
    });
}

#[test]
fn quote_returns_config_failure_for_invalid_phone() {
    with_env(&[MEMORY_DB, ("ESTIMO_CONTACT_WHATSAPP_PHONE", "12")], || {
        let result = quote::run(json_args());
        assert_eq!(result.exit_code, 2, "expected config validation failure code");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "quote");
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["error_class"], "config_validation");
    });
}

#[test]
fn quote_returns_catalog_failure_for_missing_file() {
    with_env(&[MEMORY_DB, ("ESTIMO_ESTIMATOR_CATALOG_PATH", "/nonexistent/catalog.toml")], || {
        let result = quote::run(json_args());
        assert_eq!(result.exit_code, 6);
        assert_eq!(parse_payload(&result.output)["error_class"], "catalog");
    });
}

#[test]
fn catalog_json_prices_for_requested_region() {
    with_env(&[MEMORY_DB], || {
        let result = catalog::run(Some(Region::Es), true);
        assert_eq!(result.exit_code, 0);

        let payload = parse_payload(&result.output);
        assert_eq!(payload["region"]["key"], "es");
        let landing = payload["project_types"]
            .as_array()
            .and_then(|types| types.iter().find(|entry| entry["key"] == "landing"))
            .expect("landing entry");
        assert_eq!(amount(&landing["base_price"]), 180.0);
    });
}

#[test]
fn catalog_table_uses_configured_default_region() {
    with_env(&[MEMORY_DB, ("ESTIMO_ESTIMATOR_DEFAULT_REGION", "ar")], || {
        let result = catalog::run(None, false);
        assert_eq!(result.exit_code, 0);
        assert!(result.output.starts_with("Prices for Argentina"));
    });
}

#[test]
fn migrate_returns_success_with_valid_env() {
    with_env(&[MEMORY_DB], || {
        let result = migrate::run();
        assert_eq!(result.exit_code, 0, "expected successful migrate run");

        let payload = parse_payload(&result.output);
        assert_eq!(payload["command"], "migrate");
        assert_eq!(payload["status"], "ok");
    });
}

#[test]
fn doctor_json_reports_every_check() {
    with_env(&[MEMORY_DB], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "pass");

        let names: Vec<&str> = payload["checks"]
            .as_array()
            .map(|checks| checks.iter().filter_map(|check| check["name"].as_str()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["config_validation", "catalog", "contact_links", "database"]);
    });
}

#[test]
fn doctor_skips_dependent_checks_when_config_fails() {
    with_env(&[("ESTIMO_ESTIMATOR_STATE_KEY", "bad key!")], || {
        let payload = parse_payload(&doctor::run(true));
        assert_eq!(payload["overall_status"], "fail");
        assert_eq!(payload["checks"][0]["status"], "fail");
        assert_eq!(payload["checks"][3]["status"], "skipped");
    });
}

fn json_args() -> QuoteArgs {
    QuoteArgs { format: OutputFormat::Json, ..QuoteArgs::default() }
}

fn amount(value: &Value) -> f64 {
    value.as_str().and_then(|raw| raw.parse::<f64>().ok()).unwrap_or(f64::NAN)
}

fn parse_payload(output: &str) -> Value {
    serde_json::from_str(output).expect("command output should be valid json")
}

fn with_env(vars: &[(&str, &str)], test_fn: impl FnOnce()) {
    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard =
        ENV_LOCK.get_or_init(|| Mutex::new(())).lock().expect("env mutex should not be poisoned");

    let keys = [
        "ESTIMO_DATABASE_URL",
        "ESTIMO_DATABASE_MAX_CONNECTIONS",
        "ESTIMO_DATABASE_TIMEOUT_SECS",
        "ESTIMO_SERVER_BIND_ADDRESS",
        "ESTIMO_SERVER_PORT",
        "ESTIMO_SERVER_GRACEFUL_SHUTDOWN_SECS",
        "ESTIMO_ESTIMATOR_CATALOG_PATH",
        "ESTIMO_ESTIMATOR_DEFAULT_REGION",
        "ESTIMO_ESTIMATOR_STATE_KEY",
        "ESTIMO_CONTACT_WHATSAPP_PHONE",
        "ESTIMO_CONTACT_URL",
        "ESTIMO_CONTACT_GREETING",
        "ESTIMO_LOGGING_LEVEL",
        "ESTIMO_LOGGING_FORMAT",
        "ESTIMO_LOG_LEVEL",
        "ESTIMO_LOG_FORMAT",
    ];

    let previous_values: Vec<(&str, Option<String>)> =
        keys.iter().map(|key| (*key, env::var(key).ok())).collect();

    for key in &keys {
        env::remove_var(key);
    }
    for (key, value) in vars {
        env::set_var(key, value);
    }

    test_fn();

    for (key, value) in previous_values {
        if let Some(value) = value {
            env::set_var(key, value);
        } else {
            env::remove_var(key);
        }
    }
}
