use std::env;
use std::fs;
use std::path::Path;

use estimo_core::config::{resolve_config_path, AppConfig, LoadOptions};
use estimo_core::OptionKey;
use toml::Value;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = resolve_config_path(None);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let catalog_path = config
        .estimator
        .catalog_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<builtin>".to_string());

    let fields: Vec<(&str, String, &[&str])> = vec![
        ("database.url", config.database.url.clone(), &["ESTIMO_DATABASE_URL"][..]),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            &["ESTIMO_DATABASE_MAX_CONNECTIONS"][..],
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            &["ESTIMO_DATABASE_TIMEOUT_SECS"][..],
        ),
        ("server.bind_address", config.server.bind_address.clone(), &["ESTIMO_SERVER_BIND_ADDRESS"][..]),
        ("server.port", config.server.port.to_string(), &["ESTIMO_SERVER_PORT"][..]),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["ESTIMO_SERVER_GRACEFUL_SHUTDOWN_SECS"][..],
        ),
        ("estimator.catalog_path", catalog_path, &["ESTIMO_ESTIMATOR_CATALOG_PATH"][..]),
        (
            "estimator.default_region",
            config.estimator.default_region.key().to_string(),
            &["ESTIMO_ESTIMATOR_DEFAULT_REGION"][..],
        ),
        ("estimator.state_key", config.estimator.state_key.clone(), &["ESTIMO_ESTIMATOR_STATE_KEY"][..]),
        (
            "contact.whatsapp_phone",
            redact_phone(&config.contact.whatsapp_phone),
            &["ESTIMO_CONTACT_WHATSAPP_PHONE"][..],
        ),
        ("contact.contact_url", config.contact.contact_url.clone(), &["ESTIMO_CONTACT_URL"][..]),
        ("contact.greeting", config.contact.greeting.clone(), &["ESTIMO_CONTACT_GREETING"][..]),
        (
            "logging.level",
            config.logging.level.clone(),
            &["ESTIMO_LOGGING_LEVEL", "ESTIMO_LOG_LEVEL"][..],
        ),
        (
            "logging.format",
            format!("{:?}", config.logging.format).to_ascii_lowercase(),
            &["ESTIMO_LOGGING_FORMAT", "ESTIMO_LOG_FORMAT"][..],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    let set_env = env_keys
        .iter()
        .find(|env_key| env::var(env_key).map(|value| !value.trim().is_empty()).unwrap_or(false));
    if let Some(env_key) = set_env {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact_phone(phone: &str) -> String {
    let digits: Vec<char> = phone.chars().filter(char::is_ascii_digit).collect();
    if digits.len() <= 4 {
        return "<redacted>".to_string();
    }
    let visible: String = digits[digits.len() - 4..].iter().collect();
    format!("***{visible}")
}
