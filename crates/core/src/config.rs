use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::domain::options::{parse_option_key, Region};
use crate::estimator::catalog::{Catalog, CatalogError};

pub const DEFAULT_CONFIG_FILE: &str = "estimo.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub estimator: EstimatorConfig,
    pub contact: ContactConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct EstimatorConfig {
    /// Operator-authored catalog replacing the builtin price list.
    pub catalog_path: Option<PathBuf>,
    pub default_region: Region,
    pub state_key: String,
}

#[derive(Clone, Debug)]
pub struct ContactConfig {
    pub whatsapp_phone: String,
    pub contact_url: String,
    pub greeting: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub catalog_path: Option<PathBuf>,
    pub default_region: Option<Region>,
    pub state_key: Option<String>,
    pub whatsapp_phone: Option<String>,
    pub contact_url: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://estimo.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            estimator: EstimatorConfig {
                catalog_path: None,
                default_region: Region::Global,
                state_key: "default".to_string(),
            },
            contact: ContactConfig {
                whatsapp_phone: "15555550100".to_string(),
                contact_url: "https://example.com/contact".to_string(),
                greeting: "Hi! I'd like a quote for this project:".to_string(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl EstimatorConfig {
    pub fn load_catalog(&self) -> Result<Catalog, CatalogError> {
        match &self.catalog_path {
            Some(path) => Catalog::from_toml_path(path),
            None => Ok(Catalog::builtin()),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(estimator) = patch.estimator {
            if let Some(catalog_path) = estimator.catalog_path {
                self.estimator.catalog_path = Some(catalog_path);
            }
            if let Some(default_region) = estimator.default_region {
                self.estimator.default_region =
                    parse_region("estimator.default_region", &default_region)?;
            }
            if let Some(state_key) = estimator.state_key {
                self.estimator.state_key = state_key;
            }
        }

        if let Some(contact) = patch.contact {
            if let Some(whatsapp_phone) = contact.whatsapp_phone {
                self.contact.whatsapp_phone = whatsapp_phone;
            }
            if let Some(contact_url) = contact.contact_url {
                self.contact.contact_url = contact_url;
            }
            if let Some(greeting) = contact.greeting {
                self.contact.greeting = greeting;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("ESTIMO_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("ESTIMO_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("ESTIMO_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("ESTIMO_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("ESTIMO_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("ESTIMO_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("ESTIMO_SERVER_PORT") {
            self.server.port = parse_u16("ESTIMO_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("ESTIMO_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("ESTIMO_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("ESTIMO_ESTIMATOR_CATALOG_PATH") {
            self.estimator.catalog_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read_env("ESTIMO_ESTIMATOR_DEFAULT_REGION") {
            self.estimator.default_region = parse_option_key(&value).map_err(|_| {
                ConfigError::InvalidEnvOverride {
                    key: "ESTIMO_ESTIMATOR_DEFAULT_REGION".to_string(),
                    value: value.clone(),
                }
            })?;
        }
        if let Some(value) = read_env("ESTIMO_ESTIMATOR_STATE_KEY") {
            self.estimator.state_key = value;
        }

        if let Some(value) = read_env("ESTIMO_CONTACT_WHATSAPP_PHONE") {
            self.contact.whatsapp_phone = value;
        }
        if let Some(value) = read_env("ESTIMO_CONTACT_URL") {
            self.contact.contact_url = value;
        }
        if let Some(value) = read_env("ESTIMO_CONTACT_GREETING") {
            self.contact.greeting = value;
        }

        let log_level = read_env("ESTIMO_LOGGING_LEVEL").or_else(|| read_env("ESTIMO_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("ESTIMO_LOGGING_FORMAT").or_else(|| read_env("ESTIMO_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(catalog_path) = overrides.catalog_path {
            self.estimator.catalog_path = Some(catalog_path);
        }
        if let Some(default_region) = overrides.default_region {
            self.estimator.default_region = default_region;
        }
        if let Some(state_key) = overrides.state_key {
            self.estimator.state_key = state_key;
        }
        if let Some(whatsapp_phone) = overrides.whatsapp_phone {
            self.contact.whatsapp_phone = whatsapp_phone;
        }
        if let Some(contact_url) = overrides.contact_url {
            self.contact.contact_url = contact_url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_estimator(&self.estimator)?;
        validate_contact(&self.contact)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from(DEFAULT_CONFIG_FILE), PathBuf::from("config").join(DEFAULT_CONFIG_FILE)]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_estimator(estimator: &EstimatorConfig) -> Result<(), ConfigError> {
    let key = estimator.state_key.trim();
    if key.is_empty() || key.len() > 128 {
        return Err(ConfigError::Validation(
            "estimator.state_key must be 1..=128 characters".to_string(),
        ));
    }
    if !key.chars().all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.')) {
        return Err(ConfigError::Validation(
            "estimator.state_key may only contain letters, digits, `-`, `_` and `.`".to_string(),
        ));
    }

    if let Some(path) = &estimator.catalog_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "estimator.catalog_path must not be empty when set".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_contact(contact: &ContactConfig) -> Result<(), ConfigError> {
    let phone = contact.whatsapp_phone.trim();
    let digits = phone.strip_prefix('+').unwrap_or(phone);
    if !digits.chars().all(|ch| ch.is_ascii_digit()) || !(8..=15).contains(&digits.len()) {
        return Err(ConfigError::Validation(
            "contact.whatsapp_phone must be 8 to 15 digits with an optional leading `+`"
                .to_string(),
        ));
    }

    let scheme_ok = Url::parse(contact.contact_url.trim())
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false);
    if !scheme_ok {
        return Err(ConfigError::Validation(
            "contact.contact_url must be an absolute http:// or https:// URL".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn parse_region(key: &str, value: &str) -> Result<Region, ConfigError> {
    parse_option_key(value).map_err(|error| ConfigError::Validation(format!("{key}: {error}")))
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    estimator: Option<EstimatorPatch>,
    contact: Option<ContactPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct EstimatorPatch {
    catalog_path: Option<PathBuf>,
    default_region: Option<String>,
    state_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContactPatch {
    whatsapp_phone: Option<String>,
    contact_url: Option<String>,
    greeting: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
