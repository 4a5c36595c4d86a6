use std::sync::Arc;

use estimo_core::config::{AppConfig, ConfigError, LoadOptions};
use estimo_core::{Catalog, CatalogError, StateStore};
use estimo_db::{connect_with_settings, migrations, DbPool, SqlStateStore};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub catalog: Arc<Catalog>,
    pub store: Arc<dyn StateStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let catalog = Arc::new(config.estimator.load_catalog()?);
    info!(
        event_name = "system.bootstrap.catalog_loaded",
        correlation_id = "bootstrap",
        source = config
            .estimator
            .catalog_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "builtin".to_string()),
        project_types = catalog.project_types.len(),
        "pricing catalog loaded"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let store: Arc<dyn StateStore> = Arc::new(SqlStateStore::new(db_pool.clone()));

    Ok(Application { config, db_pool, catalog, store })
}
