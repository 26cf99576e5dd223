use campus_listings::config::{AppConfig, DatabaseConfig};
use campus_listings::error::AppError;
use campus_listings::listings::SqliteListingStore;
use chrono::{DateTime, Utc};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) started_at: DateTime<Utc>,
}

/// Load configuration, letting a CLI `--database` flag win over the environment.
pub(crate) fn load_config(database: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = database {
        config.database = DatabaseConfig::new(&path.to_string_lossy());
    }
    Ok(config)
}

pub(crate) fn open_store(config: &AppConfig) -> Result<SqliteListingStore, AppError> {
    let store = SqliteListingStore::open(&config.database)?;
    info!(database = ?config.database, "listing store opened");
    Ok(store)
}
