//! Explicit per-connection context handed to every settings and pipeline call.

use crate::config::AppConfig;
use sea_orm::DatabaseConnection;
use std::path::PathBuf;

/// Everything a pipeline run needs to know about its target connection.
#[derive(Debug, Clone)]
pub struct GeonamesContext {
    /// Open connection to the target database
    pub db: DatabaseConnection,
    /// Name the settings row is keyed by
    pub connection_name: String,
    /// Directory relative storage paths are rooted in
    pub storage_root: PathBuf,
    /// Base URL GeoNames file names are appended to
    pub download_base_url: String,
    /// Rows per multi-row INSERT during bulk loads
    pub batch_size: usize,
}

impl GeonamesContext {
    /// Builds a context from the application configuration and an open connection.
    #[must_use]
    pub fn new(db: DatabaseConnection, connection_name: &str, config: &AppConfig) -> Self {
        Self {
            db,
            connection_name: connection_name.to_owned(),
            storage_root: config.storage_root.clone(),
            download_base_url: config.download_base_url.clone(),
            batch_size: config.batch_size.max(1),
        }
    }
}
