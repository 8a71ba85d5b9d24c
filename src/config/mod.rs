/// Application configuration from `geonames.toml` and environment variables
pub mod app;

/// Database connection and table creation
pub mod database;

pub use app::{AppConfig, ConnectionConfig, DownloadConfig, Driver, load_app_config};
