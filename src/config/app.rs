//! Application configuration loading from `geonames.toml` and the environment.
//!
//! The file is optional; every value has a default. Environment variables (usually
//! supplied through `.env`) override the file, which lets the connection used in
//! production be configured without a config file at all.

use crate::errors::{Error, Result};
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the connection used when none is given on the command line.
pub const DEFAULT_CONNECTION: &str = "geonames";

/// Public GeoNames export directory.
pub const DEFAULT_DOWNLOAD_BASE_URL: &str = "https://download.geonames.org/export/dump/";

const DEFAULT_CONFIG_FILE: &str = "geonames.toml";

/// Configuration structure representing the entire `geonames.toml` file
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Connection used when `--connection` is not given
    pub default_connection: String,
    /// Directory downloads are stored under
    pub storage_root: PathBuf,
    /// Base URL every GeoNames file name is appended to
    pub download_base_url: String,
    /// Rows per multi-row INSERT during bulk loads, capped per table by the bind parameter limit
    pub batch_size: usize,
    /// HTTP download behaviour
    pub download: DownloadConfig,
    /// Named database connections
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let mut connections = BTreeMap::new();
        connections.insert(DEFAULT_CONNECTION.to_string(), ConnectionConfig::default());
        Self {
            default_connection: DEFAULT_CONNECTION.to_string(),
            storage_root: PathBuf::from("storage"),
            download_base_url: DEFAULT_DOWNLOAD_BASE_URL.to_string(),
            batch_size: 500,
            download: DownloadConfig::default(),
            connections,
        }
    }
}

/// HTTP download settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Total attempts per file for transient failures
    pub attempts: u32,
    /// Pause between attempts
    pub retry_delay_secs: u64,
    /// Whole-request timeout; GeoNames dumps are large so this is generous
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            retry_delay_secs: 5,
            timeout_secs: 3600,
            user_agent: concat!("geonames-loader/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Supported database drivers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Driver {
    Sqlite,
    #[serde(alias = "pgsql", alias = "postgresql")]
    Postgres,
    Mysql,
}

impl FromStr for Driver {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "pgsql" | "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            other => Err(Error::config(format!("Unsupported database driver '{other}'"))),
        }
    }
}

/// One named database connection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Full connection URL; takes precedence over the individual fields
    pub url: Option<String>,
    pub driver: Driver,
    pub host: String,
    pub port: Option<u16>,
    /// Database name, or the file path for `SQLite`
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            driver: Driver::Sqlite,
            host: "localhost".to_string(),
            port: None,
            database: "data/geonames.sqlite".to_string(),
            username: None,
            password: None,
        }
    }
}

impl ConnectionConfig {
    /// Builds the `SeaORM` connection URL.
    ///
    /// # Errors
    /// Returns `Error::Config` if the host or credentials cannot form a valid URL.
    pub fn to_url(&self) -> Result<String> {
        if let Some(url) = &self.url {
            return Ok(url.clone());
        }

        let (scheme, default_port) = match self.driver {
            Driver::Sqlite => {
                return Ok(if self.database == ":memory:" {
                    "sqlite::memory:".to_string()
                } else {
                    format!("sqlite://{}?mode=rwc", self.database)
                });
            }
            Driver::Postgres => ("postgres", 5432),
            Driver::Mysql => ("mysql", 3306),
        };

        let base = format!(
            "{scheme}://{}:{}/{}",
            self.host,
            self.port.unwrap_or(default_port),
            self.database
        );
        let mut url = Url::parse(&base)
            .map_err(|e| Error::config(format!("Invalid connection URL {base}: {e}")))?;
        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|()| Error::config("Invalid database username"))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|()| Error::config("Invalid database password"))?;
        }
        Ok(url.to_string())
    }
}

impl AppConfig {
    /// Looks up a named connection.
    ///
    /// # Errors
    /// Returns `Error::Config` when the connection is not configured.
    pub fn connection(&self, name: &str) -> Result<&ConnectionConfig> {
        self.connections
            .get(name)
            .ok_or_else(|| Error::config(format!("Unknown database connection '{name}'")))
    }

    /// Applies environment overrides using `lookup` to read variables.
    ///
    /// Connection variables (`DB_GEONAMES_*`) apply to the default connection,
    /// which is created if the file did not declare it.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("DB_GEONAMES_CONNECTION") {
            self.default_connection = name;
        }
        if let Some(root) = lookup("GEONAMES_STORAGE_ROOT") {
            self.storage_root = PathBuf::from(root);
        }
        if let Some(base) = lookup("GEONAMES_BASE_URL") {
            self.download_base_url = base;
        }

        let connection = self
            .connections
            .entry(self.default_connection.clone())
            .or_default();
        if let Some(url) = lookup("DB_GEONAMES_URL").or_else(|| lookup("DATABASE_URL")) {
            connection.url = Some(url);
        }
        if let Some(driver) = lookup("DB_GEONAMES_DRIVER") {
            connection.driver = driver.parse()?;
        }
        if let Some(host) = lookup("DB_GEONAMES_HOST") {
            connection.host = host;
        }
        if let Some(port) = lookup("DB_GEONAMES_PORT") {
            let port = port
                .parse()
                .map_err(|e| Error::config(format!("Invalid DB_GEONAMES_PORT '{port}': {e}")))?;
            connection.port = Some(port);
        }
        if let Some(database) = lookup("DB_GEONAMES_DATABASE") {
            connection.database = database;
        }
        if let Some(username) = lookup("DB_GEONAMES_USERNAME") {
            connection.username = Some(username);
        }
        if let Some(password) = lookup("DB_GEONAMES_PASSWORD") {
            connection.password = Some(password);
        }
        Ok(())
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns `Error::Config` when the TOML is invalid.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::config(format!("Failed to parse config: {e}")))
}

/// Loads configuration from `path`, or from `./geonames.toml` when it exists, then applies
/// environment overrides.
///
/// # Errors
/// Returns `Error::Config` if an explicitly given file cannot be read, or any file fails
/// to parse.
pub fn load_app_config(path: Option<&Path>) -> Result<AppConfig> {
    let file = match path {
        Some(path) => Some(path.to_path_buf()),
        None => Some(PathBuf::from(DEFAULT_CONFIG_FILE)).filter(|p| p.exists()),
    };

    let mut config = match file {
        Some(file) => {
            tracing::debug!("Loading configuration from {:?}", file);
            let contents = std::fs::read_to_string(&file).map_err(|e| {
                Error::config(format!("Failed to read config file {}: {e}", file.display()))
            })?;
            parse_config(&contents)?
        }
        None => AppConfig::default(),
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;
    Ok(config)
}
