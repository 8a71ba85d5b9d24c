//! Unified error type for the loader.
//!
//! Every job-level failure maps onto one variant so the orchestrator can log it with a
//! category and the CLI can pick an exit code. Row-level exclusions are not errors; see
//! [`crate::core::normalize::SkipReason`].

use crate::entities::settings::InstallStatus;
use thiserror::Error;

/// All failures the pipeline can report.
#[derive(Debug, Error)]
pub enum Error {
    /// Bad settings, bad storage path or unusable configuration file
    #[error("Configuration error: {message}")]
    Config {
        /// What was wrong
        message: String,
    },

    /// Download failed: unreachable host, non-2xx status or write failure
    #[error("Network error fetching {url}: {message}")]
    Network {
        /// Remote URL that was requested
        url: String,
        /// Failure description
        message: String,
    },

    /// Archive could not be opened or is missing an expected entry
    #[error("Corrupt archive {path}: {message}")]
    CorruptArchive {
        /// Local archive path
        path: String,
        /// Failure description
        message: String,
    },

    /// Loading rows into a table was rejected
    #[error("Bulk load into {table} failed: {message}")]
    BulkLoad {
        /// Table being loaded
        table: String,
        /// Failure description
        message: String,
    },

    /// Working and production tables do not have the same shape
    #[error("Schema mismatch between {working} and {production}: {message}")]
    SchemaMismatch {
        /// Working table name
        working: String,
        /// Production table name
        production: String,
        /// Column differences
        message: String,
    },

    /// Status change not permitted by the install state machine
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status
        from: InstallStatus,
        /// Requested status
        to: InstallStatus,
    },

    /// No settings row for the connection
    #[error("No geonames settings found for connection '{connection}'")]
    SettingsNotFound {
        /// Connection name
        connection: String,
    },

    /// Database error from `SeaORM`
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Local file system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Category written to the durable log sink.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network { .. } => "remote",
            Self::CorruptArchive { .. } | Self::Io(_) => "local",
            Self::BulkLoad { .. } | Self::SchemaMismatch { .. } | Self::Database(_) => "database",
            Self::Config { .. } | Self::InvalidTransition { .. } | Self::SettingsNotFound { .. } => {
                "config"
            }
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub(crate) fn bulk_load(table: &str, message: impl std::fmt::Display) -> Self {
        Self::BulkLoad {
            table: table.to_owned(),
            message: message.to_string(),
        }
    }
}

// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
