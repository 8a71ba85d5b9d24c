//! Settings entity - one row of pipeline configuration and status per connection.
//!
//! Holds the install status, the last successful install time, the country and language
//! filters and the storage sub-directory where downloads land.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Install status of the GeoNames data on a connection
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum InstallStatus {
    /// Nothing has been installed yet
    #[sea_orm(string_value = "uninstalled")]
    Uninstalled,
    /// A pipeline run is in progress
    #[sea_orm(string_value = "installing")]
    Installing,
    /// The last run completed successfully
    #[sea_orm(string_value = "live")]
    Live,
    /// The last run failed
    #[sea_orm(string_value = "error")]
    Error,
}

impl fmt::Display for InstallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninstalled => "UNINSTALLED",
            Self::Installing => "INSTALLING",
            Self::Live => "LIVE",
            Self::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geonames_settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Name of the database connection these settings belong to
    #[sea_orm(unique)]
    pub connection_name: String,
    /// Current install status
    pub status: InstallStatus,
    /// When the last successful install finished
    pub installed_at: Option<DateTimeUtc>,
    /// Comma separated ISO2 country codes, empty for all countries
    pub countries: String,
    /// Comma separated language codes, empty for all languages
    pub languages: String,
    /// Storage directory, relative paths are rooted in the configured storage root
    pub storage_path: String,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last written
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Configured country codes; empty means every country.
    #[must_use]
    pub fn country_codes(&self) -> Vec<String> {
        split_codes(&self.countries)
    }

    /// Configured language codes; empty means every language.
    #[must_use]
    pub fn language_codes(&self) -> Vec<String> {
        split_codes(&self.languages)
    }
}

fn split_codes(joined: &str) -> Vec<String> {
    joined
        .split(',')
        .filter(|code| !code.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Settings have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
