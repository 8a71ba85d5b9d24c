//! Geoname entity - the main gazetteer (`allCountries.txt` or per-country dumps).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Geoname database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geonames_geonames")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub geonameid: i64,
    pub name: String,
    pub asciiname: String,
    /// Comma separated alternate names, can be very long
    #[sea_orm(column_type = "Text")]
    pub alternatenames: String,
    pub latitude: f64,
    pub longitude: f64,
    pub feature_class: String,
    pub feature_code: String,
    pub country_code: String,
    /// Alternate country codes, comma separated
    pub cc2: String,
    pub admin1_code: String,
    pub admin2_code: String,
    pub admin3_code: String,
    pub admin4_code: String,
    pub population: i64,
    /// Elevation in metres, absent for most rows
    pub elevation: Option<i32>,
    /// Digital elevation model value
    pub dem: i32,
    pub timezone: String,
    /// Last modification date as published (yyyy-MM-dd)
    pub modification_date: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
