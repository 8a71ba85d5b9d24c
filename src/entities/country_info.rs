//! Country info entity - one row per country from `countryInfo.txt`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Country metadata database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geonames_country_info")]
pub struct Model {
    /// GeoNames id of the country
    #[sea_orm(primary_key, auto_increment = false)]
    pub geonameid: i64,
    /// ISO 3166 alpha-2 code (e.g. "AD")
    pub iso2_code: String,
    /// ISO 3166 alpha-3 code (e.g. "AND")
    pub iso3_code: String,
    /// ISO 3166 numeric code, kept as text to preserve leading zeros
    pub iso_numeric: String,
    /// FIPS code
    pub fips_code: String,
    pub country_name: String,
    pub capital_city: String,
    /// Area in square kilometres
    pub area_sq_km: i64,
    pub population: i64,
    /// Continent code (e.g. "EU")
    pub continent: String,
    /// Top level domain (e.g. ".ad")
    pub tld: String,
    pub currency_code: String,
    pub currency_name: String,
    pub phone_format: String,
    pub postal_code_format: String,
    pub postal_code_regex: String,
    /// Comma separated language tags
    pub languages: String,
    /// Comma separated ISO2 codes of neighbouring countries
    pub neighbours: String,
    pub equivalent_fips_code: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
