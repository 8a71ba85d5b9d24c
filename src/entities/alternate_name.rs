//! Alternate name entity - names of places in other languages and spellings.
//!
//! This is the largest table the pipeline maintains (millions of rows) and is only ever
//! replaced wholesale through a working table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Alternate name database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geo_alternate_names")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub alternate_name_id: i64,
    /// GeoNames id of the place this name belongs to
    pub geonameid: i64,
    /// ISO 639 language code, or a pseudo code such as "post" or "link"
    pub isolanguage: String,
    #[sea_orm(column_type = "Text")]
    pub alternate_name: String,
    pub is_preferred_name: bool,
    pub is_short_name: bool,
    pub is_colloquial: bool,
    pub is_historic: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
