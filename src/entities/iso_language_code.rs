//! ISO language code entity - rows from `iso-languagecodes.txt`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geonames_iso_language_codes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub iso_639_3: String,
    pub iso_639_2: String,
    pub iso_639_1: String,
    pub language_name: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
