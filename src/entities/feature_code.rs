//! Feature code entity - rows from `featureCodes_en.txt`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geonames_feature_codes")]
pub struct Model {
    /// Full code as published (e.g. "A.ADM1")
    #[sea_orm(primary_key, auto_increment = false)]
    pub code: String,
    /// Class part of the code (e.g. "A")
    pub feature_class: String,
    /// Code part of the code (e.g. "ADM1")
    pub feature_code: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub created_at: DateTimeUtc,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
