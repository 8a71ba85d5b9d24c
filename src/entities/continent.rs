//! Continent entity - static seed data, not produced by the pipeline.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geonames_continents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub geonameid: i64,
    /// Two letter continent code (e.g. "EU")
    pub code: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
