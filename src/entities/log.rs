//! Log entity - durable record of pipeline events and failures.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "geonames_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Remote URL or local path the event relates to, if any
    pub url: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub message: String,
    /// Event category ("remote", "local", "database", "config", "install")
    pub category: String,
    pub connection_name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
