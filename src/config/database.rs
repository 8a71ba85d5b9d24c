//! Database configuration module.
//!
//! Opens the `SeaORM` connection for a named connection and creates every table from the
//! entity definitions with `Schema::create_table_from_entity`, so the schema always matches
//! the Rust structs without hand-written SQL.

use crate::config::app::{AppConfig, Driver};
use crate::entities::{
    AlternateName, Continent, CountryInfo, FeatureClass, FeatureCode, Geoname, IsoLanguageCode,
    Log, Settings,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Establishes a connection for the named connection in `config`.
///
/// # Errors
/// Returns `Error::Config` for an unknown connection name and `Error::Database` when the
/// database cannot be reached.
#[instrument(skip(config))]
pub async fn connect(config: &AppConfig, connection_name: &str) -> Result<DatabaseConnection> {
    let connection = config.connection(connection_name)?;
    if connection.url.is_none() && connection.driver == Driver::Sqlite {
        // sqlx creates the file with mode=rwc, but not its directory
        if let Some(parent) = Path::new(&connection.database)
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent)?;
        }
    }
    let url = connection.to_url()?;
    debug!("Opening database connection '{}'", connection_name);
    let db = Database::connect(&url).await?;
    db.ping().await?;
    info!("Connected to database connection '{}'", connection_name);
    Ok(db)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Safe to run repeatedly; existing tables and their rows are left alone.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Settings).await?;
    create_table(db, &schema, Log).await?;
    create_table(db, &schema, Continent).await?;
    create_table(db, &schema, FeatureClass).await?;
    create_table(db, &schema, FeatureCode).await?;
    create_table(db, &schema, IsoLanguageCode).await?;
    create_table(db, &schema, CountryInfo).await?;
    create_table(db, &schema, Geoname).await?;
    create_table(db, &schema, AlternateName).await?;

    debug!("GeoNames tables ensured");
    Ok(())
}
