//! Backend-aware queries against the database catalog.
//!
//! Working tables are created under names no entity maps to, so their existence, columns
//! and row counts are read by name rather than through an entity.

use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, DbBackend, Statement,
    sea_query::{Alias, Expr, Query},
};

/// Whether a table named `table` exists in the current schema.
pub async fn table_exists<C: ConnectionTrait>(db: &C, table: &str) -> Result<bool> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DbBackend::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
        DbBackend::Postgres => {
            "SELECT table_name::text AS name FROM information_schema.tables \
             WHERE table_schema = current_schema() AND table_name = $1"
        }
        DbBackend::MySql => {
            "SELECT table_name AS name FROM information_schema.tables \
             WHERE table_schema = DATABASE() AND table_name = ?"
        }
    };
    let row = db
        .query_one(Statement::from_sql_and_values(backend, sql, [table.into()]))
        .await?;
    Ok(row.is_some())
}

/// Column names of `table` in declaration order. Empty if the table does not exist.
pub async fn table_columns<C: ConnectionTrait>(db: &C, table: &str) -> Result<Vec<String>> {
    let backend = db.get_database_backend();
    let sql = match backend {
        DbBackend::Sqlite => "SELECT name FROM pragma_table_info(?) ORDER BY cid",
        DbBackend::Postgres => {
            "SELECT column_name::text AS name FROM information_schema.columns \
             WHERE table_schema = current_schema() AND table_name = $1 \
             ORDER BY ordinal_position"
        }
        DbBackend::MySql => {
            "SELECT column_name AS name FROM information_schema.columns \
             WHERE table_schema = DATABASE() AND table_name = ? \
             ORDER BY ordinal_position"
        }
    };
    let rows = db
        .query_all(Statement::from_sql_and_values(backend, sql, [table.into()]))
        .await?;
    rows.iter()
        .map(|row| row.try_get::<String>("", "name").map_err(Into::into))
        .collect()
}

/// Number of rows in `table`.
pub async fn row_count<C: ConnectionTrait>(db: &C, table: &str) -> Result<u64> {
    let query = Query::select()
        .expr_as(Expr::cust("COUNT(*)"), Alias::new("row_count"))
        .from(Alias::new(table))
        .to_owned();
    let backend = db.get_database_backend();
    let count = match db.query_one(backend.build(&query)).await? {
        Some(row) => row.try_get::<i64>("", "row_count")?,
        None => 0,
    };
    Ok(u64::try_from(count).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_context;

    #[tokio::test]
    async fn test_catalog_queries() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;

        assert!(table_exists(&ctx.db, "geonames_country_info").await?);
        assert!(!table_exists(&ctx.db, "geonames_country_info_working").await?);

        let columns = table_columns(&ctx.db, "geonames_feature_classes").await?;
        assert_eq!(columns, vec!["class", "description", "created_at", "updated_at"]);
        assert!(table_columns(&ctx.db, "missing_table").await?.is_empty());

        assert_eq!(row_count(&ctx.db, "geonames_country_info").await?, 0);
        Ok(())
    }
}
