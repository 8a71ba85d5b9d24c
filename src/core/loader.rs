//! Table loaders - the two ways a data set reaches its production table.
//!
//! * [`ShadowTable`] builds a fresh copy of the table under a working name, verifies it
//!   and swaps it in. Readers see either the complete old data or the complete new data.
//! * [`replace_rows`] deletes and re-inserts every row of a small table inside one
//!   transaction.

use crate::{
    core::catalog,
    errors::{Error, Result},
};
use indicatif::{ProgressBar, ProgressStyle};
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityName, EntityTrait,
    Iterable, QueryTrait, Schema, Statement, TransactionTrait,
    prelude::DateTimeUtc,
    sea_query::{Alias, Table},
};
use std::collections::BTreeSet;
use std::fmt;
use std::marker::PhantomData;
use tracing::{debug, info, instrument, warn};

/// Suffix appended to a production table name to form its working table.
pub const WORKING_SUFFIX: &str = "_working";

/// Bind parameters one statement may carry on every supported backend (SQLite's default
/// limit, lower than PostgreSQL's and MySQL's 65535).
pub const MAX_BIND_PARAMS: usize = 32_766;

/// A typed record that can be written as one row of its entity's table.
pub trait TableRecord {
    /// Target entity
    type Entity: EntityTrait;
    /// Active model inserted for each record
    type ActiveModel: ActiveModelTrait<Entity = Self::Entity>;

    /// Converts the record into an insertable row stamped with `loaded_at`.
    fn into_active_model(self, loaded_at: DateTimeUtc) -> Self::ActiveModel;
}

/// How a data set replaces the rows of its production table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStrategy {
    /// Load a working copy, verify it, then swap it in
    ShadowSwap,
    /// Delete and re-insert every row in one transaction
    ReplaceRows,
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ShadowSwap => f.write_str("shadow-swap"),
            Self::ReplaceRows => f.write_str("replace-rows"),
        }
    }
}

fn progress_bar(total: Option<u64>, table: &str) -> ProgressBar {
    let (bar, template) = match total {
        Some(len) => (
            ProgressBar::new(len),
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ),
        None => (
            ProgressBar::new_spinner(),
            "{spinner:.green} [{elapsed_precise}] {pos} rows {msg}",
        ),
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.set_message(table.to_owned());
    bar
}

/// Working copy of entity `E`'s table.
///
/// Lifecycle: [`prepare`](Self::prepare), any number of [`load`](Self::load) calls,
/// then [`publish`](Self::publish) on success or [`discard`](Self::discard) on failure.
#[derive(Debug)]
pub struct ShadowTable<E> {
    production: String,
    working: String,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> Default for ShadowTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> ShadowTable<E> {
    /// Working table for `E`, named `<production>_working`.
    #[must_use]
    pub fn new() -> Self {
        let production = E::default().table_name().to_owned();
        let working = format!("{production}{WORKING_SUFFIX}");
        Self {
            production,
            working,
            _entity: PhantomData,
        }
    }

    /// Name of the table being loaded.
    #[must_use]
    pub fn working_name(&self) -> &str {
        &self.working
    }

    /// Largest batch whose multi-row INSERT stays within [`MAX_BIND_PARAMS`].
    #[must_use]
    pub fn max_batch_rows() -> usize {
        (MAX_BIND_PARAMS / E::Column::iter().count().max(1)).max(1)
    }

    /// Drops any leftover working table and creates an empty one from the entity.
    #[instrument(skip(self, db), fields(table = %self.working))]
    pub async fn prepare(&self, db: &DatabaseConnection) -> Result<()> {
        let backend = db.get_database_backend();
        let drop = Table::drop()
            .table(Alias::new(&self.working))
            .if_exists()
            .to_owned();
        db.execute(backend.build(&drop)).await?;

        let mut create = Schema::new(backend).create_table_from_entity(E::default());
        create.table(Alias::new(&self.working));
        db.execute(backend.build(&create)).await?;
        debug!("Created working table {}", self.working);
        Ok(())
    }

    /// Streams `rows` into the working table in multi-row batches of `batch_size`,
    /// capped at [`Self::max_batch_rows`].
    ///
    /// The whole call runs in one transaction: if any row is rejected nothing from
    /// this call remains in the working table.
    ///
    /// # Errors
    /// Returns the first error yielded by `rows`, or `Error::BulkLoad` when the
    /// database rejects a batch.
    #[instrument(skip(self, db, rows, loaded_at), fields(table = %self.working))]
    pub async fn load<R, I>(
        &self,
        db: &DatabaseConnection,
        rows: I,
        batch_size: usize,
        loaded_at: DateTimeUtc,
    ) -> Result<u64>
    where
        R: TableRecord<Entity = E>,
        I: IntoIterator<Item = Result<R>>,
    {
        let txn = db
            .begin()
            .await
            .map_err(|e| Error::bulk_load(&self.working, e))?;
        let progress = progress_bar(None, &self.production);
        let max_rows = Self::max_batch_rows();
        if batch_size > max_rows {
            debug!(
                "Batch size {} exceeds the bind parameter limit, using {}",
                batch_size, max_rows
            );
        }
        let batch_size = batch_size.clamp(1, max_rows);

        let mut loaded = 0u64;
        let mut batch = Vec::with_capacity(batch_size);
        let mut outcome = Ok(());
        for row in rows {
            match row {
                Ok(record) => batch.push(record.into_active_model(loaded_at)),
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
            if batch.len() >= batch_size {
                match self.flush::<R, _>(&txn, &mut batch).await {
                    Ok(count) => {
                        loaded += count;
                        progress.set_position(loaded);
                    }
                    Err(e) => {
                        outcome = Err(e);
                        break;
                    }
                }
            }
        }
        if outcome.is_ok() {
            outcome = self.flush::<R, _>(&txn, &mut batch).await.map(|count| {
                loaded += count;
            });
        }
        progress.finish_and_clear();

        match outcome {
            Ok(()) => {
                txn.commit()
                    .await
                    .map_err(|e| Error::bulk_load(&self.working, e))?;
                info!("Loaded {} rows into {}", loaded, self.working);
                Ok(loaded)
            }
            Err(e) => {
                if let Err(rollback) = txn.rollback().await {
                    warn!("Rollback of {} failed: {}", self.working, rollback);
                }
                Err(e)
            }
        }
    }

    async fn flush<R, C>(&self, conn: &C, batch: &mut Vec<R::ActiveModel>) -> Result<u64>
    where
        R: TableRecord<Entity = E>,
        C: ConnectionTrait,
    {
        if batch.is_empty() {
            return Ok(0);
        }
        let count = batch.len() as u64;
        let mut insert = E::insert_many(batch.drain(..)).into_query();
        insert.into_table(Alias::new(&self.working));
        conn.execute(conn.get_database_backend().build(&insert))
            .await
            .map_err(|e| Error::bulk_load(&self.working, e))?;
        Ok(count)
    }

    /// Verifies the working table and swaps it in as the production table.
    ///
    /// The working table must hold exactly `expected_rows` rows and, when a production
    /// table exists, the same set of columns. A missing production table is not an error.
    ///
    /// # Errors
    /// Returns `Error::BulkLoad` on a row count mismatch and `Error::SchemaMismatch` when
    /// the column sets differ. The production table is untouched in both cases.
    #[instrument(skip(self, db), fields(table = %self.production))]
    pub async fn publish(&self, db: &DatabaseConnection, expected_rows: u64) -> Result<()> {
        let loaded = catalog::row_count(db, &self.working).await?;
        if loaded != expected_rows {
            return Err(Error::bulk_load(
                &self.working,
                format!("expected {expected_rows} rows, found {loaded}"),
            ));
        }

        let production_exists = catalog::table_exists(db, &self.production).await?;
        if production_exists {
            self.verify_columns(db).await?;
        } else {
            warn!(
                "Production table {} is missing; publishing {} as a new table",
                self.production, self.working
            );
        }

        self.swap(db, production_exists).await?;
        info!("Published {} rows to {}", loaded, self.production);
        Ok(())
    }

    async fn verify_columns(&self, db: &DatabaseConnection) -> Result<()> {
        let working: BTreeSet<String> = catalog::table_columns(db, &self.working)
            .await?
            .into_iter()
            .collect();
        let production: BTreeSet<String> = catalog::table_columns(db, &self.production)
            .await?
            .into_iter()
            .collect();
        if working == production {
            return Ok(());
        }

        let only_working: Vec<&str> = working.difference(&production).map(String::as_str).collect();
        let only_production: Vec<&str> =
            production.difference(&working).map(String::as_str).collect();
        Err(Error::SchemaMismatch {
            working: self.working.clone(),
            production: self.production.clone(),
            message: format!(
                "only in working: [{}], only in production: [{}]",
                only_working.join(", "),
                only_production.join(", ")
            ),
        })
    }

    async fn swap(&self, db: &DatabaseConnection, production_exists: bool) -> Result<()> {
        let backend = db.get_database_backend();
        let rename = Table::rename()
            .table(Alias::new(&self.working), Alias::new(&self.production))
            .to_owned();

        if backend == DbBackend::MySql {
            // MySQL DDL commits implicitly, so the swap relies on RENAME TABLE being atomic
            if !production_exists {
                db.execute(backend.build(&rename)).await?;
                return Ok(());
            }
            let retired = format!("{}_retired", self.production);
            let drop_retired = Table::drop()
                .table(Alias::new(&retired))
                .if_exists()
                .to_owned();
            db.execute(backend.build(&drop_retired)).await?;
            db.execute(Statement::from_string(
                backend,
                format!(
                    "RENAME TABLE `{prod}` TO `{retired}`, `{work}` TO `{prod}`",
                    prod = self.production,
                    work = self.working,
                ),
            ))
            .await?;
            db.execute(backend.build(&drop_retired)).await?;
            return Ok(());
        }

        let drop_production = Table::drop()
            .table(Alias::new(&self.production))
            .if_exists()
            .to_owned();
        let txn = db.begin().await?;
        txn.execute(backend.build(&drop_production)).await?;
        txn.execute(backend.build(&rename)).await?;
        txn.commit().await?;
        Ok(())
    }

    /// Drops the working table. Leaves production untouched.
    pub async fn discard(&self, db: &DatabaseConnection) -> Result<()> {
        let backend = db.get_database_backend();
        let drop = Table::drop()
            .table(Alias::new(&self.working))
            .if_exists()
            .to_owned();
        db.execute(backend.build(&drop)).await?;
        debug!("Discarded working table {}", self.working);
        Ok(())
    }
}

/// Replaces every row of `R`'s table with `records` inside one transaction.
///
/// Readers never observe the table empty; on failure the previous rows remain.
///
/// # Errors
/// Returns `Error::BulkLoad` if the delete or any insert is rejected.
#[instrument(skip(db, records, loaded_at), fields(rows = records.len()))]
pub async fn replace_rows<R: TableRecord>(
    db: &DatabaseConnection,
    records: Vec<R>,
    loaded_at: DateTimeUtc,
) -> Result<u64> {
    let table = R::Entity::default().table_name().to_owned();
    let backend = db.get_database_backend();
    let progress = progress_bar(Some(records.len() as u64), &table);
    let txn = db
        .begin()
        .await
        .map_err(|e| Error::bulk_load(&table, e))?;

    let outcome = async {
        R::Entity::delete_many().exec(&txn).await?;
        let mut inserted = 0u64;
        for record in records {
            let insert = R::Entity::insert(record.into_active_model(loaded_at)).into_query();
            txn.execute(backend.build(&insert)).await?;
            inserted += 1;
            progress.inc(1);
        }
        Ok::<u64, sea_orm::DbErr>(inserted)
    }
    .await;
    progress.finish_and_clear();

    match outcome {
        Ok(inserted) => {
            txn.commit().await.map_err(|e| Error::bulk_load(&table, e))?;
            info!("Replaced {} rows in {}", inserted, table);
            Ok(inserted)
        }
        Err(e) => {
            if let Err(rollback) = txn.rollback().await {
                warn!("Rollback of {} failed: {}", table, rollback);
            }
            Err(Error::bulk_load(&table, e))
        }
    }
}
