//! Pipeline orchestrator - runs data set jobs in order and drives the install status.
//!
//! A run moves the connection to `INSTALLING`, runs each job (fetch, extract, normalize,
//! load) and finishes `LIVE`. The first failing job is recorded in the durable log,
//! moves the status to `ERROR` and stops the run; later jobs never start.

use crate::{
    core::{
        archive,
        context::GeonamesContext,
        datasets::{DataSetJob, DataSetKind},
        fetch::Fetcher,
        loader::{LoadStrategy, ShadowTable, TableRecord, replace_rows},
        log,
        normalize::{RowLayout, RowReader, SkipReason, SkipStats},
        records::{
            AlternateNameRecord, CountryInfoRecord, FeatureCodeRecord, GeonameRecord,
            IsoLanguageCodeRecord,
        },
        seed::FEATURE_CLASSES,
        settings,
    },
    entities::{InstallStatus, SettingsModel},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::EntityName;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Settings a run should install with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallRequest {
    /// Two-letter country codes; empty installs every country
    pub countries: Vec<String>,
    /// Two-letter language codes for alternate names; empty keeps every language
    pub languages: Vec<String>,
    /// Storage directory, relative to the storage root
    pub storage_path: String,
}

/// Outcome of one completed job.
#[derive(Debug, Clone)]
pub struct JobReport {
    pub kind: DataSetKind,
    pub strategy: LoadStrategy,
    /// Remote files that were fetched
    pub sources: Vec<String>,
    pub rows_loaded: u64,
    pub skipped: SkipStats,
    pub elapsed: Duration,
}

/// The job that stopped a run, and why.
#[derive(Debug)]
pub struct JobFailure {
    pub kind: DataSetKind,
    pub error: Error,
}

/// Result of a multi-job run.
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Jobs that completed, in run order
    pub jobs: Vec<JobReport>,
    /// The failure that stopped the run, if any
    pub failure: Option<JobFailure>,
}

impl PipelineReport {
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    /// Total rows published across all completed jobs.
    #[must_use]
    pub fn rows_loaded(&self) -> u64 {
        self.jobs.iter().map(|job| job.rows_loaded).sum()
    }
}

struct LoadOutcome {
    rows: u64,
    skipped: SkipStats,
}

/// Runs data set jobs for one connection, fetching through `F`.
#[derive(Debug)]
pub struct Pipeline<F> {
    ctx: GeonamesContext,
    fetcher: F,
}

impl<F: Fetcher> Pipeline<F> {
    pub const fn new(ctx: GeonamesContext, fetcher: F) -> Self {
        Self { ctx, fetcher }
    }

    #[must_use]
    pub const fn context(&self) -> &GeonamesContext {
        &self.ctx
    }

    /// Saves the requested settings and runs every data set.
    ///
    /// # Errors
    /// Fails before any job runs when the settings are invalid or the status cannot move
    /// to `INSTALLING`. Job failures are reported in [`PipelineReport::failure`].
    #[instrument(skip(self, request), fields(connection = %self.ctx.connection_name))]
    pub async fn install(&self, request: &InstallRequest) -> Result<PipelineReport> {
        settings::ensure_transition(&self.ctx, InstallStatus::Installing).await?;
        settings::install(
            &self.ctx,
            &request.countries,
            &request.languages,
            &request.storage_path,
        )
        .await?;
        self.run_sequence(&DataSetKind::INSTALL_ORDER).await
    }

    /// Adds countries to the configured set and reloads the country-scoped data sets.
    ///
    /// When every country is already installed the set stays unrestricted. Requested
    /// languages are added to the configured ones in the same way.
    ///
    /// # Errors
    /// Same as [`Self::install`].
    #[instrument(skip(self, request), fields(connection = %self.ctx.connection_name))]
    pub async fn add_country(&self, request: &InstallRequest) -> Result<PipelineReport> {
        settings::ensure_transition(&self.ctx, InstallStatus::Installing).await?;
        let existing = settings::find(&self.ctx).await?;
        let countries = merge_codes(
            existing.as_ref(),
            SettingsModel::country_codes,
            &request.countries,
        );
        let languages = merge_codes(
            existing.as_ref(),
            SettingsModel::language_codes,
            &request.languages,
        );
        let storage_path = if request.storage_path.trim().is_empty() {
            existing
                .as_ref()
                .map_or_else(String::new, |s| s.storage_path.clone())
        } else {
            request.storage_path.clone()
        };

        let saved = settings::install(&self.ctx, &countries, &languages, &storage_path).await?;
        info!("Adding countries, configured set is now [{}]", saved.countries);
        self.run_sequence(&DataSetKind::COUNTRY_ORDER).await
    }

    /// Runs a single data set without touching the install status.
    ///
    /// # Errors
    /// Returns the job's error after it has been written to the durable log.
    #[instrument(skip(self), fields(connection = %self.ctx.connection_name))]
    pub async fn run_single(&self, kind: DataSetKind) -> Result<JobReport> {
        let settings = settings::init(&self.ctx).await?;
        let report = self.run_job(&settings, kind).await;
        let work_dir = self.work_dir(&settings, kind);
        if !settings::empty_directory(&work_dir) {
            warn!("Unable to empty {}", work_dir.display());
        }
        report
    }

    async fn run_sequence(&self, kinds: &[DataSetKind]) -> Result<PipelineReport> {
        let started = Instant::now();
        settings::set_status(&self.ctx, InstallStatus::Installing).await?;
        if !settings::empty_storage_directory(&self.ctx).await {
            warn!("Storage directory was not fully emptied before the run");
        }
        let settings = settings::get(&self.ctx).await?;

        let mut report = PipelineReport::default();
        for &kind in kinds {
            match self.run_job(&settings, kind).await {
                Ok(job) => report.jobs.push(job),
                Err(error) => {
                    warn!("Stopping run: {} failed", kind);
                    if let Err(e) = settings::set_status(&self.ctx, InstallStatus::Error).await {
                        warn!("Unable to record ERROR status: {}", e);
                    }
                    report.failure = Some(JobFailure { kind, error });
                    return Ok(report);
                }
            }
        }

        if let Err(e) = self.finish(started.elapsed()).await {
            log::record_error(&self.ctx, None, &e).await;
            if let Err(status) = settings::set_status(&self.ctx, InstallStatus::Error).await {
                warn!("Unable to record ERROR status: {}", status);
            }
            return Err(e);
        }
        Ok(report)
    }

    async fn finish(&self, elapsed: Duration) -> Result<()> {
        settings::set_installed_at(&self.ctx).await?;
        settings::set_status(&self.ctx, InstallStatus::Live).await?;
        if !settings::empty_storage_directory(&self.ctx).await {
            warn!("Unable to empty the storage directory after the run");
        }
        let message = format!(
            "Geonames has been installed. Runtime: {:.2}s",
            elapsed.as_secs_f64()
        );
        log::record_info(&self.ctx, &message, "install").await;
        Ok(())
    }

    fn work_dir(&self, settings: &SettingsModel, kind: DataSetKind) -> PathBuf {
        settings::absolute_storage_path(&self.ctx, settings).join(kind.name())
    }

    #[instrument(skip(self, settings))]
    async fn run_job(&self, settings: &SettingsModel, kind: DataSetKind) -> Result<JobReport> {
        let started = Instant::now();
        let job = DataSetJob::plan(kind, &self.ctx.download_base_url, settings);
        let work_dir = self.work_dir(settings, kind);
        let files = self.fetch_sources(&job, &work_dir).await?;

        let outcome = match kind {
            DataSetKind::FeatureClasses => {
                replace_rows(&self.ctx.db, FEATURE_CLASSES.to_vec(), Utc::now())
                    .await
                    .map(|rows| LoadOutcome {
                        rows,
                        skipped: SkipStats::default(),
                    })
            }
            DataSetKind::FeatureCodes => self.shadow_load::<FeatureCodeRecord>(&files, |_| true).await,
            DataSetKind::IsoLanguageCodes => {
                self.shadow_load::<IsoLanguageCodeRecord>(&files, |_| true)
                    .await
            }
            DataSetKind::AlternateNames => {
                let languages = settings.language_codes();
                self.shadow_load::<AlternateNameRecord>(&files, |record| {
                    languages.is_empty() || languages.contains(&record.isolanguage)
                })
                .await
            }
            DataSetKind::Geonames => self.shadow_load::<GeonameRecord>(&files, |_| true).await,
            DataSetKind::CountryInfo => self.replace_load::<CountryInfoRecord>(&files).await,
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                log::record_error(&self.ctx, Some(&kind.production_table()), &e).await;
                return Err(e);
            }
        };

        let report = JobReport {
            kind,
            strategy: job.strategy,
            sources: job.sources.into_iter().map(|source| source.url).collect(),
            rows_loaded: outcome.rows,
            skipped: outcome.skipped,
            elapsed: started.elapsed(),
        };
        info!(
            "{} loaded {} rows ({} skipped) in {:.2}s",
            kind,
            report.rows_loaded,
            report.skipped.total(),
            report.elapsed.as_secs_f64()
        );
        Ok(report)
    }

    /// Downloads and unpacks every source file, returning the delimited files to read.
    async fn fetch_sources(&self, job: &DataSetJob, work_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::with_capacity(job.sources.len());
        for source in &job.sources {
            let downloaded = match self.fetcher.download(&source.url, work_dir).await {
                Ok(path) => path,
                Err(e) => {
                    log::record_error(&self.ctx, Some(&source.url), &e).await;
                    return Err(e);
                }
            };
            if !source.is_archive() {
                files.push(downloaded);
                continue;
            }
            match extract_entry(&downloaded, work_dir, &source.text_file) {
                Ok(path) => files.push(path),
                Err(e) => {
                    let origin = downloaded.display().to_string();
                    log::record_error(&self.ctx, Some(&origin), &e).await;
                    return Err(e);
                }
            }
        }
        Ok(files)
    }

    async fn shadow_load<R>(
        &self,
        files: &[PathBuf],
        keep: impl Fn(&R) -> bool,
    ) -> Result<LoadOutcome>
    where
        R: RowLayout<Record = R> + TableRecord,
    {
        let table = ShadowTable::<R::Entity>::new();
        table.prepare(&self.ctx.db).await?;

        let mut skipped = SkipStats::default();
        match self.fill_shadow(&table, files, &keep, &mut skipped).await {
            Ok(rows) => Ok(LoadOutcome { rows, skipped }),
            Err(e) => {
                if let Err(discard) = table.discard(&self.ctx.db).await {
                    warn!("Unable to drop {}: {}", table.working_name(), discard);
                }
                Err(e)
            }
        }
    }

    async fn fill_shadow<R>(
        &self,
        table: &ShadowTable<R::Entity>,
        files: &[PathBuf],
        keep: &impl Fn(&R) -> bool,
        skipped: &mut SkipStats,
    ) -> Result<u64>
    where
        R: RowLayout<Record = R> + TableRecord,
    {
        let loaded_at = Utc::now();
        let mut loaded = 0;
        for file in files {
            debug!("Reading {}", file.display());
            let reader = RowReader::<R>::open(file)
                .map_err(|e| read_failure(table.working_name(), file, e))?;
            let rows = reader.filter_map(|row| match row {
                Err(e) => Some(Err(read_failure(table.working_name(), file, e))),
                Ok(Ok(record)) if keep(&record) => Some(Ok(record)),
                Ok(Ok(_)) => {
                    skipped.record(SkipReason::Filtered);
                    None
                }
                Ok(Err(reason)) => {
                    skipped.record(reason);
                    None
                }
            });
            loaded += table
                .load(&self.ctx.db, rows, self.ctx.batch_size, loaded_at)
                .await?;
        }
        table.publish(&self.ctx.db, loaded).await?;
        Ok(loaded)
    }

    async fn replace_load<R>(&self, files: &[PathBuf]) -> Result<LoadOutcome>
    where
        R: RowLayout<Record = R> + TableRecord,
    {
        let table = R::Entity::default().table_name().to_owned();
        let mut records = Vec::new();
        let mut skipped = SkipStats::default();
        for file in files {
            let reader =
                RowReader::<R>::open(file).map_err(|e| read_failure(&table, file, e))?;
            for row in reader {
                match row.map_err(|e| read_failure(&table, file, e))? {
                    Ok(record) => records.push(record),
                    Err(reason) => skipped.record(reason),
                }
            }
        }
        let rows = replace_rows(&self.ctx.db, records, Utc::now()).await?;
        Ok(LoadOutcome { rows, skipped })
    }
}

/// Reports a file that could not be read during a load as a failed load of `table`.
fn read_failure(table: &str, file: &Path, err: Error) -> Error {
    match err {
        Error::Io(e) => Error::bulk_load(table, format!("Unable to read {}: {e}", file.display())),
        other => other,
    }
}

/// Extracts `archive_path` and returns the path of its `expected` entry.
fn extract_entry(archive_path: &Path, destination_dir: &Path, expected: &str) -> Result<PathBuf> {
    archive::extract(archive_path, destination_dir)?
        .into_iter()
        .find(|path| path.file_name().is_some_and(|name| name == expected))
        .ok_or_else(|| Error::CorruptArchive {
            path: archive_path.display().to_string(),
            message: format!("archive has no entry named {expected}"),
        })
}

/// Union of the configured codes and the requested ones.
///
/// An installed connection with no codes configured already covers everything, so it
/// stays unrestricted.
fn merge_codes(
    existing: Option<&SettingsModel>,
    configured: fn(&SettingsModel) -> Vec<String>,
    requested: &[String],
) -> Vec<String> {
    let Some(existing) = existing else {
        return requested.to_vec();
    };
    let current = configured(existing);
    if current.is_empty() && existing.status != InstallStatus::Uninstalled {
        return Vec::new();
    }
    current.into_iter().chain(requested.iter().cloned()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        AlternateName, CountryInfo, FeatureClass, FeatureCode, Geoname, IsoLanguageCode, Log,
    };
    use crate::test_utils::{COUNTRY_INFO_TXT, FixtureFetcher, setup_test_context};
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    fn worldwide() -> InstallRequest {
        InstallRequest {
            storage_path: "geonames".to_string(),
            ..InstallRequest::default()
        }
    }

    #[tokio::test]
    async fn test_install_goes_live_and_empties_storage() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete());

        let report = pipeline.install(&worldwide()).await?;

        assert!(report.succeeded(), "failure: {:?}", report.failure);
        let kinds: Vec<DataSetKind> = report.jobs.iter().map(|job| job.kind).collect();
        assert_eq!(kinds, DataSetKind::INSTALL_ORDER.to_vec());

        let ctx = pipeline.context();
        let saved = settings::get(ctx).await?;
        assert_eq!(saved.status, InstallStatus::Live);
        assert!(saved.installed_at.is_some());
        let storage = settings::absolute_storage_path(ctx, &saved);
        assert_eq!(std::fs::read_dir(&storage)?.count(), 0);

        assert_eq!(FeatureClass::find().count(&ctx.db).await?, 9);
        assert_eq!(FeatureCode::find().count(&ctx.db).await?, 3);
        assert_eq!(IsoLanguageCode::find().count(&ctx.db).await?, 3);
        assert_eq!(AlternateName::find().count(&ctx.db).await?, 5);
        assert_eq!(Geoname::find().count(&ctx.db).await?, 3);
        assert_eq!(CountryInfo::find().count(&ctx.db).await?, 2);

        let country_info = &report.jobs[5];
        assert_eq!(country_info.skipped.comments, 2);
        let iso = &report.jobs[2];
        assert_eq!(iso.skipped.headers, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_reinstall_is_idempotent() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete());

        pipeline.install(&worldwide()).await?;
        let second = pipeline.install(&worldwide()).await?;

        assert!(second.succeeded());
        let db = &pipeline.context().db;
        assert_eq!(CountryInfo::find().count(db).await?, 2);
        assert_eq!(Geoname::find().count(db).await?, 3);
        assert_eq!(settings::get(pipeline.context()).await?.status, InstallStatus::Live);
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_country_info_sets_error_and_keeps_rows() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        Pipeline::new(ctx.clone(), FixtureFetcher::complete())
            .install(&worldwide())
            .await?;

        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete().without("countryInfo.txt"));
        let report = pipeline.install(&worldwide()).await?;

        let failure = report.failure.as_ref().map(|f| (f.kind, f.error.category()));
        assert_eq!(failure, Some((DataSetKind::CountryInfo, "remote")));
        assert_eq!(report.jobs.len(), 5);

        let ctx = pipeline.context();
        assert_eq!(settings::get(ctx).await?.status, InstallStatus::Error);
        assert_eq!(CountryInfo::find().count(&ctx.db).await?, 2);
        let logged = Log::find()
            .filter(crate::entities::log::Column::Category.eq("remote"))
            .all(&ctx.db)
            .await?;
        assert_eq!(logged.len(), 1);
        assert_eq!(
            logged[0].url.as_deref(),
            Some("http://fixtures.test/dump/countryInfo.txt")
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_failure_stops_remaining_jobs() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let fetcher = FixtureFetcher::complete().without("featureCodes_en.txt");
        let pipeline = Pipeline::new(ctx, fetcher);

        let report = pipeline.install(&worldwide()).await?;

        assert_eq!(report.jobs.len(), 1);
        assert_eq!(report.jobs[0].kind, DataSetKind::FeatureClasses);
        assert_eq!(
            report.failure.as_ref().map(|f| f.kind),
            Some(DataSetKind::FeatureCodes)
        );
        assert_eq!(
            pipeline.fetcher.requested(),
            vec!["http://fixtures.test/dump/featureCodes_en.txt".to_string()]
        );
        assert_eq!(
            settings::get(pipeline.context()).await?.status,
            InstallStatus::Error
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_archive_fails_job() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let fetcher = FixtureFetcher::complete().with_file("allCountries.zip", b"PK broken".to_vec());
        let pipeline = Pipeline::new(ctx, fetcher);

        let report = pipeline.install(&worldwide()).await?;

        let failure = report.failure.as_ref().map(|f| (f.kind, f.error.category()));
        assert_eq!(failure, Some((DataSetKind::Geonames, "local")));
        let db = &pipeline.context().db;
        assert_eq!(Geoname::find().count(db).await?, 0);
        assert!(!crate::core::catalog::table_exists(db, "geonames_geonames_working").await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_rerun_from_installing_is_rejected() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        settings::install(&ctx, &["AD".to_string()], &[], "geonames").await?;
        settings::set_status(&ctx, InstallStatus::Installing).await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete());
        let request = InstallRequest {
            countries: vec!["FR".to_string()],
            languages: vec!["fr".to_string()],
            storage_path: "other".to_string(),
        };

        let result = pipeline.install(&request).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        let result = pipeline.add_country(&request).await;
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));

        assert!(pipeline.fetcher.requested().is_empty());
        let saved = settings::get(pipeline.context()).await?;
        assert_eq!(saved.countries, "AD");
        assert_eq!(saved.languages, "");
        assert_eq!(saved.storage_path, "geonames");
        assert_eq!(saved.status, InstallStatus::Installing);
        Ok(())
    }

    #[tokio::test]
    async fn test_language_filter_applies_to_alternate_names() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete());
        let request = InstallRequest {
            countries: vec!["AD".to_string()],
            languages: vec!["en".to_string()],
            storage_path: "geonames".to_string(),
        };

        let report = pipeline.install(&request).await?;

        assert!(report.succeeded());
        let alternates = report
            .jobs
            .iter()
            .find(|job| job.kind == DataSetKind::AlternateNames)
            .map(|job| (job.rows_loaded, job.skipped.filtered));
        assert_eq!(alternates, Some((1, 2)));
        let names = AlternateName::find().all(&pipeline.context().db).await?;
        assert!(names.iter().all(|name| name.isolanguage == "en"));
        assert!(
            pipeline
                .fetcher
                .requested()
                .contains(&"http://fixtures.test/dump/alternatenames/AD.zip".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_add_country_merges_and_reloads() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete());
        pipeline
            .install(&InstallRequest {
                countries: vec!["AD".to_string()],
                ..worldwide()
            })
            .await?;
        assert_eq!(Geoname::find().count(&pipeline.context().db).await?, 2);

        let report = pipeline
            .add_country(&InstallRequest {
                countries: vec!["FR".to_string()],
                ..InstallRequest::default()
            })
            .await?;

        assert!(report.succeeded());
        let kinds: Vec<DataSetKind> = report.jobs.iter().map(|job| job.kind).collect();
        assert_eq!(kinds, DataSetKind::COUNTRY_ORDER.to_vec());
        let saved = settings::get(pipeline.context()).await?;
        assert_eq!(saved.countries, "AD,FR");
        assert_eq!(saved.storage_path, "geonames");
        assert_eq!(saved.status, InstallStatus::Live);
        let db = &pipeline.context().db;
        assert_eq!(Geoname::find().count(db).await?, 3);
        assert_eq!(AlternateName::find().count(db).await?, 5);
        Ok(())
    }

    #[tokio::test]
    async fn test_add_country_keeps_worldwide_install() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete());
        pipeline.install(&worldwide()).await?;

        pipeline
            .add_country(&InstallRequest {
                countries: vec!["FR".to_string()],
                ..InstallRequest::default()
            })
            .await?;

        assert_eq!(settings::get(pipeline.context()).await?.countries, "");
        Ok(())
    }

    #[tokio::test]
    async fn test_run_single_leaves_status_alone() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::complete());

        let report = pipeline.run_single(DataSetKind::CountryInfo).await?;

        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.strategy, LoadStrategy::ReplaceRows);
        let saved = settings::get(pipeline.context()).await?;
        assert_eq!(saved.status, InstallStatus::Uninstalled);
        assert!(saved.installed_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_utf8_row_is_skipped() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let mut country_info = COUNTRY_INFO_TXT.as_bytes().to_vec();
        country_info.extend_from_slice(
            b"ES\tESP\t724\tSP\tEspa\xf1a\tMadrid\t504782\t46723749\tEU\t.es\tEUR\tEuro\t34\t#####\t^(\\d{5})$\tes-ES,ca,gl,eu,oc\t2510769\tAD,FR,GI,PT,MA\t\n",
        );
        let fetcher = FixtureFetcher::complete().with_file("countryInfo.txt", country_info);
        let pipeline = Pipeline::new(ctx, fetcher);

        let report = pipeline.run_single(DataSetKind::CountryInfo).await?;

        assert_eq!(report.rows_loaded, 2);
        assert_eq!(report.skipped.encoding, 1);
        assert_eq!(CountryInfo::find().count(&pipeline.context().db).await?, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_run_single_failure_is_logged() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let pipeline = Pipeline::new(ctx, FixtureFetcher::default());

        let result = pipeline.run_single(DataSetKind::FeatureCodes).await;

        assert!(matches!(result, Err(Error::Network { .. })));
        assert_eq!(Log::find().count(&pipeline.context().db).await?, 1);
        Ok(())
    }

    #[test]
    fn test_read_failure_is_a_load_error() {
        let err = read_failure(
            "geonames_geonames_working",
            Path::new("/tmp/geonames/AD.txt"),
            Error::Io(std::io::Error::other("device gone")),
        );
        match err {
            Error::BulkLoad { table, message } => {
                assert_eq!(table, "geonames_geonames_working");
                assert!(message.contains("AD.txt"));
            }
            other => panic!("expected bulk load error, got {other:?}"),
        }
    }

    #[test]
    fn test_merge_codes_without_settings() {
        let requested = vec!["FR".to_string()];
        assert_eq!(
            merge_codes(None, SettingsModel::country_codes, &requested),
            requested
        );
    }
}
