//! Command line front end for the `geonames` binary.
//!
//! Every command opens the named connection, makes sure the tables exist and then runs
//! against a [`GeonamesContext`]. Failures are printed with their source chain and mapped
//! onto the process exit codes in [`exit`].

use crate::{
    config::{AppConfig, database, load_app_config},
    core::{
        context::GeonamesContext,
        datasets::DataSetKind,
        fetch::{Fetcher, HttpFetcher},
        pipeline::{InstallRequest, JobReport, Pipeline, PipelineReport},
        report, seed, settings,
    },
    entities::InstallStatus,
    errors::{Error, Result},
};
use clap::{Args, Parser, Subcommand};
use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use tracing::{error, info};

/// Process exit codes.
pub mod exit {
    pub const SUCCESS: u8 = 0;
    /// Anything not covered below
    pub const OTHER: u8 = 1;
    /// The database connection could not be set up
    pub const CONNECTION: u8 = 2;
    /// Configuration or settings could not be initialized
    pub const SETTINGS: u8 = 3;
    /// A file could not be downloaded or extracted
    pub const DOWNLOAD: u8 = 4;
    /// Rows could not be loaded
    pub const LOAD: u8 = 5;
}

/// CLI arguments for the GeoNames loader
#[derive(Debug, Parser)]
#[command(
    name = "geonames",
    version,
    about = "Download GeoNames exports and load them into a relational database"
)]
pub struct CliArgs {
    /// Configuration file (default: ./geonames.toml when present)
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Named database connection (default: the configured default connection)
    #[arg(short = 'c', long = "connection", global = true)]
    pub connection: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Settings given to `install` and `add-country`.
#[derive(Debug, Clone, Args)]
pub struct InstallArgs {
    /// Two-letter country code; repeat or comma separate. Omit or `*` for all countries
    #[arg(long = "country", value_delimiter = ',')]
    pub countries: Vec<String>,

    /// Two-letter language code for alternate names; repeat or comma separate
    #[arg(long = "language", value_delimiter = ',')]
    pub languages: Vec<String>,

    /// Storage directory for downloads, relative to the storage root
    #[arg(long = "storage", default_value = settings::DEFAULT_STORAGE_SUBDIR)]
    pub storage: String,
}

impl From<InstallArgs> for InstallRequest {
    fn from(args: InstallArgs) -> Self {
        Self {
            countries: args.countries,
            languages: args.languages,
            storage_path: args.storage,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the GeoNames tables and seed continents
    Migrate,

    /// Save settings and load every data set
    Install(InstallArgs),

    /// Add countries to the configured set and reload geonames and alternate names
    AddCountry(InstallArgs),

    /// Reload country information
    CountryInfo,

    /// Reload alternate names
    AlternateName,

    /// Reload feature classes
    FeatureClass,

    /// Reload feature codes
    FeatureCode,

    /// Reload ISO language codes
    IsoLanguageCode,

    /// Reload geonames
    Geoname,

    /// Show settings, status and table row counts
    Status,

    /// Force the status back to UNINSTALLED after an interrupted run
    ResetStatus,
}

impl Commands {
    /// The data set a single-job command reloads.
    #[must_use]
    pub const fn data_set(&self) -> Option<DataSetKind> {
        match self {
            Self::CountryInfo => Some(DataSetKind::CountryInfo),
            Self::AlternateName => Some(DataSetKind::AlternateNames),
            Self::FeatureClass => Some(DataSetKind::FeatureClasses),
            Self::FeatureCode => Some(DataSetKind::FeatureCodes),
            Self::IsoLanguageCode => Some(DataSetKind::IsoLanguageCodes),
            Self::Geoname => Some(DataSetKind::Geonames),
            Self::Migrate
            | Self::Install(_)
            | Self::AddCountry(_)
            | Self::Status
            | Self::ResetStatus => None,
        }
    }
}

/// Maps an error onto the exit code for the stage it belongs to.
#[must_use]
pub const fn exit_code(err: &Error) -> u8 {
    match err {
        Error::Config { .. } | Error::SettingsNotFound { .. } | Error::InvalidTransition { .. } => {
            exit::SETTINGS
        }
        Error::Network { .. } | Error::CorruptArchive { .. } => exit::DOWNLOAD,
        Error::BulkLoad { .. } | Error::SchemaMismatch { .. } | Error::Database(_) => exit::LOAD,
        Error::Io(_) => exit::OTHER,
    }
}

fn report_error(err: &Error) {
    error!(category = err.category(), "{}", err);
    eprintln!("Error: {err}");
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        eprintln!("  caused by: {cause}");
        source = cause.source();
    }
}

async fn open_database(config: &AppConfig, connection_name: &str) -> Result<DatabaseConnection> {
    let db = database::connect(config, connection_name).await?;
    database::create_tables(&db).await?;
    Ok(db)
}

/// Loads configuration, opens the connection and executes `args`.
///
/// Returns the process exit code.
pub async fn run(args: CliArgs) -> u8 {
    let config = match load_app_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            report_error(&e);
            return exit::SETTINGS;
        }
    };
    let connection_name = args
        .connection
        .unwrap_or_else(|| config.default_connection.clone());

    let db = match open_database(&config, &connection_name).await {
        Ok(db) => db,
        Err(e) => {
            report_error(&e);
            return exit::CONNECTION;
        }
    };
    let ctx = GeonamesContext::new(db, &connection_name, &config);

    let fetcher = match HttpFetcher::new(&config.download) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            report_error(&e);
            return exit::SETTINGS;
        }
    };

    match execute(&ctx, fetcher, args.command).await {
        Ok(()) => exit::SUCCESS,
        Err(e) => {
            report_error(&e);
            exit_code(&e)
        }
    }
}

/// Runs one command against an open context.
///
/// # Errors
/// Returns the error that stopped the command; a failed pipeline run returns the error
/// of the job that failed.
pub async fn execute<F: Fetcher>(
    ctx: &GeonamesContext,
    fetcher: F,
    command: Commands,
) -> Result<()> {
    if let Some(kind) = command.data_set() {
        let job = Pipeline::new(ctx.clone(), fetcher).run_single(kind).await?;
        print_job(&job);
        return Ok(());
    }

    match command {
        Commands::Migrate => {
            let continents = seed::seed_continents(&ctx.db).await?;
            println!("GeoNames tables are ready ({continents} continents seeded)");
        }
        Commands::Install(args) => {
            let report = Pipeline::new(ctx.clone(), fetcher)
                .install(&args.into())
                .await?;
            finish_run(report)?;
        }
        Commands::AddCountry(args) => {
            let report = Pipeline::new(ctx.clone(), fetcher)
                .add_country(&args.into())
                .await?;
            finish_run(report)?;
        }
        Commands::Status => {
            let status = report::generate_status_report(ctx, None).await?;
            print!("{}", report::format_status_report(&status));
        }
        Commands::ResetStatus => {
            let saved = settings::force_status(ctx, InstallStatus::Uninstalled).await?;
            println!(
                "Status for '{}' reset to {}",
                saved.connection_name, saved.status
            );
        }
        Commands::CountryInfo
        | Commands::AlternateName
        | Commands::FeatureClass
        | Commands::FeatureCode
        | Commands::IsoLanguageCode
        | Commands::Geoname => {}
    }
    Ok(())
}

fn print_job(job: &JobReport) {
    println!(
        "{:<20} {:>10} rows  {:>6} skipped  {:>8.2}s  ({})",
        job.kind.name(),
        job.rows_loaded,
        job.skipped.total(),
        job.elapsed.as_secs_f64(),
        job.strategy
    );
}

fn finish_run(report: PipelineReport) -> Result<()> {
    for job in &report.jobs {
        print_job(job);
    }
    match report.failure {
        Some(failure) => {
            eprintln!("{} failed; remaining data sets were not loaded", failure.kind);
            Err(failure.error)
        }
        None => {
            info!("Loaded {} rows", report.rows_loaded());
            println!("GeoNames is live");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::entities::{CountryInfo, Settings};
    use crate::test_utils::{FixtureFetcher, setup_test_context};
    use sea_orm::{EntityTrait, PaginatorTrait};

    #[test]
    fn test_parse_install_arguments() {
        let args = CliArgs::try_parse_from([
            "geonames",
            "--connection",
            "archive",
            "install",
            "--country",
            "AD,FR",
            "--country",
            "DE",
            "--language",
            "en",
        ])
        .unwrap();

        assert_eq!(args.connection.as_deref(), Some("archive"));
        let Commands::Install(install) = args.command else {
            panic!("expected install");
        };
        assert_eq!(install.countries, vec!["AD", "FR", "DE"]);
        assert_eq!(install.languages, vec!["en"]);
        assert_eq!(install.storage, "geonames");
    }

    #[test]
    fn test_single_data_set_commands() {
        let args = CliArgs::try_parse_from(["geonames", "iso-language-code"]).unwrap();
        assert_eq!(args.command.data_set(), Some(DataSetKind::IsoLanguageCodes));
        let args = CliArgs::try_parse_from(["geonames", "status", "--config", "x.toml"]).unwrap();
        assert_eq!(args.command.data_set(), None);
        assert_eq!(args.config, Some(PathBuf::from("x.toml")));
        assert!(CliArgs::try_parse_from(["geonames", "uninstall"]).is_err());
    }

    #[test]
    fn test_exit_codes() {
        let network = Error::Network {
            url: "http://fixtures.test/dump/countryInfo.txt".to_string(),
            message: "refused".to_string(),
        };
        assert_eq!(exit_code(&network), exit::DOWNLOAD);
        assert_eq!(exit_code(&Error::bulk_load("t", "dup")), exit::LOAD);
        assert_eq!(exit_code(&Error::config("bad")), exit::SETTINGS);
        assert_eq!(
            exit_code(&Error::Io(std::io::Error::other("disk"))),
            exit::OTHER
        );
    }

    #[tokio::test]
    async fn test_execute_install_then_reset() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let install = InstallArgs {
            countries: vec!["AD".to_string()],
            languages: Vec::new(),
            storage: "geonames".to_string(),
        };

        execute(&ctx, FixtureFetcher::complete(), Commands::Install(install)).await?;
        assert_eq!(CountryInfo::find().count(&ctx.db).await?, 2);

        execute(&ctx, FixtureFetcher::default(), Commands::ResetStatus).await?;
        let saved = Settings::find().one(&ctx.db).await?.unwrap();
        assert_eq!(saved.status, InstallStatus::Uninstalled);
        Ok(())
    }

    #[tokio::test]
    async fn test_execute_install_failure_returns_job_error() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;
        let fetcher = FixtureFetcher::complete().without("iso-languagecodes.txt");

        let result = execute(
            &ctx,
            fetcher,
            Commands::Install(InstallArgs {
                countries: Vec::new(),
                languages: Vec::new(),
                storage: "geonames".to_string(),
            }),
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(exit_code(&err), exit::DOWNLOAD);
        Ok(())
    }

    #[tokio::test]
    async fn test_reset_without_settings_is_a_settings_error() -> Result<()> {
        let (ctx, _storage) = setup_test_context().await?;

        let result = execute(&ctx, FixtureFetcher::default(), Commands::ResetStatus).await;

        assert!(matches!(result, Err(Error::SettingsNotFound { .. })));
        Ok(())
    }
}
