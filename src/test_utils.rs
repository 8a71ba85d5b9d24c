//! Shared test utilities for the GeoNames loader.
//!
//! Provides an in-memory database context, a [`Fetcher`] that serves fixture files
//! instead of going to the network, and small GeoNames-shaped fixture data.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use crate::{
    config::AppConfig,
    core::{context::GeonamesContext, fetch::Fetcher, records::CountryInfoRecord},
    errors::{Error, Result},
};
use sea_orm::{ConnectOptions, Database};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Base URL fixture files are served under.
pub const FIXTURE_BASE_URL: &str = "http://fixtures.test/dump/";

pub const COUNTRY_INFO_TXT: &str = "\
# GeoNames.org Country Information
#ISO\tISO3\tISO-Numeric\tfips\tCountry\tCapital\tArea(in sq km)\tPopulation\tContinent\ttld\tCurrencyCode\tCurrencyName\tPhone\tPostal Code Format\tPostal Code Regex\tLanguages\tgeonameid\tneighbours\tEquivalentFipsCode
AD\tAND\t020\tAN\tAndorra\tAndorra la Vella\t468\t77006\tEU\t.ad\tEUR\tEuro\t376\tAD###\t^(?:AD)*(\\d{3})$\tca\t3041565\tES,FR\t
FR\tFRA\t250\tFR\tFrance\tParis\t547030\t66987244\tEU\t.fr\tEUR\tEuro\t33\t#####\t^(\\d{5})$\tfr-FR,frp,br,co,ca,eu,oc\t3017382\tCH,DE,BE,LU,IT,AD,MC,ES\t
";

pub const FEATURE_CODES_TXT: &str = "\
A.ADM1\tfirst-order administrative division\ta primary administrative division of a country
A.ADM2\tsecond-order administrative division\ta subdivision of a first-order administrative division
null\tnot available\t
";

pub const ISO_LANGUAGE_CODES_TXT: &str = "\
ISO 639-3\tISO 639-2\tISO 639-1\tLanguage Name
cat\tcat\tca\tCatalan
eng\teng\ten\tEnglish
fra\tfre\tfr\tFrench
";

pub const AD_GEONAMES_TXT: &str = "\
3041565\tPrincipality of Andorra\tPrincipality of Andorra\tAndorra,Andorre\t42.55\t1.58333\tA\tPCLI\tAD\t\t00\t\t\t\t77006\t\t1235\tEurope/Andorra\t2020-03-03
3041563\tAndorra la Vella\tAndorra la Vella\tAndorra la Vella\t42.50779\t1.52109\tP\tPPLC\tAD\t\t07\t\t\t\t20430\t\t1037\tEurope/Andorra\t2020-03-03
";

pub const FR_GEONAMES_TXT: &str = "\
3017382\tRepublic of France\tRepublic of France\tFrance\t46\t2\tA\tPCLI\tFR\t\t00\t\t\t\t66987244\t\t500\tEurope/Paris\t2021-01-01
";

/// Alternate names for Andorra; the last row uses the ten column layout.
pub const AD_ALTERNATE_NAMES_TXT: &str = "\
1\t3041565\ten\tAndorra\t1\t\t\t
2\t3041565\tca\tAndorra\t\t\t\t
3\t3041563\tfr\tAndorre-la-Vieille\t\t\t\t\t\t
";

pub const FR_ALTERNATE_NAMES_TXT: &str = "\
4\t3017382\ten\tFrance\t1\t\t\t
5\t3017382\tde\tFrankreich\t\t\t\t
";

/// Creates an in-memory `SQLite` context with all tables and a temporary storage root.
///
/// Keep the returned `TempDir` alive for the duration of the test.
pub async fn setup_test_context() -> Result<(GeonamesContext, TempDir)> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    // every pooled connection would otherwise get its own empty database
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    crate::config::database::create_tables(&db).await?;

    let storage = tempfile::tempdir()?;
    let config = AppConfig {
        storage_root: storage.path().to_path_buf(),
        download_base_url: FIXTURE_BASE_URL.to_string(),
        batch_size: 2,
        ..AppConfig::default()
    };
    Ok((GeonamesContext::new(db, "geonames", &config), storage))
}

/// Builds a zip archive holding a single text file.
pub fn zip_bytes(name: &str, contents: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    writer.start_file(name, options).unwrap();
    writer.write_all(contents.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// A country info record with placeholder values apart from the keys.
pub fn country_info_record(iso2: &str, geonameid: i64) -> CountryInfoRecord {
    CountryInfoRecord {
        geonameid,
        iso2_code: iso2.to_string(),
        iso3_code: format!("{iso2}X"),
        iso_numeric: "000".to_string(),
        fips_code: iso2.to_string(),
        country_name: format!("Country {iso2}"),
        capital_city: String::new(),
        area_sq_km: 1,
        population: 1,
        continent: "EU".to_string(),
        tld: format!(".{}", iso2.to_ascii_lowercase()),
        currency_code: "EUR".to_string(),
        currency_name: "Euro".to_string(),
        phone_format: String::new(),
        postal_code_format: String::new(),
        postal_code_regex: String::new(),
        languages: String::new(),
        neighbours: String::new(),
        equivalent_fips_code: String::new(),
    }
}

/// Serves files from memory, keyed by their path below [`FIXTURE_BASE_URL`].
///
/// Unknown files fail like an unreachable host. Every requested URL is recorded.
#[derive(Debug, Default)]
pub struct FixtureFetcher {
    files: BTreeMap<String, Vec<u8>>,
    requested: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    /// Every file a worldwide or AD/FR install asks for.
    pub fn complete() -> Self {
        let all_alternates = format!("{AD_ALTERNATE_NAMES_TXT}{FR_ALTERNATE_NAMES_TXT}");
        let all_geonames = format!("{AD_GEONAMES_TXT}{FR_GEONAMES_TXT}");
        Self::default()
            .with_file("countryInfo.txt", COUNTRY_INFO_TXT.as_bytes().to_vec())
            .with_file("featureCodes_en.txt", FEATURE_CODES_TXT.as_bytes().to_vec())
            .with_file(
                "iso-languagecodes.txt",
                ISO_LANGUAGE_CODES_TXT.as_bytes().to_vec(),
            )
            .with_file(
                "alternateNames.zip",
                zip_bytes("alternateNames.txt", &all_alternates),
            )
            .with_file("allCountries.zip", zip_bytes("allCountries.txt", &all_geonames))
            .with_file(
                "alternatenames/AD.zip",
                zip_bytes("AD.txt", AD_ALTERNATE_NAMES_TXT),
            )
            .with_file(
                "alternatenames/FR.zip",
                zip_bytes("FR.txt", FR_ALTERNATE_NAMES_TXT),
            )
            .with_file("AD.zip", zip_bytes("AD.txt", AD_GEONAMES_TXT))
            .with_file("FR.zip", zip_bytes("FR.txt", FR_GEONAMES_TXT))
    }

    /// Adds or replaces a served file.
    pub fn with_file(mut self, path: &str, contents: Vec<u8>) -> Self {
        self.files.insert(path.to_string(), contents);
        self
    }

    /// Stops serving a file.
    pub fn without(mut self, path: &str) -> Self {
        self.files.remove(path);
        self
    }

    /// URLs requested so far, in order.
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl Fetcher for FixtureFetcher {
    async fn download(&self, url: &str, destination_dir: &Path) -> Result<PathBuf> {
        self.requested.lock().unwrap().push(url.to_string());

        let contents = url
            .strip_prefix(FIXTURE_BASE_URL)
            .and_then(|path| self.files.get(path))
            .ok_or_else(|| Error::Network {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })?;
        let file_name = crate::core::fetch::file_name_from_url(url)?;
        std::fs::create_dir_all(destination_dir)?;
        let destination = destination_dir.join(file_name);
        std::fs::write(&destination, contents)?;
        Ok(destination)
    }
}
