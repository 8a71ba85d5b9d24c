//! Data set catalog - which files each data set comes from and how it is loaded.

use crate::{
    core::{loader::LoadStrategy, settings::download_url_for_file},
    entities::{
        AlternateName, CountryInfo, FeatureClass, FeatureCode, Geoname, IsoLanguageCode,
        settings,
    },
};
use sea_orm::EntityName;
use std::fmt;

const COUNTRY_INFO_FILE: &str = "countryInfo.txt";
const FEATURE_CODES_FILE: &str = "featureCodes_en.txt";
const ISO_LANGUAGE_CODES_FILE: &str = "iso-languagecodes.txt";
const ALL_ALTERNATE_NAMES: &str = "alternateNames";
const ALL_COUNTRIES: &str = "allCountries";
const ALTERNATE_NAMES_DIR: &str = "alternatenames";

fn table_of<E: EntityName>(entity: E) -> String {
    entity.table_name().to_owned()
}

/// One GeoNames data set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DataSetKind {
    FeatureClasses,
    FeatureCodes,
    IsoLanguageCodes,
    AlternateNames,
    Geonames,
    CountryInfo,
}

impl DataSetKind {
    /// Order a full install runs the data sets in.
    pub const INSTALL_ORDER: [Self; 6] = [
        Self::FeatureClasses,
        Self::FeatureCodes,
        Self::IsoLanguageCodes,
        Self::AlternateNames,
        Self::Geonames,
        Self::CountryInfo,
    ];

    /// Data sets reloaded when countries are added.
    pub const COUNTRY_ORDER: [Self; 2] = [Self::Geonames, Self::AlternateNames];

    /// Short name used in logs, reports and storage sub-directories.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::FeatureClasses => "feature-classes",
            Self::FeatureCodes => "feature-codes",
            Self::IsoLanguageCodes => "iso-language-codes",
            Self::AlternateNames => "alternate-names",
            Self::Geonames => "geonames",
            Self::CountryInfo => "country-info",
        }
    }

    #[must_use]
    pub const fn strategy(self) -> LoadStrategy {
        match self {
            Self::FeatureClasses | Self::CountryInfo => LoadStrategy::ReplaceRows,
            Self::FeatureCodes | Self::IsoLanguageCodes | Self::AlternateNames | Self::Geonames => {
                LoadStrategy::ShadowSwap
            }
        }
    }

    /// Table the data set is published to.
    #[must_use]
    pub fn production_table(self) -> String {
        match self {
            Self::FeatureClasses => table_of(FeatureClass),
            Self::FeatureCodes => table_of(FeatureCode),
            Self::IsoLanguageCodes => table_of(IsoLanguageCode),
            Self::AlternateNames => table_of(AlternateName),
            Self::Geonames => table_of(Geoname),
            Self::CountryInfo => table_of(CountryInfo),
        }
    }
}

impl fmt::Display for DataSetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A remote file and the text file it yields locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub url: String,
    /// Name of the delimited file to read, inside the archive when `url` is a zip
    pub text_file: String,
}

impl SourceFile {
    fn plain(base_url: &str, file_name: &str) -> Self {
        Self {
            url: download_url_for_file(base_url, file_name),
            text_file: file_name.to_owned(),
        }
    }

    fn zipped(base_url: &str, remote_path: &str, stem: &str) -> Self {
        Self {
            url: download_url_for_file(base_url, &format!("{remote_path}.zip")),
            text_file: format!("{stem}.txt"),
        }
    }

    #[must_use]
    pub fn is_archive(&self) -> bool {
        self.url.ends_with(".zip")
    }
}

/// Everything needed to run one data set against the current settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSetJob {
    pub kind: DataSetKind,
    pub sources: Vec<SourceFile>,
    pub strategy: LoadStrategy,
}

impl DataSetJob {
    /// Plans the files for `kind`. Country-scoped data sets fetch one file per
    /// configured country, or the worldwide dump when no countries are configured.
    #[must_use]
    pub fn plan(kind: DataSetKind, base_url: &str, settings: &settings::Model) -> Self {
        let countries = settings.country_codes();
        let sources = match kind {
            DataSetKind::FeatureClasses => Vec::new(),
            DataSetKind::FeatureCodes => vec![SourceFile::plain(base_url, FEATURE_CODES_FILE)],
            DataSetKind::IsoLanguageCodes => {
                vec![SourceFile::plain(base_url, ISO_LANGUAGE_CODES_FILE)]
            }
            DataSetKind::CountryInfo => vec![SourceFile::plain(base_url, COUNTRY_INFO_FILE)],
            DataSetKind::AlternateNames if countries.is_empty() => vec![SourceFile::zipped(
                base_url,
                ALL_ALTERNATE_NAMES,
                ALL_ALTERNATE_NAMES,
            )],
            DataSetKind::AlternateNames => countries
                .iter()
                .map(|cc| SourceFile::zipped(base_url, &format!("{ALTERNATE_NAMES_DIR}/{cc}"), cc))
                .collect(),
            DataSetKind::Geonames if countries.is_empty() => {
                vec![SourceFile::zipped(base_url, ALL_COUNTRIES, ALL_COUNTRIES)]
            }
            DataSetKind::Geonames => countries
                .iter()
                .map(|cc| SourceFile::zipped(base_url, cc, cc))
                .collect(),
        };
        Self {
            kind,
            sources,
            strategy: kind.strategy(),
        }
    }
}
