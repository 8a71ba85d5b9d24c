//! Typed records for every GeoNames export, with their column layouts.
//!
//! Each record knows how to build itself from the source fields ([`RowLayout`]) and how to
//! become a row of its table ([`TableRecord`]). Field order follows the published GeoNames
//! layouts exactly.

use crate::{
    core::{
        loader::TableRecord,
        normalize::{RowLayout, coerce_flag, coerce_float, coerce_i32, coerce_int},
    },
    entities::{
        alternate_name, continent, country_info, feature_class, feature_code, geoname,
        iso_language_code,
    },
};
use sea_orm::{ActiveValue::NotSet, Set, prelude::DateTimeUtc};

/// One row of `countryInfo.txt`.
///
/// Sample row:
/// `AD  AND  020  AN  Andorra  Andorra la Vella  468  77006  EU  .ad  EUR  Euro  376  AD###  ^(?:AD)*(\d{3})$  ca  3041565  ES,FR`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryInfoRecord {
    pub geonameid: i64,
    pub iso2_code: String,
    pub iso3_code: String,
    pub iso_numeric: String,
    pub fips_code: String,
    pub country_name: String,
    pub capital_city: String,
    pub area_sq_km: i64,
    pub population: i64,
    pub continent: String,
    pub tld: String,
    pub currency_code: String,
    pub currency_name: String,
    pub phone_format: String,
    pub postal_code_format: String,
    pub postal_code_regex: String,
    pub languages: String,
    pub neighbours: String,
    pub equivalent_fips_code: String,
}

impl RowLayout for CountryInfoRecord {
    type Record = Self;
    const FIELD_COUNT: usize = 19;

    fn from_fields(fields: &[&str]) -> Self {
        Self {
            iso2_code: fields[0].to_owned(),
            iso3_code: fields[1].to_owned(),
            iso_numeric: fields[2].to_owned(),
            fips_code: fields[3].to_owned(),
            country_name: fields[4].to_owned(),
            capital_city: fields[5].to_owned(),
            area_sq_km: coerce_int(fields[6]),
            population: coerce_int(fields[7]),
            continent: fields[8].to_owned(),
            tld: fields[9].to_owned(),
            currency_code: fields[10].to_owned(),
            currency_name: fields[11].to_owned(),
            phone_format: fields[12].to_owned(),
            postal_code_format: fields[13].to_owned(),
            postal_code_regex: fields[14].to_owned(),
            languages: fields[15].to_owned(),
            geonameid: coerce_int(fields[16]),
            neighbours: fields[17].to_owned(),
            equivalent_fips_code: fields[18].to_owned(),
        }
    }
}

impl TableRecord for CountryInfoRecord {
    type Entity = country_info::Entity;
    type ActiveModel = country_info::ActiveModel;

    fn into_active_model(self, loaded_at: DateTimeUtc) -> Self::ActiveModel {
        country_info::ActiveModel {
            geonameid: Set(self.geonameid),
            iso2_code: Set(self.iso2_code),
            iso3_code: Set(self.iso3_code),
            iso_numeric: Set(self.iso_numeric),
            fips_code: Set(self.fips_code),
            country_name: Set(self.country_name),
            capital_city: Set(self.capital_city),
            area_sq_km: Set(self.area_sq_km),
            population: Set(self.population),
            continent: Set(self.continent),
            tld: Set(self.tld),
            currency_code: Set(self.currency_code),
            currency_name: Set(self.currency_name),
            phone_format: Set(self.phone_format),
            postal_code_format: Set(self.postal_code_format),
            postal_code_regex: Set(self.postal_code_regex),
            languages: Set(self.languages),
            neighbours: Set(self.neighbours),
            equivalent_fips_code: Set(self.equivalent_fips_code),
            created_at: Set(loaded_at),
            updated_at: Set(None),
        }
    }
}

/// One row of `alternateNames.txt` (or a per-country `alternatenames/XX.txt`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlternateNameRecord {
    pub alternate_name_id: i64,
    pub geonameid: i64,
    pub isolanguage: String,
    pub alternate_name: String,
    pub is_preferred_name: bool,
    pub is_short_name: bool,
    pub is_colloquial: bool,
    pub is_historic: bool,
}

impl RowLayout for AlternateNameRecord {
    type Record = Self;
    const FIELD_COUNT: usize = 8;

    /// The V2 dumps append `from` and `to` period columns; those are discarded.
    fn accepts(found: usize) -> bool {
        found == Self::FIELD_COUNT || found == Self::FIELD_COUNT + 2
    }

    fn from_fields(fields: &[&str]) -> Self {
        Self {
            alternate_name_id: coerce_int(fields[0]),
            geonameid: coerce_int(fields[1]),
            isolanguage: fields[2].to_owned(),
            alternate_name: fields[3].to_owned(),
            is_preferred_name: coerce_flag(fields[4]),
            is_short_name: coerce_flag(fields[5]),
            is_colloquial: coerce_flag(fields[6]),
            is_historic: coerce_flag(fields[7]),
        }
    }
}

impl TableRecord for AlternateNameRecord {
    type Entity = alternate_name::Entity;
    type ActiveModel = alternate_name::ActiveModel;

    fn into_active_model(self, loaded_at: DateTimeUtc) -> Self::ActiveModel {
        alternate_name::ActiveModel {
            alternate_name_id: Set(self.alternate_name_id),
            geonameid: Set(self.geonameid),
            isolanguage: Set(self.isolanguage),
            alternate_name: Set(self.alternate_name),
            is_preferred_name: Set(self.is_preferred_name),
            is_short_name: Set(self.is_short_name),
            is_colloquial: Set(self.is_colloquial),
            is_historic: Set(self.is_historic),
            created_at: Set(loaded_at),
            updated_at: Set(None),
        }
    }
}

/// One row of `allCountries.txt` (or a per-country `XX.txt`).
#[derive(Debug, Clone, PartialEq)]
pub struct GeonameRecord {
    pub geonameid: i64,
    pub name: String,
    pub asciiname: String,
    pub alternatenames: String,
    pub latitude: f64,
    pub longitude: f64,
    pub feature_class: String,
    pub feature_code: String,
    pub country_code: String,
    pub cc2: String,
    pub admin1_code: String,
    pub admin2_code: String,
    pub admin3_code: String,
    pub admin4_code: String,
    pub population: i64,
    pub elevation: Option<i32>,
    pub dem: i32,
    pub timezone: String,
    pub modification_date: String,
}

impl RowLayout for GeonameRecord {
    type Record = Self;
    const FIELD_COUNT: usize = 19;

    fn from_fields(fields: &[&str]) -> Self {
        Self {
            geonameid: coerce_int(fields[0]),
            name: fields[1].to_owned(),
            asciiname: fields[2].to_owned(),
            alternatenames: fields[3].to_owned(),
            latitude: coerce_float(fields[4]),
            longitude: coerce_float(fields[5]),
            feature_class: fields[6].to_owned(),
            feature_code: fields[7].to_owned(),
            country_code: fields[8].to_owned(),
            cc2: fields[9].to_owned(),
            admin1_code: fields[10].to_owned(),
            admin2_code: fields[11].to_owned(),
            admin3_code: fields[12].to_owned(),
            admin4_code: fields[13].to_owned(),
            population: coerce_int(fields[14]),
            elevation: Some(fields[15].trim())
                .filter(|value| !value.is_empty())
                .map(coerce_i32),
            dem: coerce_i32(fields[16]),
            timezone: fields[17].to_owned(),
            modification_date: fields[18].to_owned(),
        }
    }
}

impl TableRecord for GeonameRecord {
    type Entity = geoname::Entity;
    type ActiveModel = geoname::ActiveModel;

    fn into_active_model(self, loaded_at: DateTimeUtc) -> Self::ActiveModel {
        geoname::ActiveModel {
            geonameid: Set(self.geonameid),
            name: Set(self.name),
            asciiname: Set(self.asciiname),
            alternatenames: Set(self.alternatenames),
            latitude: Set(self.latitude),
            longitude: Set(self.longitude),
            feature_class: Set(self.feature_class),
            feature_code: Set(self.feature_code),
            country_code: Set(self.country_code),
            cc2: Set(self.cc2),
            admin1_code: Set(self.admin1_code),
            admin2_code: Set(self.admin2_code),
            admin3_code: Set(self.admin3_code),
            admin4_code: Set(self.admin4_code),
            population: Set(self.population),
            elevation: Set(self.elevation),
            dem: Set(self.dem),
            timezone: Set(self.timezone),
            modification_date: Set(self.modification_date),
            created_at: Set(loaded_at),
            updated_at: Set(None),
        }
    }
}

/// One row of `featureCodes_en.txt`, e.g. `A.ADM1  first-order administrative division  ...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureCodeRecord {
    pub code: String,
    pub feature_class: String,
    pub feature_code: String,
    pub name: String,
    pub description: String,
}

impl RowLayout for FeatureCodeRecord {
    type Record = Self;
    const FIELD_COUNT: usize = 3;

    fn from_fields(fields: &[&str]) -> Self {
        // "null" rows have no class part
        let (feature_class, feature_code) =
            fields[0].split_once('.').unwrap_or(("", fields[0]));
        Self {
            code: fields[0].to_owned(),
            feature_class: feature_class.to_owned(),
            feature_code: feature_code.to_owned(),
            name: fields[1].to_owned(),
            description: fields[2].to_owned(),
        }
    }
}

impl TableRecord for FeatureCodeRecord {
    type Entity = feature_code::Entity;
    type ActiveModel = feature_code::ActiveModel;

    fn into_active_model(self, loaded_at: DateTimeUtc) -> Self::ActiveModel {
        feature_code::ActiveModel {
            code: Set(self.code),
            feature_class: Set(self.feature_class),
            feature_code: Set(self.feature_code),
            name: Set(self.name),
            description: Set(self.description),
            created_at: Set(loaded_at),
            updated_at: Set(None),
        }
    }
}

/// One row of `iso-languagecodes.txt`. The file opens with an unmarked title line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IsoLanguageCodeRecord {
    pub iso_639_3: String,
    pub iso_639_2: String,
    pub iso_639_1: String,
    pub language_name: String,
}

impl RowLayout for IsoLanguageCodeRecord {
    type Record = Self;
    const FIELD_COUNT: usize = 4;
    const HEADER_LINES: usize = 1;

    fn from_fields(fields: &[&str]) -> Self {
        Self {
            iso_639_3: fields[0].to_owned(),
            iso_639_2: fields[1].to_owned(),
            iso_639_1: fields[2].to_owned(),
            language_name: fields[3].to_owned(),
        }
    }
}

impl TableRecord for IsoLanguageCodeRecord {
    type Entity = iso_language_code::Entity;
    type ActiveModel = iso_language_code::ActiveModel;

    fn into_active_model(self, loaded_at: DateTimeUtc) -> Self::ActiveModel {
        iso_language_code::ActiveModel {
            id: NotSet,
            iso_639_3: Set(self.iso_639_3),
            iso_639_2: Set(self.iso_639_2),
            iso_639_1: Set(self.iso_639_1),
            language_name: Set(self.language_name),
            created_at: Set(loaded_at),
            updated_at: Set(None),
        }
    }
}

/// A top level feature class. These are not published as a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureClassRecord {
    pub class: &'static str,
    pub description: &'static str,
}

impl TableRecord for FeatureClassRecord {
    type Entity = feature_class::Entity;
    type ActiveModel = feature_class::ActiveModel;

    fn into_active_model(self, loaded_at: DateTimeUtc) -> Self::ActiveModel {
        feature_class::ActiveModel {
            class: Set(self.class.to_owned()),
            description: Set(self.description.to_owned()),
            created_at: Set(loaded_at),
            updated_at: Set(None),
        }
    }
}

/// A continent seed row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinentRecord {
    pub geonameid: i64,
    pub code: &'static str,
    pub name: &'static str,
}

impl TableRecord for ContinentRecord {
    type Entity = continent::Entity;
    type ActiveModel = continent::ActiveModel;

    fn into_active_model(self, _loaded_at: DateTimeUtc) -> Self::ActiveModel {
        continent::ActiveModel {
            geonameid: Set(self.geonameid),
            code: Set(self.code.to_owned()),
            name: Set(self.name.to_owned()),
        }
    }
}
