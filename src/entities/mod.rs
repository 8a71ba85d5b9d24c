//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod alternate_name;
pub mod continent;
pub mod country_info;
pub mod feature_class;
pub mod feature_code;
pub mod geoname;
pub mod iso_language_code;
pub mod log;
pub mod settings;

// Re-export specific types to avoid conflicts
pub use alternate_name::{Entity as AlternateName, Model as AlternateNameModel};
pub use continent::{Entity as Continent, Model as ContinentModel};
pub use country_info::{Entity as CountryInfo, Model as CountryInfoModel};
pub use feature_class::{Entity as FeatureClass, Model as FeatureClassModel};
pub use feature_code::{Entity as FeatureCode, Model as FeatureCodeModel};
pub use geoname::{Entity as Geoname, Model as GeonameModel};
pub use iso_language_code::{Entity as IsoLanguageCode, Model as IsoLanguageCodeModel};
pub use log::{Entity as Log, Model as LogModel};
pub use settings::{
    Column as SettingsColumn, Entity as Settings, InstallStatus, Model as SettingsModel,
};
