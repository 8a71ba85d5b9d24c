//! Static reference data that GeoNames does not publish as a file.

use crate::{
    core::{
        loader::replace_rows,
        records::{ContinentRecord, FeatureClassRecord},
    },
    errors::Result,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use tracing::{info, instrument};

/// The nine top level feature classes.
pub const FEATURE_CLASSES: [FeatureClassRecord; 9] = [
    FeatureClassRecord { class: "A", description: "country, state, region,..." },
    FeatureClassRecord { class: "H", description: "stream, lake, ..." },
    FeatureClassRecord { class: "L", description: "parks,area, ..." },
    FeatureClassRecord { class: "P", description: "city, village,..." },
    FeatureClassRecord { class: "R", description: "road, railroad" },
    FeatureClassRecord { class: "S", description: "spot, building, farm" },
    FeatureClassRecord { class: "T", description: "mountain,hill,rock,..." },
    FeatureClassRecord { class: "U", description: "undersea" },
    FeatureClassRecord { class: "V", description: "forest,heath,..." },
];

/// Continent codes with their GeoNames ids.
pub const CONTINENTS: [ContinentRecord; 7] = [
    ContinentRecord { geonameid: 6_255_146, code: "AF", name: "Africa" },
    ContinentRecord { geonameid: 6_255_147, code: "AS", name: "Asia" },
    ContinentRecord { geonameid: 6_255_148, code: "EU", name: "Europe" },
    ContinentRecord { geonameid: 6_255_149, code: "NA", name: "North America" },
    ContinentRecord { geonameid: 6_255_151, code: "OC", name: "Oceania" },
    ContinentRecord { geonameid: 6_255_150, code: "SA", name: "South America" },
    ContinentRecord { geonameid: 6_255_152, code: "AN", name: "Antarctica" },
];

/// Writes the continent rows. Running it again leaves exactly the same seven rows.
#[instrument(skip(db))]
pub async fn seed_continents(db: &DatabaseConnection) -> Result<u64> {
    let seeded = replace_rows(db, CONTINENTS.to_vec(), Utc::now()).await?;
    info!("Seeded {} continents", seeded);
    Ok(seeded)
}
