//! Building catalogue the simulator publishes for.

use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UniversityBuilding {
    pub building: String,
    pub building_code: String,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AccommodationBuilding {
    pub building: String,
    #[serde(default)]
    pub building_code: String,
    #[serde(default)]
    pub total_flats: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BuildingCatalog {
    #[serde(default)]
    pub university_buildings: Vec<UniversityBuilding>,
    #[serde(default)]
    pub accommodation_buildings: Vec<AccommodationBuilding>,
}

/// One metered building or flat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Meter {
    pub name: String,
    pub code: String,
    pub zone: String,
}

impl BuildingCatalog {
    /// Read the catalogue; a missing or malformed file yields an empty one.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Building catalogue not found");
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(catalog) => catalog,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Building catalogue is malformed");
                Self::default()
            }
        }
    }

    /// Every university building, then every accommodation flat.
    pub fn meters(&self) -> Vec<Meter> {
        let buildings = self.university_buildings.iter().map(|b| Meter {
            name: b.building.clone(),
            code: b.building_code.clone(),
            zone: b.zone.clone(),
        });
        let flats = self.accommodation_buildings.iter().flat_map(|b| {
            (1..=b.total_flats).map(move |n| Meter {
                name: format!("{} Flat {}", b.building, n),
                code: b.building_code.clone(),
                zone: String::new(),
            })
        });
        buildings.chain(flats).collect()
    }
}
