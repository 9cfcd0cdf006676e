//! Catalog dataset: one CSV row per creature with its base stat total and `against_*` multipliers.

use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::damage_type::{DamageType, Multipliers};

pub const DEFAULT_CATALOG_PATH: &str = "data/pokemon.csv";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed catalog row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("catalog row {row} has no name")]
    MissingName { row: usize },
}

/// One creature from the dataset. `id` is the row position in the unfiltered catalog
/// and stays stable through filtering.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogEntry {
    pub id: usize,
    pub name: String,
    pub pokedex_number: Option<u32>,
    pub type1: String,
    pub type2: Option<String>,
    pub base_total: f64,
    pub generation: u8,
    pub is_legendary: bool,
    pub is_starter: bool,
    pub is_fossil: bool,
    pub is_pseudo_legendary: bool,
    pub multipliers: Multipliers,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find_by_name(&self, name: &str) -> Option<&CatalogEntry> {
        let wanted = name.trim().to_lowercase();
        self.entries.iter().find(|entry| entry.name == wanted)
    }

    /// Highest generation present, used to pick the category set when no cap is given.
    pub fn max_generation(&self) -> Option<u8> {
        self.entries.iter().map(|entry| entry.generation).max()
    }
}

/// Raw CSV row. Columns not listed here (abilities, hp, ...) are ignored.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    name: String,
    #[serde(default)]
    pokedex_number: Option<u32>,
    type1: String,
    #[serde(default)]
    type2: Option<String>,
    base_total: f64,
    generation: u8,
    #[serde(default)]
    is_legendary: Option<u8>,
    #[serde(default)]
    is_starter: Option<u8>,
    #[serde(default)]
    is_fossil: Option<u8>,
    #[serde(default)]
    is_pseudo_legendary: Option<u8>,
    against_bug: f64,
    against_dark: f64,
    against_dragon: f64,
    against_electric: f64,
    against_fairy: f64,
    against_fight: f64,
    against_fire: f64,
    against_flying: f64,
    against_ghost: f64,
    against_grass: f64,
    against_ground: f64,
    against_ice: f64,
    against_normal: f64,
    against_poison: f64,
    against_psychic: f64,
    against_rock: f64,
    against_steel: f64,
    against_water: f64,
}

impl CatalogRow {
    fn into_entry(self, id: usize) -> CatalogEntry {
        let mut multipliers = Multipliers::default();
        for (damage_type, value) in [
            (DamageType::Bug, self.against_bug),
            (DamageType::Dark, self.against_dark),
            (DamageType::Dragon, self.against_dragon),
            (DamageType::Electric, self.against_electric),
            (DamageType::Fairy, self.against_fairy),
            (DamageType::Fighting, self.against_fight),
            (DamageType::Fire, self.against_fire),
            (DamageType::Flying, self.against_flying),
            (DamageType::Ghost, self.against_ghost),
            (DamageType::Grass, self.against_grass),
            (DamageType::Ground, self.against_ground),
            (DamageType::Ice, self.against_ice),
            (DamageType::Normal, self.against_normal),
            (DamageType::Poison, self.against_poison),
            (DamageType::Psychic, self.against_psychic),
            (DamageType::Rock, self.against_rock),
            (DamageType::Steel, self.against_steel),
            (DamageType::Water, self.against_water),
        ] {
            multipliers.set(damage_type, value);
        }

        CatalogEntry {
            id,
            name: self.name.trim().to_lowercase(),
            pokedex_number: self.pokedex_number,
            type1: self.type1.trim().to_lowercase(),
            type2: self
                .type2
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
            base_total: self.base_total,
            generation: self.generation,
            is_legendary: flag(self.is_legendary),
            is_starter: flag(self.is_starter),
            is_fossil: flag(self.is_fossil),
            is_pseudo_legendary: flag(self.is_pseudo_legendary),
            multipliers,
        }
    }
}

fn flag(raw: Option<u8>) -> bool {
    raw.is_some_and(|value| value != 0)
}

/// Parse a catalog from any CSV reader (header row required).
pub fn read_catalog<R: Read>(reader: R) -> Result<Catalog, CatalogError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut entries = Vec::new();
    for (row, record) in csv_reader.deserialize::<CatalogRow>().enumerate() {
        let parsed = record.map_err(|source| CatalogError::Csv { row, source })?;
        if parsed.name.trim().is_empty() {
            return Err(CatalogError::MissingName { row });
        }
        entries.push(parsed.into_entry(row));
    }
    tracing::debug!(entries = entries.len(), "catalog parsed");
    Ok(Catalog::new(entries))
}

pub fn load_catalog(path: impl AsRef<Path>) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| CatalogError::Read {
        path: path.display().to_string(),
        source,
    })?;
    read_catalog(file)
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub const HEADER: &str = "name,pokedex_number,type1,type2,base_total,generation,is_legendary,against_bug,against_dark,against_dragon,against_electric,against_fairy,against_fight,against_fire,against_flying,against_ghost,against_grass,against_ground,against_ice,against_normal,against_poison,against_psychic,against_rock,against_steel,against_water";

    pub const SMALL_CATALOG: &str = "name,pokedex_number,type1,type2,base_total,generation,is_legendary,against_bug,against_dark,against_dragon,against_electric,against_fairy,against_fight,against_fire,against_flying,against_ghost,against_grass,against_ground,against_ice,against_normal,against_poison,against_psychic,against_rock,against_steel,against_water
Charizard,6,fire,flying,534,1,0,0.25,1,1,2,0.5,0.5,0.5,1,1,0.25,0,1,1,1,1,4,0.5,2
Blastoise,9,water,,530,1,0,1,1,1,2,1,1,0.5,1,1,2,1,0.5,1,1,1,1,0.5,0.5
Mewtwo,150,psychic,,680,1,1,2,2,1,1,1,0.5,1,1,2,1,1,1,1,1,0.5,1,1,1
Omastar,139,rock,water,495,1,0,1,1,1,2,1,2,0.25,0.5,1,4,2,0.5,0.5,0.5,1,1,1,1
Tyranitar,248,rock,dark,600,2,0,2,0.5,1,1,2,4,0.5,0.5,0.5,2,2,1,0.5,0.5,0,1,2,2
";
}

#[cfg(test)]
mod tests {
    use super::fixtures::SMALL_CATALOG;
    use super::*;

    #[test]
    fn reads_rows_with_stable_ids_and_lowercase_names() {
        let catalog = read_catalog(SMALL_CATALOG.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 5);
        assert_eq!(catalog.entries[0].name, "charizard");
        assert_eq!(catalog.entries[0].id, 0);
        assert_eq!(catalog.entries[4].id, 4);
        assert_eq!(catalog.max_generation(), Some(2));
    }

    #[test]
    fn empty_second_type_is_none() {
        let catalog = read_catalog(SMALL_CATALOG.as_bytes()).unwrap();
        let blastoise = catalog.find_by_name("Blastoise").unwrap();
        assert_eq!(blastoise.type2, None);
        assert_eq!(catalog.entries[0].type2.as_deref(), Some("flying"));
    }

    #[test]
    fn maps_against_columns_to_damage_types() {
        let catalog = read_catalog(SMALL_CATALOG.as_bytes()).unwrap();
        let charizard = &catalog.entries[0];
        assert_eq!(charizard.multipliers.get(DamageType::Rock), 4.0);
        assert_eq!(charizard.multipliers.get(DamageType::Ground), 0.0);
        assert_eq!(charizard.multipliers.get(DamageType::Fighting), 0.5);
        assert!(catalog.entries[2].is_legendary);
        assert!(!charizard.is_starter, "flag columns are optional and default to false");
    }

    #[test]
    fn malformed_row_reports_position() {
        let raw = format!("{}\nbroken,1,fire,,not-a-number,1,0", super::fixtures::HEADER);
        let err = read_catalog(raw.as_bytes()).unwrap_err();
        assert!(matches!(err, CatalogError::Csv { row: 0, .. }), "got {err}");
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = load_catalog("data/does-not-exist.csv").unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
