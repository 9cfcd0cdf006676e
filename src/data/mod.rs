pub mod catalog;
pub mod damage_type;
pub mod filter;
pub mod special;
pub mod validate;

pub use catalog::{load_catalog, read_catalog, Catalog, CatalogEntry, CatalogError, DEFAULT_CATALOG_PATH};
pub use damage_type::{DamageType, Multipliers, UnknownDamageType, NEWEST_GENERATION};
pub use filter::{CatalogFilter, FilterOptions, FilteredCatalog, FossilPolicy};
pub use special::SpecialClasses;
pub use validate::{check_catalog, validate_catalog, ValidationReport, ValidationSeverity};
