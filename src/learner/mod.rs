pub mod bkt;
pub mod catalog;
pub mod types;

pub use bkt::{BktConfig, CorrectPosterior};
pub use catalog::{CatalogDiagnostics, CatalogError, SkillCatalog};
pub use types::*;
