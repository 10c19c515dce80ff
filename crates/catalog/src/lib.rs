pub mod fixtures;
pub mod memory;

pub use fixtures::{SeedCatalog, SeedSources};
pub use memory::{InMemoryCatalogSource, InMemoryEcoScoreSource, InMemoryProductSource};
