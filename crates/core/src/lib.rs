pub mod analyzer;
pub mod config;
pub mod domain;
pub mod errors;
pub mod impact;
pub mod search;
pub mod selector;
pub mod sources;

pub use analyzer::{find_greener_alternatives, AnalysisSettings, CartAnalyzer};
pub use domain::cart::{Cart, CartItem};
pub use domain::matches::{AlternativeMatch, AnalysisReport, RunId};
pub use domain::product::{Breakdown, EcoAssessment, EcoGrade, EcoScore, Product, ProductId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use impact::{
    summarize, ImpactAggregator, ImpactFallbacks, ImpactSummary, ALREADY_OPTIMIZED_MESSAGE,
};
pub use search::{CatalogIndex, FieldWeights, MatchHit, Matches, SearchSettings};
pub use selector::SubstituteSelector;
pub use sources::{CatalogSource, EcoScoreSource, ProductSource, SourceError};
