//! Collaborators the engine reads from. Implementations live outside the core; the
//! `ecoswap-catalog` crate ships in-memory ones.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::product::{EcoAssessment, Product, ProductId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    Unavailable(String),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Authoritative product records, looked up by identity.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, SourceError>;
}

/// Snapshot of products eligible to be proposed as substitutes.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn list_candidates(&self) -> Result<Vec<Product>, SourceError>;
}

/// Current eco-score and breakdown for a product. `None` means the service has no score.
#[async_trait]
pub trait EcoScoreSource: Send + Sync {
    async fn get_eco_score(&self, id: &ProductId) -> Result<Option<EcoAssessment>, SourceError>;
}
