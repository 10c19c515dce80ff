use std::collections::HashMap;

use tokio::sync::RwLock;

use ecoswap_core::domain::product::{EcoAssessment, Product, ProductId};
use ecoswap_core::sources::{CatalogSource, EcoScoreSource, ProductSource, SourceError};

#[derive(Default)]
pub struct InMemoryProductSource {
    products: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductSource {
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|product| (product.id.clone(), product)).collect();
        Self { products: RwLock::new(products) }
    }

    pub async fn insert(&self, product: Product) {
        let mut products = self.products.write().await;
        products.insert(product.id.clone(), product);
    }

    /// Delists a product; carts still referencing it stop resolving.
    pub async fn remove(&self, id: &ProductId) -> Option<Product> {
        let mut products = self.products.write().await;
        products.remove(id)
    }
}

#[async_trait::async_trait]
impl ProductSource for InMemoryProductSource {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, SourceError> {
        let products = self.products.read().await;
        Ok(products.get(id).cloned())
    }
}

/// Candidate snapshot in insertion order, which is also the matcher's tie-break order.
#[derive(Default)]
pub struct InMemoryCatalogSource {
    candidates: RwLock<Vec<Product>>,
}

impl InMemoryCatalogSource {
    pub fn from_products(candidates: impl IntoIterator<Item = Product>) -> Self {
        Self { candidates: RwLock::new(candidates.into_iter().collect()) }
    }

    /// Appends a candidate, or replaces the one with the same id in place.
    pub async fn upsert(&self, product: Product) {
        let mut candidates = self.candidates.write().await;
        match candidates.iter_mut().find(|existing| existing.id == product.id) {
            Some(existing) => *existing = product,
            None => candidates.push(product),
        }
    }
}

#[async_trait::async_trait]
impl CatalogSource for InMemoryCatalogSource {
    async fn list_candidates(&self) -> Result<Vec<Product>, SourceError> {
        let candidates = self.candidates.read().await;
        Ok(candidates.clone())
    }
}

#[derive(Default)]
pub struct InMemoryEcoScoreSource {
    assessments: RwLock<HashMap<ProductId, EcoAssessment>>,
}

impl InMemoryEcoScoreSource {
    /// Seeds assessments from the score and breakdown each product already carries.
    pub fn from_products<'a>(products: impl IntoIterator<Item = &'a Product>) -> Self {
        let assessments = products
            .into_iter()
            .map(|product| {
                let assessment = EcoAssessment {
                    score: product.eco_score,
                    breakdown: product.breakdown.clone(),
                };
                (product.id.clone(), assessment)
            })
            .collect();
        Self { assessments: RwLock::new(assessments) }
    }

    pub async fn set(&self, id: ProductId, assessment: EcoAssessment) {
        let mut assessments = self.assessments.write().await;
        assessments.insert(id, assessment);
    }

    pub async fn remove(&self, id: &ProductId) -> Option<EcoAssessment> {
        let mut assessments = self.assessments.write().await;
        assessments.remove(id)
    }
}

#[async_trait::async_trait]
impl EcoScoreSource for InMemoryEcoScoreSource {
    async fn get_eco_score(&self, id: &ProductId) -> Result<Option<EcoAssessment>, SourceError> {
        let assessments = self.assessments.read().await;
        Ok(assessments.get(id).cloned())
    }
}
