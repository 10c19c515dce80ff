use crate::domain::product::Product;
use crate::errors::ApplicationError;

use super::tokenize;

/// Relative weight of each keyed field in the relevance score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub name: f64,
    pub material: f64,
    pub brand: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        super::DEFAULT_FIELD_WEIGHTS
    }
}

impl FieldWeights {
    pub(super) fn as_array(&self) -> [f64; FIELD_COUNT] {
        [self.name, self.material, self.brand]
    }

    pub fn is_valid(&self) -> bool {
        let weights = self.as_array();
        weights.iter().all(|weight| weight.is_finite() && *weight >= 0.0)
            && weights.iter().sum::<f64>() > 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    /// Maximum per-field distance (`1 - similarity`) for a candidate to qualify.
    pub threshold: f64,
    pub weights: FieldWeights,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { threshold: super::DEFAULT_THRESHOLD, weights: FieldWeights::default() }
    }
}

impl SearchSettings {
    pub fn validate(&self) -> Result<(), ApplicationError> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ApplicationError::Configuration(format!(
                "search threshold {} is outside 0.0..=1.0",
                self.threshold
            )));
        }
        if !self.weights.is_valid() {
            return Err(ApplicationError::Configuration(
                "search field weights must be finite and non-negative with a positive sum"
                    .to_owned(),
            ));
        }
        Ok(())
    }
}

pub(super) const FIELD_COUNT: usize = 3;

#[derive(Debug, Clone)]
pub(super) struct IndexedEntry {
    pub(super) product: Product,
    /// Tokens of `name`, `material`, `brand`, in that order.
    pub(super) fields: [Vec<String>; FIELD_COUNT],
}

/// Read-only search structure over one candidate snapshot.
#[derive(Debug, Clone)]
pub struct CatalogIndex {
    pub(super) entries: Vec<IndexedEntry>,
    pub(super) settings: SearchSettings,
}

impl CatalogIndex {
    pub fn build(candidates: impl IntoIterator<Item = Product>) -> Self {
        Self::index(candidates, SearchSettings::default())
    }

    /// Rejects a threshold outside `0.0..=1.0` (including NaN) and invalid weights.
    pub fn build_with(
        candidates: impl IntoIterator<Item = Product>,
        settings: SearchSettings,
    ) -> Result<Self, ApplicationError> {
        settings.validate()?;
        Ok(Self::index(candidates, settings))
    }

    fn index(candidates: impl IntoIterator<Item = Product>, settings: SearchSettings) -> Self {
        let entries = candidates
            .into_iter()
            .map(|product| {
                let fields = [
                    tokenize(&product.name),
                    tokenize(&product.material),
                    tokenize(&product.brand),
                ];
                IndexedEntry { product, fields }
            })
            .collect();

        Self { entries, settings }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    pub fn products(&self) -> impl Iterator<Item = &Product> {
        self.entries.iter().map(|entry| &entry.product)
    }
}
