use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::Product;
use crate::impact::ImpactSummary;

/// One cart item paired with the substitute chosen for it, if any.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlternativeMatch {
    pub original: Product,
    pub alternative: Option<Product>,
}

impl AlternativeMatch {
    pub fn new(original: Product, alternative: Option<Product>) -> Self {
        Self { original, alternative }
    }

    pub fn has_alternative(&self) -> bool {
        self.alternative.is_some()
    }

    /// Eco-score points gained by switching, if a substitute exists.
    pub fn score_gain(&self) -> Option<i16> {
        self.alternative.as_ref().map(|alternative| {
            i16::from(alternative.eco_score.value()) - i16::from(self.original.eco_score.value())
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub String);

impl RunId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisReport {
    pub run_id: RunId,
    pub generated_at: DateTime<Utc>,
    pub matches: Vec<AlternativeMatch>,
    pub summary: ImpactSummary,
}

impl AnalysisReport {
    pub fn switched_items(&self) -> usize {
        self.matches.iter().filter(|pairing| pairing.has_alternative()).count()
    }
}
