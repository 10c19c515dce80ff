//! Sustainability-improvement policy applied to ranked matcher output.

use crate::domain::product::Product;

/// Eco-score points a substitute must beat the original by (exclusive).
pub const DEFAULT_IMPROVEMENT_MARGIN: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstituteSelector {
    improvement_margin: u8,
}

impl Default for SubstituteSelector {
    fn default() -> Self {
        Self::new(DEFAULT_IMPROVEMENT_MARGIN)
    }
}

impl SubstituteSelector {
    pub fn new(improvement_margin: u8) -> Self {
        Self { improvement_margin }
    }

    pub fn improvement_margin(&self) -> u8 {
        self.improvement_margin
    }

    /// First candidate, in similarity order, whose eco-score clears the margin. Candidates are
    /// not filtered by identity here.
    pub fn select<'a, I>(&self, original: &Product, ranked_candidates: I) -> Option<&'a Product>
    where
        I: IntoIterator<Item = &'a Product>,
    {
        ranked_candidates.into_iter().find(|candidate| self.qualifies(original, candidate))
    }

    pub fn qualifies(&self, original: &Product, candidate: &Product) -> bool {
        candidate.eco_score.exceeds_by(original.eco_score, self.improvement_margin)
    }
}
