//! Fuzzy catalog search
//!
//! A [`CatalogIndex`] is built once per analysis run from a candidate snapshot and answers
//! repeated queries without being mutated. Each candidate is keyed by its `name`, `material` and
//! `brand` fields and compared token by token with normalized Levenshtein similarity. A candidate
//! qualifies when at least one field falls within the fuzziness threshold, and its relevance is
//! the weighted average over the qualifying fields only.

mod index;
mod matcher;

pub use index::{CatalogIndex, FieldWeights, SearchSettings};
pub use matcher::{MatchHit, Matches};

/// Fuzziness threshold: `0.0` accepts exact field matches only, `1.0` accepts anything.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Equal weights for all three keyed fields.
pub const DEFAULT_FIELD_WEIGHTS: FieldWeights =
    FieldWeights { name: 1.0, material: 1.0, brand: 1.0 };

/// Lowercases and splits on anything that is not alphanumeric.
pub(crate) fn tokenize(text: &str) -> Vec<String> {
    text.split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::tokenize;

    #[test]
    fn tokenize_lowercases_and_drops_punctuation() {
        assert_eq!(
            tokenize("Eco-Brush  Bamboo/Toothbrush (x2)"),
            vec!["eco", "brush", "bamboo", "toothbrush", "x2"]
        );
        assert!(tokenize("  -- ").is_empty());
    }
}
