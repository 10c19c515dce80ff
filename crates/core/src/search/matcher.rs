use strsim::normalized_levenshtein;

use crate::domain::product::Product;

use super::index::{CatalogIndex, FIELD_COUNT};
use super::tokenize;

/// Float slack so that a threshold of exactly `0.5` accepts a distance of exactly `0.5`.
const THRESHOLD_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchHit<'a> {
    pub product: &'a Product,
    /// Weighted similarity of the fields that matched, in `0.0..=1.0`.
    pub relevance: f64,
    /// 1-based position in the result order.
    pub rank: usize,
}

/// Query results, best match first. Iterating does not consume the results.
#[derive(Debug, Clone, Default)]
pub struct Matches<'a> {
    hits: Vec<MatchHit<'a>>,
}

impl<'a> Matches<'a> {
    pub fn iter(&self) -> std::slice::Iter<'_, MatchHit<'a>> {
        self.hits.iter()
    }

    pub fn products(&self) -> impl Iterator<Item = &'a Product> + '_ {
        self.hits.iter().map(|hit| hit.product)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

impl<'m, 'a> IntoIterator for &'m Matches<'a> {
    type Item = &'m MatchHit<'a>;
    type IntoIter = std::slice::Iter<'m, MatchHit<'a>>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.iter()
    }
}

impl CatalogIndex {
    /// Ranks indexed candidates against `text`. Ties keep catalog insertion order.
    pub fn query(&self, text: &str) -> Matches<'_> {
        let query_tokens = tokenize(text);
        if query_tokens.is_empty() || self.entries.is_empty() {
            return Matches::default();
        }

        let weights = self.settings.weights.as_array();
        let threshold = self.settings.threshold;

        let mut scored: Vec<(&Product, f64)> = self
            .entries
            .iter()
            .filter_map(|entry| {
                let similarities: [Option<f64>; FIELD_COUNT] = [
                    field_similarity(&entry.fields[0], &query_tokens, threshold),
                    field_similarity(&entry.fields[1], &query_tokens, threshold),
                    field_similarity(&entry.fields[2], &query_tokens, threshold),
                ];
                if similarities.iter().all(Option::is_none) {
                    return None;
                }

                Some((&entry.product, weighted_relevance(&similarities, &weights)))
            })
            .collect();

        // `sort_by` is stable, which keeps insertion order for equal relevance.
        scored.sort_by(|left, right| right.1.total_cmp(&left.1));

        let hits = scored
            .into_iter()
            .enumerate()
            .map(|(position, (product, relevance))| MatchHit {
                product,
                relevance,
                rank: position + 1,
            })
            .collect();

        Matches { hits }
    }
}

fn within_threshold(similarity: f64, threshold: f64) -> bool {
    1.0 - similarity <= threshold + THRESHOLD_EPSILON
}

/// Similarity of one keyed field to the query, or `None` when the field is empty or falls
/// outside the threshold.
///
/// Each field token takes its best similarity against any query token. The field qualifies when
/// the mean over all of its tokens is within the threshold. Its score is then the mean over only
/// the tokens that are within the threshold on their own, so extra descriptive words on a
/// candidate ("Recycled Steel Water Bottle") neither raise nor lower its relevance.
fn field_similarity(
    field_tokens: &[String],
    query_tokens: &[String],
    threshold: f64,
) -> Option<f64> {
    if field_tokens.is_empty() {
        return None;
    }

    let best: Vec<f64> = field_tokens
        .iter()
        .map(|field_token| {
            query_tokens
                .iter()
                .map(|query_token| normalized_levenshtein(field_token, query_token))
                .fold(0.0, f64::max)
        })
        .collect();

    let overall = best.iter().sum::<f64>() / best.len() as f64;
    if !within_threshold(overall, threshold) {
        return None;
    }

    let (total, matched) = best
        .iter()
        .filter(|similarity| within_threshold(**similarity, threshold))
        .fold((0.0_f64, 0usize), |(total, matched), similarity| (total + *similarity, matched + 1));
    if matched == 0 {
        return Some(overall);
    }
    Some(total / matched as f64)
}

/// Weighted mean over the qualifying fields only; a field that missed the threshold costs the
/// candidate nothing.
fn weighted_relevance(
    similarities: &[Option<f64>; FIELD_COUNT],
    weights: &[f64; FIELD_COUNT],
) -> f64 {
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for (similarity, weight) in similarities.iter().zip(weights.iter()) {
        if let Some(similarity) = similarity {
            weighted += similarity * weight;
            total_weight += weight;
        }
    }

    if total_weight > 0.0 {
        (weighted / total_weight).min(1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::product::{EcoScore, Product};
    use crate::search::{CatalogIndex, FieldWeights, SearchSettings};

    fn product(id: &str, name: &str, material: &str, brand: &str) -> Product {
        Product::new(id, name, brand, material, EcoScore::new(50).expect("score"))
    }

    fn catalog() -> Vec<Product> {
        vec![
            product("steel-bottle", "Steel Water Bottle", "Steel", "Hydro"),
            product("bamboo-brush", "Bamboo Toothbrush", "Bamboo", "EcoBrush"),
            product("corn-brush", "Compostable Toothbrush", "Cornstarch", "GreenSmile"),
            product("cotton-tote", "Organic Cotton Tote Bag", "Organic Cotton", "TerraCarry"),
        ]
    }

    fn ids<'a>(matches: &'a crate::search::Matches<'_>) -> Vec<&'a str> {
        matches.products().map(|product| product.id.as_str()).collect()
    }

    #[test]
    fn query_ranks_similar_products_and_drops_unrelated_ones() {
        let index = CatalogIndex::build(catalog());
        let matches = index.query("Plastic Toothbrush Plastic X");

        // Both names match on "toothbrush"; only the bamboo brush's brand ("ecobrush") also
        // qualifies, and its weaker similarity pulls that candidate's mean down.
        assert_eq!(ids(&matches), vec!["corn-brush", "bamboo-brush"]);
        let ranks: Vec<usize> = matches.iter().map(|hit| hit.rank).collect();
        assert_eq!(ranks, vec![1, 2]);
        assert!(matches.iter().all(|hit| (0.0..=1.0).contains(&hit.relevance)));
    }

    #[test]
    fn identical_fields_score_full_relevance() {
        let mut candidates = catalog();
        candidates.push(product("plastic-brush", "Plastic Toothbrush", "Plastic", "X"));
        let index = CatalogIndex::build(candidates);

        let matches = index.query("Plastic Toothbrush Plastic X");
        let identical = matches
            .iter()
            .find(|hit| hit.product.id.as_str() == "plastic-brush")
            .expect("identical product matches");

        assert!((identical.relevance - 1.0).abs() < 1e-9);
        assert!(matches.iter().all(|hit| hit.relevance <= identical.relevance));
    }

    #[test]
    fn ties_keep_catalog_insertion_order() {
        let index = CatalogIndex::build(vec![
            product("first", "Bamboo Toothbrush", "Bamboo", "EcoBrush"),
            product("second", "Bamboo Toothbrush", "Bamboo", "EcoBrush"),
            product("third", "Bamboo Toothbrush", "Bamboo", "EcoBrush"),
        ]);

        let matches = index.query("Bamboo Toothbrush Bamboo EcoBrush");
        assert_eq!(ids(&matches), vec!["first", "second", "third"]);
    }

    #[test]
    fn results_are_restartable() {
        let index = CatalogIndex::build(catalog());
        let matches = index.query("Bamboo Toothbrush");

        let first_pass: Vec<_> = matches.products().map(|product| product.id.clone()).collect();
        let second_pass: Vec<_> =
            (&matches).into_iter().map(|hit| hit.product.id.clone()).collect();
        assert_eq!(first_pass, second_pass);
        assert!(!first_pass.is_empty());
    }

    #[test]
    fn empty_index_and_blank_query_yield_nothing() {
        assert!(CatalogIndex::build(Vec::new()).query("Bamboo Toothbrush").is_empty());
        assert!(CatalogIndex::build(catalog()).query("   ").is_empty());
    }

    #[test]
    fn zero_threshold_requires_an_exact_field() {
        let settings = SearchSettings { threshold: 0.0, ..SearchSettings::default() };
        let index = CatalogIndex::build_with(catalog(), settings).expect("valid settings");

        assert!(index.query("Plastic Toothbrush Plastic X").is_empty());
        assert_eq!(ids(&index.query("Hydro")), vec!["steel-bottle"]);
    }

    #[test]
    fn loose_threshold_accepts_every_candidate() {
        let settings = SearchSettings { threshold: 1.0, ..SearchSettings::default() };
        let index = CatalogIndex::build_with(catalog(), settings).expect("valid settings");

        assert_eq!(index.query("zzz").len(), catalog().len());
    }

    #[test]
    fn weights_shift_the_ranking() {
        let candidates = vec![
            product("name-match", "Glass Jar", "Plastic", "Generic"),
            product("brand-match", "Storage Box", "Tin", "Glassworks Jar"),
        ];
        let name_heavy = SearchSettings {
            threshold: 0.5,
            weights: FieldWeights { name: 1.0, material: 0.0, brand: 0.0 },
        };
        let brand_heavy = SearchSettings {
            threshold: 0.5,
            weights: FieldWeights { name: 0.0, material: 0.0, brand: 1.0 },
        };

        let by_name =
            CatalogIndex::build_with(candidates.clone(), name_heavy).expect("valid settings");
        let by_brand = CatalogIndex::build_with(candidates, brand_heavy).expect("valid settings");

        assert_eq!(ids(&by_name.query("Glass Jar")).first(), Some(&"name-match"));
        assert_eq!(ids(&by_brand.query("Glass Jar")).first(), Some(&"brand-match"));
    }

    #[test]
    fn extra_name_words_do_not_lower_relevance() {
        let index = CatalogIndex::build(vec![
            product("sheets", "Laundry Detergent Sheets", "Paper", "PureWash"),
            product("steel", "Recycled Steel Water Bottle", "Recycled Steel", "Hydro"),
            product("glass", "Glass Water Bottle", "Glass", "Clearwell"),
        ]);

        let matches = index.query("Plastic Water Bottle Plastic AquaPure");

        assert_eq!(ids(&matches), vec!["steel", "glass", "sheets"]);
        let relevance: Vec<f64> = matches.iter().map(|hit| hit.relevance).collect();
        assert!((relevance[0] - 1.0).abs() < 1e-9);
        assert!((relevance[1] - 1.0).abs() < 1e-9);
        assert!(relevance[2] < 0.7, "spelling-only material match ranked too high: {relevance:?}");
    }

    #[test]
    fn fields_outside_the_threshold_do_not_dilute_relevance() {
        let index =
            CatalogIndex::build(vec![product("bamboo", "Bamboo Toothbrush", "Bamboo", "Zzqx")]);

        let matches = index.query("Plastic Toothbrush Plastic X");
        let hit = matches.iter().next().expect("name match qualifies");

        assert!((hit.relevance - 1.0).abs() < 1e-9);
    }
}
