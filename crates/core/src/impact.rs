//! Aggregate resource savings across accepted substitutions.
//!
//! Missing breakdown figures fall back to [`ImpactFallbacks`]. Deltas are reported as computed,
//! including negative ones: a substitute with a higher composite score can still be worse on a
//! single axis, and the fallbacks can dominate when breakdown data is sparse.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::domain::matches::AlternativeMatch;

pub const ALREADY_OPTIMIZED_MESSAGE: &str = "✅ All your selected items are already eco-optimized!";

pub const DEFAULT_FALLBACKS: ImpactFallbacks = ImpactFallbacks {
    original_carbon_kg: 10.0,
    original_water_liters: 1000.0,
    alternative_carbon_kg: 5.0,
    alternative_water_liters: 200.0,
};

/// Stand-in figures for products whose breakdown lacks carbon or water data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImpactFallbacks {
    pub original_carbon_kg: f64,
    pub original_water_liters: f64,
    pub alternative_carbon_kg: f64,
    pub alternative_water_liters: f64,
}

impl Default for ImpactFallbacks {
    fn default() -> Self {
        DEFAULT_FALLBACKS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactSummary {
    pub co2_saved_kg: f64,
    pub water_saved_liters: f64,
    pub switched_items: usize,
}

impl ImpactSummary {
    pub fn is_already_optimized(&self) -> bool {
        self.switched_items == 0
    }

    pub fn has_negative_delta(&self) -> bool {
        self.co2_saved_kg < 0.0 || self.water_saved_liters < 0.0
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ImpactSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_already_optimized() {
            return f.write_str(ALREADY_OPTIMIZED_MESSAGE);
        }

        // `{:.1}` alone rounds ties to even; ties round away from zero here (7.25 -> 7.3).
        let co2 = (self.co2_saved_kg * 10.0).round() / 10.0;
        let water = self.water_saved_liters.round() as i64;
        let plural = if self.switched_items == 1 { "" } else { "s" };
        write!(
            f,
            "🌍 You could reduce your CO₂ by {:.1}kg and water usage by {}L by switching {} item{}.",
            co2, water, self.switched_items, plural
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImpactAggregator {
    fallbacks: ImpactFallbacks,
}

impl ImpactAggregator {
    pub fn new(fallbacks: ImpactFallbacks) -> Self {
        Self { fallbacks }
    }

    pub fn fallbacks(&self) -> &ImpactFallbacks {
        &self.fallbacks
    }

    pub fn aggregate(&self, matches: &[AlternativeMatch]) -> ImpactSummary {
        let mut summary = ImpactSummary::default();

        for pairing in matches {
            let Some(alternative) = &pairing.alternative else {
                continue;
            };
            let original = &pairing.original;
            let fallbacks = &self.fallbacks;

            let original_carbon = original.carbon_kg().unwrap_or(fallbacks.original_carbon_kg);
            let alternative_carbon =
                alternative.carbon_kg().unwrap_or(fallbacks.alternative_carbon_kg);
            let original_water = original.water_liters().unwrap_or(fallbacks.original_water_liters);
            let alternative_water =
                alternative.water_liters().unwrap_or(fallbacks.alternative_water_liters);

            summary.co2_saved_kg += original_carbon - alternative_carbon;
            summary.water_saved_liters += original_water - alternative_water;
            summary.switched_items += 1;
        }

        if summary.has_negative_delta() {
            warn!(
                event_name = "ecoswap.impact.negative_delta",
                co2_saved_kg = summary.co2_saved_kg,
                water_saved_liters = summary.water_saved_liters,
                switched_items = summary.switched_items,
                "substitutions increase resource use on at least one axis"
            );
        }

        summary
    }

    pub fn summarize(&self, matches: &[AlternativeMatch]) -> String {
        self.aggregate(matches).message()
    }
}

/// Summary text using the default fallback constants.
pub fn summarize(matches: &[AlternativeMatch]) -> String {
    ImpactAggregator::default().summarize(matches)
}

#[cfg(test)]
mod tests {
    use super::{summarize, ImpactAggregator, ImpactFallbacks, ALREADY_OPTIMIZED_MESSAGE};
    use crate::domain::matches::AlternativeMatch;
    use crate::domain::product::{Breakdown, EcoScore, Product};

    fn product(id: &str, score: u16, carbon: Option<f64>, water: Option<f64>) -> Product {
        let score = EcoScore::new(score).expect("score");
        let product = Product::new(id, id, "Brand", "Material", score);
        if carbon.is_none() && water.is_none() {
            return product;
        }
        product.with_breakdown(Breakdown { carbon, water, ..Breakdown::default() })
    }

    #[test]
    fn empty_input_is_already_optimized() {
        assert_eq!(summarize(&[]), ALREADY_OPTIMIZED_MESSAGE);
    }

    #[test]
    fn matches_without_alternatives_are_already_optimized() {
        let matches = vec![
            AlternativeMatch::new(product("a", 95, None, None), None),
            AlternativeMatch::new(product("b", 80, Some(1.0), Some(10.0)), None),
        ];
        assert_eq!(summarize(&matches), ALREADY_OPTIMIZED_MESSAGE);
    }

    #[test]
    fn single_substitution_uses_singular_phrasing() {
        let matches = vec![AlternativeMatch::new(
            product("plastic", 40, None, None),
            Some(product("bamboo", 90, Some(5.0), Some(150.0))),
        )];

        assert_eq!(
            summarize(&matches),
            "🌍 You could reduce your CO₂ by 5.0kg and water usage by 850L by switching 1 item."
        );
    }

    #[test]
    fn co2_ties_round_away_from_zero() {
        let matches = vec![AlternativeMatch::new(
            product("bag", 30, Some(12.25), Some(1200.0)),
            Some(product("tote", 70, None, None)),
        )];
        assert_eq!(
            summarize(&matches),
            "🌍 You could reduce your CO₂ by 7.3kg and water usage by 1000L by switching 1 item."
        );

        let worse = vec![AlternativeMatch::new(
            product("bag", 30, Some(0.0), None),
            Some(product("tote", 70, Some(7.25), None)),
        )];
        assert!(summarize(&worse).starts_with("🌍 You could reduce your CO₂ by -7.3kg"));
    }

    #[test]
    fn multiple_substitutions_sum_with_literal_fallbacks() {
        let matches = vec![
            AlternativeMatch::new(
                product("tote", 30, Some(12.5), None),
                Some(product("organic-tote", 70, None, Some(400.0))),
            ),
            AlternativeMatch::new(product("kept", 90, None, None), None),
            AlternativeMatch::new(
                product("bottle", 20, None, Some(900.0)),
                Some(product("steel-bottle", 60, Some(2.0), None)),
            ),
        ];

        let summary = ImpactAggregator::default().aggregate(&matches);
        // (12.5 - 5) + (10 - 2) and (1000 - 400) + (900 - 200)
        assert!((summary.co2_saved_kg - 15.5).abs() < 1e-9);
        assert!((summary.water_saved_liters - 1300.0).abs() < 1e-9);
        assert_eq!(summary.switched_items, 2);
        assert_eq!(
            summary.to_string(),
            "🌍 You could reduce your CO₂ by 15.5kg and water usage by 1300L by switching 2 items."
        );
    }

    #[test]
    fn negative_deltas_are_reported_unclamped() {
        let matches = vec![AlternativeMatch::new(
            product("glass", 40, Some(3.0), Some(100.0)),
            Some(product("paper", 80, Some(1.0), Some(350.4))),
        )];

        let summary = ImpactAggregator::default().aggregate(&matches);
        assert!(summary.has_negative_delta());
        assert_eq!(
            summary.message(),
            "🌍 You could reduce your CO₂ by 2.0kg and water usage by -250L by switching 1 item."
        );
    }

    #[test]
    fn fallbacks_are_configurable() {
        let aggregator = ImpactAggregator::new(ImpactFallbacks {
            original_carbon_kg: 1.0,
            original_water_liters: 10.0,
            alternative_carbon_kg: 0.5,
            alternative_water_liters: 4.0,
        });
        let matches = vec![AlternativeMatch::new(
            product("a", 10, None, None),
            Some(product("b", 90, None, None)),
        )];

        let summary = aggregator.aggregate(&matches);
        assert!((summary.co2_saved_kg - 0.5).abs() < 1e-9);
        assert!((summary.water_saved_liters - 6.0).abs() < 1e-9);
        assert_eq!(aggregator.fallbacks().alternative_water_liters, 4.0);
    }
}
