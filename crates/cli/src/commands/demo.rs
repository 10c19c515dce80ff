use anyhow::Context;
use ecoswap_catalog::SeedCatalog;
use ecoswap_core::config::{AppConfig, ConfigOverrides, LoadOptions};
use ecoswap_core::{
    AlternativeMatch, AnalysisReport, ApplicationError, Cart, CartAnalyzer, CartItem,
    ImpactAggregator, RunId,
};

use crate::commands::CommandResult;

#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    /// Product ids to analyze; empty means the seed catalog's demo cart.
    pub cart: Vec<String>,
    pub improvement_margin: Option<u8>,
    pub threshold: Option<f64>,
    pub json: bool,
}

pub fn run(options: DemoOptions) -> CommandResult {
    let overrides = ConfigOverrides {
        matching_threshold: options.threshold,
        improvement_margin: options.improvement_margin,
        ..ConfigOverrides::default()
    };
    let config = match AppConfig::load(LoadOptions { overrides, ..LoadOptions::default() }) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "demo",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let analyzer = match seed_analyzer(&config) {
        Ok(analyzer) => analyzer,
        Err(error) => {
            return CommandResult::failure("demo", "seed_catalog", format!("{error:#}"), 4);
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "demo",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let cart = if options.cart.is_empty() {
        SeedCatalog::demo_cart()
    } else {
        options.cart.iter().map(|id| CartItem::new(id.as_str())).collect::<Cart>()
    };

    let aggregator = ImpactAggregator::new(config.impact);
    let run_id = RunId::generate();

    let analysis = analyzer.analyze_cart_report_with_run_id(run_id.clone(), &cart, &aggregator);
    let report = match runtime.block_on(analysis) {
        Ok(report) => report,
        Err(error) => return analysis_failure(error, &run_id),
    };

    let message = render_report(&report, cart.len());
    if !options.json {
        return CommandResult::success("demo", message);
    }

    match serde_json::to_value(&report) {
        Ok(data) => CommandResult::success_with_data("demo", message, Some(data)),
        Err(error) => CommandResult::failure(
            "demo",
            "serialization",
            format!("failed to serialize analysis report: {error}"),
            6,
        ),
    }
}

fn seed_analyzer(config: &AppConfig) -> anyhow::Result<CartAnalyzer> {
    let catalog = SeedCatalog::load().context("seed catalog is invalid")?;
    let sources = catalog.sources();
    Ok(CartAnalyzer::new(
        sources.products,
        sources.catalog,
        sources.eco_scores,
        config.analysis_settings(),
    ))
}

fn analysis_failure(error: ApplicationError, run_id: &RunId) -> CommandResult {
    let error = error.into_interface(run_id.to_string());
    CommandResult::failure(
        "demo",
        "analysis",
        format!("{} ({error}; run {})", error.user_message(), error.correlation_id()),
        5,
    )
}

fn render_report(report: &AnalysisReport, requested: usize) -> String {
    let mut lines = vec![format!(
        "analyzed {} of {} cart item(s) (run {}):",
        report.matches.len(),
        requested,
        report.run_id
    )];
    lines.extend(report.matches.iter().map(render_pairing));
    lines.push(report.summary.message());
    lines.join("\n")
}

fn render_pairing(pairing: &AlternativeMatch) -> String {
    let original = &pairing.original;
    match &pairing.alternative {
        Some(alternative) => format!(
            "  - {} ({}, {}) -> {} ({}, {})",
            original.id,
            original.name,
            original.eco_score.value(),
            alternative.id,
            alternative.name,
            alternative.eco_score.value()
        ),
        None => format!(
            "  - {} ({}, {}) -> no greener alternative",
            original.id,
            original.name,
            original.eco_score.value()
        ),
    }
}

#[cfg(test)]
mod tests {
    use ecoswap_core::{
        AlternativeMatch, ApplicationError, EcoScore, Product, RunId, SourceError,
    };

    use super::{analysis_failure, render_pairing};

    fn product(id: &str, name: &str, score: u16) -> Product {
        Product::new(id, name, "Brand", "Material", EcoScore::new(score).expect("score"))
    }

    #[test]
    fn pairing_line_names_both_products() {
        let pairing = AlternativeMatch::new(
            product("shop-tote", "Cotton Tote Bag", 55),
            Some(product("green-organic-tote", "Organic Cotton Tote Bag", 76)),
        );

        assert_eq!(
            render_pairing(&pairing),
            "  - shop-tote (Cotton Tote Bag, 55) -> green-organic-tote (Organic Cotton Tote Bag, 76)"
        );
    }

    #[test]
    fn pairing_line_without_alternative() {
        let pairing =
            AlternativeMatch::new(product("shop-detergent", "Laundry Detergent Pods", 88), None);

        assert_eq!(
            render_pairing(&pairing),
            "  - shop-detergent (Laundry Detergent Pods, 88) -> no greener alternative"
        );
    }

    #[test]
    fn analysis_failure_reports_the_run_id() {
        let run_id = RunId("4f7c2a9e-run".to_owned());
        let error = ApplicationError::Source(SourceError::Unavailable("catalog timed out".into()));

        let result = analysis_failure(error, &run_id);

        assert_eq!(result.exit_code, 5);
        assert!(result.output.contains("\"error_class\":\"analysis\""), "{}", result.output);
        assert!(result.output.contains("run 4f7c2a9e-run"), "{}", result.output);
        assert!(!result.output.contains("run demo"));
    }
}
