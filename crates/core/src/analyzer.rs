//! Cart analysis: resolve cart items, score the candidate catalog, and pair each item with a
//! greener substitute.
//!
//! Per-item lookups fan out as tokio tasks and are joined back in cart order. Dropping an
//! in-progress analysis drops its `JoinSet`, which aborts the outstanding lookups.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::config::DEFAULT_FETCH_CONCURRENCY;
use crate::domain::cart::{Cart, CartItem};
use crate::domain::matches::{AlternativeMatch, AnalysisReport, RunId};
use crate::domain::product::{Product, ProductId};
use crate::errors::ApplicationError;
use crate::impact::ImpactAggregator;
use crate::search::{CatalogIndex, SearchSettings};
use crate::selector::{SubstituteSelector, DEFAULT_IMPROVEMENT_MARGIN};
use crate::sources::{CatalogSource, EcoScoreSource, ProductSource};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub search: SearchSettings,
    pub improvement_margin: u8,
    /// Drop candidates sharing the cart item's id before selection.
    pub exclude_self_matches: bool,
    pub fetch_concurrency: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            search: SearchSettings::default(),
            improvement_margin: DEFAULT_IMPROVEMENT_MARGIN,
            exclude_self_matches: false,
            fetch_concurrency: DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

/// Builds one index over `candidates` and pairs every resolved product with its substitute.
/// Output order follows `resolved`. Fails only on invalid search settings.
pub fn find_greener_alternatives(
    resolved: &[Product],
    candidates: Vec<Product>,
    settings: &AnalysisSettings,
) -> Result<Vec<AlternativeMatch>, ApplicationError> {
    if resolved.is_empty() {
        return Ok(Vec::new());
    }

    let index = CatalogIndex::build_with(candidates, settings.search)?;
    let selector = SubstituteSelector::new(settings.improvement_margin);

    let matches = resolved
        .iter()
        .map(|original| {
            let hits = index.query(&original.search_text());
            let ranked = hits.products().filter(|candidate| {
                !(settings.exclude_self_matches && candidate.id == original.id)
            });
            let alternative = selector.select(original, ranked).cloned();
            AlternativeMatch::new(original.clone(), alternative)
        })
        .collect();
    Ok(matches)
}

pub struct CartAnalyzer {
    products: Arc<dyn ProductSource>,
    catalog: Arc<dyn CatalogSource>,
    eco_scores: Arc<dyn EcoScoreSource>,
    settings: AnalysisSettings,
}

impl CartAnalyzer {
    pub fn new(
        products: Arc<dyn ProductSource>,
        catalog: Arc<dyn CatalogSource>,
        eco_scores: Arc<dyn EcoScoreSource>,
        settings: AnalysisSettings,
    ) -> Self {
        Self { products, catalog, eco_scores, settings }
    }

    pub fn settings(&self) -> &AnalysisSettings {
        &self.settings
    }

    /// Analyzes the cart against the current catalog snapshot.
    pub async fn analyze_cart(
        &self,
        cart: &Cart,
    ) -> Result<Vec<AlternativeMatch>, ApplicationError> {
        self.run_cart(&RunId::generate(), cart).await
    }

    /// Like [`CartAnalyzer::analyze_cart`], plus a run id, timestamp, and impact summary.
    pub async fn analyze_cart_report(
        &self,
        cart: &Cart,
        aggregator: &ImpactAggregator,
    ) -> Result<AnalysisReport, ApplicationError> {
        self.analyze_cart_report_with_run_id(RunId::generate(), cart, aggregator).await
    }

    /// Runs under a caller-chosen run id, so a failed run can still be correlated with its
    /// `ecoswap.analysis.*` events.
    pub async fn analyze_cart_report_with_run_id(
        &self,
        run_id: RunId,
        cart: &Cart,
        aggregator: &ImpactAggregator,
    ) -> Result<AnalysisReport, ApplicationError> {
        let matches = self.run_cart(&run_id, cart).await?;
        let summary = aggregator.aggregate(&matches);

        Ok(AnalysisReport { run_id, generated_at: Utc::now(), matches, summary })
    }

    /// Analyzes `items` against a caller-supplied catalog snapshot. Items that no longer resolve
    /// are omitted; the rest keep their relative order.
    pub async fn analyze(
        &self,
        items: &[CartItem],
        catalog: Vec<Product>,
    ) -> Result<Vec<AlternativeMatch>, ApplicationError> {
        self.run(&RunId::generate(), items, catalog).await
    }

    async fn run_cart(
        &self,
        run_id: &RunId,
        cart: &Cart,
    ) -> Result<Vec<AlternativeMatch>, ApplicationError> {
        if cart.is_empty() {
            debug!(
                event_name = "ecoswap.analysis.empty_cart",
                correlation_id = %run_id,
                "cart is empty; skipping catalog fetch"
            );
            return Ok(Vec::new());
        }

        let catalog = self.catalog.list_candidates().await?;
        self.run(run_id, cart.items(), catalog).await
    }

    async fn run(
        &self,
        run_id: &RunId,
        items: &[CartItem],
        catalog: Vec<Product>,
    ) -> Result<Vec<AlternativeMatch>, ApplicationError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            event_name = "ecoswap.analysis.start",
            correlation_id = %run_id,
            cart_items = items.len(),
            catalog_size = catalog.len(),
            "starting cart analysis"
        );

        let resolved = self.resolve_items(run_id, items).await?;
        if resolved.is_empty() {
            info!(
                event_name = "ecoswap.analysis.complete",
                correlation_id = %run_id,
                resolved_items = 0,
                substitutions = 0,
                "no cart items resolved"
            );
            return Ok(Vec::new());
        }

        let candidates = self.score_candidates(run_id, catalog).await?;
        let matches = find_greener_alternatives(&resolved, candidates, &self.settings)?;

        info!(
            event_name = "ecoswap.analysis.complete",
            correlation_id = %run_id,
            resolved_items = resolved.len(),
            substitutions = matches.iter().filter(|pairing| pairing.has_alternative()).count(),
            "cart analysis complete"
        );

        Ok(matches)
    }

    async fn resolve_items(
        &self,
        run_id: &RunId,
        items: &[CartItem],
    ) -> Result<Vec<Product>, ApplicationError> {
        let ids: Vec<ProductId> = items.iter().map(|item| item.product_id.clone()).collect();
        let products = Arc::clone(&self.products);
        let eco_scores = Arc::clone(&self.eco_scores);

        let resolved = fan_out(ids.clone(), self.settings.fetch_concurrency, move |id| {
            let products = Arc::clone(&products);
            let eco_scores = Arc::clone(&eco_scores);
            async move {
                let Some(product) = products.get_product(&id).await? else {
                    return Ok(None);
                };
                let assessment = eco_scores.get_eco_score(&id).await?;
                Ok::<_, ApplicationError>(
                    assessment.map(|assessment| product.apply_assessment(assessment)),
                )
            }
        })
        .await?;

        let mut products = Vec::with_capacity(resolved.len());
        for (id, product) in ids.iter().zip(resolved) {
            match product {
                Some(product) => products.push(product),
                None => debug!(
                    event_name = "ecoswap.analysis.item_unresolved",
                    correlation_id = %run_id,
                    product_id = %id,
                    "cart item no longer resolves; omitting it"
                ),
            }
        }
        Ok(products)
    }

    /// Refreshes every candidate's score; candidates the eco-score service does not know are
    /// left out of the index.
    async fn score_candidates(
        &self,
        run_id: &RunId,
        catalog: Vec<Product>,
    ) -> Result<Vec<Product>, ApplicationError> {
        let ids: Vec<ProductId> = catalog.iter().map(|product| product.id.clone()).collect();
        let eco_scores = Arc::clone(&self.eco_scores);

        let assessments = fan_out(ids, self.settings.fetch_concurrency, move |id| {
            let eco_scores = Arc::clone(&eco_scores);
            async move { Ok::<_, ApplicationError>(eco_scores.get_eco_score(&id).await?) }
        })
        .await?;

        let total = catalog.len();
        let candidates: Vec<Product> = catalog
            .into_iter()
            .zip(assessments)
            .filter_map(|(product, assessment)| {
                assessment.map(|assessment| product.apply_assessment(assessment))
            })
            .collect();

        debug!(
            event_name = "ecoswap.analysis.candidates_scored",
            correlation_id = %run_id,
            catalog_size = total,
            scored = candidates.len(),
            "candidate catalog scored"
        );
        Ok(candidates)
    }
}

/// Runs `fetch` for every id with at most `limit` lookups in flight and returns the results in
/// input order. The first failure aborts the remaining lookups.
async fn fan_out<T, F, Fut>(
    ids: Vec<ProductId>,
    limit: usize,
    fetch: F,
) -> Result<Vec<Option<T>>, ApplicationError>
where
    T: Send + 'static,
    F: Fn(ProductId) -> Fut,
    Fut: Future<Output = Result<Option<T>, ApplicationError>> + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let mut tasks = JoinSet::new();

    for (position, id) in ids.into_iter().enumerate() {
        let permits = Arc::clone(&permits);
        let lookup = fetch(id);
        tasks.spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|error| ApplicationError::Integration(error.to_string()))?;
            lookup.await.map(|value| (position, value))
        });
    }

    let mut slots: Vec<Option<T>> = Vec::with_capacity(tasks.len());
    slots.resize_with(tasks.len(), || None);
    while let Some(joined) = tasks.join_next().await {
        let (position, value) = joined.map_err(|error| {
            ApplicationError::Integration(format!("lookup task failed: {error}"))
        })??;
        slots[position] = value;
    }

    Ok(slots)
}
