//! Recommendation resolver implementation

use tracing::{debug, error, warn};

use super::picker::Picker;
use super::types::{EchoReason, Resolution, ResolutionStrategy};
use super::SuggestionResult;
use crate::catalog::Catalog;
use crate::domain::product::PriceBucket;
use crate::errors::DomainError;
use crate::ml::{PipelineError, RecommendationModel};

/// Resolves a single "recommended next item" for a product.
///
/// The classifier stages are best-effort: any stage failure degrades to
/// echoing the input product. The only error surfaced is an invariant
/// violation, raised when the nearest-price fallback needs the input
/// product's price but the product is not in the catalog.
pub struct SuggestionEngine<'a, M: ?Sized> {
    catalog: &'a Catalog,
    model: &'a M,
}

impl<'a, M: RecommendationModel + ?Sized> SuggestionEngine<'a, M> {
    pub fn new(catalog: &'a Catalog, model: &'a M) -> Self {
        Self { catalog, model }
    }

    pub fn recommend<P: Picker + ?Sized>(
        &self,
        product_name: &str,
        picker: &mut P,
    ) -> SuggestionResult<String> {
        self.resolve(product_name, picker).map(|resolution| resolution.product)
    }

    pub fn resolve<P: Picker + ?Sized>(
        &self,
        product_name: &str,
        picker: &mut P,
    ) -> SuggestionResult<Resolution> {
        let code = match self.model.encode(product_name) {
            Ok(code) => code,
            Err(PipelineError::UnknownProduct(_)) => {
                debug!(
                    event_name = "recommendation.fallback",
                    product = product_name,
                    reason = "unknown_product",
                    "product not in encoder vocabulary; echoing input"
                );
                return Ok(echo(product_name, EchoReason::UnknownProduct));
            }
            Err(failure) => return Ok(stage_failure(product_name, EchoReason::EncodeFailed, &failure)),
        };

        let feature = match self.model.scale(code) {
            Ok(feature) => feature,
            Err(failure) => return Ok(stage_failure(product_name, EchoReason::ScaleFailed, &failure)),
        };

        let bucket = match self.model.classify(feature) {
            Ok(bucket) => bucket,
            Err(failure) => {
                return Ok(stage_failure(product_name, EchoReason::ClassifyFailed, &failure))
            }
        };

        let same_bucket: Vec<&str> =
            self.catalog.in_bucket(bucket).map(|product| product.name.as_str()).collect();
        if same_bucket.is_empty() {
            return self.nearest_price(product_name, bucket);
        }

        let others: Vec<&str> =
            same_bucket.iter().copied().filter(|name| *name != product_name).collect();
        let candidates = if others.is_empty() { same_bucket } else { others };

        let index = picker.pick(candidates.len());
        let Some(chosen) = candidates.get(index) else {
            return Err(invariant(format!(
                "picker returned index {index} for {} candidates",
                candidates.len()
            )));
        };

        debug!(
            event_name = "recommendation.resolved",
            product = product_name,
            recommended = *chosen,
            bucket = bucket.label(),
            candidates = candidates.len(),
            "recommendation drawn from predicted bucket"
        );

        Ok(Resolution {
            product: (*chosen).to_owned(),
            strategy: ResolutionStrategy::SameBucket { bucket, candidates: candidates.len() },
        })
    }

    fn nearest_price(&self, product_name: &str, bucket: PriceBucket) -> SuggestionResult<Resolution> {
        let Some(product) = self.catalog.find(product_name) else {
            return Err(invariant(format!(
                "product `{product_name}` was encoded but is not present in the catalog"
            )));
        };

        let Some(nearest) = self.catalog.nearest_by_price(product.price, Some(product_name)) else {
            return Ok(echo(product_name, EchoReason::NoAlternative));
        };

        debug!(
            event_name = "recommendation.resolved",
            product = product_name,
            recommended = nearest.name.as_str(),
            bucket = bucket.label(),
            "predicted bucket is empty; recommending nearest price"
        );

        Ok(Resolution {
            product: nearest.name.clone(),
            strategy: ResolutionStrategy::NearestPrice { bucket },
        })
    }
}

/// Free-function form of [`SuggestionEngine::recommend`].
pub fn recommend<M, P>(
    product_name: &str,
    catalog: &Catalog,
    model: &M,
    picker: &mut P,
) -> SuggestionResult<String>
where
    M: RecommendationModel + ?Sized,
    P: Picker + ?Sized,
{
    SuggestionEngine::new(catalog, model).recommend(product_name, picker)
}

fn echo(product_name: &str, reason: EchoReason) -> Resolution {
    Resolution { product: product_name.to_owned(), strategy: ResolutionStrategy::Echo { reason } }
}

fn stage_failure(product_name: &str, reason: EchoReason, failure: &PipelineError) -> Resolution {
    warn!(
        event_name = "recommendation.fallback",
        product = product_name,
        reason = ?reason,
        error = %failure,
        "classifier pipeline failed; echoing input"
    );
    echo(product_name, reason)
}

fn invariant(message: String) -> DomainError {
    error!(event_name = "recommendation.invariant_violation", %message, "recommendation invariant violated");
    DomainError::InvariantViolation(message)
}
