//! Types for the recommendation resolver

use serde::{Deserialize, Serialize};

use crate::domain::product::PriceBucket;

/// Outcome of one resolution call: the recommended product and how it was
/// chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub product: String,
    pub strategy: ResolutionStrategy,
}

impl Resolution {
    pub fn is_echo(&self) -> bool {
        matches!(self.strategy, ResolutionStrategy::Echo { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// Uniform pick among products sharing the predicted bucket.
    SameBucket { bucket: PriceBucket, candidates: usize },
    /// The predicted bucket had no products; closest price won instead.
    NearestPrice { bucket: PriceBucket },
    /// The classifier could not help; the input product is returned as is.
    Echo { reason: EchoReason },
}

/// Why a resolution fell back to echoing the input product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoReason {
    /// The name was not in the encoder vocabulary.
    UnknownProduct,
    /// Encoding failed for some other reason.
    EncodeFailed,
    ScaleFailed,
    ClassifyFailed,
    /// Nothing but the input product itself was available to recommend.
    NoAlternative,
}

impl EchoReason {
    pub fn description(&self) -> &'static str {
        match self {
            EchoReason::UnknownProduct => "product was not seen during training",
            EchoReason::EncodeFailed => "product could not be encoded",
            EchoReason::ScaleFailed => "encoded product could not be scaled",
            EchoReason::ClassifyFailed => "classifier could not predict a bucket",
            EchoReason::NoAlternative => "no other product is available",
        }
    }
}
