//! Price-bucket classifier pipeline
//!
//! Three artifacts fitted offline from the catalog and loaded read-only at
//! startup: a name encoder, an affine scaler and a decision tree over price
//! buckets. Every stage is deterministic; failures are typed per stage so
//! callers can tell an unseen product apart from a broken artifact.

pub mod artifacts;
pub mod encoder;
pub mod scaler;
pub mod training;
pub mod tree;

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::product::PriceBucket;

pub use artifacts::{ArtifactPaths, Artifacts, ARTIFACT_FORMAT_VERSION};
pub use encoder::LabelEncoder;
pub use scaler::StandardScaler;
pub use training::{train, TrainedPipeline, TrainingOptions, TrainingReport};
pub use tree::{DecisionTree, TreeNode, TreeOptions};

/// Query surface the recommendation resolver needs from a fitted pipeline.
pub trait RecommendationModel: Send + Sync {
    fn encode(&self, name: &str) -> Result<usize, PipelineError>;
    fn scale(&self, code: usize) -> Result<f64, PipelineError>;
    fn classify(&self, feature: f64) -> Result<PriceBucket, PipelineError>;
}

/// Per-stage query failures.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum PipelineError {
    #[error("product `{0}` is not in the encoder vocabulary")]
    UnknownProduct(String),
    #[error("scaling code {code} produced a non-finite feature")]
    NonFiniteFeature { code: usize },
    #[error("classifier received a non-finite feature ({0})")]
    InvalidFeature(f64),
    #[error("classifier tree is malformed at node {node}")]
    MalformedTree { node: usize },
}

#[derive(Debug, Error)]
pub enum ArtifactLoadError {
    #[error("artifact file was not found: `{0}`")]
    Missing(PathBuf),
    #[error("could not read artifact file `{path}`: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("could not parse artifact file `{path}`: {source}")]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("artifact file `{path}` has an unexpected shape: {message}")]
    Shape { path: PathBuf, message: String },
    #[error("artifacts do not form one pipeline: {0}")]
    Mismatch(String),
}

#[derive(Debug, Error)]
pub enum TrainingError {
    #[error("invalid training options: {0}")]
    InvalidOptions(String),
    #[error("training requires at least one sample")]
    NoSamples,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error("trained artifacts are inconsistent: {0}")]
    Inconsistent(String),
    #[error("could not serialize artifact `{path}`: {source}")]
    Serialize { path: PathBuf, source: serde_json::Error },
    #[error("could not write artifact `{path}`: {source}")]
    Write { path: PathBuf, source: std::io::Error },
}
