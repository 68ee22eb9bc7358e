use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::artifacts::Artifacts;
use super::encoder::LabelEncoder;
use super::scaler::StandardScaler;
use super::tree::{DecisionTree, TreeOptions};
use super::{RecommendationModel, TrainingError};
use crate::catalog::Catalog;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrainingOptions {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        let tree = TreeOptions::default();
        Self { max_depth: tree.max_depth, min_samples_split: tree.min_samples_split }
    }
}

/// Summary of a training run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub samples: usize,
    pub vocabulary: usize,
    pub node_count: usize,
    pub leaf_count: usize,
    pub depth: usize,
    /// Share of catalog products whose predicted bucket equals their own.
    pub training_accuracy: f64,
}

#[derive(Clone, Debug)]
pub struct TrainedPipeline {
    pub artifacts: Artifacts,
    pub report: TrainingReport,
}

/// Fits encoder, scaler and classifier on the catalog. The label of each
/// product is its price bucket and the only feature is its scaled name code.
pub fn train(catalog: &Catalog, options: TrainingOptions) -> Result<TrainedPipeline, TrainingError> {
    validate_options(options)?;

    let encoder = LabelEncoder::fit(catalog.products().iter().map(|product| product.name.as_str()));

    let mut codes = Vec::with_capacity(catalog.len());
    for product in catalog.products() {
        codes.push(encoder.encode(&product.name)?);
    }

    let raw_codes: Vec<f64> = codes.iter().map(|&code| code as f64).collect();
    let scaler = StandardScaler::fit(&raw_codes).ok_or(TrainingError::NoSamples)?;

    let mut samples = Vec::with_capacity(catalog.len());
    for (product, &code) in catalog.products().iter().zip(codes.iter()) {
        samples.push((scaler.transform(code)?, product.bucket));
    }

    let tree_options =
        TreeOptions { max_depth: options.max_depth, min_samples_split: options.min_samples_split };
    let classifier = DecisionTree::fit(&samples, tree_options).ok_or(TrainingError::NoSamples)?;

    let artifacts = Artifacts::from_parts(encoder, scaler, classifier, Utc::now())
        .map_err(|error| TrainingError::Inconsistent(error.to_string()))?;

    let correct = catalog
        .products()
        .iter()
        .filter(|product| {
            artifacts
                .encode(&product.name)
                .and_then(|code| artifacts.scale(code))
                .and_then(|feature| artifacts.classify(feature))
                .map(|bucket| bucket == product.bucket)
                .unwrap_or(false)
        })
        .count();

    let classifier = artifacts.classifier();
    let report = TrainingReport {
        samples: samples.len(),
        vocabulary: artifacts.encoder().len(),
        node_count: classifier.nodes().len(),
        leaf_count: classifier.leaf_count(),
        depth: classifier.depth(),
        training_accuracy: correct as f64 / catalog.len() as f64,
    };

    info!(
        event_name = "training.completed",
        samples = report.samples,
        node_count = report.node_count,
        depth = report.depth,
        training_accuracy = report.training_accuracy,
        "recommendation pipeline trained"
    );

    Ok(TrainedPipeline { artifacts, report })
}

fn validate_options(options: TrainingOptions) -> Result<(), TrainingError> {
    if options.min_samples_split < 2 {
        return Err(TrainingError::InvalidOptions(
            "min_samples_split must be at least 2".to_string(),
        ));
    }
    if options.max_depth == Some(0) {
        return Err(TrainingError::InvalidOptions(
            "max_depth must be greater than zero when set".to_string(),
        ));
    }
    Ok(())
}
