use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::encoder::LabelEncoder;
use super::scaler::StandardScaler;
use super::tree::DecisionTree;
use super::{ArtifactLoadError, PipelineError, RecommendationModel, TrainingError};
use crate::domain::product::PriceBucket;

pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

const ENCODER_KIND: &str = "label_encoder";
const SCALER_KIND: &str = "standard_scaler";
const CLASSIFIER_KIND: &str = "decision_tree_classifier";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub encoder: PathBuf,
    pub scaler: PathBuf,
    pub classifier: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(
        dir: &Path,
        encoder_file: &str,
        scaler_file: &str,
        classifier_file: &str,
    ) -> Self {
        Self {
            encoder: dir.join(encoder_file),
            scaler: dir.join(scaler_file),
            classifier: dir.join(classifier_file),
        }
    }

    pub fn all(&self) -> [&Path; 3] {
        [&self.encoder, &self.scaler, &self.classifier]
    }
}

/// On-disk envelope shared by the three artifact files.
#[derive(Debug, Serialize, Deserialize)]
struct ArtifactDocument<T> {
    kind: String,
    format_version: u32,
    trained_at: DateTime<Utc>,
    #[serde(flatten)]
    body: T,
}

/// The fitted encoder -> scaler -> classifier pipeline. Read-only once built.
#[derive(Clone, Debug, PartialEq)]
pub struct Artifacts {
    encoder: LabelEncoder,
    scaler: StandardScaler,
    classifier: DecisionTree,
    trained_at: DateTime<Utc>,
}

impl Artifacts {
    pub fn from_parts(
        encoder: LabelEncoder,
        scaler: StandardScaler,
        classifier: DecisionTree,
        trained_at: DateTime<Utc>,
    ) -> Result<Self, ArtifactLoadError> {
        encoder.check_shape().map_err(ArtifactLoadError::Mismatch)?;
        scaler.check_shape().map_err(ArtifactLoadError::Mismatch)?;
        classifier.check_shape().map_err(ArtifactLoadError::Mismatch)?;
        check_pipeline(&encoder, &scaler).map_err(ArtifactLoadError::Mismatch)?;

        Ok(Self { encoder, scaler, classifier, trained_at })
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactLoadError> {
        let encoder: ArtifactDocument<LabelEncoder> = read_document(&paths.encoder, ENCODER_KIND)?;
        encoder
            .body
            .check_shape()
            .map_err(|message| shape_error(&paths.encoder, message))?;

        let scaler: ArtifactDocument<StandardScaler> = read_document(&paths.scaler, SCALER_KIND)?;
        scaler.body.check_shape().map_err(|message| shape_error(&paths.scaler, message))?;

        let classifier: ArtifactDocument<DecisionTree> =
            read_document(&paths.classifier, CLASSIFIER_KIND)?;
        classifier
            .body
            .check_shape()
            .map_err(|message| shape_error(&paths.classifier, message))?;

        check_pipeline(&encoder.body, &scaler.body).map_err(ArtifactLoadError::Mismatch)?;

        info!(
            event_name = "artifacts.load.completed",
            vocabulary = encoder.body.len(),
            classifier_nodes = classifier.body.nodes().len(),
            trained_at = %classifier.trained_at,
            "recommendation artifacts loaded"
        );

        Ok(Self {
            encoder: encoder.body,
            scaler: scaler.body,
            classifier: classifier.body,
            trained_at: classifier.trained_at,
        })
    }

    pub fn save(&self, paths: &ArtifactPaths) -> Result<(), TrainingError> {
        write_document(&paths.encoder, ENCODER_KIND, self.trained_at, &self.encoder)?;
        write_document(&paths.scaler, SCALER_KIND, self.trained_at, &self.scaler)?;
        write_document(&paths.classifier, CLASSIFIER_KIND, self.trained_at, &self.classifier)?;

        info!(
            event_name = "artifacts.save.completed",
            encoder = %paths.encoder.display(),
            scaler = %paths.scaler.display(),
            classifier = %paths.classifier.display(),
            "recommendation artifacts written"
        );
        Ok(())
    }

    pub fn encoder(&self) -> &LabelEncoder {
        &self.encoder
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &DecisionTree {
        &self.classifier
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }
}

impl RecommendationModel for Artifacts {
    fn encode(&self, name: &str) -> Result<usize, PipelineError> {
        self.encoder.encode(name)
    }

    fn scale(&self, code: usize) -> Result<f64, PipelineError> {
        self.scaler.transform(code)
    }

    fn classify(&self, feature: f64) -> Result<PriceBucket, PipelineError> {
        self.classifier.predict(feature)
    }
}

fn check_pipeline(encoder: &LabelEncoder, scaler: &StandardScaler) -> Result<(), String> {
    if scaler.n_samples() != encoder.len() {
        return Err(format!(
            "scaler was fitted on {} codes but the encoder vocabulary has {} names",
            scaler.n_samples(),
            encoder.len()
        ));
    }
    Ok(())
}

fn shape_error(path: &Path, message: String) -> ArtifactLoadError {
    ArtifactLoadError::Shape { path: path.to_path_buf(), message }
}

fn read_document<T: DeserializeOwned>(
    path: &Path,
    expected_kind: &str,
) -> Result<ArtifactDocument<T>, ArtifactLoadError> {
    if !path.exists() {
        return Err(ArtifactLoadError::Missing(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path)
        .map_err(|source| ArtifactLoadError::Read { path: path.to_path_buf(), source })?;
    let document: ArtifactDocument<T> = serde_json::from_str(&raw)
        .map_err(|source| ArtifactLoadError::Parse { path: path.to_path_buf(), source })?;

    if document.kind != expected_kind {
        return Err(shape_error(
            path,
            format!("expected artifact kind `{expected_kind}`, found `{}`", document.kind),
        ));
    }
    if document.format_version != ARTIFACT_FORMAT_VERSION {
        return Err(shape_error(
            path,
            format!(
                "unsupported format_version {} (expected {ARTIFACT_FORMAT_VERSION})",
                document.format_version
            ),
        ));
    }

    Ok(document)
}

fn write_document<T: Serialize>(
    path: &Path,
    kind: &str,
    trained_at: DateTime<Utc>,
    body: &T,
) -> Result<(), TrainingError> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|source| TrainingError::Write { path: parent.to_path_buf(), source })?;
    }

    let document = ArtifactDocument {
        kind: kind.to_string(),
        format_version: ARTIFACT_FORMAT_VERSION,
        trained_at,
        body,
    };
    let json = serde_json::to_string_pretty(&document)
        .map_err(|source| TrainingError::Serialize { path: path.to_path_buf(), source })?;
    fs::write(path, json).map_err(|source| TrainingError::Write { path: path.to_path_buf(), source })
}
