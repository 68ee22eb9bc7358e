use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogOptions;
use crate::ml::{ArtifactPaths, TrainingOptions};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub catalog: CatalogConfig,
    pub artifacts: ArtifactConfig,
    pub training: TrainingConfig,
    pub recommendation: RecommendationConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct CatalogConfig {
    pub path: PathBuf,
    pub has_header: bool,
}

#[derive(Clone, Debug)]
pub struct ArtifactConfig {
    pub dir: PathBuf,
    pub encoder_file: String,
    pub scaler_file: String,
    pub classifier_file: String,
}

#[derive(Clone, Debug)]
pub struct TrainingConfig {
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
}

#[derive(Clone, Debug)]
pub struct RecommendationConfig {
    /// Seed for the candidate picker; unset means entropy.
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub catalog_path: Option<PathBuf>,
    pub artifacts_dir: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub recommendation_seed: Option<u64>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogConfig { path: PathBuf::from("data/products.csv"), has_header: true },
            artifacts: ArtifactConfig {
                dir: PathBuf::from("artifacts"),
                encoder_file: "encoder.json".to_string(),
                scaler_file: "scaler.json".to_string(),
                classifier_file: "best_model.json".to_string(),
            },
            training: TrainingConfig { max_depth: None, min_samples_split: 2 },
            recommendation: RecommendationConfig { seed: None },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl CatalogConfig {
    pub fn options(&self) -> CatalogOptions {
        CatalogOptions { has_header: self.has_header }
    }
}

impl ArtifactConfig {
    pub fn paths(&self) -> ArtifactPaths {
        ArtifactPaths::in_dir(&self.dir, &self.encoder_file, &self.scaler_file, &self.classifier_file)
    }
}

impl TrainingConfig {
    pub fn options(&self) -> TrainingOptions {
        TrainingOptions { max_depth: self.max_depth, min_samples_split: self.min_samples_split }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from("smartcart.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(catalog) = patch.catalog {
            if let Some(path) = catalog.path {
                self.catalog.path = path;
            }
            if let Some(has_header) = catalog.has_header {
                self.catalog.has_header = has_header;
            }
        }

        if let Some(artifacts) = patch.artifacts {
            if let Some(dir) = artifacts.dir {
                self.artifacts.dir = dir;
            }
            if let Some(encoder_file) = artifacts.encoder_file {
                self.artifacts.encoder_file = encoder_file;
            }
            if let Some(scaler_file) = artifacts.scaler_file {
                self.artifacts.scaler_file = scaler_file;
            }
            if let Some(classifier_file) = artifacts.classifier_file {
                self.artifacts.classifier_file = classifier_file;
            }
        }

        if let Some(training) = patch.training {
            if let Some(max_depth) = training.max_depth {
                self.training.max_depth = Some(max_depth);
            }
            if let Some(min_samples_split) = training.min_samples_split {
                self.training.min_samples_split = min_samples_split;
            }
        }

        if let Some(recommendation) = patch.recommendation {
            if let Some(seed) = recommendation.seed {
                self.recommendation.seed = Some(seed);
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SMARTCART_CATALOG_PATH") {
            self.catalog.path = PathBuf::from(value);
        }
        if let Some(value) = read_env("SMARTCART_CATALOG_HAS_HEADER") {
            self.catalog.has_header = parse_bool("SMARTCART_CATALOG_HAS_HEADER", &value)?;
        }

        if let Some(value) = read_env("SMARTCART_ARTIFACTS_DIR") {
            self.artifacts.dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("SMARTCART_ARTIFACTS_ENCODER_FILE") {
            self.artifacts.encoder_file = value;
        }
        if let Some(value) = read_env("SMARTCART_ARTIFACTS_SCALER_FILE") {
            self.artifacts.scaler_file = value;
        }
        if let Some(value) = read_env("SMARTCART_ARTIFACTS_CLASSIFIER_FILE") {
            self.artifacts.classifier_file = value;
        }

        if let Some(value) = read_env("SMARTCART_TRAINING_MAX_DEPTH") {
            self.training.max_depth = Some(parse_usize("SMARTCART_TRAINING_MAX_DEPTH", &value)?);
        }
        if let Some(value) = read_env("SMARTCART_TRAINING_MIN_SAMPLES_SPLIT") {
            self.training.min_samples_split =
                parse_usize("SMARTCART_TRAINING_MIN_SAMPLES_SPLIT", &value)?;
        }

        if let Some(value) = read_env("SMARTCART_RECOMMENDATION_SEED") {
            self.recommendation.seed = Some(parse_u64("SMARTCART_RECOMMENDATION_SEED", &value)?);
        }

        let log_level =
            read_env("SMARTCART_LOGGING_LEVEL").or_else(|| read_env("SMARTCART_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SMARTCART_LOGGING_FORMAT").or_else(|| read_env("SMARTCART_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(catalog_path) = overrides.catalog_path {
            self.catalog.path = catalog_path;
        }
        if let Some(artifacts_dir) = overrides.artifacts_dir {
            self.artifacts.dir = artifacts_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
        if let Some(seed) = overrides.recommendation_seed {
            self.recommendation.seed = Some(seed);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_catalog(&self.catalog)?;
        validate_artifacts(&self.artifacts)?;
        validate_training(&self.training)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("smartcart.toml"), PathBuf::from("config/smartcart.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_catalog(catalog: &CatalogConfig) -> Result<(), ConfigError> {
    if catalog.path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("catalog.path must not be empty".to_string()));
    }
    Ok(())
}

fn validate_artifacts(artifacts: &ArtifactConfig) -> Result<(), ConfigError> {
    let files = [
        ("artifacts.encoder_file", &artifacts.encoder_file),
        ("artifacts.scaler_file", &artifacts.scaler_file),
        ("artifacts.classifier_file", &artifacts.classifier_file),
    ];

    for (key, file) in files {
        let trimmed = file.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::Validation(format!("{key} must not be empty")));
        }
        if trimmed.contains('/') || trimmed.contains('\\') {
            return Err(ConfigError::Validation(format!(
                "{key} must be a file name inside artifacts.dir, not a path (`{trimmed}`)"
            )));
        }
    }

    let distinct = artifacts.encoder_file != artifacts.scaler_file
        && artifacts.encoder_file != artifacts.classifier_file
        && artifacts.scaler_file != artifacts.classifier_file;
    if !distinct {
        return Err(ConfigError::Validation(
            "artifacts.encoder_file, artifacts.scaler_file and artifacts.classifier_file must differ"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_training(training: &TrainingConfig) -> Result<(), ConfigError> {
    if training.min_samples_split < 2 {
        return Err(ConfigError::Validation(
            "training.min_samples_split must be at least 2".to_string(),
        ));
    }
    if training.max_depth == Some(0) {
        return Err(ConfigError::Validation(
            "training.max_depth must be greater than zero when set".to_string(),
        ));
    }
    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    catalog: Option<CatalogPatch>,
    artifacts: Option<ArtifactPatch>,
    training: Option<TrainingPatch>,
    recommendation: Option<RecommendationPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct CatalogPatch {
    path: Option<PathBuf>,
    has_header: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct ArtifactPatch {
    dir: Option<PathBuf>,
    encoder_file: Option<String>,
    scaler_file: Option<String>,
    classifier_file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TrainingPatch {
    max_depth: Option<usize>,
    min_samples_split: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendationPatch {
    seed: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
