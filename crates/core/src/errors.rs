use thiserror::Error;

use crate::catalog::CatalogLoadError;
use crate::config::ConfigError;
use crate::ml::{ArtifactLoadError, TrainingError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}

/// Failures that stop the storefront from serving requests.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogLoadError),
    #[error(transparent)]
    Artifacts(#[from] ArtifactLoadError),
    #[error(transparent)]
    Training(#[from] TrainingError),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_validation",
            Self::Catalog(_) => "catalog_load",
            Self::Artifacts(_) => "artifact_load",
            Self::Training(_) => "training",
            Self::Domain(_) => "invariant_violation",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Catalog(_) => 3,
            Self::Artifacts(_) => 4,
            Self::Training(_) => 5,
            Self::Domain(_) => 6,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Config(_) => "The storefront configuration is invalid.",
            Self::Catalog(_) => "The product catalog could not be loaded.",
            Self::Artifacts(_) => "The recommendation model files could not be loaded.",
            Self::Training(_) => "The recommendation model could not be trained.",
            Self::Domain(_) => "An unexpected internal error occurred.",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::catalog::CatalogLoadError;
    use crate::errors::{ApplicationError, DomainError};
    use crate::ml::ArtifactLoadError;

    #[test]
    fn invariant_violation_maps_to_domain_class() {
        let error = ApplicationError::from(DomainError::InvariantViolation(
            "cart item `x` is not present in the catalog".to_owned(),
        ));

        assert_eq!(error.error_class(), "invariant_violation");
        assert_eq!(error.exit_code(), 6);
        assert_eq!(error.user_message(), "An unexpected internal error occurred.");
    }

    #[test]
    fn startup_failures_have_distinct_exit_codes() {
        let catalog = ApplicationError::from(CatalogLoadError::Empty);
        let artifacts =
            ApplicationError::from(ArtifactLoadError::Missing(PathBuf::from("encoder.json")));

        assert_eq!(catalog.error_class(), "catalog_load");
        assert_eq!(artifacts.error_class(), "artifact_load");
        assert_ne!(catalog.exit_code(), artifacts.exit_code());
    }

    #[test]
    fn transparent_errors_keep_source_message() {
        let error =
            ApplicationError::from(ArtifactLoadError::Missing(PathBuf::from("scaler.json")));
        assert!(error.to_string().contains("scaler.json"));
    }
}
