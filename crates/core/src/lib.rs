pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ml;
pub mod storefront;
pub mod suggestions;

pub use catalog::{Catalog, CatalogLoadError, CatalogOptions};
pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use domain::cart::{Cart, CartLine};
pub use domain::product::{PriceBucket, Product};
pub use errors::{ApplicationError, DomainError};
pub use ml::{
    train, ArtifactLoadError, ArtifactPaths, Artifacts, PipelineError, RecommendationModel,
    TrainedPipeline, TrainingError, TrainingOptions, TrainingReport,
};
pub use storefront::{SessionId, ShopperSession, Storefront};
pub use suggestions::{
    recommend, EchoReason, FirstPicker, Picker, RandomPicker, Resolution, ResolutionStrategy,
    SuggestionEngine,
};
