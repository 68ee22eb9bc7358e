//! Recommended-next-item resolution
//!
//! Given a product, asks the trained bucket classifier which price bucket to
//! look in and picks one alternative product from it, with defined fallbacks
//! when the classifier cannot help or the bucket is empty.

mod engine;
mod picker;
mod types;

pub use engine::{recommend, SuggestionEngine};
pub use picker::{FirstPicker, Picker, RandomPicker};
pub use types::*;

use crate::errors::DomainError;

/// Result type for suggestion operations
pub type SuggestionResult<T> = Result<T, DomainError>;
