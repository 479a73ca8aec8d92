//! Score normalization and batched scoring.
//!
//! [`NormalizationStrategy`] is resolved once per model (see
//! [`crate::cache::CachedModelEntry`]) and applied to every batch that
//! [`ScoringPipeline`] scores under that model, so scores within a call are
//! always comparable.

pub mod error;
pub mod normalization;
pub mod pipeline;


pub use error::ScoringError;
pub use normalization::{NormalizationStrategy, positive_class_index, sigmoid, softmax};
pub use pipeline::ScoringPipeline;
