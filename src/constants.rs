//! Cross-cutting, shared constants.
//!
//! Runtime overrides live in [`crate::config::Config`]; these are the defaults it falls back to.

/// Number of results returned by a rerank call when the caller does not say otherwise.
pub const DEFAULT_TOP_K: usize = 4;

/// Query/passage pairs sent to the backend per inference call.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Token limit applied to each (query, passage) pair before inference.
pub const DEFAULT_MAX_SEQ_LEN: usize = 512;

/// Cutoffs reported by the evaluation harness.
pub const DEFAULT_K_VALUES: [usize; 4] = [1, 3, 5, 10];

/// Directory searched for model folders when a key is not itself a path.
pub const DEFAULT_MODEL_ROOT: &str = "./models";

/// Class slot assumed to mean "relevant" when a multi-logit model has no matching label.
pub const DEFAULT_POSITIVE_CLASS_INDEX: usize = 1;
