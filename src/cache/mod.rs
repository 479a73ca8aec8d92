//! Process-wide model cache.
//!
//! [`ModelCache`] maps a [`ModelKey`] to one [`CachedModelEntry`] (model,
//! tokenizer, declared metadata and normalization strategy). It starts empty,
//! is populated by [`ModelCache::ensure_loaded`] and emptied by
//! [`ModelCache::evict`]. Share it between rerankers through
//! [`ModelCacheHandle`].

pub mod entry;
pub mod error;
pub mod key;
pub mod registry;

#[cfg(test)]
mod tests;

pub use entry::CachedModelEntry;
pub use error::{CacheError, CacheResult};
pub use key::ModelKey;
pub use registry::{ModelCache, ModelCacheHandle};
