use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Instant;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared, try_join};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::entry::CachedModelEntry;
use super::error::{CacheError, CacheResult};
use super::key::ModelKey;
use crate::backend::ScoringBackend;
use crate::scoring::NormalizationStrategy;

type LoadResult<B> = CacheResult<Arc<CachedModelEntry<B>>>;
type SharedLoad<B> = Shared<BoxFuture<'static, LoadResult<B>>>;

struct PendingLoad<B: ScoringBackend> {
    generation: u64,
    future: SharedLoad<B>,
}

struct CacheState<B: ScoringBackend> {
    ready: HashMap<ModelKey, Arc<CachedModelEntry<B>>>,
    pending: HashMap<ModelKey, PendingLoad<B>>,
    next_generation: u64,
}

impl<B: ScoringBackend> CacheState<B> {
    fn new() -> Self {
        Self {
            ready: HashMap::new(),
            pending: HashMap::new(),
            next_generation: 0,
        }
    }
}

/// Registry of initialized models keyed by [`ModelKey`].
///
/// At most one load runs per key: the first caller starts it, later callers
/// await the same shared future and receive the same entry or the same error.
/// Failed loads are never stored. The check-then-start sequence runs under a
/// single lock, so no caller can observe a half-built entry.
///
/// Each load runs on its own task, so dropping the caller that started it
/// does not stall it. Must be used from within a Tokio runtime.
pub struct ModelCache<B: ScoringBackend> {
    backend: Arc<B>,
    state: Arc<Mutex<CacheState<B>>>,
}

impl<B: ScoringBackend> ModelCache<B> {
    /// Creates an empty cache over `backend`.
    pub fn new(backend: B) -> Self {
        Self::with_backend(Arc::new(backend))
    }

    /// Creates an empty cache over a shared backend.
    pub fn with_backend(backend: Arc<B>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(CacheState::new())),
        }
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the entry for `key`, loading it if needed.
    pub async fn ensure_loaded(&self, key: &ModelKey) -> LoadResult<B> {
        if key.is_blank() {
            return Err(CacheError::InvalidKey {
                reason: "model key cannot be empty".to_string(),
            });
        }

        let load = {
            let mut state = self.state.lock();

            if let Some(entry) = state.ready.get(key) {
                debug!(model = %key, "Model cache hit");
                return Ok(Arc::clone(entry));
            }

            match state.pending.get(key) {
                Some(pending) => {
                    debug!(model = %key, "Awaiting in-flight model load");
                    pending.future.clone()
                }
                None => {
                    let generation = state.next_generation;
                    state.next_generation += 1;

                    let future = Self::load(
                        Arc::clone(&self.backend),
                        Arc::clone(&self.state),
                        key.clone(),
                        generation,
                    )
                    .boxed()
                    .shared();

                    state.pending.insert(
                        key.clone(),
                        PendingLoad {
                            generation,
                            future: future.clone(),
                        },
                    );
                    // Drives the load to completion even if every caller goes away.
                    tokio::spawn(future.clone());
                    future
                }
            }
        };

        load.await
    }

    /// Returns the entry for `key` only if it is already loaded.
    pub fn get(&self, key: &ModelKey) -> Option<Arc<CachedModelEntry<B>>> {
        self.state.lock().ready.get(key).cloned()
    }

    /// Returns a loaded entry, or awaits a load already in flight.
    ///
    /// Never starts a load: a key that is neither loaded nor loading yields
    /// [`CacheError::NotInitialized`].
    pub async fn wait_ready(&self, key: &ModelKey) -> LoadResult<B> {
        let pending = {
            let state = self.state.lock();
            if let Some(entry) = state.ready.get(key) {
                return Ok(Arc::clone(entry));
            }
            state.pending.get(key).map(|p| p.future.clone())
        };

        match pending {
            Some(load) => load.await,
            None => Err(CacheError::NotInitialized { key: key.clone() }),
        }
    }

    /// Removes one entry (`Some(key)`) or every entry (`None`), in-flight
    /// markers included. Returns the number of loaded entries dropped.
    ///
    /// A load that was in flight still resolves for its waiters but is not
    /// stored; the next [`ensure_loaded`](Self::ensure_loaded) starts fresh.
    pub fn evict(&self, key: Option<&ModelKey>) -> usize {
        let mut state = self.state.lock();

        match key {
            Some(key) => {
                let removed = state.ready.remove(key).is_some();
                let cancelled = state.pending.remove(key).is_some();
                info!(model = %key, removed, cancelled, "Evicted model");
                usize::from(removed)
            }
            None => {
                let removed = state.ready.len();
                let cancelled = state.pending.len();
                state.ready.clear();
                state.pending.clear();
                info!(removed, cancelled, "Evicted all models");
                removed
            }
        }
    }

    /// Keys with a loaded entry.
    pub fn list_keys(&self) -> BTreeSet<ModelKey> {
        self.state.lock().ready.keys().cloned().collect()
    }

    /// `true` while a load for `key` is in flight.
    pub fn is_loading(&self, key: &ModelKey) -> bool {
        self.state.lock().pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.state.lock().ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().ready.is_empty()
    }

    async fn load(
        backend: Arc<B>,
        state: Arc<Mutex<CacheState<B>>>,
        key: ModelKey,
        generation: u64,
    ) -> LoadResult<B> {
        let started = Instant::now();
        info!(model = %key, "Loading cross-encoder model");

        let result = Self::initialize(&backend, &key).await;

        let mut state = state.lock();
        let current = state
            .pending
            .get(&key)
            .is_some_and(|p| p.generation == generation);
        if current {
            state.pending.remove(&key);
        }

        match result {
            Ok(entry) => {
                let entry = Arc::new(entry);
                if current {
                    state.ready.insert(key.clone(), Arc::clone(&entry));
                    info!(
                        model = %key,
                        strategy = ?entry.strategy(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Model loaded"
                    );
                } else {
                    warn!(model = %key, "Model evicted while loading; result not cached");
                }
                Ok(entry)
            }
            Err(e) => {
                warn!(model = %key, error = %e, "Model load failed");
                Err(e)
            }
        }
    }

    async fn initialize(backend: &B, key: &ModelKey) -> CacheResult<CachedModelEntry<B>> {
        let (model, tokenizer) = try_join(backend.load_model(key), backend.load_tokenizer(key))
            .await
            .map_err(|source| CacheError::LoadFailed {
                key: key.clone(),
                source,
            })?;

        let info = backend.model_info(&model);
        let strategy =
            NormalizationStrategy::resolve(&info).map_err(|e| CacheError::MalformedMetadata {
                key: key.clone(),
                reason: e.to_string(),
            })?;

        Ok(CachedModelEntry::new(
            key.clone(),
            model,
            tokenizer,
            info,
            strategy,
        ))
    }
}

impl<B: ScoringBackend> std::fmt::Debug for ModelCache<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ModelCache")
            .field("ready", &state.ready.len())
            .field("pending", &state.pending.len())
            .finish()
    }
}

/// Shared handle to a [`ModelCache`].
///
/// Clone it into every [`Reranker`](crate::reranker::Reranker) that should
/// share loaded models.
pub struct ModelCacheHandle<B: ScoringBackend> {
    inner: Arc<ModelCache<B>>,
}

impl<B: ScoringBackend> Clone for ModelCacheHandle<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: ScoringBackend> From<ModelCache<B>> for ModelCacheHandle<B> {
    fn from(cache: ModelCache<B>) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }
}

impl<B: ScoringBackend> ModelCacheHandle<B> {
    /// Creates a handle to a new, empty cache.
    #[inline]
    pub fn new(backend: B) -> Self {
        ModelCache::new(backend).into()
    }

    #[inline]
    pub fn backend(&self) -> &B {
        self.inner.backend()
    }

    #[inline]
    pub async fn ensure_loaded(&self, key: &ModelKey) -> LoadResult<B> {
        self.inner.ensure_loaded(key).await
    }

    #[inline]
    pub fn get(&self, key: &ModelKey) -> Option<Arc<CachedModelEntry<B>>> {
        self.inner.get(key)
    }

    #[inline]
    pub async fn wait_ready(&self, key: &ModelKey) -> LoadResult<B> {
        self.inner.wait_ready(key).await
    }

    #[inline]
    pub fn evict(&self, key: Option<&ModelKey>) -> usize {
        self.inner.evict(key)
    }

    #[inline]
    pub fn list_keys(&self) -> BTreeSet<ModelKey> {
        self.inner.list_keys()
    }

    #[inline]
    pub fn is_loading(&self, key: &ModelKey) -> bool {
        self.inner.is_loading(key)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<B: ScoringBackend> std::fmt::Debug for ModelCacheHandle<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}
