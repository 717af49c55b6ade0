//! Memoizing registry of bases keyed by `(channels, depth)`
//!
//! The registry is an explicit value passed by reference into every operation,
//! so independent registries (one per test, say) never share state. Bases are
//! immutable once built and handed out as `Arc`s, so readers need no locking.
//! Builds for the same key are serialized through a per-key `OnceLock`, while
//! builds for different keys proceed concurrently.

use super::{LyndonBasis, WordIndexer, check_dims};
use crate::error::Result;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Default ceiling on `channels^depth`, in scalars per tensor level
pub const DEFAULT_MAX_LEVEL_SIZE: usize = 1 << 26;

type BasisKey = (usize, usize);

/// Size limits applied by a [`BasisRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Largest `channels^depth` the registry will build a basis for, and the
    /// most terms a Lyndon basis may spend on its bracket expansions
    pub max_level_size: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_level_size: DEFAULT_MAX_LEVEL_SIZE,
        }
    }
}

/// Per-key once-initialized slots
struct KeyedCache<V> {
    slots: RwLock<HashMap<BasisKey, Arc<OnceLock<Arc<V>>>>>,
}

impl<V> KeyedCache<V> {
    fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: BasisKey) -> Arc<OnceLock<Arc<V>>> {
        if let Some(slot) = self.slots.read().get(&key) {
            return Arc::clone(slot);
        }
        Arc::clone(self.slots.write().entry(key).or_default())
    }

    fn get_or_build(&self, key: BasisKey, build: impl FnOnce() -> V) -> Arc<V> {
        Arc::clone(self.slot(key).get_or_init(|| Arc::new(build())))
    }

    fn is_built(&self, key: BasisKey) -> bool {
        self.slots
            .read()
            .get(&key)
            .is_some_and(|slot| slot.get().is_some())
    }

    fn clear(&self) {
        self.slots.write().clear();
    }
}

/// Process-wide-shareable cache of word indexers and Lyndon bases
///
/// # Example
///
/// ```
/// use sigr::basis::BasisRegistry;
///
/// let registry = BasisRegistry::new();
/// let basis = registry.lyndon(2, 4)?;
/// assert_eq!(basis.len(), 8);
/// // second lookup returns the cached instance
/// assert!(std::sync::Arc::ptr_eq(&basis, &registry.lyndon(2, 4)?));
/// # Ok::<(), sigr::error::Error>(())
/// ```
pub struct BasisRegistry {
    config: RegistryConfig,
    words: KeyedCache<WordIndexer>,
    lyndon: KeyedCache<LyndonBasis>,
}

impl BasisRegistry {
    /// Create an empty registry with the default size ceiling
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with a custom size ceiling
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            words: KeyedCache::new(),
            lyndon: KeyedCache::new(),
        }
    }

    /// The limits this registry enforces
    #[inline]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Word indexer for `(channels, depth)`, built on first use
    pub fn words(&self, channels: usize, depth: usize) -> Result<Arc<WordIndexer>> {
        check_dims(channels, depth, self.config.max_level_size)?;
        Ok(self.words.get_or_build((channels, depth), || {
            let indexer = WordIndexer::build(channels, depth);
            tracing::debug!(
                channels,
                depth,
                signature_channels = indexer.signature_channels(),
                "built word indexer"
            );
            indexer
        }))
    }

    /// Lyndon basis for `(channels, depth)`, built on first use
    pub fn lyndon(&self, channels: usize, depth: usize) -> Result<Arc<LyndonBasis>> {
        check_dims(channels, depth, self.config.max_level_size)?;
        Ok(self.lyndon.get_or_build((channels, depth), || {
            let basis = LyndonBasis::generate(channels, depth, self.config.max_level_size);
            tracing::debug!(channels, depth, words = basis.len(), "built Lyndon basis");
            basis
        }))
    }

    /// Seed the cache with a basis restored from a persisted table
    ///
    /// An already cached basis for the same key wins; both are identical by
    /// construction, so the incoming one is dropped. The registry's ceiling
    /// replaces the basis' own bracket term limit.
    pub fn preload(&self, basis: LyndonBasis) -> Result<Arc<LyndonBasis>> {
        let (channels, depth) = basis.key();
        check_dims(channels, depth, self.config.max_level_size)?;
        let incoming = Arc::new(basis.with_term_limit(self.config.max_level_size));
        let slot = self.lyndon.slot((channels, depth));
        let cached = slot.get_or_init(|| {
            tracing::debug!(channels, depth, "preloaded Lyndon basis");
            Arc::clone(&incoming)
        });
        Ok(Arc::clone(cached))
    }

    /// Whether a Lyndon basis for `(channels, depth)` is already built
    pub fn has_lyndon(&self, channels: usize, depth: usize) -> bool {
        self.lyndon.is_built((channels, depth))
    }

    /// Drop every cached basis
    ///
    /// Outstanding `Arc`s stay valid; later lookups rebuild.
    pub fn clear(&self) {
        self.words.clear();
        self.lyndon.clear();
    }
}

impl Default for BasisRegistry {
    fn default() -> Self {
        Self::new()
    }
}
