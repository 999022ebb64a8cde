// navrs-transect/src/index/cache.rs

//! Bounded LRU cache of spatial indexes keyed by grid source.

use super::errors::SpatialIndexError;
use super::spatial_index::SpatialIndex;
use log::{debug, info, trace};
use lru::LruCache;
use ndarray::ArrayView2;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

pub const DEFAULT_CAPACITY: usize = 16;

/// Held while a key's index is being built, so one build runs per key.
type BuildGate = Arc<Mutex<()>>;

#[derive(Default)]
pub struct SpatialIndexCacheStats {
    pub hits: AtomicU64,
    pub misses: AtomicU64,
    pub builds: AtomicU64,
    pub evictions: AtomicU64,
}

impl SpatialIndexCacheStats {
    /// Cache hit rate as a percentage (0-100).
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        if total == 0 {
            0.0
        } else {
            (hits as f64 / total as f64) * 100.0
        }
    }
}

/// Shared cache of built [`SpatialIndex`]es.
///
/// `get_or_build` runs at most one build per key even when called
/// concurrently. Only finished indexes enter the LRU, so a failed or
/// in-flight build never evicts anything; evicted keys are rebuilt on
/// their next use.
pub struct SpatialIndexCache {
    entries: Mutex<LruCache<String, Arc<SpatialIndex>>>,
    building: Mutex<HashMap<String, BuildGate>>,
    stats: SpatialIndexCacheStats,
    capacity: usize,
}

impl Default for SpatialIndexCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SpatialIndexCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!("SpatialIndexCache initialized: capacity={}", capacity);
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN),
            )),
            building: Mutex::new(HashMap::new()),
            stats: SpatialIndexCacheStats::default(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    pub fn stats(&self) -> &SpatialIndexCacheStats {
        &self.stats
    }

    /// Cached index for `key` if its shape matches, marking it most
    /// recently used.
    fn lookup(&self, key: &str, shape: (usize, usize)) -> Option<Arc<SpatialIndex>> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let index = entries.get(key)?;
        if index.shape() == shape {
            return Some(index.clone());
        }
        debug!(
            "Cached index for {} has shape {:?}, expected {:?}; rebuilding",
            key,
            index.shape(),
            shape
        );
        None
    }

    fn insert(&self, key: &str, index: Arc<SpatialIndex>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((evicted, _)) = entries.push(key.to_string(), index) {
            if evicted != key {
                self.stats.evictions.fetch_add(1, Ordering::Relaxed);
                debug!("Evicted spatial index for {}", evicted);
            }
        }
    }

    fn gate(&self, key: &str) -> BuildGate {
        let mut building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        building.entry(key.to_string()).or_default().clone()
    }

    /// Drops the gate for `key` once no other caller holds it.
    fn release(&self, key: &str, gate: BuildGate) {
        let mut building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = building
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, &gate) && Arc::strong_count(&gate) == 2);
        if idle {
            building.remove(key);
        }
    }

    /// Returns the index cached under `key`, building it from the
    /// coordinate arrays on a miss.
    pub fn get_or_build(
        &self,
        key: &str,
        latitudes: ArrayView2<f64>,
        longitudes: ArrayView2<f64>,
    ) -> Result<Arc<SpatialIndex>, SpatialIndexError> {
        let shape = latitudes.dim();
        if let Some(index) = self.lookup(key, shape) {
            trace!("Spatial index cache hit for {}", key);
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(index);
        }
        let gate = self.gate(key);
        let result = {
            let _building = gate.lock().unwrap_or_else(PoisonError::into_inner);
            // another caller may have finished the build while we waited
            if let Some(index) = self.lookup(key, shape) {
                trace!("Spatial index cache hit for {} after waiting", key);
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                Ok(index)
            } else {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                SpatialIndex::build(latitudes, longitudes).map(|index| {
                    self.stats.builds.fetch_add(1, Ordering::Relaxed);
                    let index = Arc::new(index);
                    self.insert(key, index.clone());
                    index
                })
            }
        };
        self.release(key, gate);
        result
    }
}
