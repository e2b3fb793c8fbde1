use std::collections::HashMap;

use crate::types::{CacheKey, ChartData};

/// Manages caching of aggregated chart data per language selection
#[derive(Clone)]
pub struct ChartCache {
    cache: HashMap<CacheKey, ChartData>,
}

impl ChartCache {
    /// Create a new cache
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// Store aggregated data in the cache
    pub fn store(&mut self, key: CacheKey, data: ChartData) {
        self.cache.insert(key, data);
    }

    /// Retrieve aggregated data from the cache
    pub fn get(&self, key: &CacheKey) -> Option<&ChartData> {
        self.cache.get(key)
    }

    /// Clear the cache
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}

impl Default for ChartCache {
    fn default() -> Self {
        Self::new()
    }
}
