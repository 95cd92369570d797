//! Compiled mapper cache
//!
//! One compiled mapper per (source type, target type, selection graph,
//! variant) key, built lazily and kept for the life of the engine. Reads take
//! a shared lock; builds are serialized by a single build lock with a second
//! read under it, so each key is built exactly once even when many threads
//! ask for it at the same moment.
//!
//! Copyright (c) 2025 Shapeshift Team
//! Licensed under the Apache-2.0 license

use crate::compile::{CompiledMapper, Variant};
use crate::error::Result;
use crate::selection::SelectionGraph;
use crate::types::TypeRef;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cache key; selection graphs compare structurally
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source: TypeRef,
    pub target: TypeRef,
    pub graph: Option<SelectionGraph>,
    pub variant: Variant,
}

impl CacheKey {
    pub fn new(source: TypeRef, target: TypeRef, graph: Option<SelectionGraph>, variant: Variant) -> Self {
        Self {
            source,
            target,
            graph,
            variant,
        }
    }
}

/// Cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Compiled mappers built
    pub builds: u64,
    /// Lookups answered from the cache
    pub hits: u64,
    /// Cached compiled mappers
    pub entries: usize,
}

#[derive(Debug, Default)]
pub struct CompiledMapperCache {
    entries: RwLock<HashMap<CacheKey, Arc<CompiledMapper>>>,
    build_lock: Mutex<()>,
    builds: AtomicU64,
    hits: AtomicU64,
}

impl CompiledMapperCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<CompiledMapper>> {
        let found = self.entries.read().get(key).cloned();
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Return the cached mapper for `key`, building it on first request
    ///
    /// A failed build caches nothing; the next request retries.
    pub fn get_or_build<F>(&self, key: &CacheKey, build: F) -> Result<Arc<CompiledMapper>>
    where
        F: FnOnce() -> Result<CompiledMapper>,
    {
        if let Some(found) = self.get(key) {
            return Ok(found);
        }

        let _building = self.build_lock.lock();
        if let Some(found) = self.get(key) {
            log::debug!("{} -> {} was built by another caller", key.source, key.target);
            return Ok(found);
        }

        let compiled = Arc::new(build()?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.entries.write().insert(key.clone(), compiled.clone());
        Ok(compiled)
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.read().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            builds: self.builds.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
