//! Resolution session: the full pipeline behind a coalescing document cache.
//!
//! Documents are cached by the canonical set of their sources. Concurrent
//! requests for the same set share a single build; every caller receives the
//! same `Arc`. Failed builds are not cached.
use crate::document::MetadataDocument;
use crate::error::{ConfigurationError, ResolveResult};
use crate::sources::{canonical_sources, CacheKey};
use crate::{certificate, defaults, license, loader, normalize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

type Slot = Arc<OnceLock<ResolveResult<Arc<MetadataDocument>>>>;

/// A caller-owned document cache.
#[derive(Default)]
pub struct Resolver {
    cache: Mutex<HashMap<CacheKey, Slot>>,
    builds: AtomicUsize,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resolved document for `sources`, built at most once per source set.
    pub fn load(&self, sources: &[PathBuf]) -> ResolveResult<Arc<MetadataDocument>> {
        if sources.is_empty() {
            return Err(ConfigurationError::NoSources.into());
        }
        let sources = canonical_sources(sources);
        let key = CacheKey::for_sources(&sources);
        let slot = {
            let mut cache = self.lock();
            Arc::clone(cache.entry(key.clone()).or_default())
        };

        if slot.get().is_some() {
            tracing::debug!(key = %key, "document cache hit");
        }
        let result = slot
            .get_or_init(|| {
                self.builds.fetch_add(1, Ordering::SeqCst);
                tracing::debug!(key = %key, "document cache miss");
                build(&sources).map(Arc::new)
            })
            .clone();

        if let Err(err) = &result {
            tracing::debug!(key = %key, error = %err, "dropping failed build from cache");
            let mut cache = self.lock();
            if cache
                .get(&key)
                .is_some_and(|cached| Arc::ptr_eq(cached, &slot))
            {
                cache.remove(&key);
            }
        }
        result
    }

    /// Number of pipeline runs so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Forget the cached document for `sources`.
    pub fn invalidate(&self, sources: &[PathBuf]) -> bool {
        let key = CacheKey::for_sources(sources);
        self.lock().remove(&key).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run the full pipeline once, without caching.
///
/// load, normalize, licenses, certificates, defaults.
pub fn build(sources: &[PathBuf]) -> ResolveResult<MetadataDocument> {
    let mut doc = loader::load(sources)?;
    normalize::normalize(&mut doc)?;
    license::resolve_licenses(&mut doc)?;
    certificate::resolve_certificates(&mut doc)?;
    defaults::apply_defaults(&mut doc);
    tracing::info!(
        artworks = doc.artwork_ids().len(),
        warnings = doc.warnings().len(),
        "resolved metadata document"
    );
    Ok(doc)
}

