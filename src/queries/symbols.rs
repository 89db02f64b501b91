//! Listing and name search over the cached bhavcopy.

use crate::error::Result;
use crate::models::CacheEntry;
use crate::store::CacheStore;

/// Result cap used when a caller has no preference.
pub const DEFAULT_LIMIT: usize = 10;

// ---------------------------------------------------------------------------
// SymbolQuery
// ---------------------------------------------------------------------------

/// Read-only view over the symbol cache.
///
/// Results follow the backend's key enumeration order, which is not sorted
/// and may differ between calls. A disconnected store yields empty results.
pub struct SymbolQuery<'a> {
    store: &'a CacheStore,
}

impl<'a> SymbolQuery<'a> {
    /// Create a new `SymbolQuery` bound to the given store.
    pub fn new(store: &'a CacheStore) -> Self {
        Self { store }
    }

    /// Up to `limit` cached entries.
    pub fn list(&self, limit: usize) -> Result<Vec<CacheEntry>> {
        self.store.entries_where(|_| true, Some(limit))
    }

    /// Up to `limit` entries whose name contains `query`, ignoring case.
    ///
    /// An empty query matches every symbol.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<CacheEntry>> {
        let needle = query.to_lowercase();
        self.store
            .entries_where(|key| key.to_lowercase().contains(&needle), Some(limit))
    }

    /// Exact, case-sensitive lookup by symbol name.
    pub fn get(&self, name: &str) -> Result<Option<CacheEntry>> {
        self.store.get(name)
    }

    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }
}
