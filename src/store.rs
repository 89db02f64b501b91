//! Symbol cache on top of a key-value backend.
//!
//! Keys are symbol names and values are JSON-encoded [`Quote`]s. The store
//! connects on a best-effort basis: when the backend cannot be reached it
//! stays disconnected, reads come back empty and writes are skipped, so
//! callers branch on [`StoreStatus`] instead of handling errors.
//!
//! Nothing here expires. A symbol absent from the latest report keeps its
//! previous value until it is overwritten or the database is cleared.

use std::cell::RefCell;

use tracing::{debug, error, info};

use crate::backend::{BackendFactory, KeyValueBackend, RedisFactory};
use crate::config::StoreConfig;
use crate::error::{BhavcopyError, Result};
use crate::models::{CacheEntry, Quote};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreStatus {
    Connected,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Number of keys written in one atomic request.
    Committed(usize),
    /// No batch was open; nothing was sent.
    Skipped,
}

pub struct CacheStore {
    config: StoreConfig,
    factory: Box<dyn BackendFactory>,
    client: RefCell<Option<Box<dyn KeyValueBackend>>>,
    batch: Option<Vec<(String, String)>>,
}

impl CacheStore {
    /// A Redis-backed store. Does not connect until [`connect`](Self::connect).
    pub fn new(config: StoreConfig) -> Self {
        Self::with_backend(config, RedisFactory)
    }

    pub fn with_backend<F: BackendFactory + 'static>(config: StoreConfig, factory: F) -> Self {
        Self::with_boxed_backend(config, Box::new(factory))
    }

    pub fn with_boxed_backend(config: StoreConfig, factory: Box<dyn BackendFactory>) -> Self {
        Self {
            config,
            factory,
            client: RefCell::new(None),
            batch: None,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.client.borrow().is_some()
    }

    // -- Connection lifecycle ----------------------------------------------

    /// Open a fresh connection and probe it.
    ///
    /// Any previous connection and open batch are dropped first. Failure is
    /// logged and reported as [`StoreStatus::Unavailable`].
    pub fn connect(&mut self) -> StoreStatus {
        self.close();

        let opened = self.factory.open(&self.config).and_then(|mut backend| {
            backend.ping()?;
            Ok(backend)
        });

        match opened {
            Ok(backend) => {
                info!(host = %self.config.host, port = self.config.port, index = self.config.index, "connected to cache");
                *self.client.get_mut() = Some(backend);
                StoreStatus::Connected
            }
            Err(e) => {
                error!(host = %self.config.host, port = self.config.port, error = %e, "Unable to connect to cache");
                StoreStatus::Unavailable
            }
        }
    }

    /// Connect only if not already connected.
    pub fn ensure_connected(&mut self) -> StoreStatus {
        if self.is_connected() {
            StoreStatus::Connected
        } else {
            self.connect()
        }
    }

    /// Drop the connection and any uncommitted batch.
    pub fn close(&mut self) {
        self.batch = None;
        *self.client.get_mut() = None;
    }

    // -- Writes ------------------------------------------------------------

    /// Open a write batch, replacing any batch already open.
    ///
    /// Returns `false` (and logs) when disconnected.
    pub fn begin_batch(&mut self) -> bool {
        if !self.is_connected() {
            error!("Unable to start write batch: cache is not connected");
            return false;
        }
        self.batch = Some(Vec::new());
        true
    }

    pub fn has_batch(&self) -> bool {
        self.batch.is_some()
    }

    /// Writes queued in the open batch.
    pub fn pending(&self) -> usize {
        self.batch.as_ref().map(Vec::len).unwrap_or(0)
    }

    /// Queue one entry. Returns `Ok(false)` when no batch is open.
    pub fn queue(&mut self, entry: &CacheEntry) -> Result<bool> {
        let value = serde_json::to_string(&entry.quote)?;
        match self.batch.as_mut() {
            Some(batch) => {
                batch.push((entry.name.clone(), value));
                Ok(true)
            }
            None => {
                error!(key = %entry.name, "Unable to queue write: no active batch");
                Ok(false)
            }
        }
    }

    /// Send every queued write as one atomic request and close the batch.
    ///
    /// With no open batch this logs and returns [`WriteOutcome::Skipped`].
    /// If the request fails, none of the batch is applied and the error is
    /// returned.
    pub fn commit(&mut self) -> Result<WriteOutcome> {
        let Some(writes) = self.batch.take() else {
            error!("Unable to insert data: no active write batch");
            return Ok(WriteOutcome::Skipped);
        };

        let mut client = self.client.borrow_mut();
        let Some(backend) = client.as_mut() else {
            error!("Unable to insert data: cache is not connected");
            return Ok(WriteOutcome::Skipped);
        };

        backend.apply(&writes)?;
        info!(keys = writes.len(), "committed write batch");
        Ok(WriteOutcome::Committed(writes.len()))
    }

    /// Abandon the open batch. Returns how many writes were dropped.
    pub fn discard_batch(&mut self) -> usize {
        let dropped = self.batch.take().map(|b| b.len()).unwrap_or(0);
        if dropped > 0 {
            debug!(dropped, "discarded write batch");
        }
        dropped
    }

    /// Begin, queue everything, commit.
    pub fn bulk_write<I>(&mut self, entries: I) -> Result<WriteOutcome>
    where
        I: IntoIterator<Item = CacheEntry>,
    {
        if !self.begin_batch() {
            return Ok(WriteOutcome::Skipped);
        }
        for entry in entries {
            self.queue(&entry)?;
        }
        self.commit()
    }

    // -- Reads -------------------------------------------------------------

    /// Every cached entry, in backend key order. Empty when disconnected.
    pub fn read_all(&self) -> Result<Vec<CacheEntry>> {
        self.entries_where(|_| true, None)
    }

    /// Entries whose name contains `substring`, ignoring case.
    pub fn search(&self, substring: &str) -> Result<Vec<CacheEntry>> {
        let needle = substring.to_lowercase();
        self.entries_where(|key| key.to_lowercase().contains(&needle), None)
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Result<Option<CacheEntry>> {
        let mut client = self.client.borrow_mut();
        let Some(backend) = client.as_mut() else {
            return Ok(None);
        };
        match backend.get(name)? {
            Some(raw) => Ok(Some(CacheEntry::new(name, decode(name, &raw)?))),
            None => Ok(None),
        }
    }

    /// Number of cached symbols. Zero when disconnected.
    pub fn count(&self) -> Result<usize> {
        let mut client = self.client.borrow_mut();
        match client.as_mut() {
            Some(backend) => Ok(backend.keys()?.len()),
            None => Ok(0),
        }
    }

    /// Remove every key from the logical database. No-op when disconnected.
    pub fn clear(&self) -> Result<()> {
        if let Some(backend) = self.client.borrow_mut().as_mut() {
            backend.flush()?;
            info!(index = self.config.index, "cleared cache");
        }
        Ok(())
    }

    /// Filter keys first, then fetch and decode values, stopping after
    /// `limit` matches. Keys deleted mid-scan are skipped.
    pub(crate) fn entries_where<P>(&self, predicate: P, limit: Option<usize>) -> Result<Vec<CacheEntry>>
    where
        P: Fn(&str) -> bool,
    {
        let mut client = self.client.borrow_mut();
        let Some(backend) = client.as_mut() else {
            return Ok(Vec::new());
        };

        let limit = limit.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        for key in backend.keys()? {
            if out.len() >= limit {
                break;
            }
            if !predicate(&key) {
                continue;
            }
            if let Some(raw) = backend.get(&key)? {
                let quote = decode(&key, &raw)?;
                out.push(CacheEntry::new(key, quote));
            }
        }
        Ok(out)
    }
}

fn decode(key: &str, raw: &str) -> Result<Quote> {
    serde_json::from_str(raw).map_err(|source| BhavcopyError::CorruptEntry {
        key: key.to_string(),
        source,
    })
}
