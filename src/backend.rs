//! Key-value backends for the symbol cache.
//!
//! [`RedisBackend`] is the production store. [`MemoryBackend`] keeps
//! everything in a shared in-process map and can be told to refuse
//! connections or fail commits, which makes outages reproducible.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use redis::Commands;

use crate::config::StoreConfig;
use crate::error::{BhavcopyError, Result};

/// Minimal command surface the cache needs.
pub trait KeyValueBackend: Send {
    /// Health probe.
    fn ping(&mut self) -> Result<()>;

    /// Every key in the selected database, in backend order.
    fn keys(&mut self) -> Result<Vec<String>>;

    fn get(&mut self, key: &str) -> Result<Option<String>>;

    /// Apply all writes as one atomic request: either every pair is stored
    /// or none is.
    fn apply(&mut self, writes: &[(String, String)]) -> Result<()>;

    /// Drop every key in the selected database.
    fn flush(&mut self) -> Result<()>;
}

/// Opens a backend for a given configuration.
pub trait BackendFactory: Send {
    fn open(&self, config: &StoreConfig) -> Result<Box<dyn KeyValueBackend>>;
}

// ---------------------------------------------------------------------------
// Redis
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct RedisFactory;

impl BackendFactory for RedisFactory {
    fn open(&self, config: &StoreConfig) -> Result<Box<dyn KeyValueBackend>> {
        let client = redis::Client::open(config.url().as_str())?;
        let conn = client.get_connection_with_timeout(config.timeout)?;
        conn.set_read_timeout(Some(config.timeout))?;
        conn.set_write_timeout(Some(config.timeout))?;
        Ok(Box::new(RedisBackend { conn }))
    }
}

pub struct RedisBackend {
    conn: redis::Connection,
}

impl KeyValueBackend for RedisBackend {
    fn ping(&mut self) -> Result<()> {
        redis::cmd("PING").query::<String>(&mut self.conn)?;
        Ok(())
    }

    fn keys(&mut self) -> Result<Vec<String>> {
        let iter: redis::Iter<'_, String> = self.conn.scan()?;
        Ok(iter.collect())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = self.conn.get(key)?;
        Ok(value)
    }

    fn apply(&mut self, writes: &[(String, String)]) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        pipe.atomic();
        for (key, value) in writes {
            pipe.set(key, value).ignore();
        }
        pipe.query::<()>(&mut self.conn)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        redis::cmd("FLUSHDB").query::<()>(&mut self.conn)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// A cloneable handle to one shared map. Clones see the same data and the
/// same failure switches.
///
/// Keys enumerate in sorted order.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    reachable: Arc<AtomicBool>,
    fail_commits: Arc<AtomicBool>,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self {
            entries: Arc::new(Mutex::new(BTreeMap::new())),
            reachable: Arc::new(AtomicBool::new(true)),
            fail_commits: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose health probe always fails.
    pub fn unreachable() -> Self {
        let backend = Self::default();
        backend.set_reachable(false);
        backend
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    /// When set, `apply` fails without storing anything, as if the
    /// connection dropped before the transaction executed.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Store a raw value directly, bypassing serialization.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.lock()?.insert(key.into(), value.into());
        Ok(())
    }

    pub fn snapshot(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.lock()?.clone())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| BhavcopyError::Backend("memory backend lock poisoned".into()))
    }

    fn check_reachable(&self) -> Result<()> {
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BhavcopyError::Backend("connection refused".into()))
        }
    }
}

impl KeyValueBackend for MemoryBackend {
    fn ping(&mut self) -> Result<()> {
        self.check_reachable()
    }

    fn keys(&mut self) -> Result<Vec<String>> {
        self.check_reachable()?;
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>> {
        self.check_reachable()?;
        Ok(self.lock()?.get(key).cloned())
    }

    fn apply(&mut self, writes: &[(String, String)]) -> Result<()> {
        self.check_reachable()?;
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(BhavcopyError::Backend(
                "connection dropped before commit".into(),
            ));
        }
        let mut entries = self.lock()?;
        for (key, value) in writes {
            entries.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.check_reachable()?;
        self.lock()?.clear();
        Ok(())
    }
}

impl BackendFactory for MemoryBackend {
    fn open(&self, _config: &StoreConfig) -> Result<Box<dyn KeyValueBackend>> {
        Ok(Box::new(self.clone()))
    }
}
