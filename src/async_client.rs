//! Async wrapper around [`Bhavcopy`] for use in async runtimes (Tokio, etc.).
//!
//! Every operation runs on the blocking thread pool via
//! [`tokio::task::spawn_blocking`], since downloads, archive parsing and
//! Redis calls all block.
//!
//! # Example
//!
//! ```no_run
//! use bhavcopy::{AsyncBhavcopy, Bhavcopy};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let bhav = AsyncBhavcopy::build(Bhavcopy::builder()).await.unwrap();
//!     bhav.run(|b| Ok(b.connect())).await.unwrap();
//!
//!     let top = bhav.list(10).await.unwrap();
//!     let hits = bhav.search("infosys", 10).await.unwrap();
//! }
//! ```

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::error::{BhavcopyError, Result};
use crate::ingest::IngestOutcome;
use crate::models::CacheEntry;
use crate::{Bhavcopy, BhavcopyBuilder};

/// Async wrapper around [`Bhavcopy`].
///
/// The inner service sits behind a [`Mutex`], so concurrent callers are
/// served one at a time over the single cache connection.
#[derive(Clone)]
pub struct AsyncBhavcopy {
    inner: Arc<Mutex<Bhavcopy>>,
}

impl AsyncBhavcopy {
    /// Build the service on the blocking pool.
    ///
    /// The default HTTP source owns a blocking `reqwest` client, which must
    /// not be created on an async worker thread.
    pub async fn build(builder: BhavcopyBuilder) -> Result<Self> {
        tokio::task::spawn_blocking(move || {
            let bhav = builder.build()?;
            Ok(Self::from_blocking(bhav))
        })
        .await
        .map_err(|e| BhavcopyError::InvalidArgument(format!("Task join error: {e}")))?
    }

    /// Wrap an already-built service.
    pub fn from_blocking(bhav: Bhavcopy) -> Self {
        Self {
            inner: Arc::new(Mutex::new(bhav)),
        }
    }

    /// Run a sync operation on the blocking thread pool.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Bhavcopy) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let bhav = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = bhav
                .lock()
                .map_err(|_| BhavcopyError::InvalidArgument("Bhavcopy lock poisoned".into()))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| BhavcopyError::InvalidArgument(format!("Task join error: {e}")))?
    }

    pub async fn ingest(&self, date: NaiveDate) -> Result<IngestOutcome> {
        self.run(move |b| b.ingest(date)).await
    }

    /// Top `limit` cached entries.
    pub async fn list(&self, limit: usize) -> Result<Vec<CacheEntry>> {
        self.run(move |b| b.symbols().list(limit)).await
    }

    /// Top `limit` entries whose name contains `query`, ignoring case.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<CacheEntry>> {
        let query = query.to_string();
        self.run(move |b| b.symbols().search(&query, limit)).await
    }

    /// Release the service on the blocking pool.
    pub async fn close(self) -> Result<()> {
        tokio::task::spawn_blocking(move || drop(self))
            .await
            .map_err(|e| BhavcopyError::InvalidArgument(format!("Task join error: {e}")))
    }
}
