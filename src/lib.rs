//! BSE bhavcopy downloader and symbol cache.
//!
//! Downloads the exchange's daily end-of-day equity report (a zipped CSV),
//! stores one entry per symbol in Redis, and answers listing and
//! name-search queries from that cache.
//!
//! # Quick start
//!
//! ```no_run
//! use bhavcopy::Bhavcopy;
//!
//! let mut bhav = Bhavcopy::builder().build().unwrap();
//! bhav.connect();
//! bhav.ingest_today().unwrap();
//!
//! for entry in bhav.symbols().search("reliance", 10).unwrap() {
//!     println!("{:?}", entry.to_row());
//! }
//! ```

#[cfg(feature = "async")]
pub mod async_client;
pub mod backend;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod ingest;
pub mod models;
pub mod queries;
pub mod store;

#[cfg(feature = "async")]
pub use async_client::AsyncBhavcopy;
pub use backend::{BackendFactory, KeyValueBackend, MemoryBackend, RedisFactory};
pub use config::StoreConfig;
pub use error::{BhavcopyError, Result};
pub use fetcher::{FetchOutcome, HttpSource, ReportFetcher, ReportSource};
pub use ingest::{IngestOutcome, Ingestor};
pub use models::{CacheEntry, Quote, ReportRow};
pub use store::{CacheStore, StoreStatus, WriteOutcome};

use std::fmt;
use std::time::Duration;

use chrono::NaiveDate;

// ---------------------------------------------------------------------------
// BhavcopyBuilder
// ---------------------------------------------------------------------------

/// Builder for configuring and constructing a [`Bhavcopy`] instance.
///
/// Use [`Bhavcopy::builder()`] to obtain a builder, chain configuration
/// methods, and call [`build()`](BhavcopyBuilder::build).
pub struct BhavcopyBuilder {
    base_url: String,
    timeout: Duration,
    max_attempts: u32,
    store_config: Option<StoreConfig>,
    source: Option<Box<dyn ReportSource>>,
    backend: Option<Box<dyn BackendFactory>>,
}

impl Default for BhavcopyBuilder {
    fn default() -> Self {
        Self {
            base_url: config::BASE_URL.to_string(),
            timeout: config::HTTP_TIMEOUT,
            max_attempts: config::MAX_ATTEMPTS,
            store_config: None,
            source: None,
            backend: None,
        }
    }
}

impl BhavcopyBuilder {
    /// Override the exchange host, e.g. for a mirror.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// HTTP request timeout for report downloads. Defaults to 30 seconds.
    ///
    /// Ignored when a custom [`source`](Self::source) is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// How many dates to try, walking backwards one day each time.
    /// Defaults to 4.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Cache connection settings.
    ///
    /// If not set, they are read from `DB_HOST`, `DB_PORT` and `DB_INDEX`
    /// when [`build()`](Self::build) runs.
    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = Some(config);
        self
    }

    /// Replace the HTTP source.
    pub fn source<S: ReportSource + 'static>(mut self, source: S) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Replace the Redis backend.
    pub fn backend<F: BackendFactory + 'static>(mut self, factory: F) -> Self {
        self.backend = Some(Box::new(factory));
        self
    }

    /// Build the service. No network or cache traffic happens here; call
    /// [`Bhavcopy::connect`] before using the cache.
    pub fn build(self) -> Result<Bhavcopy> {
        let source = match self.source {
            Some(source) => source,
            None => Box::new(HttpSource::new(self.timeout)?),
        };
        let fetcher = ReportFetcher::new(source, self.base_url, self.max_attempts)?;

        let store_config = match self.store_config {
            Some(config) => config,
            None => StoreConfig::from_env()?,
        };
        let store = match self.backend {
            Some(factory) => CacheStore::with_boxed_backend(store_config, factory),
            None => CacheStore::new(store_config),
        };

        Ok(Bhavcopy { fetcher, store })
    }
}

// ---------------------------------------------------------------------------
// Bhavcopy
// ---------------------------------------------------------------------------

/// Owns one [`ReportFetcher`] and one [`CacheStore`].
///
/// Lifecycle: [`builder()`](Self::builder) → [`connect()`](Self::connect) →
/// ingest and query → [`close()`](Self::close).
pub struct Bhavcopy {
    fetcher: ReportFetcher,
    store: CacheStore,
}

impl Bhavcopy {
    pub fn builder() -> BhavcopyBuilder {
        BhavcopyBuilder::default()
    }

    /// Best-effort connect to the cache.
    pub fn connect(&mut self) -> StoreStatus {
        self.store.connect()
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    /// Download the report for `date` (or an earlier one) without caching it.
    pub fn fetch(&self, date: NaiveDate) -> Result<FetchOutcome> {
        self.fetcher.fetch(date)
    }

    /// Run one ingestion for `date`.
    pub fn ingest(&mut self, date: NaiveDate) -> Result<IngestOutcome> {
        Ingestor::new(&self.fetcher, &mut self.store).run(date)
    }

    /// Run one ingestion for the local calendar date.
    pub fn ingest_today(&mut self) -> Result<IngestOutcome> {
        self.ingest(chrono::Local::now().date_naive())
    }

    /// Access the listing/search interface.
    pub fn symbols(&self) -> queries::SymbolQuery<'_> {
        queries::SymbolQuery::new(&self.store)
    }

    /// Remove every cached symbol from the configured database.
    pub fn clear(&self) -> Result<()> {
        self.store.clear()
    }

    pub fn fetcher(&self) -> &ReportFetcher {
        &self.fetcher
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut CacheStore {
        &mut self.store
    }

    /// Drop the cache connection and release the HTTP client.
    pub fn close(mut self) {
        self.store.close();
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

impl fmt::Display for Bhavcopy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.store.config();
        write!(
            f,
            "Bhavcopy(source={}, attempts={}, cache={}:{}/{}, connected={})",
            self.fetcher.base_url(),
            self.fetcher.max_attempts(),
            config.host,
            config.port,
            config.index,
            self.store.is_connected()
        )
    }
}
