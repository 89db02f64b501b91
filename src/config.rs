use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use chrono::NaiveDate;

use crate::error::{BhavcopyError, Result};

pub const BASE_URL: &str = "https://www.bseindia.com";
pub const REPORT_PATH: &str = "download/BhavCopy/Equity";
pub const DATE_FORMAT: &str = "%d%m%y";

/// The exchange refuses requests without a browser-like agent.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

pub const MAX_ATTEMPTS: u32 = 4;
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 6379;
pub const DEFAULT_INDEX: i64 = 4;
pub const STORE_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_HOST: &str = "DB_HOST";
pub const ENV_PORT: &str = "DB_PORT";
pub const ENV_INDEX: &str = "DB_INDEX";

/// Remote archive URL for a trading date, e.g. `.../EQ190824_CSV.ZIP`.
pub fn report_url(base_url: &str, date: NaiveDate) -> String {
    format!(
        "{}/{}/EQ{}_CSV.ZIP",
        base_url.trim_end_matches('/'),
        REPORT_PATH,
        date.format(DATE_FORMAT)
    )
}

/// Name of the CSV entry inside the archive for a trading date.
pub fn report_entry_name(date: NaiveDate) -> String {
    format!("EQ{}.CSV", date.format(DATE_FORMAT))
}

// ---------------------------------------------------------------------------
// StoreConfig
// ---------------------------------------------------------------------------

/// Connection settings for the cache backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    /// Logical database selector.
    pub index: i64,
    /// Applied to connect, read and write.
    pub timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            index: DEFAULT_INDEX,
            timeout: STORE_TIMEOUT,
        }
    }
}

impl StoreConfig {
    /// Read `DB_HOST`, `DB_PORT` and `DB_INDEX` from the process environment,
    /// loading a `.env` file from the working directory first if one exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the same keys from a dotenv-style file without touching the
    /// process environment.
    pub fn from_env_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let iter = dotenvy::from_path_iter(path.as_ref()).map_err(|e| {
            BhavcopyError::InvalidArgument(format!(
                "Unable to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let mut vars = HashMap::new();
        for item in iter {
            let (key, value) = item
                .map_err(|e| BhavcopyError::InvalidArgument(format!("Bad env line: {}", e)))?;
            vars.insert(key, value);
        }
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build a config from an arbitrary key lookup. Missing or empty values
    /// fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get(ENV_HOST) {
            config.host = host.trim().to_string();
        }
        if let Some(port) = get(ENV_PORT) {
            config.port = port.trim().parse().map_err(|_| {
                BhavcopyError::InvalidArgument(format!("{} is not a valid port: {:?}", ENV_PORT, port))
            })?;
        }
        if let Some(index) = get(ENV_INDEX) {
            config.index = index.trim().parse().map_err(|_| {
                BhavcopyError::InvalidArgument(format!(
                    "{} is not a valid database index: {:?}",
                    ENV_INDEX, index
                ))
            })?;
        }

        Ok(config)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `redis://host:port/index`
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.index)
    }
}
