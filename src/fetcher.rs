//! Bhavcopy download with date rollback.
//!
//! Requests the zipped report for a date and, when the exchange has nothing
//! published for it, steps back one calendar day at a time until the attempt
//! budget runs out. Archives are unpacked and parsed entirely in memory.

use std::io::Cursor;
use std::time::Duration;

use chrono::NaiveDate;
use csv::StringRecord;
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::config;
use crate::error::{BhavcopyError, Result};

// ---------------------------------------------------------------------------
// ReportSource
// ---------------------------------------------------------------------------

/// Where report archives come from.
pub trait ReportSource: Send {
    /// Fetch the body at `url`.
    ///
    /// Returns `Ok(None)` when the server answers with any non-success
    /// status. Transport failures are returned as errors and are never
    /// retried by the fetcher.
    fn get(&self, url: &str) -> Result<Option<Vec<u8>>>;
}

/// Blocking HTTP source backed by `reqwest`.
pub struct HttpSource {
    client: Client,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(config::USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self { client })
    }
}

impl ReportSource for HttpSource {
    fn get(&self, url: &str) -> Result<Option<Vec<u8>>> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            debug!(%url, %status, "report not available");
            return Ok(None);
        }
        Ok(Some(resp.bytes()?.to_vec()))
    }
}

// ---------------------------------------------------------------------------
// FetchOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// `records[0]` is the CSV header.
    Found {
        date: NaiveDate,
        records: Vec<StringRecord>,
    },
    /// Every attempt came back empty-handed. `oldest` is the last date tried.
    NotFound { attempts: u32, oldest: NaiveDate },
}

impl FetchOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, FetchOutcome::Found { .. })
    }

    /// Date of the report that was actually downloaded.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            FetchOutcome::Found { date, .. } => Some(*date),
            FetchOutcome::NotFound { .. } => None,
        }
    }

    /// Flatten into the raw record sequence; empty when nothing was found.
    pub fn into_records(self) -> Vec<StringRecord> {
        match self {
            FetchOutcome::Found { records, .. } => records,
            FetchOutcome::NotFound { .. } => Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReportFetcher
// ---------------------------------------------------------------------------

pub struct ReportFetcher {
    source: Box<dyn ReportSource>,
    base_url: String,
    max_attempts: u32,
}

impl ReportFetcher {
    /// Create a fetcher over an arbitrary source.
    ///
    /// `max_attempts` must be at least 1.
    pub fn new(
        source: Box<dyn ReportSource>,
        base_url: impl Into<String>,
        max_attempts: u32,
    ) -> Result<Self> {
        if max_attempts == 0 {
            return Err(BhavcopyError::InvalidArgument(
                "max_attempts must be at least 1".into(),
            ));
        }
        Ok(Self {
            source,
            base_url: base_url.into(),
            max_attempts,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Download and parse the report for `date`, rolling back one day per
    /// missing report.
    ///
    /// A malformed archive or a missing CSV entry is an error, not a retry.
    pub fn fetch(&self, date: NaiveDate) -> Result<FetchOutcome> {
        let mut current = date;
        let mut remaining = self.max_attempts;

        loop {
            let url = config::report_url(&self.base_url, current);
            debug!(%url, remaining, "requesting bhavcopy");

            if let Some(bytes) = self.source.get(&url)? {
                let records = parse_archive(&bytes, &config::report_entry_name(current))?;
                info!(date = %current, records = records.len(), "downloaded bhavcopy");
                return Ok(FetchOutcome::Found {
                    date: current,
                    records,
                });
            }

            remaining -= 1;
            if remaining == 0 {
                warn!(
                    from = %date,
                    oldest = %current,
                    attempts = self.max_attempts,
                    "no bhavcopy published in range"
                );
                return Ok(FetchOutcome::NotFound {
                    attempts: self.max_attempts,
                    oldest: current,
                });
            }

            current = current.pred_opt().ok_or_else(|| {
                BhavcopyError::InvalidArgument(format!("cannot step back from {}", current))
            })?;
        }
    }
}

/// Open a zip archive held in memory and read the named CSV entry.
///
/// No header handling happens here: the header comes back as the first
/// record. Records may have differing lengths.
pub fn parse_archive(bytes: &[u8], entry_name: &str) -> Result<Vec<StringRecord>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let entry = archive.by_name(entry_name)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(entry);

    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }
    Ok(records)
}
