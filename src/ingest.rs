//! Fetch → map → cache, as one all-or-nothing run.

use chrono::NaiveDate;
use tracing::{error, info};

use crate::error::Result;
use crate::fetcher::{FetchOutcome, ReportFetcher};
use crate::models::{CacheEntry, ReportRow};
use crate::store::{CacheStore, StoreStatus, WriteOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// `entries` keys were committed from the report dated `report_date`.
    Written {
        report_date: NaiveDate,
        entries: usize,
    },
    /// No report was found within the attempt budget; nothing was written.
    NoReport { attempts: u32 },
    /// The cache could not be reached; nothing was downloaded or written.
    StoreUnavailable,
}

impl IngestOutcome {
    pub fn entries_written(&self) -> usize {
        match self {
            IngestOutcome::Written { entries, .. } => *entries,
            _ => 0,
        }
    }
}

/// Drives one ingestion run over a borrowed fetcher and store.
pub struct Ingestor<'a> {
    fetcher: &'a ReportFetcher,
    store: &'a mut CacheStore,
}

impl<'a> Ingestor<'a> {
    pub fn new(fetcher: &'a ReportFetcher, store: &'a mut CacheStore) -> Self {
        Self { fetcher, store }
    }

    /// Ingest the report for `date`, or the nearest earlier one the fetcher
    /// finds.
    ///
    /// Every row is mapped before the write batch is opened, so a malformed
    /// row fails the run with nothing queued. Fetch and commit errors
    /// propagate; an unreachable cache or a missing report is an outcome.
    pub fn run(&mut self, date: NaiveDate) -> Result<IngestOutcome> {
        if self.store.ensure_connected() == StoreStatus::Unavailable {
            error!("Unable to insert data: cache unavailable");
            return Ok(IngestOutcome::StoreUnavailable);
        }

        let (report_date, records) = match self.fetcher.fetch(date)? {
            FetchOutcome::Found { date, records } => (date, records),
            FetchOutcome::NotFound { attempts, .. } => {
                error!(%date, attempts, "Unable to insert data: no bhavcopy found");
                return Ok(IngestOutcome::NoReport { attempts });
            }
        };

        let entries = records
            .iter()
            .skip(1)
            .map(|record| ReportRow::from_record(record).map(CacheEntry::from))
            .collect::<Result<Vec<_>>>()?;

        if !self.store.begin_batch() {
            error!("Unable to insert data: no active write batch");
            return Ok(IngestOutcome::StoreUnavailable);
        }
        for entry in &entries {
            self.store.queue(entry)?;
        }

        match self.store.commit()? {
            WriteOutcome::Committed(n) => {
                info!(%report_date, entries = n, "ingested bhavcopy");
                Ok(IngestOutcome::Written {
                    report_date,
                    entries: n,
                })
            }
            WriteOutcome::Skipped => Ok(IngestOutcome::StoreUnavailable),
        }
    }
}
