//! Shared test fixtures for the bhavcopy integration tests.
//!
//! Provides an in-memory zip builder, a scripted [`ReportSource`] that
//! records every URL it is asked for, a one-shot local HTTP server for
//! exercising the real client, and helpers that wire sources into a
//! [`Bhavcopy`] backed by a [`MemoryBackend`].

#![allow(dead_code)]

use bhavcopy::config::{self, report_entry_name, report_url};
use bhavcopy::{Bhavcopy, BhavcopyError, CacheStore, MemoryBackend, ReportSource, StoreConfig};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Cursor, Write};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use zip::write::SimpleFileOptions;

pub const HEADER: &str = "SC_CODE,SC_NAME,SC_GROUP,SC_TYPE,OPEN,HIGH,LOW,CLOSE,LAST,PREVCLOSE,NO_TRADES,NO_OF_SHRS,NET_TURNOV,TDCLOITINDI";

/// Header plus three symbols, including the ACME example row.
pub const SAMPLE_CSV: &str = "\
SC_CODE,SC_NAME,SC_GROUP,SC_TYPE,OPEN,HIGH,LOW,CLOSE,LAST,PREVCLOSE,NO_TRADES,NO_OF_SHRS,NET_TURNOV,TDCLOITINDI
500001,ACME,A ,Q,10.5,11,10,10.8,10.8,10.2,120,4500,48000.00,
500002,ABB LTD.    ,A ,Q,7210.00,7300.55,7150.10,7282.35,7280.00,7195.40,3412,18765,136500000.00,
532540,TCS LTD.,A ,Q,3950.00,3990.00,3921.15,3978.60,3979.00,3940.25,9876,120045,477000000.00,
";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Zip `csv` under `entry_name`, deflated.
pub fn zip_bytes(entry_name: &str, csv: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file(entry_name, SimpleFileOptions::default())
        .unwrap();
    writer.write_all(csv.as_bytes()).unwrap();
    writer.finish().unwrap().into_inner()
}

/// Zip `csv` the way the exchange publishes the report for `date`.
pub fn zip_report(date: NaiveDate, csv: &str) -> Vec<u8> {
    zip_bytes(&report_entry_name(date), csv)
}

// ---------------------------------------------------------------------------
// ScriptedSource
// ---------------------------------------------------------------------------

/// Serves canned archives by URL and answers "not found" for anything else.
///
/// Clones share the request log.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    responses: HashMap<String, Vec<u8>>,
    requests: Arc<Mutex<Vec<String>>>,
    transport_failure: bool,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `csv` as the report for `date` on the default exchange host.
    pub fn with_report(self, date: NaiveDate, csv: &str) -> Self {
        let body = zip_report(date, csv);
        self.with_body(&report_url(config::BASE_URL, date), body)
    }

    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), body);
        self
    }

    /// Every request fails at the transport level.
    pub fn failing() -> Self {
        Self {
            transport_failure: true,
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl ReportSource for ScriptedSource {
    fn get(&self, url: &str) -> bhavcopy::Result<Option<Vec<u8>>> {
        self.requests.lock().unwrap().push(url.to_string());
        if self.transport_failure {
            return Err(BhavcopyError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }
        Ok(self.responses.get(url).cloned())
    }
}

// ---------------------------------------------------------------------------
// LocalExchange
// ---------------------------------------------------------------------------

/// A loopback HTTP server that answers one connection per scripted
/// `(status, body)` pair, in order, then stops.
pub struct LocalExchange {
    base_url: String,
    handle: JoinHandle<Vec<String>>,
}

impl LocalExchange {
    pub fn serve(responses: Vec<(u16, Vec<u8>)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut paths = Vec::new();
            for (status, body) in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());

                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                let path = request_line.split_whitespace().nth(1).unwrap_or_default();
                paths.push(path.to_string());

                // Drain headers; requests carry no body.
                loop {
                    let mut line = String::new();
                    if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                        break;
                    }
                }

                let reason = match status {
                    200 => "OK",
                    404 => "Not Found",
                    500 => "Internal Server Error",
                    _ => "Unknown",
                };
                let head = format!(
                    "HTTP/1.1 {status} {reason}\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                stream.write_all(head.as_bytes()).unwrap();
                stream.write_all(&body).unwrap();
            }
            paths
        });

        Self { base_url, handle }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Wait for every scripted response to be served; returns the request
    /// paths in arrival order.
    pub fn finish(self) -> Vec<String> {
        self.handle.join().unwrap()
    }
}

/// A loopback URL with nothing listening on it.
pub fn refused_base_url() -> String {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    format!("http://127.0.0.1:{port}")
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// A store over a fresh memory backend, plus a handle to inspect it.
pub fn memory_store() -> (CacheStore, MemoryBackend) {
    let backend = MemoryBackend::new();
    let store = CacheStore::with_backend(StoreConfig::default(), backend.clone());
    (store, backend)
}

/// A connected [`Bhavcopy`] over `source` and `backend`.
pub fn bhavcopy_with(source: ScriptedSource, backend: MemoryBackend) -> Bhavcopy {
    let mut bhav = Bhavcopy::builder()
        .store_config(StoreConfig::default())
        .source(source)
        .backend(backend)
        .build()
        .unwrap();
    bhav.connect();
    bhav
}
