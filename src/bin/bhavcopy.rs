//! bhavcopy CLI: ingest the daily report into the cache, then list or search it.
//!
//! Commands:
//! - `ingest`: download the latest report (today, or `--date`) and cache it
//! - `list`: print the first N cached symbols
//! - `search`: print the first N symbols whose name contains a substring
//! - `clear`: drop every cached symbol from the configured database
//!
//! Cache settings come from `DB_HOST`, `DB_PORT` and `DB_INDEX` (or `.env`).

use anyhow::{bail, Result};
use bhavcopy::queries::DEFAULT_LIMIT;
use bhavcopy::{Bhavcopy, CacheEntry, IngestOutcome, StoreStatus};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "bhavcopy", about = "BSE bhavcopy downloader and symbol cache")]
struct Cli {
    /// Override the exchange host.
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// HTTP timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the bhavcopy and write it to the cache.
    Ingest {
        /// Report date (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print cached symbols.
    List {
        #[arg(long, short, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Print cached symbols whose name contains QUERY (case-insensitive).
    Search {
        query: String,

        #[arg(long, short, default_value_t = DEFAULT_LIMIT)]
        limit: usize,
    },
    /// Remove every cached symbol.
    Clear,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if std::env::var("DEBUG").as_deref() == Ok("true") {
            "info"
        } else {
            "error"
        };
        EnvFilter::new(format!("bhavcopy={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let mut builder = Bhavcopy::builder().timeout(Duration::from_secs(cli.timeout));
    if let Some(url) = cli.base_url {
        builder = builder.base_url(url);
    }
    let mut bhav = builder.build()?;

    if bhav.connect() == StoreStatus::Unavailable {
        eprintln!("Cache unavailable; results will be empty");
    }

    match cli.command {
        Commands::Ingest { date } => {
            let outcome = match date {
                Some(d) => bhav.ingest(d)?,
                None => bhav.ingest_today()?,
            };
            match outcome {
                IngestOutcome::Written {
                    report_date,
                    entries,
                } => println!("Cached {} symbols from the {} bhavcopy", entries, report_date),
                IngestOutcome::NoReport { attempts } => {
                    bail!("no bhavcopy found in the last {} days", attempts)
                }
                IngestOutcome::StoreUnavailable => bail!("cache unavailable; nothing written"),
            }
        }
        Commands::List { limit } => print_rows(&bhav.symbols().list(limit)?),
        Commands::Search { query, limit } => print_rows(&bhav.symbols().search(&query, limit)?),
        Commands::Clear => {
            bhav.clear()?;
            println!("Cache cleared");
        }
    }

    bhav.close();
    Ok(())
}

fn print_rows(entries: &[CacheEntry]) {
    println!(
        "{:<28} {:>8} {:>10} {:>10} {:>10} {:>10}",
        "NAME", "CODE", "OPEN", "HIGH", "LOW", "CLOSE"
    );
    for entry in entries {
        let [name, code, open, high, low, close] = entry.to_row();
        println!(
            "{:<28} {:>8} {:>10} {:>10} {:>10} {:>10}",
            name.trim(),
            code,
            open,
            high,
            low,
            close
        );
    }
}
