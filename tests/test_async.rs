//! Async wrapper tests. Run with `--features async`.

#![cfg(feature = "async")]

mod common;

use bhavcopy::{AsyncBhavcopy, Bhavcopy, IngestOutcome, MemoryBackend, StoreConfig};
use common::{date, ScriptedSource, SAMPLE_CSV};

#[tokio::test]
async fn ingest_then_query_on_blocking_pool() {
    let day = date(2024, 8, 19);
    let builder = Bhavcopy::builder()
        .store_config(StoreConfig::default())
        .source(ScriptedSource::new().with_report(day, SAMPLE_CSV))
        .backend(MemoryBackend::new());
    let bhav = AsyncBhavcopy::build(builder).await.unwrap();

    bhav.run(|b| Ok(b.connect())).await.unwrap();
    let outcome = bhav.ingest(day).await.unwrap();
    assert!(matches!(outcome, IngestOutcome::Written { entries: 3, .. }));

    assert_eq!(bhav.list(2).await.unwrap().len(), 2);
    let hits = bhav.search("tcs", 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].quote.code, "532540");

    bhav.close().await.unwrap();
}

#[tokio::test]
async fn disconnected_queries_are_empty() {
    let builder = Bhavcopy::builder()
        .store_config(StoreConfig::default())
        .source(ScriptedSource::new())
        .backend(MemoryBackend::unreachable());
    let bhav = AsyncBhavcopy::build(builder).await.unwrap();

    assert!(bhav.list(10).await.unwrap().is_empty());
    assert!(bhav.search("acme", 10).await.unwrap().is_empty());
    bhav.close().await.unwrap();
}
