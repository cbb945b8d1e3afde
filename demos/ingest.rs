//! Feeds saved product text through the full pipeline against an in-memory
//! store, printing what gets created/related. Point it at a directory of
//! `.txt` files, each holding one raw NWWS product.

use async_trait::async_trait;
use nwws_core::{ErrorSink, LiveStream, Pipeline, Store};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
struct MemoryStore {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

#[derive(Debug, thiserror::Error)]
#[error("memory store error")]
struct MemoryStoreError;

#[async_trait]
impl Store for MemoryStore {
    type Error = MemoryStoreError;

    async fn create(&self, table: &str, record: Value) -> Result<Value, Self::Error> {
        log::info!("create {}: {}", table, record);
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(record.clone());
        Ok(record)
    }

    async fn update(&self, record_id: &str, patch: Value) -> Result<Value, Self::Error> {
        log::info!("update {}: {}", record_id, patch);
        Ok(patch)
    }

    async fn query(&self, statement: &str, params: Value) -> Result<Vec<Value>, Self::Error> {
        log::debug!("query {} {}", statement, params);
        if statement.contains("count()") {
            return Ok(vec![serde_json::json!({ "count": 0 })]);
        }
        Ok(Vec::new())
    }

    async fn relate(
        &self,
        from: &str,
        edge: &str,
        to: &str,
        props: Option<Value>,
    ) -> Result<Value, Self::Error> {
        log::info!("relate {} -{}-> {} ({:?})", from, edge, to, props);
        Ok(Value::Null)
    }

    async fn delete(&self, id: &str) -> Result<(), Self::Error> {
        log::info!("delete {}", id);
        Ok(())
    }

    async fn live(&self, _table: &str) -> Result<LiveStream, Self::Error> {
        Ok(Box::pin(futures::stream::empty()))
    }
}

struct PrintingErrorSink;

#[async_trait]
impl ErrorSink for PrintingErrorSink {
    async fn dump(
        &self,
        product_id: Option<&str>,
        raw_text: &str,
        error: &(dyn std::fmt::Display + Send + Sync),
    ) {
        log::warn!(
            "dumping failed product {}: {} ({} bytes)",
            product_id.unwrap_or("<unframed>"),
            error,
            raw_text.len()
        );
    }
}

#[tokio::main]
async fn main() {
    env_logger::builder()
        .filter(None, log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let dir = std::env::args()
        .nth(1)
        .expect("usage: ingest <directory of .txt product files>");

    let pipeline = Pipeline::new(MemoryStore::default());
    let sink = PrintingErrorSink;

    let mut entries: Vec<_> = std::fs::read_dir(&dir)
        .expect("read directory")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "txt").unwrap_or(false))
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let text = std::fs::read_to_string(entry.path()).expect("read product file");
        let received_at = chrono::Utc::now();
        match pipeline.ingest(received_at, &text, &sink).await {
            Some(product) => log::info!("ingested {}", product.id),
            None => log::info!("skipped {:?}", entry.path()),
        }
    }
}
