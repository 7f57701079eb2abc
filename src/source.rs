//! Item sources: in-memory fixtures, the spreadsheet web app and CSV exports.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use crate::item::{item_from_object, normalize_payload, InventoryItem};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP client build error: {0}")]
    HttpClientBuild(String),
    #[error("HTTP request failed for {url}: {message}")]
    HttpRequest { url: String, message: String },
    #[error("invalid JSON payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("source task failed: {0}")]
    Task(String),
}

pub trait InventorySource: Send + Sync + 'static {
    fn items(&self) -> Result<Vec<InventoryItem>, SourceError>;
}

#[derive(Clone)]
pub struct InMemoryInventorySource {
    inner: Arc<RwLock<Vec<InventoryItem>>>,
}

impl InMemoryInventorySource {
    pub fn new(items: Vec<InventoryItem>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(items)),
        }
    }

    pub fn demo() -> Self {
        Self::new(demo_items())
    }

    pub fn replace_items(&self, items: Vec<InventoryItem>) {
        let mut guard = self
            .inner
            .write()
            .expect("in-memory item lock should not be poisoned");
        *guard = items;
    }
}

impl InventorySource for InMemoryInventorySource {
    fn items(&self) -> Result<Vec<InventoryItem>, SourceError> {
        Ok(self
            .inner
            .read()
            .expect("in-memory item lock should not be poisoned")
            .clone())
    }
}

/// Fetches the item sheet from a spreadsheet web app returning JSON.
pub struct SheetInventorySource {
    url: String,
    client: reqwest::blocking::Client,
}

impl SheetInventorySource {
    pub fn new(url: impl Into<String>, timeout_ms: u64) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()
            .map_err(|err| SourceError::HttpClientBuild(err.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn get_bytes(&self) -> Result<Vec<u8>, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .header("accept", "application/json")
            .send()
            .map_err(|err| SourceError::HttpRequest {
                url: self.url.clone(),
                message: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::HttpRequest {
                url: self.url.clone(),
                message: format!("unexpected HTTP status {status}"),
            });
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|err| SourceError::HttpRequest {
                url: self.url.clone(),
                message: err.to_string(),
            })
    }
}

impl InventorySource for SheetInventorySource {
    fn items(&self) -> Result<Vec<InventoryItem>, SourceError> {
        let body = self.get_bytes()?;
        let items = parse_items_json(&body)?;
        info!(
            component = "source",
            event = "source.sheet.fetched",
            bytes = body.len(),
            item_count = items.len()
        );
        Ok(items)
    }
}

pub struct CsvInventorySource {
    path: PathBuf,
}

impl CsvInventorySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl InventorySource for CsvInventorySource {
    fn items(&self) -> Result<Vec<InventoryItem>, SourceError> {
        load_items_csv(&self.path)
    }
}

pub fn parse_items_json(body: &[u8]) -> Result<Vec<InventoryItem>, SourceError> {
    let payload: Value = serde_json::from_slice(body)?;
    Ok(normalize_payload(&payload))
}

/// Loads a CSV export of the item sheet. The header row names the columns
/// using the same aliases the JSON payload accepts.
pub fn load_items_csv(path: &Path) -> Result<Vec<InventoryItem>, SourceError> {
    let mut buf = String::new();
    File::open(path)?.read_to_string(&mut buf)?;
    let items = parse_items_csv(&buf)?;
    info!(
        component = "source",
        event = "source.csv.loaded",
        path = %path.display(),
        item_count = items.len()
    );
    Ok(items)
}

pub fn parse_items_csv(body: &str) -> Result<Vec<InventoryItem>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let mut items = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(
                    component = "source",
                    event = "source.csv.bad_record",
                    record = idx,
                    error = %err
                );
                continue;
            }
        };

        let row: Map<String, Value> = headers
            .iter()
            .zip(record.iter())
            .map(|(header, cell)| (header.to_string(), Value::String(cell.to_string())))
            .collect();
        items.push(item_from_object(&row));
    }

    Ok(items)
}

pub fn demo_items() -> Vec<InventoryItem> {
    let item = |purchase_date: &str, name: &str, special: &str, float: f64| InventoryItem {
        purchase_date: Some(purchase_date.to_string()),
        name: name.to_string(),
        special: special.to_string(),
        float: Some(float),
        image: None,
        show: true,
        sold: None,
    };

    vec![
        item("2025-08-01T19:12:00Z", "AK-47 | Redline", "", 0.1612),
        item("2025-08-09T02:40:00Z", "★ Karambit | Doppler", "Phase 2", 0.0123),
        item("2025-08-12T17:05:00Z", "AWP | Asiimov", "Kato14 sticker", 0.4211),
        item("2025-08-14T22:30:00Z", "★ Sport Gloves | Vice", "", 0.5873),
        item("2025-08-15T08:00:00Z", "Glock-18 | Fade", "", 0.0701),
    ]
}
