use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::fmt::Debug;
use std::num::NonZeroU32;
use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;
use tracing::{debug, info};

use crate::source::timestamp::GemsTimestamp;
use crate::utils::errors::FetchError;
use crate::utils::futures::join_handle_results_lenient;

/// Rows of one HTML table, each row holding the trimmed text of its `td` cells.
pub type TableData = Vec<Vec<String>>;

#[async_trait]
pub trait TableSource: Send + Sync + Debug {
    async fn fetch_table(&self, timestamp: Option<GemsTimestamp>) -> Result<TableData, FetchError>;
}

#[derive(Clone, Debug)]
pub struct HttpTableSource {
    client: Client,
    base_url: String,
    table_index: usize,
}

impl HttpTableSource {
    pub fn new(client: Client, base_url: impl Into<String>, table_index: usize) -> Self {
        HttpTableSource {
            client,
            base_url: base_url.into(),
            table_index,
        }
    }
}

#[async_trait]
impl TableSource for HttpTableSource {
    async fn fetch_table(&self, timestamp: Option<GemsTimestamp>) -> Result<TableData, FetchError> {
        get_table_data(&self.client, &self.base_url, timestamp, self.table_index).await
    }
}

/// Loads the GEMS data page and extracts the rows of the `table_index`-th table.
/// Without a timestamp the page serves its default (latest) hour.
#[tracing::instrument(level = "debug", skip(client))]
pub async fn get_table_data(
    client: &Client,
    base_url: &str,
    timestamp: Option<GemsTimestamp>,
    table_index: usize,
) -> Result<TableData, FetchError> {
    let html = request_page(client, base_url, timestamp).await?;
    let rows = extract_table_rows(&html, table_index)?;
    debug!("Extracted {} rows from table {}", rows.len(), table_index);
    Ok(rows)
}

async fn request_page(
    client: &Client,
    base_url: &str,
    timestamp: Option<GemsTimestamp>,
) -> Result<String, FetchError> {
    let mut request = client.get(base_url);
    if let Some(timestamp) = timestamp {
        request = request.query(&[("timestamp", timestamp.to_string())]);
    }
    let response = match request.send().await.and_then(|r| r.error_for_status()) {
        Ok(ok) => ok,
        Err(error) => {
            tracing::error!("Error while loading data from GEMS ({}).", base_url);
            if let Some(x) = error.url() {
                tracing::error!("Error caused by query: {}", x);
            }
            return Err(FetchError::ClientRequestError(error));
        }
    };
    Ok(response.text().await?)
}

/// Header cells (`th`) are ignored, rows consisting of header cells only are dropped.
pub fn extract_table_rows(html: &str, table_index: usize) -> Result<TableData, FetchError> {
    static TABLE: OnceLock<Selector> = OnceLock::new();
    static ROW: OnceLock<Selector> = OnceLock::new();
    static CELL: OnceLock<Selector> = OnceLock::new();
    let table_selector = TABLE.get_or_init(|| Selector::parse("table").expect("valid selector"));
    let row_selector = ROW.get_or_init(|| Selector::parse("tr").expect("valid selector"));
    let cell_selector = CELL.get_or_init(|| Selector::parse("td").expect("valid selector"));

    let document = Html::parse_document(html);
    let tables: Vec<_> = document.select(table_selector).collect();
    let table = tables.get(table_index).ok_or(FetchError::TableNotFound {
        index: table_index,
        found: tables.len(),
    })?;

    Ok(table
        .select(row_selector)
        .map(|row| {
            row.select(cell_selector)
                .map(|cell| cell.text().collect::<String>().trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|cells| !cells.is_empty())
        .collect())
}

/// Upper bound of page requests in flight during one collection run.
pub const MAX_CONCURRENT_FETCHES: usize = 4;

/// Fetches `hours` consecutive hourly pages starting at `start` concurrently.
/// Rows are returned in chronological page order, failed pages are skipped.
#[tracing::instrument(skip(source))]
pub async fn collect_hours(
    source: Arc<dyn TableSource>,
    start: GemsTimestamp,
    hours: NonZeroU32,
) -> Result<TableData, FetchError> {
    let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_FETCHES));
    let mut handles = Vec::with_capacity(hours.get() as usize);
    let mut timestamp = start;
    for hour in 0..hours.get() {
        if hour > 0 {
            timestamp = timestamp.next_hour()?;
        }
        let source = source.clone();
        let permits = permits.clone();
        let handle = tokio::spawn(async move {
            let _permit = permits
                .acquire_owned()
                .await
                .map_err(|e| FetchError::UnexpectedError(anyhow::Error::from(e)))?;
            source.fetch_table(Some(timestamp)).await
        });
        handles.push((timestamp, handle));
    }

    let pages = join_handle_results_lenient(handles).await?;
    let mut rows = TableData::new();
    for (timestamp, mut page) in pages {
        info!("Collected {} rows for {}", page.len(), timestamp);
        rows.append(&mut page);
    }
    Ok(rows)
}
