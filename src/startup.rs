use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::client::build_client;
use crate::configuration::{ApplicationSettings, Settings};
use crate::export::export_records;
use crate::records::{sort_by_type, ParsedRecords, RecordKind};
use crate::source::{collect_hours, GemsTimestamp, HttpTableSource, TableSource};

pub struct Application {
    source: Arc<dyn TableSource>,
    settings: ApplicationSettings,
}

/// Outcome of one collection run.
#[derive(Debug)]
pub struct RunSummary {
    pub start: GemsTimestamp,
    pub rows: usize,
    /// Raw payloads per type character, unknown types included
    pub payloads: BTreeMap<char, usize>,
    pub parsed: BTreeMap<RecordKind, usize>,
    pub rga_cycles: usize,
    pub files: Vec<PathBuf>,
}

impl Application {
    pub fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let client = build_client(&configuration.application.http_client)?;
        let source = HttpTableSource::new(
            client,
            configuration.source.base_url,
            configuration.source.table_index,
        );
        Ok(Application::with_source(
            Arc::new(source),
            configuration.application,
        ))
    }

    pub fn with_source(source: Arc<dyn TableSource>, settings: ApplicationSettings) -> Self {
        Application { source, settings }
    }

    /// An explicit timestamp wins over the lookback.
    pub fn start_timestamp(&self) -> Result<GemsTimestamp, anyhow::Error> {
        match &self.settings.timestamp {
            Some(timestamp) => Ok(GemsTimestamp::resolve(timestamp)?),
            None => Ok(GemsTimestamp::hours_ago(self.settings.lookback_hours)?),
        }
    }

    /// Collects, parses and exports the configured hours.
    #[tracing::instrument(name = "Run GEMS data collection", skip(self))]
    pub async fn run(&self) -> Result<RunSummary, anyhow::Error> {
        let start = self.start_timestamp()?;
        info!("Fetching data for timestamp: {}", start);
        let rows = collect_hours(self.source.clone(), start, self.settings.hours).await?;

        let sorted = sort_by_type(&rows);
        let payloads: BTreeMap<char, usize> = sorted.iter().map(|(c, p)| (c, p.len())).collect();
        for (type_char, count) in &payloads {
            info!("Type {}: {} elements", type_char, count);
        }

        let records = ParsedRecords::parse(&sorted);
        let parsed: BTreeMap<RecordKind, usize> = RecordKind::ALL
            .into_iter()
            .map(|kind| (kind, records.count(kind)))
            .collect();
        for (kind, count) in &parsed {
            info!("Parsed {} {} records", count, kind);
        }
        let rga_cycles = records.rga_wide.rows.len();
        info!("Reshaped RGA data into {} cycles", rga_cycles);

        let directory = self.settings.output_directory.join(start.to_string());
        let files = export_records(directory, records).await?;

        Ok(RunSummary {
            start,
            rows: rows.len(),
            payloads,
            parsed,
            rga_cycles,
            files,
        })
    }
}
