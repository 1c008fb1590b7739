use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::plots::{plot_rga, plot_velocity};
use crate::records::adv::velocity_series;
use crate::records::rga::RgaWideTable;
use crate::records::ParsedRecords;
use crate::utils::telemetry::spawn_blocking_with_tracing;

pub const RGA_FILE: &str = "rga.csv";
pub const RGA_WIDE_FILE: &str = "rga_wide.csv";
pub const TURBO_STATUS_FILE: &str = "turbo_status.csv";
pub const ADV_STATUS_FILE: &str = "adv_status.csv";
pub const ADV_DATA_FILE: &str = "adv_data.csv";
pub const ADV_VELOCITY_FILE: &str = "adv_velocity.csv";

/// Writes every non-empty series as CSV into `directory` on a blocking thread,
/// together with the RGA pressure and ADV velocity charts.
#[tracing::instrument(skip(records))]
pub async fn export_records(
    directory: PathBuf,
    records: ParsedRecords,
) -> Result<Vec<PathBuf>, anyhow::Error> {
    spawn_blocking_with_tracing(move || write_records(&directory, &records)).await?
}

pub fn write_records(directory: &Path, records: &ParsedRecords) -> Result<Vec<PathBuf>, anyhow::Error> {
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create {}", directory.display()))?;

    let mut written = Vec::new();
    let mut collect = |path: Option<PathBuf>| written.extend(path);
    collect(write_serialized(directory, RGA_FILE, &records.rga)?);
    collect(write_rga_wide(directory, &records.rga_wide)?);
    collect(plot_rga(directory, &records.rga_wide)?);
    collect(write_serialized(
        directory,
        TURBO_STATUS_FILE,
        &records.turbo_status,
    )?);
    collect(write_serialized(directory, ADV_STATUS_FILE, &records.adv_status)?);
    collect(write_serialized(directory, ADV_DATA_FILE, &records.adv_data)?);
    let velocity = velocity_series(&records.adv_data);
    collect(write_serialized(directory, ADV_VELOCITY_FILE, &velocity)?);
    collect(plot_velocity(directory, &velocity)?);

    info!("Exported {} files to {}", written.len(), directory.display());
    Ok(written)
}

fn write_serialized<T: Serialize>(
    directory: &Path,
    file_name: &str,
    rows: &[T],
) -> Result<Option<PathBuf>, anyhow::Error> {
    if rows.is_empty() {
        return Ok(None);
    }
    let path = directory.join(file_name);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(Some(path))
}

/// Missing pressures are written as empty cells.
fn write_rga_wide(directory: &Path, table: &RgaWideTable) -> Result<Option<PathBuf>, anyhow::Error> {
    if table.is_empty() {
        return Ok(None);
    }
    let path = directory.join(RGA_WIDE_FILE);
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    writer.write_record(table.column_names())?;
    for row in &table.rows {
        let record = std::iter::once(row.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()).chain(
            row.pressures
                .iter()
                .map(|p| p.map(|p| format!("{:e}", p)).unwrap_or_default()),
        );
        writer.write_record(record)?;
    }
    writer.flush()?;
    Ok(Some(path))
}
