//! Parsers for the raw telemetry lines published on the GEMS data page.
//!
//! Every line on the page starts with a sequence number in brackets followed by a
//! record type character, e.g. `[42]R:2024-03-15T07:00:01, 28, 51234`.
//! [`sorting`] groups the payloads by type, the remaining modules turn the
//! payloads into typed records.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, error};

use crate::utils::errors::RecordError;

pub mod adv;
pub mod rga;
pub mod sorting;
pub mod turbo;

pub use sorting::{sort_by_type, RecordKind, SortedRecords};

/// All known record types of one collection run, parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRecords {
    pub rga: Vec<rga::RgaReading>,
    pub rga_wide: rga::RgaWideTable,
    pub turbo_status: Vec<turbo::TurboStatus>,
    pub adv_status: Vec<adv::AdvStatus>,
    pub adv_data: Vec<adv::AdvSample>,
}

impl ParsedRecords {
    pub fn parse(sorted: &SortedRecords) -> Self {
        let rga = rga::parse_rga(sorted.get(RecordKind::Rga));
        let rga_wide = rga::rga_wider(&rga);
        ParsedRecords {
            rga,
            rga_wide,
            turbo_status: turbo::parse_turbo_status(sorted.get(RecordKind::TurboStatus)),
            adv_status: adv::parse_adv_status(sorted.get(RecordKind::AdvStatus)),
            adv_data: adv::parse_adv_data(sorted.get(RecordKind::AdvData)),
        }
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        match kind {
            RecordKind::Rga => self.rga.len(),
            RecordKind::TurboStatus => self.turbo_status.len(),
            RecordKind::AdvStatus => self.adv_status.len(),
            RecordKind::AdvData => self.adv_data.len(),
        }
    }
}

/// A typed record that can be read from one comma separated payload.
pub trait Record: Sized {
    const NAME: &'static str;

    fn from_payload(payload: &str) -> Result<Self, RecordError>;
}

/// Parses every payload, logging and skipping the ones that fail.
pub fn parse_records<R: Record>(payloads: &[String]) -> Vec<R> {
    payloads
        .iter()
        .filter_map(|payload| match R::from_payload(payload) {
            Ok(record) => Some(record),
            Err(e) if e.is_field_count() => {
                debug!("Skipping {} data with {}: {}", R::NAME, e, payload);
                None
            }
            Err(e) => {
                error!("Error parsing {} data: {}, data: {}", R::NAME, e, payload);
                None
            }
        })
        .collect()
}

/// Splits a payload into exactly `expected` trimmed fields.
pub(crate) fn split_fields(payload: &str, expected: usize) -> Result<Vec<&str>, RecordError> {
    let fields: Vec<&str> = payload.split(',').map(str::trim).collect();
    if fields.len() != expected {
        return Err(RecordError::FieldCount {
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

pub(crate) fn parse_int(field: &'static str, value: &str) -> Result<i64, RecordError> {
    value
        .parse()
        .map_err(|source| RecordError::Integer { field, source })
}

pub(crate) fn parse_float(field: &'static str, value: &str) -> Result<f64, RecordError> {
    value
        .parse()
        .map_err(|source| RecordError::Float { field, source })
}

/// Accepts `T` or space separated ISO 8601 timestamps with optional seconds and fraction,
/// as well as plain dates (midnight). Timestamps carrying an offset are converted to UTC.
pub(crate) fn parse_iso_timestamp(value: &str) -> Result<NaiveDateTime, RecordError> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y%m%dT%H%M%S",
    ];
    if let Ok(datetime) = value.parse::<NaiveDateTime>() {
        return Ok(datetime);
    }
    if let Some(datetime) = NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
    {
        return Ok(datetime);
    }
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M%:z"))
        .map(|d| d.naive_utc())
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| RecordError::Timestamp(value.to_string()))
}
