use chrono::{Duration, NaiveDateTime, Timelike};
use serde::Serialize;
use std::collections::HashMap;

use crate::records::{parse_int, parse_iso_timestamp, split_fields, Record};
use crate::utils::errors::RecordError;

/// Faraday cup current is reported in femtoampere.
const CURRENT_SCALE: f64 = 1e-15;
/// Sensitivity of the analyser in A/Torr.
const SENSITIVITY: f64 = 0.081;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RgaReading {
    pub timestamp: NaiveDateTime,
    pub mass: i64,
    /// Ampere
    pub current: f64,
    /// Torr
    pub pressure: f64,
}

impl Record for RgaReading {
    const NAME: &'static str = "RGA";

    fn from_payload(payload: &str) -> Result<Self, RecordError> {
        let fields = split_fields(payload, 3)?;
        let current = parse_int("current", fields[2])? as f64 * CURRENT_SCALE;
        Ok(RgaReading {
            timestamp: parse_iso_timestamp(fields[0])?,
            mass: parse_int("mass", fields[1])?,
            current,
            pressure: current / SENSITIVITY,
        })
    }
}

/// Parses `timestamp, mass, current` payloads.
pub fn parse_rga(payloads: &[String]) -> Vec<RgaReading> {
    super::parse_records(payloads)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RgaWideRow {
    pub timestamp: NaiveDateTime,
    /// One entry per mass of [`RgaWideTable::masses`]
    pub pressures: Vec<Option<f64>>,
}

/// Pressure per mass, one row per scan cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RgaWideTable {
    pub masses: Vec<i64>,
    pub rows: Vec<RgaWideRow>,
}

impl RgaWideTable {
    pub fn column_names(&self) -> Vec<String> {
        std::iter::once("timestamp".to_string())
            .chain(self.masses.iter().map(|m| format!("mass_{}", m)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reshapes readings into one row per scan cycle and one column per mass.
///
/// The analyser scans the masses in a fixed order, so a cycle starts whenever the
/// mass of the very first reading shows up again. The row timestamp is the mean
/// timestamp of the cycle rounded to the nearest second. Cycles that round to the
/// same second share a row, the first pressure per mass wins.
pub fn rga_wider(readings: &[RgaReading]) -> RgaWideTable {
    let Some(first) = readings.first() else {
        return RgaWideTable::default();
    };

    let mut cycles = Vec::with_capacity(readings.len());
    let mut cycle = 0usize;
    for reading in readings {
        if reading.mass == first.mass {
            cycle += 1;
        }
        cycles.push(cycle);
    }

    let cycle_timestamps = mean_cycle_timestamps(readings, &cycles, cycle);

    let mut masses = Vec::new();
    let mut mass_columns = HashMap::new();
    let mut rows: Vec<RgaWideRow> = Vec::new();
    let mut row_index = HashMap::new();
    for (reading, cycle) in readings.iter().zip(&cycles) {
        let column = *mass_columns.entry(reading.mass).or_insert_with(|| {
            masses.push(reading.mass);
            masses.len() - 1
        });
        let timestamp = cycle_timestamps[cycle - 1];
        let row = *row_index.entry(timestamp).or_insert_with(|| {
            rows.push(RgaWideRow {
                timestamp,
                pressures: Vec::new(),
            });
            rows.len() - 1
        });
        let pressures = &mut rows[row].pressures;
        if pressures.len() <= column {
            pressures.resize(column + 1, None);
        }
        pressures[column].get_or_insert(reading.pressure);
    }
    for row in rows.iter_mut() {
        row.pressures.resize(masses.len(), None);
    }

    RgaWideTable { masses, rows }
}

fn mean_cycle_timestamps(
    readings: &[RgaReading],
    cycles: &[usize],
    cycle_count: usize,
) -> Vec<NaiveDateTime> {
    // Offsets are taken from a whole second so that rounding lands on whole seconds.
    let base = readings[0]
        .timestamp
        .with_nanosecond(0)
        .unwrap_or(readings[0].timestamp);
    let mut sums = vec![(0i128, 0i128); cycle_count];
    for (reading, cycle) in readings.iter().zip(cycles) {
        let offset = (reading.timestamp - base)
            .num_microseconds()
            .unwrap_or_default();
        let (sum, count) = &mut sums[cycle - 1];
        *sum += i128::from(offset);
        *count += 1;
    }
    sums.into_iter()
        .map(|(sum, count)| {
            let mean_seconds = sum as f64 / count as f64 / 1e6;
            base + Duration::seconds(mean_seconds.round() as i64)
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn at(s: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_milli_opt(7, 0, s, milli)
            .unwrap()
    }

    fn reading(timestamp: NaiveDateTime, mass: i64, pressure: f64) -> RgaReading {
        RgaReading {
            timestamp,
            mass,
            current: pressure * SENSITIVITY,
            pressure,
        }
    }

    #[test]
    fn parse_rga_scales_current_and_pressure() {
        let payloads = vec!["2024-03-15T07:00:01, 28, 81000".to_string()];

        let parsed = parse_rga(&payloads);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].timestamp, at(1, 0));
        assert_eq!(parsed[0].mass, 28);
        assert!((parsed[0].current - 8.1e-11).abs() < 1e-20);
        assert!((parsed[0].pressure - 1e-9).abs() < 1e-18);
    }

    #[test]
    fn parse_rga_skips_broken_payloads() {
        let payloads = vec![
            "2024-03-15T07:00:01,28".to_string(),
            "2024-03-15T07:00:01,28,1.5".to_string(),
            "yesterday,28,15".to_string(),
            "2024-03-15T07:00:02,32,15".to_string(),
        ];

        let parsed = parse_rga(&payloads);

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].mass, 32);
    }

    #[test]
    fn wider_pivots_cycles_into_rows() {
        let readings = vec![
            reading(at(0, 0), 2, 1.0),
            reading(at(1, 0), 28, 2.0),
            reading(at(2, 0), 32, 3.0),
            reading(at(10, 0), 2, 4.0),
            reading(at(11, 0), 28, 5.0),
        ];

        let wide = rga_wider(&readings);

        assert_eq!(wide.masses, vec![2, 28, 32]);
        assert_eq!(
            wide.column_names(),
            vec!["timestamp", "mass_2", "mass_28", "mass_32"]
        );
        assert_eq!(
            wide.rows,
            vec![
                RgaWideRow {
                    timestamp: at(1, 0),
                    pressures: vec![Some(1.0), Some(2.0), Some(3.0)],
                },
                RgaWideRow {
                    timestamp: at(11, 0),
                    pressures: vec![Some(4.0), Some(5.0), None],
                },
            ]
        );
    }

    #[test]
    fn wider_rounds_cycle_timestamp_to_nearest_second() {
        let readings = vec![
            reading(at(0, 0), 2, 1.0),
            reading(at(0, 600), 28, 2.0),
            reading(at(3, 600), 2, 3.0),
            reading(at(4, 0), 28, 4.0),
        ];

        let wide = rga_wider(&readings);

        let timestamps: Vec<_> = wide.rows.iter().map(|r| r.timestamp).collect();
        assert_eq!(timestamps, vec![at(0, 0), at(4, 0)]);
    }

    #[test]
    fn wider_keeps_first_pressure_of_duplicate_mass() {
        let readings = vec![
            reading(at(0, 0), 2, 1.0),
            reading(at(1, 0), 28, 2.0),
            reading(at(2, 0), 28, 9.0),
        ];

        let wide = rga_wider(&readings);

        assert_eq!(wide.rows.len(), 1);
        assert_eq!(wide.rows[0].pressures, vec![Some(1.0), Some(2.0)]);
    }

    #[test]
    fn wider_on_empty_input() {
        let wide = rga_wider(&[]);
        assert!(wide.is_empty());
        assert_eq!(wide.column_names(), vec!["timestamp"]);
    }
}
