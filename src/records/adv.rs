use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::records::{parse_int, parse_iso_timestamp, split_fields, Record};
use crate::utils::errors::RecordError;

/// ADV status record, the instrument reports its own clock next to the logger timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvStatus {
    pub timestamp: NaiveDateTime,
    pub adv_timestamp: NaiveDateTime,
    /// Volts
    pub bat: f64,
    /// m/s
    pub soundspeed: f64,
    /// Degrees, 0 if the instrument has no compass
    pub heading: f64,
    /// Degrees
    pub pitch: f64,
    /// Degrees
    pub roll: f64,
    /// Degrees Celsius
    pub temp: f64,
}

impl Record for AdvStatus {
    const NAME: &'static str = "ADV status";

    fn from_payload(payload: &str) -> Result<Self, RecordError> {
        let f = split_fields(payload, 13)?;
        let int = |field: &'static str, i: usize| parse_int(field, f[i]);
        Ok(AdvStatus {
            timestamp: parse_iso_timestamp(f[0])?,
            adv_timestamp: adv_clock(
                int("year", 5)?,
                int("month", 6)?,
                int("day", 3)?,
                int("hour", 4)?,
                int("minute", 1)?,
                int("second", 2)?,
            )?,
            bat: int("bat", 7)? as f64 * 0.1,
            soundspeed: int("soundspeed", 8)? as f64 * 0.1,
            heading: int("heading", 9)? as f64 * 0.1,
            pitch: int("pitch", 10)? as f64 * 0.1,
            roll: int("roll", 11)? as f64 * 0.1,
            temp: int("temp", 12)? as f64 * 0.01,
        })
    }
}

/// The instrument clock counts years from 2000.
fn adv_clock(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Result<NaiveDateTime, RecordError> {
    let invalid =
        || RecordError::Date(format!("{year}-{month}-{day} {hour}:{minute}:{second}"));
    let component = |value: i64| u32::try_from(value).map_err(|_| invalid());
    let year = year
        .checked_add(2000)
        .and_then(|y| i32::try_from(y).ok())
        .ok_or_else(invalid)?;
    NaiveDate::from_ymd_opt(year, component(month)?, component(day)?)
        .and_then(|date| {
            date.and_hms_opt(
                component(hour).ok()?,
                component(minute).ok()?,
                component(second).ok()?,
            )
        })
        .ok_or_else(invalid)
}

/// One ADV velocity sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdvSample {
    pub count: i64,
    /// Decibars
    pub pressure: f64,
    /// m/s
    pub u: f64,
    pub v: f64,
    pub w: f64,
    /// Signal amplitude in counts
    pub amp1: i64,
    pub amp2: i64,
    pub amp3: i64,
    /// Correlation in percent
    pub corr1: i64,
    pub corr2: i64,
    pub corr3: i64,
    pub ana_in: i64,
    pub ana_in2: i64,
    pub ph_count: i64,
}

impl Record for AdvSample {
    const NAME: &'static str = "ADV";

    fn from_payload(payload: &str) -> Result<Self, RecordError> {
        let f = split_fields(payload, 14)?;
        let int = |field: &'static str, i: usize| parse_int(field, f[i]);
        Ok(AdvSample {
            count: int("count", 0)?,
            pressure: int("pressure", 1)? as f64 * 0.001,
            u: int("u", 2)? as f64 * 0.0001,
            v: int("v", 3)? as f64 * 0.0001,
            w: int("w", 4)? as f64 * 0.0001,
            amp1: int("amp1", 5)?,
            amp2: int("amp2", 6)?,
            amp3: int("amp3", 7)?,
            corr1: int("corr1", 8)?,
            corr2: int("corr2", 9)?,
            corr3: int("corr3", 10)?,
            ana_in: int("ana_in", 11)?,
            ana_in2: int("ana_in2", 12)?,
            ph_count: int("ph_count", 13)?,
        })
    }
}

pub fn parse_adv_status(payloads: &[String]) -> Vec<AdvStatus> {
    super::parse_records(payloads)
}

pub fn parse_adv_data(payloads: &[String]) -> Vec<AdvSample> {
    super::parse_records(payloads)
}

/// Velocity components per sample row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VelocityPoint {
    pub row: usize,
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

pub fn velocity_series(samples: &[AdvSample]) -> Vec<VelocityPoint> {
    samples
        .iter()
        .enumerate()
        .map(|(row, s)| VelocityPoint {
            row,
            u: s.u,
            v: s.v,
            w: s.w,
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn parse_adv_status_line() {
        // timestamp, minute, second, day, hour, year, month, bat, soundspeed, heading, pitch, roll, temp
        let payloads = vec!["2024-03-15T07:00:01,59,30,15,6,24,3,121,15012,0,-15,23,1234".to_string()];

        let parsed = parse_adv_status(&payloads);

        assert_eq!(parsed.len(), 1);
        let status = &parsed[0];
        assert_eq!(
            status.adv_timestamp,
            NaiveDate::from_ymd_opt(2024, 3, 15)
                .unwrap()
                .and_hms_opt(6, 59, 30)
                .unwrap()
        );
        assert!(close(status.bat, 12.1));
        assert!(close(status.soundspeed, 1501.2));
        assert!(close(status.heading, 0.0));
        assert!(close(status.pitch, -1.5));
        assert!(close(status.roll, 2.3));
        assert!(close(status.temp, 12.34));
    }

    #[test]
    fn adv_status_with_impossible_clock_is_skipped() {
        let payloads = vec!["2024-03-15T07:00:01,59,30,31,6,24,2,121,15012,0,-15,23,1234".to_string()];

        assert!(parse_adv_status(&payloads).is_empty());
        assert!(matches!(
            AdvStatus::from_payload(&payloads[0]),
            Err(RecordError::Date(_))
        ));
    }

    #[test]
    fn adv_status_with_overflowing_year_is_skipped() {
        let payloads = vec![
            "2024-03-15T07:00:01,59,30,15,6,9223372036854775807,3,121,15012,0,-15,23,1234"
                .to_string(),
            "2024-03-15T07:00:01,59,30,15,6,-9223372036854775808,3,121,15012,0,-15,23,1234"
                .to_string(),
        ];

        assert!(parse_adv_status(&payloads).is_empty());
        assert!(matches!(
            AdvStatus::from_payload(&payloads[0]),
            Err(RecordError::Date(_))
        ));
    }

    #[test]
    fn parse_adv_data_line() {
        let payloads = vec![
            "17,10250,1234,-567,89,120,121,122,90,91,92,0,1,3".to_string(),
            "18,10250,1234".to_string(),
        ];

        let parsed = parse_adv_data(&payloads);

        assert_eq!(parsed.len(), 1);
        let sample = &parsed[0];
        assert_eq!(sample.count, 17);
        assert!(close(sample.pressure, 10.25));
        assert!(close(sample.u, 0.1234));
        assert!(close(sample.v, -0.0567));
        assert!(close(sample.w, 0.0089));
        assert_eq!((sample.amp1, sample.amp2, sample.amp3), (120, 121, 122));
        assert_eq!((sample.corr1, sample.corr2, sample.corr3), (90, 91, 92));
        assert_eq!((sample.ana_in, sample.ana_in2, sample.ph_count), (0, 1, 3));
    }

    #[test]
    fn velocity_series_numbers_rows() {
        let samples = parse_adv_data(&[
            "1,0,10000,0,0,0,0,0,0,0,0,0,0,0".to_string(),
            "2,0,0,20000,-10000,0,0,0,0,0,0,0,0,0".to_string(),
        ]);

        let series = velocity_series(&samples);

        assert_eq!(series.len(), 2);
        assert_eq!(series[1].row, 1);
        assert!(close(series[0].u, 1.0));
        assert!(close(series[1].v, 2.0));
        assert!(close(series[1].w, -1.0));
    }
}
