use chrono::NaiveDateTime;
use serde::Serialize;

use crate::records::{parse_float, parse_int, parse_iso_timestamp, split_fields, Record};
use crate::utils::errors::RecordError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurboStatus {
    pub timestamp: NaiveDateTime,
    pub status: i64,
    /// Hz
    pub speed: i64,
    /// Watts
    pub power: i64,
    /// Volts
    pub voltage: i64,
    /// Electronics temperature, degrees Celsius
    pub e_temp: i64,
    /// Pump bottom temperature, degrees Celsius
    pub p_temp: i64,
    /// Motor temperature, degrees Celsius
    pub m_temp: i64,
    /// Amps
    pub filament: f64,
}

impl Record for TurboStatus {
    const NAME: &'static str = "turbo pump status";

    fn from_payload(payload: &str) -> Result<Self, RecordError> {
        let f = split_fields(payload, 9)?;
        Ok(TurboStatus {
            timestamp: parse_iso_timestamp(f[0])?,
            status: parse_int("status", f[1])?,
            speed: parse_int("speed", f[2])?,
            power: parse_int("power", f[3])?,
            voltage: parse_int("voltage", f[4])?,
            e_temp: parse_int("e_temp", f[5])?,
            p_temp: parse_int("p_temp", f[6])?,
            m_temp: parse_int("m_temp", f[7])?,
            filament: parse_float("filament", f[8])?,
        })
    }
}

pub fn parse_turbo_status(payloads: &[String]) -> Vec<TurboStatus> {
    super::parse_records(payloads)
}
