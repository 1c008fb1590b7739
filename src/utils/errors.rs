use std::num::{ParseFloatError, ParseIntError};

use crate::source::GemsTimestamp;

/// Errors while retrieving a GEMS data page.
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("The request to the GEMS data page failed")]
    ClientRequestError(#[source] reqwest::Error),
    #[error("Table {index} requested, but the page contains {found} tables")]
    TableNotFound { index: usize, found: usize },
    #[error("Invalid timestamp `{0}`, expected YYYYMMDDHH")]
    InvalidTimestamp(String),
    #[error("{start} shifted by {hours} hours leaves the supported date range")]
    TimestampOutOfRange { start: GemsTimestamp, hours: i64 },
    #[error("Something went wrong")]
    UnexpectedError(#[source] anyhow::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        FetchError::ClientRequestError(error)
    }
}

/// Errors while parsing a single record payload.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },
    #[error("field `{field}` is not an integer")]
    Integer {
        field: &'static str,
        #[source]
        source: ParseIntError,
    },
    #[error("field `{field}` is not a number")]
    Float {
        field: &'static str,
        #[source]
        source: ParseFloatError,
    },
    #[error("`{0}` is not an ISO 8601 timestamp")]
    Timestamp(String),
    #[error("fields do not form a valid date: {0}")]
    Date(String),
}

impl RecordError {
    /// Wrong field counts are skipped quietly, everything else is worth an error log.
    pub fn is_field_count(&self) -> bool {
        matches!(self, RecordError::FieldCount { .. })
    }
}
