pub mod timestamp;
pub mod web;

pub use timestamp::GemsTimestamp;
pub use web::{collect_hours, get_table_data, HttpTableSource, TableData, TableSource};
