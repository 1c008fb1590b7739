pub mod errors;
pub mod futures;
pub mod telemetry;
pub mod test_helpers;
