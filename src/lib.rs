pub mod client;
pub mod configuration;
pub mod export;
pub mod plots;
pub mod records;
pub mod source;
pub mod startup;
pub mod utils;
