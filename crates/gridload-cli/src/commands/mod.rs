pub mod config;
pub mod grid;
pub mod load;
pub mod telemetry;
