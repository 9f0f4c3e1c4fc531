pub mod adverts;
pub mod config;
pub mod error;
pub mod telemetry;
