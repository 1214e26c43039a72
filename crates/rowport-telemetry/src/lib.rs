pub mod error;
mod loggers;
pub mod telemetry;
