pub mod config;
pub mod culture;
pub mod error;
