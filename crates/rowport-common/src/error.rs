use std::path::PathBuf;

use thiserror::Error;

pub type CommonResult<T> = Result<T, CommonError>;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("configuration file not found: {}", .0.display())]
    ConfigFileNotFound(PathBuf),
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] Box<figment::Error>),
    #[error("unsupported culture: {0}")]
    UnsupportedCulture(String),
}
