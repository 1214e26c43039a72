use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{CommonError, CommonResult};

const DEFAULT_CONFIG: &str = include_str!("default.toml");

/// The prefix of environment variables that override configuration values.
/// A double underscore separates nested keys, e.g. `ROWPORT__REPORT__DELIMITER`.
pub const CONFIG_ENV_PREFIX: &str = "ROWPORT__";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub report: ReportConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> CommonResult<Self> {
        Ok(Self::figment()
            .admerge(Self::env())
            .extract()
            .map_err(Box::new)?)
    }

    /// Loads the configuration with the values of a user TOML file
    /// layered between the defaults and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> CommonResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CommonError::ConfigFileNotFound(path.to_path_buf()));
        }
        Ok(Self::figment()
            .admerge(Toml::file(path))
            .admerge(Self::env())
            .extract()
            .map_err(Box::new)?)
    }

    fn figment() -> Figment {
        Figment::from(Toml::string(DEFAULT_CONFIG))
    }

    fn env() -> Env {
        Env::prefixed(CONFIG_ENV_PREFIX).map(|p| p.as_str().replace("__", ".").into())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    pub root: PathBuf,
    pub delimiter: String,
    pub escape_header: bool,
    pub culture: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(deserialize_with = "deserialize_non_empty_path")]
    pub log_file: Option<PathBuf>,
}

fn deserialize_non_empty_path<'de, D>(deserializer: D) -> Result<Option<PathBuf>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        Ok(None)
    } else {
        Ok(Some(PathBuf::from(value)))
    }
}
