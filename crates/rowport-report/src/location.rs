use std::path::{Component, Path, PathBuf};

use rowport_common::config::ReportConfig;

use crate::error::{ReportError, ReportResult};

/// Resolves the folders that belong to a connection.
/// The result must be deterministic per connection name.
pub trait ReportLocationProvider: Send + Sync {
    /// The folder holding the lock markers of the connection's running jobs.
    fn processing_folder(&self, connection_name: &str) -> ReportResult<PathBuf>;

    /// The folder receiving the connection's report files.
    fn output_folder(&self, connection_name: &str) -> ReportResult<PathBuf>;
}

/// Lays out connections under a single root folder:
/// `<root>/<connection>/processing` and `<root>/<connection>/output`.
#[derive(Debug, Clone)]
pub struct FolderReportLocationProvider {
    root: PathBuf,
}

impl FolderReportLocationProvider {
    const PROCESSING: &'static str = "processing";
    const OUTPUT: &'static str = "output";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &ReportConfig) -> Self {
        Self::new(config.root.clone())
    }

    fn connection_folder(&self, connection_name: &str) -> ReportResult<PathBuf> {
        let mut components = Path::new(connection_name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(connection_name)),
            _ => Err(ReportError::invalid(format!(
                "connection name must be a single folder name: {connection_name:?}"
            ))),
        }
    }
}

impl ReportLocationProvider for FolderReportLocationProvider {
    fn processing_folder(&self, connection_name: &str) -> ReportResult<PathBuf> {
        Ok(self.connection_folder(connection_name)?.join(Self::PROCESSING))
    }

    fn output_folder(&self, connection_name: &str) -> ReportResult<PathBuf> {
        Ok(self.connection_folder(connection_name)?.join(Self::OUTPUT))
    }
}
