//! Shared fixtures for report integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rowport_report::coordinator::FileConcurrencyCoordinator;
use rowport_report::error::ReportResult;
use rowport_report::location::ReportLocationProvider;
use tempfile::TempDir;

/// Places each connection's processing folder directly under the root.
pub struct TestLocationProvider {
    root: PathBuf,
}

impl ReportLocationProvider for TestLocationProvider {
    fn processing_folder(&self, connection_name: &str) -> ReportResult<PathBuf> {
        Ok(self.root.join(connection_name))
    }

    fn output_folder(&self, connection_name: &str) -> ReportResult<PathBuf> {
        Ok(self.root.join("output").join(connection_name))
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub coordinator: FileConcurrencyCoordinator,
}

impl Fixture {
    #[allow(dead_code)]
    pub fn processing_folder(&self, connection_name: &str) -> PathBuf {
        self.dir.path().join(connection_name)
    }

    #[allow(dead_code)]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}

pub fn setup() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let locations = Arc::new(TestLocationProvider {
        root: dir.path().to_path_buf(),
    });
    Fixture {
        dir,
        coordinator: FileConcurrencyCoordinator::new(locations),
    }
}
