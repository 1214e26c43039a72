use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};

use crate::error::{ReportError, ReportResult};
use crate::location::ReportLocationProvider;
use crate::JobId;

/// Tracks which report jobs of a connection are running.
///
/// A job is running while a marker named after its id exists in the
/// connection's processing folder. Nothing is cached, so independent
/// processes sharing the folder see the same state.
pub trait ConcurrencyCoordinator {
    /// Returns the ids of the running jobs, in no particular order.
    /// A processing folder that does not exist yet means no job is running.
    fn get_running_reports(&self, connection_name: &str) -> ReportResult<Vec<JobId>>;

    /// Creates the marker for the job, replacing an existing one.
    ///
    /// This is not an atomic test-and-set: two callers locking the same id
    /// concurrently both succeed. Use [`ConcurrencyCoordinator::try_lock_report_job`]
    /// when the caller must know it is the only holder.
    fn lock_report_job(&self, connection_name: &str, job_id: JobId) -> ReportResult<()>;

    /// Creates the marker for the job only if it does not exist,
    /// failing with [`ReportError::AlreadyLocked`] otherwise.
    fn try_lock_report_job(&self, connection_name: &str, job_id: JobId) -> ReportResult<()>;

    /// Removes the marker for the job. Removing a missing marker is a no-op.
    fn unlock_report_job(&self, connection_name: &str, job_id: JobId) -> ReportResult<()>;
}

/// A [`ConcurrencyCoordinator`] backed by zero-byte marker files.
#[derive(Clone)]
pub struct FileConcurrencyCoordinator {
    locations: Arc<dyn ReportLocationProvider>,
}

impl FileConcurrencyCoordinator {
    pub fn new(locations: Arc<dyn ReportLocationProvider>) -> Self {
        Self { locations }
    }

    fn marker_path(&self, connection_name: &str, job_id: JobId) -> ReportResult<PathBuf> {
        Ok(self
            .locations
            .processing_folder(connection_name)?
            .join(job_id.to_string()))
    }

    fn ensure_processing_folder(&self, connection_name: &str) -> ReportResult<PathBuf> {
        let folder = self.locations.processing_folder(connection_name)?;
        fs::create_dir_all(&folder)?;
        Ok(folder)
    }
}

impl ConcurrencyCoordinator for FileConcurrencyCoordinator {
    fn get_running_reports(&self, connection_name: &str) -> ReportResult<Vec<JobId>> {
        let folder = self.locations.processing_folder(connection_name)?;
        let entries = match fs::read_dir(&folder) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => return Err(e.into()),
        };
        let mut running = vec![];
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let job_id = if entry.file_type()?.is_file() {
                name.to_str().and_then(parse_marker_name)
            } else {
                None
            };
            match job_id {
                Some(job_id) => running.push(job_id),
                None => warn!(
                    "ignoring unexpected entry {name:?} in processing folder {}",
                    folder.display()
                ),
            }
        }
        Ok(running)
    }

    fn lock_report_job(&self, connection_name: &str, job_id: JobId) -> ReportResult<()> {
        let folder = self.ensure_processing_folder(connection_name)?;
        fs::File::create(folder.join(job_id.to_string()))?;
        debug!("locked report job {job_id} for connection {connection_name}");
        Ok(())
    }

    fn try_lock_report_job(&self, connection_name: &str, job_id: JobId) -> ReportResult<()> {
        let folder = self.ensure_processing_folder(connection_name)?;
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(folder.join(job_id.to_string()))
        {
            Ok(_) => {
                debug!("locked report job {job_id} for connection {connection_name}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(ReportError::AlreadyLocked {
                connection: connection_name.to_string(),
                job_id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    fn unlock_report_job(&self, connection_name: &str, job_id: JobId) -> ReportResult<()> {
        match fs::remove_file(self.marker_path(connection_name, job_id)?) {
            Ok(()) => {
                debug!("unlocked report job {job_id} for connection {connection_name}");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A marker name is the canonical decimal form of its job id,
/// so `007` or `+7` never stands for job 7.
fn parse_marker_name(name: &str) -> Option<JobId> {
    name.parse::<JobId>()
        .ok()
        .filter(|job_id| job_id.to_string() == name)
}
