use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info};

use crate::column::ColumnMetaData;
use crate::coordinator::ConcurrencyCoordinator;
use crate::cursor::RowCursor;
use crate::error::{ReportError, ReportResult};
use crate::formatter::ValueFormatter;
use crate::writer::{DelimitedReportWriter, HeaderMode};
use crate::JobId;

#[derive(Debug, Clone)]
pub struct ReportJob {
    pub connection_name: String,
    pub job_id: JobId,
    pub output_path: PathBuf,
    pub delimiter: String,
    pub header: HeaderMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed { rows: usize, path: PathBuf },
    /// Another holder has the job locked; nothing was written.
    AlreadyRunning,
}

/// Runs a report job under its lock: check, lock, write, unlock.
pub struct ReportJobRunner {
    coordinator: Arc<dyn ConcurrencyCoordinator + Send + Sync>,
    formatter: Arc<dyn ValueFormatter + Send + Sync>,
}

impl ReportJobRunner {
    pub fn new(
        coordinator: Arc<dyn ConcurrencyCoordinator + Send + Sync>,
        formatter: Arc<dyn ValueFormatter + Send + Sync>,
    ) -> Self {
        Self {
            coordinator,
            formatter,
        }
    }

    /// Writes the rows of the cursor to the job's output path.
    /// The lock is released whether or not the write succeeds.
    pub fn run(
        &self,
        job: &ReportJob,
        cursor: &mut dyn RowCursor,
        columns: &[ColumnMetaData],
    ) -> ReportResult<JobOutcome> {
        let running = self
            .coordinator
            .get_running_reports(&job.connection_name)?;
        if running.contains(&job.job_id) {
            info!(
                "report job {} is already running for connection {}",
                job.job_id, job.connection_name
            );
            return Ok(JobOutcome::AlreadyRunning);
        }
        let lock = match JobLock::acquire(self.coordinator.as_ref(), &job.connection_name, job.job_id)
        {
            Ok(lock) => lock,
            Err(ReportError::AlreadyLocked { .. }) => {
                info!(
                    "report job {} was locked concurrently for connection {}",
                    job.job_id, job.connection_name
                );
                return Ok(JobOutcome::AlreadyRunning);
            }
            Err(e) => return Err(e),
        };

        if let Some(parent) = job.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = DelimitedReportWriter::create(&job.output_path, self.formatter.clone())?;
        let rows = writer.write_report(cursor, columns, &job.delimiter, job.header)?;
        writer.finish()?;
        lock.release()?;

        info!(
            "report job {} for connection {} wrote {rows} row(s) to {}",
            job.job_id,
            job.connection_name,
            job.output_path.display()
        );
        Ok(JobOutcome::Completed {
            rows,
            path: job.output_path.clone(),
        })
    }
}

/// Holds a job lock and releases it when dropped.
struct JobLock<'a> {
    coordinator: &'a (dyn ConcurrencyCoordinator + Send + Sync),
    connection_name: &'a str,
    job_id: JobId,
    released: bool,
}

impl<'a> JobLock<'a> {
    fn acquire(
        coordinator: &'a (dyn ConcurrencyCoordinator + Send + Sync),
        connection_name: &'a str,
        job_id: JobId,
    ) -> ReportResult<Self> {
        coordinator.try_lock_report_job(connection_name, job_id)?;
        Ok(Self {
            coordinator,
            connection_name,
            job_id,
            released: false,
        })
    }

    fn release(mut self) -> ReportResult<()> {
        self.released = true;
        self.coordinator
            .unlock_report_job(self.connection_name, self.job_id)
    }
}

impl Drop for JobLock<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self
            .coordinator
            .unlock_report_job(self.connection_name, self.job_id)
        {
            error!(
                "failed to unlock report job {} for connection {}: {e}",
                self.job_id, self.connection_name
            );
        }
    }
}
