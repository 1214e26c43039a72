//! Integration tests for running report jobs under their locks.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::fs;
use std::sync::Arc;

use common::setup;
use rowport_report::column::ColumnMetaData;
use rowport_report::coordinator::ConcurrencyCoordinator;
use rowport_report::cursor::{MemoryRowCursor, RowCursor};
use rowport_report::error::{ReportError, ReportResult};
use rowport_report::formatter::TextFormatter;
use rowport_report::runner::{JobOutcome, ReportJob, ReportJobRunner};
use rowport_report::value::ScalarValue;
use rowport_report::writer::HeaderMode;

/// A cursor whose data source fails after the first row.
struct FailingCursor {
    rows_left: usize,
    value: ScalarValue,
}

impl RowCursor for FailingCursor {
    fn field_count(&self) -> usize {
        1
    }

    fn advance(&mut self) -> ReportResult<bool> {
        if self.rows_left == 0 {
            return Err(ReportError::internal("connection reset"));
        }
        self.rows_left -= 1;
        Ok(true)
    }

    fn value_at(&self, _ordinal: usize) -> Option<&ScalarValue> {
        Some(&self.value)
    }
}

fn columns() -> Vec<ColumnMetaData> {
    vec![
        ColumnMetaData::new("Name", "varchar", 100),
        ColumnMetaData::new("Age", "int", 4),
    ]
}

fn people() -> MemoryRowCursor {
    MemoryRowCursor::try_new(
        2,
        vec![
            vec![Some("Matt".into()), Some(41.into())],
            vec![Some("Jane".into()), None],
        ],
    )
    .unwrap()
}

#[test]
fn test_run_writes_report_and_releases_lock() {
    let fixture = setup();
    let coordinator = Arc::new(fixture.coordinator.clone());
    let runner = ReportJobRunner::new(coordinator.clone(), Arc::new(TextFormatter::default()));
    let job = ReportJob {
        connection_name: "sales".to_string(),
        job_id: 12,
        output_path: fixture.root().join("out").join("12.csv"),
        delimiter: ",".to_string(),
        header: HeaderMode::Verbatim,
    };

    let outcome = runner.run(&job, &mut people(), &columns()).unwrap();

    assert_eq!(
        outcome,
        JobOutcome::Completed {
            rows: 2,
            path: job.output_path.clone()
        }
    );
    assert_eq!(
        fs::read_to_string(&job.output_path).unwrap(),
        "Name,Age\nMatt,41\nJane,\n"
    );
    assert!(coordinator.get_running_reports("sales").unwrap().is_empty());
}

#[test]
fn test_run_skips_running_job() {
    let fixture = setup();
    let coordinator = Arc::new(fixture.coordinator.clone());
    coordinator.lock_report_job("sales", 12).unwrap();
    let runner = ReportJobRunner::new(coordinator.clone(), Arc::new(TextFormatter::default()));
    let job = ReportJob {
        connection_name: "sales".to_string(),
        job_id: 12,
        output_path: fixture.root().join("12.csv"),
        delimiter: ",".to_string(),
        header: HeaderMode::Verbatim,
    };

    let outcome = runner.run(&job, &mut people(), &columns()).unwrap();

    assert_eq!(outcome, JobOutcome::AlreadyRunning);
    assert!(!job.output_path.exists());
    // the other holder keeps its lock
    assert_eq!(coordinator.get_running_reports("sales").unwrap(), vec![12]);
}

#[test]
fn test_run_releases_lock_on_failure() {
    let fixture = setup();
    let coordinator = Arc::new(fixture.coordinator.clone());
    let runner = ReportJobRunner::new(coordinator.clone(), Arc::new(TextFormatter::default()));
    let job = ReportJob {
        connection_name: "sales".to_string(),
        job_id: 13,
        output_path: fixture.root().join("13.csv"),
        delimiter: ";".to_string(),
        header: HeaderMode::Omit,
    };
    let mut cursor = FailingCursor {
        rows_left: 1,
        value: "partial".into(),
    };

    let result = runner.run(&job, &mut cursor, &columns()[..1]);

    assert!(matches!(result, Err(ReportError::InternalError(_))));
    assert!(coordinator.get_running_reports("sales").unwrap().is_empty());
    assert_eq!(fs::read_to_string(&job.output_path).unwrap(), "partial\n");
}
