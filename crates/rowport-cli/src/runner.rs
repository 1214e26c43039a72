use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{error, info};
use rowport_common::config::AppConfig;
use rowport_common::culture::Culture;
use rowport_report::coordinator::{ConcurrencyCoordinator, FileConcurrencyCoordinator};
use rowport_report::formatter::TextFormatter;
use rowport_report::location::{FolderReportLocationProvider, ReportLocationProvider};
use rowport_report::runner::{JobOutcome, ReportJob, ReportJobRunner};
use rowport_report::source::JsonReportSource;
use rowport_report::writer::HeaderMode;
use rowport_report::JobId;
use rowport_telemetry::telemetry::{init_telemetry, shutdown_telemetry};

#[derive(Parser)]
#[command(version, name = "rowport")]
#[command(about = "Export query results to delimited text files, one job at a time per job id")]
struct Cli {
    /// A TOML file layered over the default configuration
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the ids of the running jobs of a connection
    Running { connection: String },
    /// Mark a job as running
    Lock {
        connection: String,
        #[arg(allow_negative_numbers = true)]
        job_id: JobId,
        /// Fail instead of replacing an existing lock
        #[arg(long)]
        exclusive: bool,
    },
    /// Mark a job as no longer running
    Unlock {
        connection: String,
        #[arg(allow_negative_numbers = true)]
        job_id: JobId,
    },
    /// Write the rows of a JSON query result to a delimited file under the job lock
    Export {
        connection: String,
        #[arg(allow_negative_numbers = true)]
        job_id: JobId,
        /// A JSON document with `columns` and `rows`
        #[arg(long)]
        input: PathBuf,
        /// Defaults to `<job-id>.csv` in the connection's output folder
        #[arg(long)]
        output: Option<PathBuf>,
        /// Overrides the configured delimiter
        #[arg(long)]
        delimiter: Option<String>,
        #[arg(long)]
        no_header: bool,
    },
}

pub fn main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(args);
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    init_telemetry(&config.telemetry)?;

    let result = run(cli.command, &config);
    if let Err(e) = &result {
        error!("{e}");
    }
    shutdown_telemetry();
    result
}

fn run(command: Command, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let locations = Arc::new(FolderReportLocationProvider::from_config(&config.report));
    let coordinator = Arc::new(FileConcurrencyCoordinator::new(locations.clone()));

    match command {
        Command::Running { connection } => {
            let mut running = coordinator.get_running_reports(&connection)?;
            running.sort_unstable();
            for job_id in running {
                println!("{job_id}");
            }
        }
        Command::Lock {
            connection,
            job_id,
            exclusive,
        } => {
            if exclusive {
                coordinator.try_lock_report_job(&connection, job_id)?;
            } else {
                coordinator.lock_report_job(&connection, job_id)?;
            }
            info!("locked report job {job_id} for connection {connection}");
        }
        Command::Unlock { connection, job_id } => {
            coordinator.unlock_report_job(&connection, job_id)?;
            info!("unlocked report job {job_id} for connection {connection}");
        }
        Command::Export {
            connection,
            job_id,
            input,
            output,
            delimiter,
            no_header,
        } => {
            let (columns, mut cursor) = JsonReportSource::from_path(&input)?.into_cursor()?;
            let output_path = match output {
                Some(path) => path,
                None => locations
                    .output_folder(&connection)?
                    .join(format!("{job_id}.csv")),
            };
            let header = if no_header {
                HeaderMode::Omit
            } else if config.report.escape_header {
                HeaderMode::Escaped
            } else {
                HeaderMode::Verbatim
            };
            let job = ReportJob {
                connection_name: connection,
                job_id,
                output_path,
                delimiter: delimiter.unwrap_or_else(|| config.report.delimiter.clone()),
                header,
            };
            let formatter = TextFormatter::new(Culture::from_name(&config.report.culture)?);
            let runner = ReportJobRunner::new(coordinator, Arc::new(formatter));
            match runner.run(&job, &mut cursor, &columns)? {
                JobOutcome::Completed { rows, path } => {
                    println!("{rows} row(s) written to {}", path.display());
                }
                JobOutcome::AlreadyRunning => {
                    println!(
                        "report job {} is already running for connection {}",
                        job.job_id, job.connection_name
                    );
                }
            }
        }
    }
    Ok(())
}
