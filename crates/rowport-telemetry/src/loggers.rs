use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use log::{Log, Metadata, Record};

use crate::error::TelemetryResult;

/// A logger that appends plain-text records to a file.
pub struct FileLogger {
    writer: Mutex<BufWriter<File>>,
}

impl FileLogger {
    pub fn open(path: &Path) -> TelemetryResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl Log for FileLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ");
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        // A logger has nowhere to report its own failures.
        let _ = writeln!(
            writer,
            "[{timestamp} {} {}] {}",
            record.level(),
            record.target(),
            record.args()
        );
    }

    fn flush(&self) {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let _ = writer.flush();
    }
}

/// Forwards every record accepted by the console logger to the file logger, if any.
/// The console logger's filter decides for both.
pub struct TeeLogger {
    console: env_logger::Logger,
    file: Option<FileLogger>,
}

impl TeeLogger {
    pub fn new(console: env_logger::Logger, file: Option<FileLogger>) -> Self {
        Self { console, file }
    }

    pub fn filter(&self) -> log::LevelFilter {
        self.console.filter()
    }
}

impl Log for TeeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.console.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.console.matches(record) {
            return;
        }
        self.console.log(record);
        if let Some(file) = &self.file {
            file.log(record);
        }
    }

    fn flush(&self) {
        self.console.flush();
        if let Some(file) = &self.file {
            file.flush();
        }
    }
}
