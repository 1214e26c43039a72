use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::column::ColumnMetaData;
use crate::cursor::RowCursor;
use crate::error::{ReportError, ReportResult};
use crate::formatter::ValueFormatter;

const LINE_TERMINATOR: &str = "\n";

/// How the header line of a report is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderMode {
    Omit,
    /// Column names joined by the delimiter as they are.
    Verbatim,
    /// Column names escaped the same way as data fields.
    Escaped,
}

/// Streams rows to delimited text.
///
/// A field is quoted when it contains the delimiter, a double quote, or a line
/// break; embedded double quotes are doubled. Every data line has exactly one
/// field per column and ends with `\n`.
///
/// The destination is owned by the writer. It is flushed by [`DelimitedReportWriter::finish`],
/// and dropping the writer on an error path still flushes and closes it.
pub struct DelimitedReportWriter<W: Write> {
    inner: W,
    formatter: Arc<dyn ValueFormatter + Send + Sync>,
}

impl DelimitedReportWriter<BufWriter<File>> {
    /// Creates or truncates the file at the path.
    pub fn create(
        path: impl AsRef<Path>,
        formatter: Arc<dyn ValueFormatter + Send + Sync>,
    ) -> ReportResult<Self> {
        let file = File::create(path.as_ref())?;
        Ok(Self::new(BufWriter::new(file), formatter))
    }
}

impl<W: Write> DelimitedReportWriter<W> {
    pub fn new(inner: W, formatter: Arc<dyn ValueFormatter + Send + Sync>) -> Self {
        Self { inner, formatter }
    }

    /// Writes the column names joined by the delimiter, without escaping.
    pub fn write_header<I, S>(&mut self, names: I, delimiter: &str) -> ReportResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_delimiter(delimiter)?;
        let line = names
            .into_iter()
            .map(|name| name.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(delimiter);
        self.write_raw_line(&line)
    }

    /// Writes the column names with the same escaping as data fields.
    pub fn write_header_escaped<I, S>(&mut self, names: I, delimiter: &str) -> ReportResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        check_delimiter(delimiter)?;
        let line = names
            .into_iter()
            .map(|name| escape_field(name.as_ref(), delimiter).into_owned())
            .collect::<Vec<_>>()
            .join(delimiter);
        self.write_raw_line(&line)
    }

    /// Writes the current row of the cursor, one field per column in declared order.
    pub fn write_line(
        &mut self,
        cursor: &dyn RowCursor,
        columns: &[ColumnMetaData],
        delimiter: &str,
    ) -> ReportResult<()> {
        check_delimiter(delimiter)?;
        if columns.len() > cursor.field_count() {
            return Err(ReportError::invalid(format!(
                "{} columns were declared but the cursor has {} fields",
                columns.len(),
                cursor.field_count()
            )));
        }
        let line = columns
            .iter()
            .enumerate()
            .map(|(ordinal, column)| {
                let text = self
                    .formatter
                    .format_text(cursor.value_at(ordinal), &column.data_type());
                escape_field(&text, delimiter).into_owned()
            })
            .collect::<Vec<_>>()
            .join(delimiter);
        self.write_raw_line(&line)
    }

    /// Writes the header and then every remaining row of the cursor.
    /// Returns the number of data lines written.
    pub fn write_report(
        &mut self,
        cursor: &mut dyn RowCursor,
        columns: &[ColumnMetaData],
        delimiter: &str,
        header: HeaderMode,
    ) -> ReportResult<usize> {
        let names = columns.iter().map(|c| c.name.as_str());
        match header {
            HeaderMode::Omit => check_delimiter(delimiter)?,
            HeaderMode::Verbatim => self.write_header(names, delimiter)?,
            HeaderMode::Escaped => self.write_header_escaped(names, delimiter)?,
        }
        let mut rows = 0;
        while cursor.advance()? {
            self.write_line(cursor, columns, delimiter)?;
            rows += 1;
        }
        Ok(rows)
    }

    /// Flushes buffered output and returns the destination.
    pub fn finish(mut self) -> ReportResult<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn write_raw_line(&mut self, line: &str) -> ReportResult<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(LINE_TERMINATOR.as_bytes())?;
        Ok(())
    }
}

fn check_delimiter(delimiter: &str) -> ReportResult<()> {
    if delimiter.is_empty() {
        Err(ReportError::invalid("delimiter must not be empty"))
    } else {
        Ok(())
    }
}

/// Quotes the field if it contains the delimiter, a double quote, or a line break.
pub fn escape_field<'a>(text: &'a str, delimiter: &str) -> Cow<'a, str> {
    if text.contains(delimiter) || text.contains(['"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", text.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(text)
    }
}
