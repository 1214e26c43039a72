use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::column::ColumnMetaData;
use crate::cursor::MemoryRowCursor;
use crate::error::{ReportError, ReportResult};
use crate::value::ScalarValue;

/// Query results materialized as JSON:
/// `{"columns": [{"name": "Age", "type": "int", "size": 4}], "rows": [[41]]}`.
///
/// Rows shorter than the column list leave the trailing values absent.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonReportSource {
    pub columns: Vec<ColumnMetaData>,
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl JsonReportSource {
    pub fn from_reader(reader: impl Read) -> ReportResult<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ReportResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn into_cursor(self) -> ReportResult<(Vec<ColumnMetaData>, MemoryRowCursor)> {
        let field_count = self.columns.len();
        let rows = self
            .rows
            .into_iter()
            .enumerate()
            .map(|(index, row)| {
                if row.len() > field_count {
                    return Err(ReportError::invalid(format!(
                        "row {index} has {} values but there are {field_count} columns",
                        row.len()
                    )));
                }
                let mut values = row
                    .into_iter()
                    .map(|v| json_to_scalar(v).map(Some))
                    .collect::<ReportResult<Vec<_>>>()?;
                values.resize(field_count, None);
                Ok(values)
            })
            .collect::<ReportResult<Vec<_>>>()?;
        let cursor = MemoryRowCursor::try_new(field_count, rows)?;
        Ok((self.columns, cursor))
    }
}

fn json_to_scalar(value: Value) -> ReportResult<ScalarValue> {
    match value {
        Value::Null => Ok(ScalarValue::Null),
        Value::Bool(v) => Ok(ScalarValue::Boolean(v)),
        Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                Ok(ScalarValue::Int64(v))
            } else if let Some(v) = n.as_f64() {
                Ok(ScalarValue::Float64(v))
            } else {
                Err(ReportError::unsupported(format!("JSON number: {n}")))
            }
        }
        Value::String(v) => Ok(ScalarValue::Utf8(v)),
        Value::Array(_) | Value::Object(_) => Err(ReportError::unsupported(format!(
            "nested JSON value: {value}"
        ))),
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::RowCursor;

    #[test]
    fn test_json_source() {
        let json = r#"{
            "columns": [
                {"name": "Name", "type": "varchar", "size": 100},
                {"name": "Score", "type": "float"},
                {"name": "Active", "type": "bit", "size": 1}
            ],
            "rows": [["Matt", 1.5, true], ["Jane", null]]
        }"#;
        let source = JsonReportSource::from_reader(json.as_bytes()).unwrap();
        let (columns, mut cursor) = source.into_cursor().unwrap();
        assert_eq!(columns[1], ColumnMetaData::new("Score", "float", 0));
        assert_eq!(cursor.field_count(), 3);

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.value_at(0), Some(&ScalarValue::from("Matt")));
        assert_eq!(cursor.value_at(1), Some(&ScalarValue::Float64(1.5)));
        assert_eq!(cursor.value_at(2), Some(&ScalarValue::Boolean(true)));

        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.value_at(1), Some(&ScalarValue::Null));
        assert_eq!(cursor.value_at(2), None);
        assert!(!cursor.advance().unwrap());
    }

    #[test]
    fn test_json_source_rejects_nested_values() {
        let json = r#"{"columns": [{"name": "A", "type": "varchar"}], "rows": [[[1, 2]]]}"#;
        let source = JsonReportSource::from_reader(json.as_bytes()).unwrap();
        assert!(matches!(
            source.into_cursor(),
            Err(ReportError::NotSupported(_))
        ));
    }

    #[test]
    fn test_json_source_rejects_long_rows() {
        let json = r#"{"columns": [{"name": "A", "type": "varchar"}], "rows": [[1, 2]]}"#;
        let source = JsonReportSource::from_reader(json.as_bytes()).unwrap();
        assert!(matches!(
            source.into_cursor(),
            Err(ReportError::InvalidArgument(_))
        ));
    }
}
