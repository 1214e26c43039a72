use crate::error::{ReportError, ReportResult};
use crate::value::ScalarValue;

/// Sequential read-only access to the rows of a query result.
///
/// A cursor starts before the first row; [`RowCursor::advance`] must be called
/// before values of the first row can be read.
pub trait RowCursor {
    fn field_count(&self) -> usize;

    /// Moves to the next row, returning `false` when the rows are exhausted.
    fn advance(&mut self) -> ReportResult<bool>;

    /// Returns the value of the current row at the ordinal.
    /// `None` means the value is absent, which is distinct from [`ScalarValue::Null`].
    fn value_at(&self, ordinal: usize) -> Option<&ScalarValue>;
}

/// A row cursor over rows held in memory.
#[derive(Debug, Clone)]
pub struct MemoryRowCursor {
    field_count: usize,
    rows: Vec<Vec<Option<ScalarValue>>>,
    position: Option<usize>,
}

impl MemoryRowCursor {
    pub fn try_new(field_count: usize, rows: Vec<Vec<Option<ScalarValue>>>) -> ReportResult<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != field_count)
        {
            return Err(ReportError::invalid(format!(
                "row {index} has {} values but the cursor has {field_count} fields",
                row.len()
            )));
        }
        Ok(Self {
            field_count,
            rows,
            position: None,
        })
    }
}

impl RowCursor for MemoryRowCursor {
    fn field_count(&self) -> usize {
        self.field_count
    }

    fn advance(&mut self) -> ReportResult<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }

    fn value_at(&self, ordinal: usize) -> Option<&ScalarValue> {
        self.position
            .and_then(|p| self.rows.get(p))
            .and_then(|row| row.get(ordinal))
            .and_then(Option::as_ref)
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_cursor_walks_rows() {
        let mut cursor = MemoryRowCursor::try_new(
            2,
            vec![
                vec![Some("a".into()), None],
                vec![Some("b".into()), Some(ScalarValue::Null)],
            ],
        )
        .unwrap();
        assert_eq!(cursor.value_at(0), None);
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.value_at(0), Some(&ScalarValue::from("a")));
        assert_eq!(cursor.value_at(1), None);
        assert!(cursor.advance().unwrap());
        assert_eq!(cursor.value_at(1), Some(&ScalarValue::Null));
        assert!(!cursor.advance().unwrap());
        assert!(!cursor.advance().unwrap());
        assert_eq!(cursor.value_at(0), None);
    }

    #[test]
    fn test_memory_cursor_rejects_ragged_rows() {
        let result = MemoryRowCursor::try_new(2, vec![vec![Some(1.into())]]);
        assert!(matches!(result, Err(ReportError::InvalidArgument(_))));
    }
}
