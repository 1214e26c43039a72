use serde::{Deserialize, Serialize};

use crate::value::DataType;

/// Describes one output column. Column order is fixed per report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetaData {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub size: usize,
}

impl ColumnMetaData {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            size,
        }
    }

    pub fn data_type(&self) -> DataType {
        DataType::from_type_name(&self.type_name)
    }
}
