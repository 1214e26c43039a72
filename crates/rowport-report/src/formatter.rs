use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use log::error;
use rowport_common::culture::Culture;
use thiserror::Error;

use crate::value::{format_f32, format_f64, DataType, Decimal128, ScalarValue};

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Why a value could not be converted to the kind its column declares.
/// Conversion errors never abort a report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("cannot convert {from} value to {to}")]
    InvalidCast {
        from: &'static str,
        to: &'static str,
    },
    #[error("cannot parse {text:?} as {to}")]
    InvalidFormat { text: String, to: &'static str },
    #[error("{0}")]
    Overflow(String),
}

/// How a cell value was turned into text.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendering {
    /// The value was null or absent.
    Empty,
    /// The value was converted to its declared kind and rendered with the culture.
    Typed(String),
    /// The declared kind has no culture rules, so the default text was used.
    Generic(String),
    /// The conversion to the declared kind failed and the default text was used.
    Fallback {
        text: String,
        error: ConversionError,
    },
}

impl Rendering {
    pub fn into_text(self) -> String {
        match self {
            Rendering::Empty => String::new(),
            Rendering::Typed(text)
            | Rendering::Generic(text)
            | Rendering::Fallback { text, .. } => text,
        }
    }
}

/// Renders a cell value as display text. Formatting never fails.
pub trait ValueFormatter {
    fn format_text(&self, value: Option<&ScalarValue>, data_type: &DataType) -> String;
}

#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    culture: Culture,
}

impl TextFormatter {
    pub fn new(culture: Culture) -> Self {
        Self { culture }
    }

    /// Renders the value, first as its declared kind and then as default text.
    pub fn render(&self, value: Option<&ScalarValue>, data_type: &DataType) -> Rendering {
        let value = match value {
            Some(value) if !value.is_null() => value,
            _ => return Rendering::Empty,
        };
        match self.render_typed(value, data_type) {
            None => Rendering::Generic(generic_text(value)),
            Some(Ok(text)) => Rendering::Typed(text),
            Some(Err(e)) => {
                error!(
                    "failed to format {} value as {data_type:?}: {e}",
                    value.kind()
                );
                Rendering::Fallback {
                    text: generic_text(value),
                    error: e,
                }
            }
        }
    }

    fn render_typed(
        &self,
        value: &ScalarValue,
        data_type: &DataType,
    ) -> Option<Result<String, ConversionError>> {
        let culture = &self.culture;
        let text = match data_type {
            DataType::DateTime => to_datetime(value).map(|v| culture.format_datetime(&v)),
            DataType::Decimal => to_decimal(value).map(|v| culture.localize_number(v.to_string())),
            DataType::Float32 => to_f32(value).map(|v| culture.localize_number(format_f32(v))),
            DataType::Float64 => to_f64(value).map(|v| culture.localize_number(format_f64(v))),
            DataType::Other(_) => return None,
        };
        Some(text)
    }
}

impl ValueFormatter for TextFormatter {
    fn format_text(&self, value: Option<&ScalarValue>, data_type: &DataType) -> String {
        self.render(value, data_type).into_text()
    }
}

/// The default text of the value with line breaks removed.
fn generic_text(value: &ScalarValue) -> String {
    value.to_string().replace(['\r', '\n'], "")
}

fn to_datetime(value: &ScalarValue) -> Result<NaiveDateTime, ConversionError> {
    const TO: &str = "datetime";
    match value {
        ScalarValue::Timestamp(v) => Ok(*v),
        ScalarValue::Date(v) => Ok(v.and_time(NaiveTime::MIN)),
        ScalarValue::Utf8(v) => {
            let text = v.trim();
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .or_else(|| {
                    NaiveDate::parse_from_str(text, DATE_FORMAT)
                        .ok()
                        .map(|d| d.and_time(NaiveTime::MIN))
                })
                .ok_or_else(|| ConversionError::InvalidFormat {
                    text: v.clone(),
                    to: TO,
                })
        }
        other => Err(ConversionError::InvalidCast {
            from: other.kind(),
            to: TO,
        }),
    }
}

fn to_decimal(value: &ScalarValue) -> Result<Decimal128, ConversionError> {
    const TO: &str = "decimal";
    let overflow = |e: crate::error::ReportError| ConversionError::Overflow(e.to_string());
    match value {
        ScalarValue::Decimal128(v) => Ok(*v),
        ScalarValue::Int32(v) => Ok(Decimal128::from_i64(*v as i64)),
        ScalarValue::Int64(v) => Ok(Decimal128::from_i64(*v)),
        ScalarValue::Boolean(v) => Ok(Decimal128::from_i64(*v as i64)),
        ScalarValue::Float32(v) => Decimal128::from_float(*v as f64, 7).map_err(overflow),
        ScalarValue::Float64(v) => Decimal128::from_float(*v, 15).map_err(overflow),
        ScalarValue::Utf8(v) => Decimal128::parse(v).map_err(|_| ConversionError::InvalidFormat {
            text: v.clone(),
            to: TO,
        }),
        other => Err(ConversionError::InvalidCast {
            from: other.kind(),
            to: TO,
        }),
    }
}

fn to_f64(value: &ScalarValue) -> Result<f64, ConversionError> {
    const TO: &str = "float64";
    match value {
        ScalarValue::Float64(v) => Ok(*v),
        ScalarValue::Float32(v) => Ok(*v as f64),
        ScalarValue::Int32(v) => Ok(*v as f64),
        ScalarValue::Int64(v) => Ok(*v as f64),
        ScalarValue::Decimal128(v) => Ok(v.to_f64()),
        ScalarValue::Boolean(v) => Ok(if *v { 1.0 } else { 0.0 }),
        ScalarValue::Utf8(v) => v.trim().parse().map_err(|_| ConversionError::InvalidFormat {
            text: v.clone(),
            to: TO,
        }),
        other => Err(ConversionError::InvalidCast {
            from: other.kind(),
            to: TO,
        }),
    }
}

fn to_f32(value: &ScalarValue) -> Result<f32, ConversionError> {
    const TO: &str = "float32";
    match value {
        ScalarValue::Float32(v) => Ok(*v),
        ScalarValue::Utf8(v) => v.trim().parse().map_err(|_| ConversionError::InvalidFormat {
            text: v.clone(),
            to: TO,
        }),
        other => to_f64(other)
            .map(|v| v as f32)
            .map_err(|e| match e {
                ConversionError::InvalidCast { from, .. } => {
                    ConversionError::InvalidCast { from, to: TO }
                }
                e => e,
            }),
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn formatter(culture: &str) -> TextFormatter {
        TextFormatter::new(Culture::from_name(culture).unwrap())
    }

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(15, 4, 5)
            .unwrap()
    }

    #[test]
    fn test_null_and_absent_are_empty() {
        let formatter = formatter("invariant");
        for data_type in [DataType::DateTime, DataType::Decimal, DataType::from_type_name("varchar")] {
            assert_eq!(formatter.render(None, &data_type), Rendering::Empty);
            assert_eq!(
                formatter.render(Some(&ScalarValue::Null), &data_type),
                Rendering::Empty
            );
        }
    }

    #[test]
    fn test_line_breaks_are_removed() {
        let formatter = formatter("invariant");
        let varchar = DataType::from_type_name("varchar");
        let render = |s: &str| formatter.format_text(Some(&ScalarValue::from(s)), &varchar);
        assert_eq!(render("new\nline"), "newline");
        assert_eq!(render("carriage\rreturn"), "carriagereturn");
        assert_eq!(render("carriage\rreturn_new\nline"), "carriagereturn_newline");
        assert_eq!(render("crlf\r\n"), "crlf");
    }

    #[test]
    fn test_datetime_uses_culture() {
        let value = ScalarValue::Timestamp(timestamp());
        assert_eq!(
            formatter("en-US").render(Some(&value), &DataType::DateTime),
            Rendering::Typed("3/7/2024 3:04:05 PM".to_string())
        );
        assert_eq!(
            formatter("de-DE").format_text(Some(&value), &DataType::DateTime),
            "07.03.2024 15:04:05"
        );
        let text = ScalarValue::from("2024-03-07T15:04:05");
        assert_eq!(
            formatter("en-GB").format_text(Some(&text), &DataType::DateTime),
            "07/03/2024 15:04:05"
        );
        let date = ScalarValue::from("2024-03-07");
        assert_eq!(
            formatter("en-GB").format_text(Some(&date), &DataType::DateTime),
            "07/03/2024 00:00:00"
        );
    }

    #[test]
    fn test_numbers_use_culture() {
        let formatter = formatter("de-DE");
        let decimal = ScalarValue::Decimal128(Decimal128::new(-123450, 2));
        assert_eq!(
            formatter.format_text(Some(&decimal), &DataType::Decimal),
            "-1234,50"
        );
        assert_eq!(
            formatter.format_text(Some(&ScalarValue::from(2.5f64)), &DataType::Float64),
            "2,5"
        );
        assert_eq!(
            formatter.format_text(Some(&ScalarValue::from(0.25f32)), &DataType::Float32),
            "0,25"
        );
        assert_eq!(
            formatter.format_text(Some(&ScalarValue::from("12.5")), &DataType::Decimal),
            "12,5"
        );
        assert_eq!(
            formatter.format_text(Some(&ScalarValue::from(41)), &DataType::Decimal),
            "41"
        );
    }

    #[test]
    fn test_failed_conversion_falls_back_to_default_text() {
        let formatter = formatter("invariant");
        assert_eq!(
            formatter.render(Some(&ScalarValue::from(41)), &DataType::DateTime),
            Rendering::Fallback {
                text: "41".to_string(),
                error: ConversionError::InvalidCast {
                    from: "int32",
                    to: "datetime"
                },
            }
        );
        let rendering = formatter.render(Some(&ScalarValue::from("n/a\n")), &DataType::Float64);
        assert!(matches!(
            &rendering,
            Rendering::Fallback {
                error: ConversionError::InvalidFormat { .. },
                ..
            }
        ));
        assert_eq!(rendering.into_text(), "n/a");
        assert_eq!(
            formatter.format_text(Some(&ScalarValue::from(f64::NAN)), &DataType::Decimal),
            "NaN"
        );
    }

    #[test]
    fn test_other_types_use_default_text() {
        let formatter = formatter("de-DE");
        let int = DataType::from_type_name("int");
        assert_eq!(
            formatter.render(Some(&ScalarValue::from(2.5f64)), &int),
            Rendering::Generic("2.5".to_string())
        );
        assert_eq!(
            formatter.format_text(Some(&ScalarValue::from(false)), &int),
            "False"
        );
    }
}
