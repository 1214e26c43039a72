use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{ReportError, ReportResult};

/// The largest scale a decimal produced by a conversion may carry.
const MAX_DECIMAL_SCALE: u8 = 28;

/// A single cell value read from a row cursor.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// The database null marker.
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal128(Decimal128),
    Utf8(String),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// The name of the value kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            ScalarValue::Null => "null",
            ScalarValue::Boolean(_) => "boolean",
            ScalarValue::Int32(_) => "int32",
            ScalarValue::Int64(_) => "int64",
            ScalarValue::Float32(_) => "float32",
            ScalarValue::Float64(_) => "float64",
            ScalarValue::Decimal128(_) => "decimal128",
            ScalarValue::Utf8(_) => "utf8",
            ScalarValue::Date(_) => "date",
            ScalarValue::Timestamp(_) => "timestamp",
        }
    }
}

/// The default text representation of a value, independent of any culture.
impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => Ok(()),
            ScalarValue::Boolean(true) => write!(f, "True"),
            ScalarValue::Boolean(false) => write!(f, "False"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float32(v) => write!(f, "{}", format_f32(*v)),
            ScalarValue::Float64(v) => write!(f, "{}", format_f64(*v)),
            ScalarValue::Decimal128(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => write!(f, "{v}"),
            ScalarValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            ScalarValue::Timestamp(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<f32> for ScalarValue {
    fn from(value: f32) -> Self {
        ScalarValue::Float32(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<Decimal128> for ScalarValue {
    fn from(value: Decimal128) -> Self {
        ScalarValue::Decimal128(value)
    }
}

impl From<NaiveDate> for ScalarValue {
    fn from(value: NaiveDate) -> Self {
        ScalarValue::Date(value)
    }
}

impl From<NaiveDateTime> for ScalarValue {
    fn from(value: NaiveDateTime) -> Self {
        ScalarValue::Timestamp(value)
    }
}

impl<T: Into<ScalarValue>> From<Option<T>> for ScalarValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ScalarValue::Null)
    }
}

/// A fixed-point decimal number `value * 10^-scale`.
/// The scale is preserved when rendering, so `1.50` stays `1.50`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decimal128 {
    pub value: i128,
    pub scale: u8,
}

impl Decimal128 {
    pub fn new(value: i128, scale: u8) -> Self {
        Self { value, scale }
    }

    pub fn from_i64(value: i64) -> Self {
        Self::new(value as i128, 0)
    }

    /// Converts a float, keeping the given number of significant digits.
    pub fn from_float(value: f64, significant_digits: usize) -> ReportResult<Self> {
        if !value.is_finite() {
            return Err(ReportError::invalid(format!(
                "value was either too large or too small for a decimal: {value}"
            )));
        }
        let precision = significant_digits.saturating_sub(1);
        let scientific = format!("{value:.precision$e}");
        let (mantissa, exponent) = scientific
            .split_once('e')
            .ok_or_else(|| ReportError::internal(format!("invalid float rendering: {scientific}")))?;
        let exponent = exponent
            .parse::<i32>()
            .map_err(|e| ReportError::internal(e.to_string()))?;
        let negative = mantissa.starts_with('-');
        let digits = mantissa
            .chars()
            .filter(char::is_ascii_digit)
            .collect::<String>();
        let mut unscaled = digits
            .parse::<i128>()
            .map_err(|e| ReportError::internal(e.to_string()))?;
        let mut scale = precision as i32 - exponent;
        if scale < 0 {
            unscaled = 10i128
                .checked_pow(scale.unsigned_abs())
                .and_then(|factor| unscaled.checked_mul(factor))
                .ok_or_else(|| ReportError::invalid(format!("decimal overflow: {value}")))?;
            scale = 0;
        }
        while scale > 0 && unscaled % 10 == 0 {
            unscaled /= 10;
            scale -= 1;
        }
        while scale > MAX_DECIMAL_SCALE as i32 {
            unscaled /= 10;
            scale -= 1;
        }
        if negative {
            unscaled = -unscaled;
        }
        Ok(Self::new(unscaled, scale as u8))
    }

    /// Parses a plain decimal literal such as `-12.50`.
    pub fn parse(text: &str) -> ReportResult<Self> {
        let invalid = || ReportError::invalid(format!("invalid decimal: {text}"));
        let trimmed = text.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (integral, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if integral.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !integral
            .chars()
            .chain(fraction.chars())
            .all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }
        let scale = u8::try_from(fraction.len())
            .ok()
            .filter(|s| *s <= MAX_DECIMAL_SCALE)
            .ok_or_else(invalid)?;
        let digits = format!("{integral}{fraction}");
        let unscaled = digits.parse::<i128>().map_err(|_| invalid())?;
        Ok(Self::new(if negative { -unscaled } else { unscaled }, scale))
    }

    pub fn to_f64(&self) -> f64 {
        self.value as f64 / 10f64.powi(self.scale as i32)
    }
}

impl fmt::Display for Decimal128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.value < 0 { "-" } else { "" };
        let digits = self.value.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if scale == 0 {
            return write!(f, "{sign}{digits}");
        }
        let digits = format!("{digits:0>width$}", width = scale + 1);
        let (integral, fraction) = digits.split_at(digits.len() - scale);
        write!(f, "{sign}{integral}.{fraction}")
    }
}

/// Renders a double with the shortest round-trip digits,
/// switching to exponent notation for very large or very small magnitudes.
pub fn format_f64(value: f64) -> String {
    if let Some(special) = format_non_finite(value.is_nan(), value.is_infinite(), value > 0.0) {
        return special;
    }
    format_shortest(format!("{value:E}"), || format!("{value}"), 15)
}

/// Renders a single with the shortest round-trip digits.
pub fn format_f32(value: f32) -> String {
    if let Some(special) = format_non_finite(value.is_nan(), value.is_infinite(), value > 0.0) {
        return special;
    }
    format_shortest(format!("{value:E}"), || format!("{value}"), 7)
}

fn format_non_finite(nan: bool, infinite: bool, positive: bool) -> Option<String> {
    if nan {
        Some("NaN".to_string())
    } else if infinite && positive {
        Some("Infinity".to_string())
    } else if infinite {
        Some("-Infinity".to_string())
    } else {
        None
    }
}

fn format_shortest(scientific: String, plain: impl FnOnce() -> String, upper: i32) -> String {
    let Some((mantissa, exponent)) = scientific.split_once('E') else {
        return plain();
    };
    let Ok(exponent) = exponent.parse::<i32>() else {
        return plain();
    };
    if exponent >= upper || exponent <= -5 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}E{sign}{:02}", exponent.unsigned_abs())
    } else {
        plain()
    }
}

/// The semantic kind of a column, derived from its declared type name.
///
/// Only the kinds that are rendered with culture rules are distinguished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataType {
    DateTime,
    Decimal,
    Float32,
    Float64,
    Other(String),
}

impl DataType {
    pub fn from_type_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "datetime" | "datetime2" | "smalldatetime" | "date" | "datetimeoffset"
            | "timestamp" => DataType::DateTime,
            "decimal" | "numeric" | "money" | "smallmoney" => DataType::Decimal,
            "real" | "float4" => DataType::Float32,
            "float" | "double" | "float8" => DataType::Float64,
            other => DataType::Other(other.to_string()),
        }
    }
}
