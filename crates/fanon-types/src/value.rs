use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use fanon_error::{AnonError, Result};
use serde::{Deserialize, Serialize};

use crate::{ANY_VALUE, NULL_VALUE};

/// Declared type of an attribute.
///
/// The type decides how the textual cell values of a column are ordered and
/// compared; the encoded matrix itself only ever stores dictionary codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataType {
    /// Free text, ordered lexicographically.
    #[default]
    String,
    /// Signed 64-bit integers.
    Integer,
    /// Floating point numbers.
    Decimal,
    /// Dates or timestamps parsed with a `strftime` format.
    Date { format: String },
}

impl DataType {
    /// Date type with the given `strftime` format.
    pub fn date(format: impl Into<String>) -> Self {
        Self::Date {
            format: format.into(),
        }
    }

    /// Parse a cell value.
    ///
    /// The reserved tokens [`NULL_VALUE`] and [`ANY_VALUE`] parse to
    /// [`TypedValue::Null`] and [`TypedValue::Any`] for every type.
    pub fn parse(&self, value: &str) -> Result<TypedValue> {
        if value == NULL_VALUE {
            return Ok(TypedValue::Null);
        }
        if value == ANY_VALUE {
            return Ok(TypedValue::Any);
        }
        match self {
            Self::String => Ok(TypedValue::Text(value.to_owned())),
            Self::Integer => value
                .trim()
                .parse::<i64>()
                .map(TypedValue::Integer)
                .map_err(|_| AnonError::type_mismatch(value, self.to_string())),
            Self::Decimal => value
                .trim()
                .parse::<f64>()
                .map(TypedValue::Decimal)
                .map_err(|_| AnonError::type_mismatch(value, self.to_string())),
            Self::Date { format } => parse_date(value, format)
                .map(TypedValue::Date)
                .ok_or_else(|| AnonError::type_mismatch(value, self.to_string())),
        }
    }

    /// Whether `value` parses with this type.
    pub fn is_valid(&self, value: &str) -> bool {
        self.parse(value).is_ok()
    }

    /// Compare two cell values under this type.
    pub fn compare(&self, left: &str, right: &str) -> Result<Ordering> {
        Ok(self.parse(left)?.cmp(&self.parse(right)?))
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Integer => f.write_str("integer"),
            Self::Decimal => f.write_str("decimal"),
            Self::Date { format } => write!(f, "date({format})"),
        }
    }
}

fn parse_date(value: &str, format: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, format) {
        return Some(ts);
    }
    // Date-only formats carry no time fields; treat them as midnight.
    NaiveDate::parse_from_str(value, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// A parsed cell value.
///
/// Ordering is total: `Null` sorts first, `Any` (the suppressed / wildcard
/// token) sorts last, and integers and decimals compare numerically with each
/// other.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TypedValue {
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
    Date(NaiveDateTime),
    Any,
}

impl TypedValue {
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub const fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Numeric view, if this value is a number.
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Decimal(d) => Some(*d),
            _ => None,
        }
    }

    const fn sort_class(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Integer(_) | Self::Decimal(_) => 1,
            Self::Date(_) => 2,
            Self::Text(_) => 3,
            Self::Any => 4,
        }
    }
}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str(NULL_VALUE),
            Self::Text(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::Date(ts) => write!(f, "{ts}"),
            Self::Any => f.write_str(ANY_VALUE),
        }
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TypedValue {}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        let class_a = self.sort_class();
        let class_b = other.sort_class();
        if class_a != class_b {
            return class_a.cmp(&class_b);
        }
        match (self, other) {
            (Self::Integer(a), Self::Integer(b)) => a.cmp(b),
            (Self::Decimal(a), Self::Decimal(b)) => a.total_cmp(b),
            (Self::Integer(a), Self::Decimal(b)) => int_float_cmp(*a, *b),
            (Self::Decimal(a), Self::Integer(b)) => int_float_cmp(*b, *a).reverse(),
            (Self::Date(a), Self::Date(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            // Same class, no payload: Null/Null and Any/Any.
            _ => Ordering::Equal,
        }
    }
}

impl From<i64> for TypedValue {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<f64> for TypedValue {
    fn from(d: f64) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for TypedValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for TypedValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<NaiveDateTime> for TypedValue {
    fn from(ts: NaiveDateTime) -> Self {
        Self::Date(ts)
    }
}

/// Compare an integer with a float without losing precision for |i| > 2^53.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn int_float_cmp(i: i64, r: f64) -> Ordering {
    if r.is_nan() {
        return Ordering::Less;
    }
    if r < -9_223_372_036_854_775_808.0 {
        return Ordering::Greater;
    }
    if r >= 9_223_372_036_854_775_808.0 {
        return Ordering::Less;
    }
    let y = r as i64;
    match i.cmp(&y) {
        Ordering::Equal => (i as f64).total_cmp(&r),
        ord => ord,
    }
}
