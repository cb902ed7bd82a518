use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use num::BigRational;

use crate::columns::ReroutedColumn;

/// A value as delivered by the warehouse client for one cell of a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    String(String),
    Bytes(Vec<u8>),
    Numeric(BigRational),
    BigNumeric(BigRational),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<Utc>),
    Interval(IntervalValue),
    Range(Box<RangeValue>),
    /// The JSON text as returned by the warehouse.
    Json(String),
    /// The WKT representation of a geography value.
    Geography(String),
    /// The payload of an ARRAY or a STRUCT.
    /// The warehouse client does not distinguish the two at the value level.
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(values) => Some(values),
            _ => None,
        }
    }
}

/// Renders a rational number as `numerator/denominator`.
/// The denominator is always written, even when it is one.
pub fn format_rational(value: &BigRational) -> String {
    format!("{}/{}", value.numer(), value.denom())
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Bool(x) => write!(f, "{x}"),
            Value::Int64(x) => write!(f, "{x}"),
            Value::Float64(x) => write!(f, "{x}"),
            Value::String(x) | Value::Json(x) | Value::Geography(x) => write!(f, "{x}"),
            Value::Bytes(x) => write!(f, "{}", STANDARD.encode(x)),
            Value::Numeric(x) | Value::BigNumeric(x) => write!(f, "{}", format_rational(x)),
            Value::Date(x) => write!(f, "{x}"),
            Value::Time(x) => write!(f, "{x}"),
            Value::DateTime(x) => write!(f, "{x}"),
            Value::Timestamp(x) => write!(f, "{x}"),
            Value::Interval(x) => write!(f, "{x}"),
            Value::Range(x) => write!(f, "{x}"),
            Value::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// An INTERVAL value. The parts are kept as returned by the warehouse
/// and are never normalized against each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntervalValue {
    pub years: i32,
    pub months: i32,
    pub days: i32,
    pub hours: i32,
    pub minutes: i32,
    pub seconds: i32,
    pub sub_second_nanos: i32,
}

impl fmt::Display for IntervalValue {
    /// Writes the canonical `[-]Y-M [-]D [-]H:M:S[.F]` form.
    /// Years and months share one sign, and so do the time parts.
    /// The fraction is omitted when zero and has its trailing zeros removed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn sign(negative: bool) -> &'static str {
            if negative {
                "-"
            } else {
                ""
            }
        }

        let date_sign = sign(self.years < 0 || self.months < 0);
        let years = self.years.unsigned_abs();
        let months = self.months.unsigned_abs();
        write!(f, "{date_sign}{years}-{months} {} ", self.days)?;

        let time_sign = sign(
            self.hours < 0 || self.minutes < 0 || self.seconds < 0 || self.sub_second_nanos < 0,
        );
        let hours = self.hours.unsigned_abs();
        let minutes = self.minutes.unsigned_abs();
        let seconds = self.seconds.unsigned_abs();
        write!(f, "{time_sign}{hours}:{minutes}:{seconds}")?;
        if self.sub_second_nanos != 0 {
            let fraction = format!("{:09}", self.sub_second_nanos.unsigned_abs());
            write!(f, ".{}", fraction.trim_end_matches('0'))?;
        }
        Ok(())
    }
}

/// A RANGE value. A missing endpoint means the range is unbounded on that side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeValue {
    pub start: Option<Value>,
    pub end: Option<Value>,
}

impl fmt::Display for RangeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn endpoint(value: &Option<Value>) -> String {
            match value {
                Some(value) => value.to_string(),
                None => "UNBOUNDED".to_string(),
            }
        }
        write!(f, "{},{}", endpoint(&self.start), endpoint(&self.end))
    }
}

/// A value exchanged with the generic database client,
/// either as a query argument or as a converted result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    /// A nullable float argument. `None` is a typed NULL.
    NullableFloat64(Option<f64>),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(DateTime<Utc>),
    /// A warehouse value handed to the client without conversion.
    Native(Value),
    /// A nested payload that can be scanned as rows on its own.
    Rerouted(ReroutedColumn),
    /// Rows materialized from a rerouted payload.
    Rows(Vec<Vec<DriverValue>>),
}

impl DriverValue {
    pub fn is_null(&self) -> bool {
        matches!(
            self,
            DriverValue::Null
                | DriverValue::NullableFloat64(None)
                | DriverValue::Native(Value::Null)
        )
    }
}

impl fmt::Display for DriverValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverValue::Null | DriverValue::NullableFloat64(None) => write!(f, "NULL"),
            DriverValue::Bool(x) => write!(f, "{x}"),
            DriverValue::Int64(x) => write!(f, "{x}"),
            DriverValue::Float64(x) | DriverValue::NullableFloat64(Some(x)) => write!(f, "{x}"),
            DriverValue::String(x) => write!(f, "{x}"),
            DriverValue::Bytes(x) => write!(f, "{}", STANDARD.encode(x)),
            DriverValue::Timestamp(x) => write!(f, "{x}"),
            DriverValue::Native(x) => write!(f, "{x}"),
            DriverValue::Rerouted(x) => write!(f, "<rerouted column with {} rows>", x.len()),
            DriverValue::Rows(x) => write!(f, "<{} rows>", x.len()),
        }
    }
}

impl From<bool> for DriverValue {
    fn from(value: bool) -> Self {
        DriverValue::Bool(value)
    }
}

impl From<i64> for DriverValue {
    fn from(value: i64) -> Self {
        DriverValue::Int64(value)
    }
}

impl From<f64> for DriverValue {
    fn from(value: f64) -> Self {
        DriverValue::Float64(value)
    }
}

impl From<Option<f64>> for DriverValue {
    fn from(value: Option<f64>) -> Self {
        DriverValue::NullableFloat64(value)
    }
}

impl From<&str> for DriverValue {
    fn from(value: &str) -> Self {
        DriverValue::String(value.to_string())
    }
}

impl From<String> for DriverValue {
    fn from(value: String) -> Self {
        DriverValue::String(value)
    }
}

impl From<Vec<u8>> for DriverValue {
    fn from(value: Vec<u8>) -> Self {
        DriverValue::Bytes(value)
    }
}

impl From<DateTime<Utc>> for DriverValue {
    fn from(value: DateTime<Utc>) -> Self {
        DriverValue::Timestamp(value)
    }
}

impl From<Value> for DriverValue {
    fn from(value: Value) -> Self {
        DriverValue::Native(value)
    }
}

/// A call argument of the generic client protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    /// The parameter name, or `None` for a positional argument.
    pub name: Option<String>,
    /// The one-based position of the argument in the call.
    pub ordinal: usize,
    pub value: DriverValue,
}

impl NamedValue {
    pub fn positional(ordinal: usize, value: impl Into<DriverValue>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<DriverValue>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }

    /// Turns a list of plain values into positional arguments.
    pub fn from_values(values: Vec<DriverValue>) -> Vec<NamedValue> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| NamedValue::positional(i + 1, value))
            .collect()
    }
}
