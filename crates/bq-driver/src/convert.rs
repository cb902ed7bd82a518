use crate::value::{format_rational, Value};

/// The text that replaces ARRAY and STRUCT values when they are rendered as strings.
pub const NESTED_VALUE_PLACEHOLDER: &str = "<ARRAY or STRUCT>";

/// Whether the rows cursor renders values the client cannot represent as strings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StringFallback {
    /// NUMERIC, BIGNUMERIC, INTERVAL, RANGE, ARRAY, and STRUCT values are rendered
    /// as strings before the column conversion runs. Column adaptors are not
    /// consulted for these values.
    #[default]
    Enabled,
    /// Values go through the column conversion unchanged.
    /// This is needed to scan nested columns as rerouted rows.
    Disabled,
}

impl From<bool> for StringFallback {
    fn from(value: bool) -> Self {
        if value {
            StringFallback::Enabled
        } else {
            StringFallback::Disabled
        }
    }
}

/// Renders a warehouse value the client cannot represent as a string.
/// Returns `None` for every other value.
pub fn unsupported_value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Numeric(x) | Value::BigNumeric(x) => Some(format_rational(x)),
        Value::Interval(x) => Some(x.to_string()),
        Value::List(_) => Some(NESTED_VALUE_PLACEHOLDER.to_string()),
        Value::Range(x) => Some(x.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use num::{BigInt, BigRational};

    use super::*;
    use crate::value::{IntervalValue, RangeValue};

    #[test]
    fn test_unsupported_value_to_string() {
        let cases = [
            (Value::Int64(123), None),
            (Value::String("abc".to_string()), None),
            (
                Value::Numeric(BigRational::new(BigInt::from(1), BigInt::from(2))),
                Some("1/2"),
            ),
            (
                Value::BigNumeric(BigRational::new(BigInt::from(-3), BigInt::from(4))),
                Some("-3/4"),
            ),
            (
                Value::Interval(IntervalValue {
                    months: 1,
                    days: 2,
                    sub_second_nanos: 3_000_000,
                    ..Default::default()
                }),
                Some("0-1 2 0:0:0.003"),
            ),
            (
                Value::List(vec![
                    Value::String("a".to_string()),
                    Value::String("b".to_string()),
                ]),
                Some(NESTED_VALUE_PLACEHOLDER),
            ),
            (
                Value::Range(Box::new(RangeValue {
                    start: Some(Value::String("2023-01-01".to_string())),
                    end: Some(Value::String("2023-12-31".to_string())),
                })),
                Some("2023-01-01,2023-12-31"),
            ),
            (
                Value::Range(Box::new(RangeValue {
                    start: None,
                    end: Some(Value::String("2023-12-31".to_string())),
                })),
                Some("UNBOUNDED,2023-12-31"),
            ),
            (
                Value::Range(Box::new(RangeValue {
                    start: Some(Value::String("2023-01-01".to_string())),
                    end: None,
                })),
                Some("2023-01-01,UNBOUNDED"),
            ),
            (
                Value::Interval(IntervalValue {
                    hours: -1,
                    minutes: -2,
                    seconds: -3,
                    ..Default::default()
                }),
                Some("0-0 0 -1:2:3"),
            ),
        ];
        for (value, expected) in cases {
            assert_eq!(
                unsupported_value_to_string(&value).as_deref(),
                expected,
                "value: {value:?}"
            );
        }
    }

    #[test]
    fn test_string_fallback_from_config_flag() {
        assert_eq!(StringFallback::from(true), StringFallback::Enabled);
        assert_eq!(StringFallback::from(false), StringFallback::Disabled);
    }
}
