//! Built-in scalar types.
//!
//! `String`, `Integer`, `Float`, `Boolean` and `ID` translate to the
//! executor's predefined scalars (`Integer` is GraphQL `Int`). The others are
//! registered as custom scalars.

use std::sync::{Arc, LazyLock};

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use lang_graphql::ast::value::{ConstValue, SimpleValue};
use lang_graphql::scalar::{ScalarBehavior, Variables};
use serde_json::Value;

use crate::declaration::DeclaredType;

/// Largest value of a GraphQL `Int`, a signed 32-bit integer.
pub const MAX_INT: i64 = 2_147_483_647;

/// Smallest value of a GraphQL `Int`.
pub const MIN_INT: i64 = -2_147_483_648;

/// Declared names of the built-in scalars with their executor names.
const PREDEFINED: [(&str, &str); 5] = [
    ("String", "String"),
    ("Integer", "Int"),
    ("Float", "Float"),
    ("Boolean", "Boolean"),
    ("ID", "ID"),
];

/// The executor's name for a scalar predefined by it, if `declared` is one.
pub fn predefined_name(declared: &DeclaredType) -> Option<&'static str> {
    PREDEFINED
        .iter()
        .find(|(declared_name, _)| *declared_name == declared.declared_name())
        .map(|(_, native)| *native)
}

fn literal(node: &ConstValue) -> Option<&SimpleValue> {
    node.as_simple()
}

#[allow(clippy::cast_possible_truncation)]
fn truncate(float: f64) -> Option<i64> {
    float.is_finite().then(|| float.trunc() as i64)
}

/// `int(value)`, falling back to `int(float(value))`.
fn coerce_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(truncate)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(truncate))
        }
        Value::Bool(flag) => Some(i64::from(*flag)),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn in_int_range(value: i64) -> Option<Value> {
    (MIN_INT..=MAX_INT).contains(&value).then(|| Value::from(value))
}

/// Text values. Booleans render as `true`/`false`, numbers as their digits.
pub struct StringScalar;

impl ScalarBehavior for StringScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        literal(node)?.as_str().map(Value::from)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Null => Some(Value::Null),
            Value::String(text) => Some(Value::from(text.as_str())),
            Value::Bool(flag) => Some(Value::from(if *flag { "true" } else { "false" })),
            Value::Number(number) => Some(Value::from(number.to_string())),
            Value::Array(_) | Value::Object(_) => Some(Value::from(value.to_string())),
        }
    }
}

/// Signed 32-bit integers. Values outside the range are undefined.
pub struct IntegerScalar;

impl ScalarBehavior for IntegerScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        literal(node)?.as_i64().and_then(in_int_range)
    }

    fn parse_value(&self, value: &Value) -> Option<Value> {
        value.as_i64().and_then(in_int_range)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        coerce_integer(value).and_then(in_int_range)
    }
}

/// Integers without the 32-bit restriction, up to 64 bits.
pub struct BigIntegerScalar;

impl ScalarBehavior for BigIntegerScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        literal(node)?.as_i64().map(Value::from)
    }

    fn parse_value(&self, value: &Value) -> Option<Value> {
        value.as_i64().map(Value::from)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        coerce_integer(value).map(Value::from)
    }
}

/// Double precision floating point values.
pub struct FloatScalar;

impl ScalarBehavior for FloatScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        literal(node)?.as_f64().map(Value::from)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        let float = match value {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => text.trim().parse::<f64>().ok(),
            Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }?;
        float.is_finite().then(|| Value::from(float))
    }
}

pub struct BooleanScalar;

impl ScalarBehavior for BooleanScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        literal(node)?.as_bool().map(Value::from)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        match value {
            Value::Bool(flag) => Some(Value::from(*flag)),
            Value::Number(number) => number.as_f64().map(|n| Value::from(n != 0.0)),
            _ => None,
        }
    }
}

/// Unique identifiers, accepted as strings or integers and serialized as
/// strings.
pub struct IdScalar;

impl ScalarBehavior for IdScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        match literal(node)? {
            SimpleValue::String(text) => Some(Value::from(text.as_str())),
            SimpleValue::Integer(int) => Some(Value::from(int.to_string())),
            _ => None,
        }
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        match value {
            Value::String(text) => Some(Value::from(text.as_str())),
            Value::Number(number) if number.is_i64() || number.is_u64() => {
                Some(Value::from(number.to_string()))
            }
            _ => None,
        }
    }
}

/// Any JSON-like value.
pub struct GenericScalar;

impl ScalarBehavior for GenericScalar {
    fn parse_literal(&self, node: &ConstValue, variables: Option<&Variables>) -> Option<Value> {
        match node {
            ConstValue::SimpleValue(SimpleValue::String(text)) => Some(Value::from(text.as_str())),
            ConstValue::SimpleValue(SimpleValue::Boolean(flag)) => Some(Value::from(*flag)),
            ConstValue::SimpleValue(SimpleValue::Integer(int)) => in_int_range(*int),
            ConstValue::SimpleValue(SimpleValue::Float(float)) => Some(Value::from(*float)),
            ConstValue::List(items) => Some(Value::Array(
                items
                    .iter()
                    .map(|item| self.parse_literal(item, variables).unwrap_or(Value::Null))
                    .collect(),
            )),
            ConstValue::Object(fields) => Some(Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| {
                        (
                            key.clone(),
                            self.parse_literal(value, variables).unwrap_or(Value::Null),
                        )
                    })
                    .collect(),
            )),
            ConstValue::SimpleValue(SimpleValue::Null | SimpleValue::Enum(_)) => None,
        }
    }
}

/// Parses `value` as text with `parse` and renders it back with `render`.
fn iso_text<T>(
    value: &Value,
    parse: impl Fn(&str) -> Option<T>,
    render: impl Fn(T) -> String,
) -> Option<Value> {
    value.as_str().and_then(parse).map(|parsed| Value::from(render(parsed)))
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

fn parse_date_time(text: &str) -> Option<String> {
    DateTime::parse_from_rfc3339(text)
        .map(|date_time| date_time.to_rfc3339())
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|date_time| date_time.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        })
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S%.f").ok()
}

/// Calendar dates as ISO-8601 text, `YYYY-MM-DD`.
pub struct DateScalar;

impl ScalarBehavior for DateScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        self.resolve_value(&Value::from(literal(node)?.as_str()?))
    }

    fn parse_value(&self, value: &Value) -> Option<Value> {
        self.resolve_value(value)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        iso_text(value, parse_date, |date| date.format("%Y-%m-%d").to_string())
    }
}

/// Timestamps as ISO-8601 text, with or without an offset.
pub struct DateTimeScalar;

impl ScalarBehavior for DateTimeScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        self.resolve_value(&Value::from(literal(node)?.as_str()?))
    }

    fn parse_value(&self, value: &Value) -> Option<Value> {
        self.resolve_value(value)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        iso_text(value, parse_date_time, |date_time| date_time)
    }
}

/// Times of day as ISO-8601 text, `HH:MM:SS[.fraction]`.
pub struct TimeScalar;

impl ScalarBehavior for TimeScalar {
    fn parse_literal(&self, node: &ConstValue, _variables: Option<&Variables>) -> Option<Value> {
        self.resolve_value(&Value::from(literal(node)?.as_str()?))
    }

    fn parse_value(&self, value: &Value) -> Option<Value> {
        self.resolve_value(value)
    }

    fn resolve_value(&self, value: &Value) -> Option<Value> {
        iso_text(value, parse_time, |time| time.format("%H:%M:%S%.f").to_string())
    }
}

macro_rules! builtin {
    ($fn_name:ident, $static_name:ident, $name:literal, $behavior:expr, $description:literal) => {
        static $static_name: LazyLock<DeclaredType> = LazyLock::new(|| {
            DeclaredType::builtin_scalar($name, $description, Arc::new($behavior))
        });

        #[doc = concat!("The `", $name, "` scalar.")]
        pub fn $fn_name() -> DeclaredType {
            $static_name.clone()
        }
    };
}

builtin!(
    string,
    STRING,
    "String",
    StringScalar,
    "The `String` scalar type represents textual data, represented as UTF-8 character sequences."
);
builtin!(
    integer,
    INTEGER,
    "Integer",
    IntegerScalar,
    "The `Int` scalar type represents non-fractional signed whole numeric values between -(2^31) and 2^31 - 1."
);
builtin!(
    big_integer,
    BIG_INTEGER,
    "BigInteger",
    BigIntegerScalar,
    "The `BigInteger` scalar type represents non-fractional whole numeric values up to 64 bits."
);
builtin!(
    float,
    FLOAT,
    "Float",
    FloatScalar,
    "The `Float` scalar type represents signed double-precision fractional values."
);
builtin!(
    boolean,
    BOOLEAN,
    "Boolean",
    BooleanScalar,
    "The `Boolean` scalar type represents `true` or `false`."
);
builtin!(
    id,
    ID,
    "ID",
    IdScalar,
    "The `ID` scalar type represents a unique identifier, serialized as a string."
);
builtin!(
    generic,
    GENERIC,
    "GenericScalar",
    GenericScalar,
    "The `GenericScalar` scalar type represents a generic GraphQL scalar value: String, Boolean, Int, Float, List or Object."
);
builtin!(
    date,
    DATE,
    "Date",
    DateScalar,
    "The `Date` scalar type represents a date value as specified by ISO-8601."
);
builtin!(
    date_time,
    DATE_TIME,
    "DateTime",
    DateTimeScalar,
    "The `DateTime` scalar type represents a date and time value as specified by ISO-8601."
);
builtin!(
    time,
    TIME,
    "Time",
    TimeScalar,
    "The `Time` scalar type represents a time value as specified by ISO-8601."
);
