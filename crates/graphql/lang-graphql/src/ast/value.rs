use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum SimpleValue {
    /// `null`.
    Null,
    /// A number.
    Integer(i64),
    /// A float
    Float(f64),
    /// A string.
    String(String),
    /// A boolean.
    Boolean(bool),
    /// An enum. These are typically in `SCREAMING_SNAKE_CASE`.
    Enum(String),
}

impl SimpleValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            SimpleValue::Null => serde_json::Value::Null,
            SimpleValue::Integer(i) => serde_json::json!(i),
            SimpleValue::Float(f) => serde_json::json!(f),
            SimpleValue::String(s) | SimpleValue::Enum(s) => serde_json::json!(s),
            SimpleValue::Boolean(b) => serde_json::json!(b),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SimpleValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SimpleValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            // Integer literals are accepted where a float is expected.
            SimpleValue::Float(f) => Some(*f),
            SimpleValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SimpleValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }
}

/// A literal GraphQL input value, as handed to a scalar's `parse_literal`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub enum ConstValue {
    /// A leaf value
    SimpleValue(SimpleValue),
    /// A list of values.
    List(Vec<ConstValue>),
    /// An object. This is a map of keys to values.
    Object(IndexMap<String, ConstValue>),
}

impl ConstValue {
    pub fn kind(&self) -> &'static str {
        match self {
            ConstValue::SimpleValue(simple_value) => match simple_value {
                SimpleValue::Null => "NULL",
                SimpleValue::Integer(_) => "INTEGER",
                SimpleValue::Float(_) => "FLOAT",
                SimpleValue::String(_) => "STRING",
                SimpleValue::Boolean(_) => "BOOLEAN",
                SimpleValue::Enum(_) => "ENUM",
            },
            ConstValue::List(_) => "LIST",
            ConstValue::Object(_) => "OBJECT",
        }
    }

    pub fn as_simple(&self) -> Option<&SimpleValue> {
        match self {
            ConstValue::SimpleValue(simple_value) => Some(simple_value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            ConstValue::SimpleValue(simple_value) => simple_value.to_json(),
            ConstValue::List(items) => {
                serde_json::Value::Array(items.iter().map(ConstValue::to_json).collect())
            }
            ConstValue::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_json()))
                    .collect(),
            ),
        }
    }

    /// Builds a literal from a JSON value. Numbers that fit an `i64` become
    /// integer literals, every other number becomes a float literal.
    pub fn from_json(value: &serde_json::Value) -> ConstValue {
        match value {
            serde_json::Value::Null => ConstValue::SimpleValue(SimpleValue::Null),
            serde_json::Value::Bool(b) => ConstValue::SimpleValue(SimpleValue::Boolean(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => ConstValue::SimpleValue(SimpleValue::Integer(i)),
                None => ConstValue::SimpleValue(SimpleValue::Float(n.as_f64().unwrap_or(f64::NAN))),
            },
            serde_json::Value::String(s) => ConstValue::SimpleValue(SimpleValue::String(s.clone())),
            serde_json::Value::Array(items) => {
                ConstValue::List(items.iter().map(ConstValue::from_json).collect())
            }
            serde_json::Value::Object(fields) => ConstValue::Object(
                fields
                    .iter()
                    .map(|(key, value)| (key.clone(), ConstValue::from_json(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_from_json_splits_integers_and_floats() {
        let literal = ConstValue::from_json(&json!({"count": 3, "ratio": 0.5, "tags": ["a"]}));
        let ConstValue::Object(fields) = &literal else {
            panic!("expected an object literal, got {}", literal.kind());
        };
        assert_eq!(fields["count"], ConstValue::SimpleValue(SimpleValue::Integer(3)));
        assert_eq!(fields["ratio"], ConstValue::SimpleValue(SimpleValue::Float(0.5)));
        assert_eq!(fields["tags"].kind(), "LIST");
        assert_eq!(literal.to_json(), json!({"count": 3, "ratio": 0.5, "tags": ["a"]}));
    }
}
