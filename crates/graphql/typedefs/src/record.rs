use indexmap::IndexMap;
use lang_graphql::resolver::{Attributes, RuntimeValue};

use crate::error::Error;
use crate::fields::Field;

/// The plain-data shape of an object type: its field names with their
/// default values.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordShape {
    type_name: String,
    fields: Vec<(String, Option<serde_json::Value>)>,
}

impl RecordShape {
    pub(crate) fn new(type_name: &str, fields: &IndexMap<String, Field>) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: fields
                .iter()
                .map(|(key, field)| (key.clone(), field.config.default_value.clone()))
                .collect(),
        }
    }

    pub(crate) fn empty(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Fills the fields from `positional` values in field order, then from
    /// `named` values. Fields given neither take their default, or null.
    pub fn instantiate(
        &self,
        positional: Vec<serde_json::Value>,
        mut named: IndexMap<String, serde_json::Value>,
    ) -> Result<Record, Error> {
        if positional.len() > self.fields.len() {
            return Err(Error::TooManyValues {
                type_name: self.type_name.clone(),
                expected: self.fields.len(),
                found: positional.len(),
            });
        }
        if let Some(unknown) = named
            .keys()
            .find(|key| !self.fields.iter().any(|(name, _)| name == *key))
        {
            return Err(Error::UnknownField {
                type_name: self.type_name.clone(),
                field_name: unknown.clone(),
            });
        }

        let mut positional = positional.into_iter();
        let mut values = IndexMap::new();
        for (name, default) in &self.fields {
            let value = match positional.next() {
                Some(value) => {
                    if named.contains_key(name) {
                        return Err(Error::DuplicateValue {
                            type_name: self.type_name.clone(),
                            field_name: name.clone(),
                        });
                    }
                    value
                }
                None => named
                    .shift_remove(name)
                    .or_else(|| default.clone())
                    .unwrap_or(serde_json::Value::Null),
            };
            values.insert(name.clone(), value);
        }
        Ok(Record {
            type_name: self.type_name.clone(),
            values,
        })
    }
}

/// A plain-data value of an object type.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    type_name: String,
    values: IndexMap<String, serde_json::Value>,
}

impl Record {
    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.values.get(name)
    }

    pub fn values(&self) -> &IndexMap<String, serde_json::Value> {
        &self.values
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.values
                .iter()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        )
    }

    pub fn into_runtime(self) -> RuntimeValue {
        RuntimeValue::object(self)
    }
}

impl Attributes for Record {
    fn attribute(&self, name: &str) -> Option<RuntimeValue> {
        self.values.get(name).cloned().map(RuntimeValue::Json)
    }

    fn type_name(&self) -> Option<&str> {
        Some(&self.type_name)
    }
}
