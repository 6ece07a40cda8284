//! Native schema types, the translated form of declared types.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::ast::common::{self as ast, Name, TypeName};
use crate::ast::value::ConstValue;
use crate::resolver::{Resolver, Subscriber};
use crate::scalar::{ScalarBehavior, Variables};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DeprecationStatus {
    #[default]
    NotDeprecated,
    Deprecated {
        reason: Option<String>,
    },
}

impl DeprecationStatus {
    pub fn from_reason(reason: Option<&str>) -> Self {
        match reason {
            None => DeprecationStatus::NotDeprecated,
            Some(reason) => DeprecationStatus::Deprecated {
                reason: Some(reason.to_string()),
            },
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            DeprecationStatus::NotDeprecated => None,
            DeprecationStatus::Deprecated { reason } => reason.as_deref(),
        }
    }
}

#[derive(Clone)]
pub struct Scalar {
    pub name: TypeName,
    pub description: Option<String>,
    /// Built-in scalars are predefined by the executor and never registered.
    pub builtin: bool,
    pub behavior: Arc<dyn ScalarBehavior>,
}

impl Scalar {
    pub fn serialize(&self, value: &serde_json::Value) -> Option<serde_json::Value> {
        self.behavior.resolve_value(value)
    }

    pub fn parse_value(&self, value: &serde_json::Value) -> Option<serde_json::Value> {
        self.behavior.parse_value(value)
    }

    pub fn parse_literal(
        &self,
        node: &ConstValue,
        variables: Option<&Variables>,
    ) -> Option<serde_json::Value> {
        self.behavior.parse_literal(node, variables)
    }
}

impl fmt::Debug for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scalar")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("builtin", &self.builtin)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    pub name: Name,
    /// The key resolvers receive the value under.
    pub key: String,
    pub description: Option<String>,
    pub field_type: ast::Type,
    pub default_value: Option<serde_json::Value>,
    pub deprecation_status: DeprecationStatus,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name: Name,
    pub description: Option<String>,
    pub field_type: ast::Type,
    pub arguments: IndexMap<Name, InputField>,
    pub deprecation_status: DeprecationStatus,
    pub resolver: Resolver,
    pub subscriber: Option<Subscriber>,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub name: TypeName,
    pub description: Option<String>,
    pub fields: IndexMap<Name, Field>,
    pub interfaces: Vec<TypeName>,
}

#[derive(Debug, Clone)]
pub struct Interface {
    pub name: TypeName,
    pub description: Option<String>,
    pub fields: IndexMap<Name, Field>,
    pub interfaces: Vec<TypeName>,
}

#[derive(Debug, Clone)]
pub struct InputObject {
    pub name: TypeName,
    pub description: Option<String>,
    pub fields: IndexMap<Name, InputField>,
}

#[derive(Debug, Clone)]
pub enum TypeInfo {
    Scalar(Scalar),
    Object(Object),
    Interface(Interface),
    InputObject(InputObject),
}

impl TypeInfo {
    pub fn name(&self) -> &TypeName {
        match self {
            TypeInfo::Scalar(scalar) => &scalar.name,
            TypeInfo::Object(object) => &object.name,
            TypeInfo::Interface(interface) => &interface.name,
            TypeInfo::InputObject(input_object) => &input_object.name,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            TypeInfo::Scalar(scalar) => scalar.description.as_deref(),
            TypeInfo::Object(object) => object.description.as_deref(),
            TypeInfo::Interface(interface) => interface.description.as_deref(),
            TypeInfo::InputObject(input_object) => input_object.description.as_deref(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            TypeInfo::Scalar(_) => "SCALAR",
            TypeInfo::Object(_) => "OBJECT",
            TypeInfo::Interface(_) => "INTERFACE",
            TypeInfo::InputObject(_) => "INPUT_OBJECT",
        }
    }

    /// Output fields of objects and interfaces.
    pub fn fields(&self) -> Option<&IndexMap<Name, Field>> {
        match self {
            TypeInfo::Object(object) => Some(&object.fields),
            TypeInfo::Interface(interface) => Some(&interface.fields),
            TypeInfo::Scalar(_) | TypeInfo::InputObject(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            TypeInfo::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            TypeInfo::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_input_object(&self) -> Option<&InputObject> {
        match self {
            TypeInfo::InputObject(input_object) => Some(input_object),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mk_name;
    use pretty_assertions::assert_eq;

    struct Anything;

    impl ScalarBehavior for Anything {
        fn parse_literal(
            &self,
            node: &ConstValue,
            _variables: Option<&Variables>,
        ) -> Option<serde_json::Value> {
            Some(node.to_json())
        }
    }

    #[test]
    fn test_deprecation_status_from_reason() {
        assert_eq!(
            DeprecationStatus::from_reason(None),
            DeprecationStatus::NotDeprecated
        );
        let deprecated = DeprecationStatus::from_reason(Some("use fullName"));
        assert_eq!(deprecated.reason(), Some("use fullName"));
    }

    #[test]
    fn test_scalar_forwards_to_behavior() {
        let scalar = TypeInfo::Scalar(Scalar {
            name: TypeName(mk_name!("Anything")),
            description: Some("Any value".to_string()),
            builtin: false,
            behavior: Arc::new(Anything),
        });
        assert_eq!(scalar.kind(), "SCALAR");
        assert_eq!(scalar.description(), Some("Any value"));
        assert!(scalar.fields().is_none());

        let json = serde_json::json!([1, "a"]);
        let literal = ConstValue::from_json(&json);
        let scalar = scalar.as_scalar().map(|s| (s.parse_literal(&literal, None), s.serialize(&json)));
        assert_eq!(scalar, Some((Some(json.clone()), Some(json))));
    }
}
