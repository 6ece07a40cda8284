use lang_graphql::ast::common::InvalidGraphQlName;
use tracing_util::{ErrorVisibility, TraceableError};

use crate::declaration::TypeKind;
use crate::structures::StructureKind;

/// Errors raised while declaring types, fields and arguments.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("type {type_name} does not declare its kind (object, interface, input object or scalar)")]
    MissingTypeKind { type_name: String },

    #[error(
        "Invalid options provided in Meta class: {}. Valid options are: {}",
        invalid.join(", "),
        valid.join(", ")
    )]
    InvalidMetaOptions {
        invalid: Vec<String>,
        valid: Vec<String>,
    },

    #[error("invalid value for Meta option {key}: expected {expected}")]
    InvalidMetaValue { key: String, expected: &'static str },

    #[error("{type_name} lists {interface} as an interface, but it is a {kind} type")]
    NotAnInterface {
        type_name: String,
        interface: String,
        kind: TypeKind,
    },

    #[error("scalar type {type_name} has no value conversions")]
    MissingScalarBehavior { type_name: String },

    #[error("field {field_name} cannot specify both a source and a resolver")]
    ConflictingResolver { field_name: String },

    #[error("{structure} could not have a mounted {inner}() as inner type. Try with {structure}({inner}).")]
    WrappedImplicitField {
        structure: StructureKind,
        inner: String,
    },

    #[error("expected an implicit field, got {found}")]
    NotMountable { found: &'static str },

    #[error("expected {key} to be Argument, but received Field. Try using Argument({type_name}).")]
    FieldAsArgument { key: String, type_name: String },

    #[error("more than one Argument have same name \"{name}\"")]
    DuplicateArgument { name: String },

    #[error("field {field_name} of {type_name} is already declared by its non-abstract parent {parent}")]
    DuplicateInheritedField {
        type_name: String,
        field_name: String,
        parent: String,
    },

    #[error(transparent)]
    InvalidName(#[from] InvalidGraphQlName),

    #[error("{type_name} takes at most {expected} values, got {found}")]
    TooManyValues {
        type_name: String,
        expected: usize,
        found: usize,
    },

    #[error("{type_name} has no field named {field_name}")]
    UnknownField {
        type_name: String,
        field_name: String,
    },

    #[error("{type_name} got more than one value for field {field_name}")]
    DuplicateValue {
        type_name: String,
        field_name: String,
    },
}

impl TraceableError for Error {
    fn visibility(&self) -> ErrorVisibility {
        ErrorVisibility::User
    }
}
