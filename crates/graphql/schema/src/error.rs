use lang_graphql::ast::common::{InvalidGraphQlName, OperationType};
use tracing_util::{ErrorVisibility, TraceableError};

use graphql_typedefs::TypeKind;

/// Errors raised while composing declared types into a schema.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Declaration(#[from] graphql_typedefs::Error),

    #[error("type {reference} is not registered in the schema")]
    UnresolvedType { reference: String },

    #[error("the {operation} root must be an object type, {name} is not")]
    NotAnObjectType {
        operation: OperationType,
        name: String,
    },

    #[error("abstract type {name} cannot be used in a schema")]
    AbstractType { name: String },

    #[error("{name} is a {kind} type, which cannot be translated")]
    UnsupportedTypeKind { name: String, kind: TypeKind },

    #[error(transparent)]
    InvalidName(#[from] InvalidGraphQlName),

    #[error("the executor rejected the schema: {0}")]
    Executor(String),

    #[error("introspection failed: {}", errors.join("; "))]
    IntrospectionFailed { errors: Vec<String> },

    #[error("internal error: {0}")]
    Internal(String),
}

impl TraceableError for Error {
    fn visibility(&self) -> ErrorVisibility {
        match self {
            Error::Executor(_) | Error::Internal(_) => ErrorVisibility::Internal,
            Error::Declaration(_)
            | Error::UnresolvedType { .. }
            | Error::NotAnObjectType { .. }
            | Error::AbstractType { .. }
            | Error::UnsupportedTypeKind { .. }
            | Error::InvalidName(_)
            | Error::IntrospectionFailed { .. } => ErrorVisibility::User,
        }
    }
}
