use std::fmt;
use std::sync::Arc;

use crate::declaration::DeclaredType;
use crate::type_ref::TypeRef;

/// Name-based access to the declared types of the schema being built.
pub trait TypeLookup {
    fn lookup(&self, name: &str) -> Option<DeclaredType>;
}

struct NoTypes;

impl TypeLookup for NoTypes {
    fn lookup(&self, _name: &str) -> Option<DeclaredType> {
        None
    }
}

type LazyType = dyn Fn() -> Option<TypeRef> + Send + Sync;
type SchemaAwareLazyType = dyn Fn(&dyn TypeLookup) -> Option<TypeRef> + Send + Sync;

#[derive(Clone)]
enum Thunk {
    Plain(Arc<LazyType>),
    WithSchema(Arc<SchemaAwareLazyType>),
}

/// A type reference whose target is produced on demand, used for
/// self-referential and mutually recursive types.
///
/// The callable runs only when the schema is translated, never while types
/// are being declared.
#[derive(Clone)]
pub struct Dynamic {
    thunk: Thunk,
}

impl Dynamic {
    pub fn new<F, T>(lazy_type: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        T: Into<TypeRef>,
    {
        Self {
            thunk: Thunk::Plain(Arc::new(move || Some(lazy_type().into()))),
        }
    }

    /// A reference that may turn out to have no type at all.
    pub fn optional<F>(lazy_type: F) -> Self
    where
        F: Fn() -> Option<TypeRef> + Send + Sync + 'static,
    {
        Self {
            thunk: Thunk::Plain(Arc::new(lazy_type)),
        }
    }

    /// A reference resolved against the types of the schema being built.
    pub fn with_schema<F>(lazy_type: F) -> Self
    where
        F: Fn(&dyn TypeLookup) -> Option<TypeRef> + Send + Sync + 'static,
    {
        Self {
            thunk: Thunk::WithSchema(Arc::new(lazy_type)),
        }
    }

    pub fn is_schema_aware(&self) -> bool {
        matches!(self.thunk, Thunk::WithSchema(_))
    }

    /// Produces the referenced type. Schema-aware references see `schema`,
    /// or no types at all when none is given.
    pub fn resolve(&self, schema: Option<&dyn TypeLookup>) -> Option<TypeRef> {
        match &self.thunk {
            Thunk::Plain(lazy_type) => lazy_type(),
            Thunk::WithSchema(lazy_type) => lazy_type(schema.unwrap_or(&NoTypes)),
        }
    }
}

impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        match (&self.thunk, &other.thunk) {
            (Thunk::Plain(a), Thunk::Plain(b)) => Arc::ptr_eq(a, b),
            (Thunk::WithSchema(a), Thunk::WithSchema(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dynamic")
            .field("with_schema", &self.is_schema_aware())
            .finish_non_exhaustive()
    }
}
