use std::fmt;

use crate::declaration::DeclaredType;
use crate::dynamic::Dynamic;
use crate::structures::{Structure, StructureKind};

/// A reference from a field or argument to the type of its value.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeRef {
    Declared(DeclaredType),
    /// A type referred to by its registered name, resolved by the container.
    Path(String),
    /// A type produced on demand by a deferred callable.
    Lazy(Dynamic),
    Structure(Box<Structure>),
}

impl TypeRef {
    pub fn path(name: impl Into<String>) -> Self {
        TypeRef::Path(name.into())
    }

    pub fn is_non_null(&self) -> bool {
        matches!(self, TypeRef::Structure(structure) if structure.kind() == StructureKind::NonNull)
    }

    /// Wraps the reference in non-null, unless it already is.
    #[must_use]
    pub fn non_null(self) -> Self {
        if self.is_non_null() {
            self
        } else {
            Structure::wrap(StructureKind::NonNull, self).into()
        }
    }

    #[must_use]
    pub fn list(self) -> Self {
        Structure::wrap(StructureKind::List, self).into()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Declared(declared) => f.write_str(declared.name()),
            TypeRef::Path(path) => f.write_str(path),
            TypeRef::Lazy(_) => f.write_str("Dynamic"),
            TypeRef::Structure(structure) => structure.fmt(f),
        }
    }
}

impl From<DeclaredType> for TypeRef {
    fn from(declared: DeclaredType) -> Self {
        TypeRef::Declared(declared)
    }
}

impl From<&DeclaredType> for TypeRef {
    fn from(declared: &DeclaredType) -> Self {
        TypeRef::Declared(declared.clone())
    }
}

impl From<Dynamic> for TypeRef {
    fn from(dynamic: Dynamic) -> Self {
        TypeRef::Lazy(dynamic)
    }
}

impl From<Structure> for TypeRef {
    fn from(structure: Structure) -> Self {
        TypeRef::Structure(Box::new(structure))
    }
}
