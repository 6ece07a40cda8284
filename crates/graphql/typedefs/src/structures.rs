use std::fmt;

use crate::declaration::DeclaredType;
use crate::dynamic::Dynamic;
use crate::error::Error;
use crate::fields::ImplicitField;
use crate::type_ref::TypeRef;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum StructureKind {
    List,
    NonNull,
}

/// A list-of or non-null-of wrapper around exactly one inner type.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    kind: StructureKind,
    of_type: TypeRef,
}

/// What a structure may be built over.
#[derive(Clone, Debug)]
pub enum Wrappable {
    Type(TypeRef),
    Implicit(ImplicitField),
}

impl Structure {
    /// Wraps `inner`. An implicit field is only accepted when it is itself a
    /// structure: `List(String)` is fine, `List(String())` is not.
    pub fn new(kind: StructureKind, inner: impl Into<Wrappable>) -> Result<Self, Error> {
        let of_type = match inner.into() {
            Wrappable::Type(of_type) => of_type,
            Wrappable::Implicit(implicit) => match implicit.of_type() {
                TypeRef::Structure(_) => implicit.of_type().clone(),
                other => {
                    return Err(Error::WrappedImplicitField {
                        structure: kind,
                        inner: other.to_string(),
                    })
                }
            },
        };
        Ok(Self::wrap(kind, of_type))
    }

    pub fn list(inner: impl Into<Wrappable>) -> Result<Self, Error> {
        Self::new(StructureKind::List, inner)
    }

    pub fn non_null(inner: impl Into<Wrappable>) -> Result<Self, Error> {
        Self::new(StructureKind::NonNull, inner)
    }

    pub(crate) fn wrap(kind: StructureKind, of_type: TypeRef) -> Self {
        Self { kind, of_type }
    }

    pub fn kind(&self) -> StructureKind {
        self.kind
    }

    pub fn of_type(&self) -> &TypeRef {
        &self.of_type
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            StructureKind::List => write!(f, "[{}]", self.of_type),
            StructureKind::NonNull => write!(f, "{}!", self.of_type),
        }
    }
}

impl From<TypeRef> for Wrappable {
    fn from(of_type: TypeRef) -> Self {
        Wrappable::Type(of_type)
    }
}

impl From<DeclaredType> for Wrappable {
    fn from(declared: DeclaredType) -> Self {
        Wrappable::Type(declared.into())
    }
}

impl From<&DeclaredType> for Wrappable {
    fn from(declared: &DeclaredType) -> Self {
        Wrappable::Type(declared.into())
    }
}

impl From<Dynamic> for Wrappable {
    fn from(dynamic: Dynamic) -> Self {
        Wrappable::Type(dynamic.into())
    }
}

impl From<Structure> for Wrappable {
    fn from(structure: Structure) -> Self {
        Wrappable::Type(structure.into())
    }
}

impl From<ImplicitField> for Wrappable {
    fn from(implicit: ImplicitField) -> Self {
        Wrappable::Implicit(implicit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scalars;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_structure_display() -> anyhow::Result<()> {
        let names = Structure::non_null(Structure::list(Structure::non_null(scalars::string())?)?)?;
        assert_eq!(names.to_string(), "[String!]!");
        assert_eq!(names.kind(), StructureKind::NonNull);
        Ok(())
    }

    #[test]
    fn test_structure_equality() -> anyhow::Result<()> {
        assert_eq!(Structure::list(scalars::string())?, Structure::list(scalars::string())?);
        assert_ne!(Structure::list(scalars::string())?, Structure::non_null(scalars::string())?);
        assert_ne!(Structure::list(scalars::string())?, Structure::list(scalars::integer())?);
        Ok(())
    }

    #[test]
    fn test_structure_rejects_mounted_implicit_field() -> anyhow::Result<()> {
        let error = Structure::list(ImplicitField::new(scalars::string())).err();
        assert_eq!(
            error.map(|e| e.to_string()),
            Some("List could not have a mounted String() as inner type. Try with List(String).".to_string())
        );

        let nested = ImplicitField::new(Structure::non_null(scalars::string())?);
        assert_eq!(Structure::list(nested)?.to_string(), "[String!]");
        Ok(())
    }
}
