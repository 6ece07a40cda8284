use serde::{Deserialize, Deserializer, Serialize};
use smol_str::SmolStr;
use std::fmt::{self, Display, Formatter, Write};
use std::hash::Hash;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not a valid graphql name")]
pub struct InvalidGraphQlName(pub String);

/// A name that satisfies the GraphQL `Name` grammar: `/[_A-Za-z][_0-9A-Za-z]*/`.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(SmolStr);

impl Name {
    pub fn get(&self) -> &SmolStr {
        &self.0
    }
    pub fn new(s: &str) -> Result<Name, InvalidGraphQlName> {
        Name::from_str(s)
    }
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Name {
    type Err = InvalidGraphQlName;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if is_valid_graphql_name(s) {
            Ok(Name(SmolStr::new(s)))
        } else {
            Err(InvalidGraphQlName(s.into()))
        }
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Name::new(&s).map_err(serde::de::Error::custom)
    }
}

fn match_first(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn match_body(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

pub fn is_valid_graphql_name(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => match_first(first) && chars.all(match_body),
        None => false,
    }
}

// Macro to build a valid graphql name from a literal
#[macro_export]
macro_rules! mk_name {
    ($name:literal) => {
        $crate::ast::common::Name::new($name).unwrap()
    };
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeName(pub Name);

impl TypeName {
    pub fn new(s: &str) -> Result<TypeName, InvalidGraphQlName> {
        Name::new(s).map(TypeName)
    }
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The type of an operation; `query`, `mutation` or `subscription`.
#[derive(Serialize, Debug, PartialEq, Eq, Copy, Clone, Hash)]
pub enum OperationType {
    Query,
    Mutation,
    Subscription,
}

impl Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        })
    }
}

/// A GraphQL type reference, for example `String` or `[String!]!`.
///
/// Non-null is a flag on the container rather than a separate wrapper, so a
/// type can never be wrapped in non-null twice.
#[derive(Serialize, Deserialize, Hash, Debug, PartialEq, Eq, Clone)]
pub struct TypeContainer<T> {
    /// The base type.
    pub base: BaseTypeContainer<T>,
    /// Whether the type is nullable.
    pub nullable: bool,
}

pub type Type = TypeContainer<TypeName>;

impl<T> TypeContainer<T> {
    pub fn named_non_null(named: T) -> TypeContainer<T> {
        TypeContainer {
            base: BaseTypeContainer::Named(named),
            nullable: false,
        }
    }
    pub fn named_null(named: T) -> TypeContainer<T> {
        TypeContainer {
            base: BaseTypeContainer::Named(named),
            nullable: true,
        }
    }
    pub fn list_null(element_type: TypeContainer<T>) -> TypeContainer<T> {
        TypeContainer {
            base: BaseTypeContainer::List(Box::new(element_type)),
            nullable: true,
        }
    }

    /// The same type with its outermost layer made non-null.
    #[must_use]
    pub fn non_null(self) -> TypeContainer<T> {
        TypeContainer {
            base: self.base,
            nullable: false,
        }
    }

    pub fn underlying_type(&self) -> &T {
        match &self.base {
            BaseTypeContainer::Named(n) => n,
            BaseTypeContainer::List(ty) => ty.underlying_type(),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.base, BaseTypeContainer::List(_))
    }
}

impl Display for Type {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.base.fmt(f)?;
        if !self.nullable {
            f.write_char('!')?;
        }
        Ok(())
    }
}

/// A GraphQL base type, for example `String` or `[String!]`, without its
/// nullability.
#[derive(Serialize, Deserialize, Hash, Debug, PartialEq, Eq, Clone)]
pub enum BaseTypeContainer<T> {
    Named(T),
    List(Box<TypeContainer<T>>),
}

pub type BaseType = BaseTypeContainer<TypeName>;

impl Display for BaseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => name.fmt(f),
            Self::List(ty) => write!(f, "[{ty}]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_graphql_compliant_name() -> anyhow::Result<()> {
        for valid in ["foo", "FooBar", "_foo", "_Foo", "foo1", "Foo1", "foo_1"] {
            let name: Name = serde_json::from_str(&format!("\"{valid}\""))?;
            assert_eq!(name.as_str(), valid);
        }

        for invalid in ["1foo", "-foo", "foo bar", "foo-bar", ""] {
            let name: Result<Name, _> = serde_json::from_str(&format!("\"{invalid}\""));
            assert!(name.is_err(), "{invalid:?} should be rejected");
        }

        Ok(())
    }

    #[test]
    fn test_type_display() {
        let user = TypeName(mk_name!("User"));
        let ty = Type::list_null(Type::named_non_null(user.clone())).non_null();
        assert_eq!(ty.to_string(), "[User!]!");
        assert_eq!(ty.underlying_type(), &user);

        let twice = Type::named_null(user).non_null().non_null();
        assert_eq!(twice.to_string(), "User!");
    }
}
