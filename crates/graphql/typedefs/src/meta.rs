use indexmap::IndexMap;
use lang_graphql::resolver::DefaultResolver;

use crate::declaration::{DeclaredType, TypeKind};
use crate::error::Error;
use crate::fields::Field;

pub const NAME: &str = "name";
pub const DESCRIPTION: &str = "description";
pub const INTERFACES: &str = "interfaces";
pub const ABSTRACT: &str = "abstract";
pub const DEFAULT_RESOLVER: &str = "default_resolver";

#[derive(Clone, Debug)]
pub enum MetaValue {
    Text(String),
    Flag(bool),
    Types(Vec<DeclaredType>),
    Resolver(DefaultResolver),
}

/// The configuration block of a type declaration: a set of keyed options,
/// validated against the keys the type's kind accepts.
#[derive(Clone, Debug, Default)]
pub struct Meta {
    entries: IndexMap<String, MetaValue>,
}

impl Meta {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, key: impl Into<String>, value: impl Into<MetaValue>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub(crate) fn validate_keys(&self, accepted: &[&str]) -> Result<(), Error> {
        let invalid: Vec<String> = self
            .keys()
            .filter(|key| !accepted.contains(key))
            .map(str::to_string)
            .collect();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidMetaOptions {
                invalid,
                valid: accepted.iter().map(|key| (*key).to_string()).collect(),
            })
        }
    }

    fn text(&self, key: &str) -> Result<Option<String>, Error> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(MetaValue::Text(text)) => Ok(Some(text.clone())),
            Some(_) => Err(invalid_value(key, "text")),
        }
    }

    fn flag(&self, key: &str) -> Result<Option<bool>, Error> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(MetaValue::Flag(flag)) => Ok(Some(*flag)),
            Some(_) => Err(invalid_value(key, "a boolean")),
        }
    }

    fn types(&self, key: &str) -> Result<Option<Vec<DeclaredType>>, Error> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(MetaValue::Types(types)) => Ok(Some(types.clone())),
            Some(_) => Err(invalid_value(key, "a list of types")),
        }
    }

    fn resolver(&self, key: &str) -> Result<Option<DefaultResolver>, Error> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(MetaValue::Resolver(resolver)) => Ok(Some(resolver.clone())),
            Some(_) => Err(invalid_value(key, "a resolver")),
        }
    }
}

fn invalid_value(key: &str, expected: &'static str) -> Error {
    Error::InvalidMetaValue {
        key: key.to_string(),
        expected,
    }
}

/// Per-type metadata, created once when a declaration is built.
#[derive(Clone, Debug)]
pub struct TypeOptions {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, Field>,
    pub interfaces: Vec<DeclaredType>,
    pub is_abstract: bool,
    pub default_resolver: Option<DefaultResolver>,
    accepted_meta_keys: &'static [&'static str],
}

impl TypeOptions {
    pub(crate) fn new(kind: TypeKind, declared_name: &str) -> Self {
        Self {
            name: declared_name.to_string(),
            description: None,
            fields: IndexMap::new(),
            interfaces: Vec::new(),
            is_abstract: false,
            default_resolver: None,
            accepted_meta_keys: kind.accepted_meta_keys(),
        }
    }

    pub fn accepted_meta_keys(&self) -> &'static [&'static str] {
        self.accepted_meta_keys
    }

    /// Validates `meta` and copies its options over the defaults.
    pub(crate) fn apply(&mut self, meta: &Meta) -> Result<(), Error> {
        meta.validate_keys(self.accepted_meta_keys)?;
        if let Some(name) = meta.text(NAME)? {
            self.name = name;
        }
        if let Some(description) = meta.text(DESCRIPTION)? {
            self.description = Some(description);
        }
        if let Some(interfaces) = meta.types(INTERFACES)? {
            if let Some(other) = interfaces
                .iter()
                .find(|interface| interface.kind() != TypeKind::Interface)
            {
                return Err(Error::NotAnInterface {
                    type_name: self.name.clone(),
                    interface: other.name().to_string(),
                    kind: other.kind(),
                });
            }
            self.interfaces = interfaces;
        }
        if let Some(is_abstract) = meta.flag(ABSTRACT)? {
            self.is_abstract = is_abstract;
        }
        self.default_resolver = meta.resolver(DEFAULT_RESOLVER)?;
        Ok(())
    }
}

impl From<&str> for MetaValue {
    fn from(text: &str) -> Self {
        MetaValue::Text(text.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(text: String) -> Self {
        MetaValue::Text(text)
    }
}

impl From<bool> for MetaValue {
    fn from(flag: bool) -> Self {
        MetaValue::Flag(flag)
    }
}

impl From<Vec<DeclaredType>> for MetaValue {
    fn from(types: Vec<DeclaredType>) -> Self {
        MetaValue::Types(types)
    }
}

impl From<DefaultResolver> for MetaValue {
    fn from(resolver: DefaultResolver) -> Self {
        MetaValue::Resolver(resolver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_meta_keys_are_reported_with_the_valid_ones() {
        let mut options = TypeOptions::new(TypeKind::Interface, "Node");
        let meta = Meta::new().set("name", "Node").set("ordering", "asc");
        assert_eq!(
            options.apply(&meta).err().map(|e| e.to_string()),
            Some(
                "Invalid options provided in Meta class: ordering. \
                 Valid options are: name, description, interfaces, abstract"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_meta_values_must_have_the_right_shape() {
        let mut options = TypeOptions::new(TypeKind::Object, "User");
        let meta = Meta::new().set("abstract", "yes");
        assert_eq!(
            options.apply(&meta).err(),
            Some(Error::InvalidMetaValue {
                key: "abstract".to_string(),
                expected: "a boolean"
            })
        );
    }

    #[test]
    fn test_meta_overrides_defaults() -> anyhow::Result<()> {
        let mut options = TypeOptions::new(TypeKind::Object, "User");
        options.apply(
            &Meta::new()
                .set(NAME, "Person")
                .set(DESCRIPTION, "A person")
                .set(ABSTRACT, true),
        )?;
        assert_eq!(options.name, "Person");
        assert_eq!(options.description.as_deref(), Some("A person"));
        assert!(options.is_abstract);
        assert!(options.default_resolver.is_none());
        Ok(())
    }
}
