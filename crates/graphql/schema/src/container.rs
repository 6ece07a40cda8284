//! The types container: a name-indexed registry of declared types and the
//! translation of those types into native [`TypeInfo`]s.
//!
//! Translation runs in two phases. Registering a declared type records it
//! under its name and queues it; the queue is then drained, translating each
//! type and registering whatever it references. Types are therefore free to
//! refer to each other in cycles.

use std::collections::VecDeque;
use std::sync::Arc;

use convert_case::{Case, Casing};
use indexmap::IndexMap;
use lang_graphql::ast::common::{self as ast, Name, TypeName};
use lang_graphql::resolver::Resolver;
use lang_graphql::schema::{
    DeprecationStatus, Field, InputField, InputObject, Interface, Object, Scalar, TypeInfo,
};
use tracing_util::{global_tracer, SpanVisibility};

use graphql_typedefs::{scalars, DeclaredType, StructureKind, TypeKind, TypeLookup, TypeRef};

use crate::error::Error;

#[derive(Debug, Default)]
pub struct TypesContainer {
    auto_camelcase: bool,
    /// Every registered declared type, by GraphQL name.
    declared: IndexMap<String, DeclaredType>,
    /// Translated types, by GraphQL name.
    translated: IndexMap<String, Arc<TypeInfo>>,
    pending: VecDeque<DeclaredType>,
}

impl TypesContainer {
    pub fn new(auto_camelcase: bool) -> Self {
        Self {
            auto_camelcase,
            ..Self::default()
        }
    }

    pub fn auto_camelcase(&self) -> bool {
        self.auto_camelcase
    }

    /// Registers whatever `type_ref` refers to and returns its native type
    /// reference. `None` means the reference resolved to nothing, which only
    /// happens for dynamic references.
    pub fn add_to_self(&mut self, type_ref: Option<&TypeRef>) -> Result<Option<ast::Type>, Error> {
        let Some(type_ref) = type_ref else {
            return Ok(None);
        };
        match type_ref {
            TypeRef::Declared(declared) => self.register(declared).map(Some),
            TypeRef::Path(path) => {
                let declared = self.lookup(path).ok_or_else(|| Error::UnresolvedType {
                    reference: path.clone(),
                })?;
                self.register(&declared).map(Some)
            }
            TypeRef::Lazy(dynamic) => {
                let resolved = dynamic.resolve(Some(&*self));
                self.add_to_self(resolved.as_ref())
            }
            TypeRef::Structure(structure) => {
                let inner = self.add_to_self(Some(structure.of_type()))?;
                Ok(inner.map(|inner| match structure.kind() {
                    StructureKind::List => ast::Type::list_null(inner),
                    StructureKind::NonNull => inner.non_null(),
                }))
            }
        }
    }

    fn register(&mut self, declared: &DeclaredType) -> Result<ast::Type, Error> {
        if let Some(existing) = self.declared.get(declared.name()) {
            return Ok(ast::Type::named_null(native_name(existing)?));
        }
        if declared.is_abstract() {
            return Err(Error::AbstractType {
                name: declared.name().to_string(),
            });
        }
        if matches!(declared.kind(), TypeKind::Union | TypeKind::Enum) {
            return Err(Error::UnsupportedTypeKind {
                name: declared.name().to_string(),
                kind: declared.kind(),
            });
        }
        let name = native_name(declared)?;
        self.declared
            .insert(declared.name().to_string(), declared.clone());
        self.pending.push_back(declared.clone());
        Ok(ast::Type::named_null(name))
    }

    /// Registers `declared`, translates everything pending and returns the
    /// native type.
    pub fn translate(&mut self, declared: &DeclaredType) -> Result<Arc<TypeInfo>, Error> {
        self.add_to_self(Some(&TypeRef::from(declared)))?;
        self.translate_pending()?;
        self.get(declared.name())
            .ok_or_else(|| Error::Internal(format!("type {declared} was not translated")))
    }

    /// Drains the worklist.
    pub fn translate_pending(&mut self) -> Result<(), Error> {
        while let Some(declared) = self.pending.pop_front() {
            let type_info = global_tracer().in_span(
                "translate_type",
                format!("Translate type {declared}").into(),
                SpanVisibility::Internal,
                || self.translate_type(&declared),
            )?;
            self.translated
                .insert(declared.name().to_string(), Arc::new(type_info));
        }
        Ok(())
    }

    fn translate_type(&mut self, declared: &DeclaredType) -> Result<TypeInfo, Error> {
        match declared.kind() {
            TypeKind::Scalar => self.translate_scalar(declared),
            TypeKind::Object => self.translate_objecttype(declared).map(TypeInfo::Object),
            TypeKind::Interface => self.translate_interface(declared).map(TypeInfo::Interface),
            TypeKind::InputObject => self
                .translate_input_object(declared)
                .map(TypeInfo::InputObject),
            kind @ (TypeKind::Union | TypeKind::Enum) => Err(Error::UnsupportedTypeKind {
                name: declared.name().to_string(),
                kind,
            }),
        }
    }

    /// The translated type registered under `name`.
    pub fn get(&self, name: &str) -> Option<Arc<TypeInfo>> {
        self.translated.get(name).cloned()
    }

    /// The declared type registered under `name`.
    pub fn declared(&self, name: &str) -> Option<&DeclaredType> {
        self.declared.get(name)
    }

    /// Translated types in registration order.
    pub fn types(&self) -> impl Iterator<Item = &Arc<TypeInfo>> {
        self.translated.values()
    }

    fn translate_scalar(&self, declared: &DeclaredType) -> Result<TypeInfo, Error> {
        let behavior = declared
            .scalar_behavior()
            .cloned()
            .ok_or_else(|| graphql_typedefs::Error::MissingScalarBehavior {
                type_name: declared.name().to_string(),
            })?;
        Ok(TypeInfo::Scalar(Scalar {
            name: native_name(declared)?,
            description: declared.description().map(str::to_string),
            builtin: scalars::predefined_name(declared).is_some(),
            behavior,
        }))
    }

    fn translate_objecttype(&mut self, declared: &DeclaredType) -> Result<Object, Error> {
        Ok(Object {
            name: native_name(declared)?,
            description: declared.description().map(str::to_string),
            interfaces: self.translate_interface_list(declared)?,
            fields: self.translate_output_fields(declared)?,
        })
    }

    fn translate_interface(&mut self, declared: &DeclaredType) -> Result<Interface, Error> {
        Ok(Interface {
            name: native_name(declared)?,
            description: declared.description().map(str::to_string),
            interfaces: self.translate_interface_list(declared)?,
            fields: self.translate_output_fields(declared)?,
        })
    }

    fn translate_input_object(&mut self, declared: &DeclaredType) -> Result<InputObject, Error> {
        Ok(InputObject {
            name: native_name(declared)?,
            description: declared.description().map(str::to_string),
            fields: self.translate_input_fields(declared)?,
        })
    }

    fn translate_interface_list(&mut self, declared: &DeclaredType) -> Result<Vec<TypeName>, Error> {
        let mut interfaces = Vec::new();
        for interface in declared.interfaces() {
            if let Some(native) = self.add_to_self(Some(&TypeRef::from(interface)))? {
                interfaces.push(native.underlying_type().clone());
            }
        }
        Ok(interfaces)
    }

    fn translate_input_fields(
        &mut self,
        declared: &DeclaredType,
    ) -> Result<IndexMap<Name, InputField>, Error> {
        let mut fields = IndexMap::new();
        for (key, field) in declared.fields() {
            let Some(field_type) = self.add_to_self(Some(&field.output_type()))? else {
                tracing::debug!(type_name = declared.name(), field = %key, "skipping field with unresolved type");
                continue;
            };
            let name = self.external_name(key, field.config.name.as_deref())?;
            fields.insert(
                name.clone(),
                InputField {
                    name,
                    key: key.clone(),
                    description: field.config.description.clone(),
                    field_type,
                    default_value: field.config.default_value.clone(),
                    deprecation_status: DeprecationStatus::from_reason(
                        field.config.deprecation_reason.as_deref(),
                    ),
                },
            );
        }
        Ok(fields)
    }

    fn translate_output_fields(
        &mut self,
        declared: &DeclaredType,
    ) -> Result<IndexMap<Name, Field>, Error> {
        let mut fields = IndexMap::new();
        for (key, field) in declared.fields() {
            let Some(field_type) = self.add_to_self(Some(&field.output_type()))? else {
                tracing::debug!(type_name = declared.name(), field = %key, "skipping field with unresolved type");
                continue;
            };

            let mut arguments = IndexMap::new();
            for (arg_key, argument) in field.arguments()? {
                let Some(arg_type) = self.add_to_self(Some(&argument.input_type()))? else {
                    tracing::debug!(
                        type_name = declared.name(),
                        field = %key,
                        argument = %arg_key,
                        "skipping argument with unresolved type"
                    );
                    continue;
                };
                let arg_name = self.external_name(&arg_key, argument.name.as_deref())?;
                arguments.insert(
                    arg_name.clone(),
                    InputField {
                        name: arg_name,
                        key: arg_key,
                        description: None,
                        field_type: arg_type,
                        default_value: argument.default_value.clone(),
                        deprecation_status: DeprecationStatus::from_reason(
                            argument.deprecation_reason.as_deref(),
                        ),
                    },
                );
            }

            let subscriber = field.wrap_subscribe(declared.find_subscriber(key));
            let fallback = declared
                .find_resolver(key)
                .or_else(|| subscriber.as_ref().map(|_| Resolver::identity()))
                .unwrap_or_else(|| {
                    declared
                        .options()
                        .default_resolver
                        .clone()
                        .unwrap_or_default()
                        .bind(key, field.config.default_value.clone())
                });
            let resolver = field.wrap_resolve(fallback);

            let name = self.external_name(key, field.config.name.as_deref())?;
            fields.insert(
                name.clone(),
                Field {
                    name,
                    description: field.config.description.clone(),
                    field_type,
                    arguments,
                    deprecation_status: DeprecationStatus::from_reason(
                        field.config.deprecation_reason.as_deref(),
                    ),
                    resolver,
                    subscriber,
                },
            );
        }
        Ok(fields)
    }

    /// An explicit name is used as given; keys are camel-cased when
    /// `auto_camelcase` is on.
    fn external_name(&self, key: &str, explicit: Option<&str>) -> Result<Name, Error> {
        let name = match explicit {
            Some(name) => name.to_string(),
            None if self.auto_camelcase => key.to_case(Case::Camel),
            None => key.to_string(),
        };
        Ok(Name::new(&name)?)
    }
}

impl TypeLookup for TypesContainer {
    fn lookup(&self, name: &str) -> Option<DeclaredType> {
        self.declared.get(name).cloned().or_else(|| {
            self.declared
                .values()
                .find(|declared| declared.declared_name() == name)
                .cloned()
        })
    }
}

/// The executor's name for `declared`: predefined scalars keep the executor's
/// spelling, everything else uses its GraphQL name.
fn native_name(declared: &DeclaredType) -> Result<TypeName, Error> {
    let name = scalars::predefined_name(declared).unwrap_or(declared.name());
    Ok(TypeName::new(name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphql_typedefs::{
        Dynamic, FieldOptions, ImplicitField, Meta, Structure, TypeDeclaration,
    };
    use pretty_assertions::assert_eq;

    fn user() -> anyhow::Result<DeclaredType> {
        Ok(TypeDeclaration::object("User")
            .field("name", scalars::string())
            .build()?)
    }

    #[test]
    fn test_memoizes_by_name() -> anyhow::Result<()> {
        let user = user()?;
        let mut container = TypesContainer::new(false);
        let first = container.translate(&user)?;
        let second = container.translate(&user)?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(container.types().count(), 2);
        Ok(())
    }

    #[test]
    fn test_builtin_scalars_use_native_names() -> anyhow::Result<()> {
        let mut container = TypesContainer::new(false);
        let native = container.add_to_self(Some(&TypeRef::from(scalars::integer())))?;
        assert_eq!(native.map(|t| t.to_string()), Some("Int".to_string()));
        container.translate_pending()?;
        let int = container.get("Integer").and_then(|t| t.as_scalar().map(|s| s.builtin));
        assert_eq!(int, Some(true));
        Ok(())
    }

    #[test]
    fn test_structures_become_wrapped_references() -> anyhow::Result<()> {
        let mut container = TypesContainer::new(false);
        let names = Structure::non_null(Structure::list(Structure::non_null(scalars::string())?)?)?;
        let native = container.add_to_self(Some(&TypeRef::from(names)))?;
        assert_eq!(native.map(|t| t.to_string()), Some("[String!]!".to_string()));

        let required = ImplicitField::new(scalars::string()).required().mount_as_field();
        let native = container.add_to_self(Some(&required.output_type()))?;
        assert_eq!(native.map(|t| t.to_string()), Some("String!".to_string()));
        Ok(())
    }

    #[test]
    fn test_paths_resolve_through_the_registry() -> anyhow::Result<()> {
        let mut container = TypesContainer::new(false);
        let missing = container.add_to_self(Some(&TypeRef::path("User")));
        assert_eq!(
            missing.err(),
            Some(Error::UnresolvedType {
                reference: "User".to_string()
            })
        );

        container.translate(&user()?)?;
        let found = container.add_to_self(Some(&TypeRef::path("User")))?;
        assert_eq!(found.map(|t| t.to_string()), Some("User".to_string()));
        Ok(())
    }

    #[test]
    fn test_unresolved_dynamic_fields_are_skipped() -> anyhow::Result<()> {
        let query = TypeDeclaration::object("Query")
            .field("later", Dynamic::optional(|| None))
            .field("now", scalars::string())
            .build()?;
        let mut container = TypesContainer::new(false);
        let query = container.translate(&query)?;
        let names: Vec<_> = query
            .fields()
            .map(|fields| fields.keys().map(Name::as_str).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["now"]);
        Ok(())
    }

    #[test]
    fn test_abstract_and_unsupported_types_are_rejected() -> anyhow::Result<()> {
        let base = TypeDeclaration::object("Base")
            .meta(Meta::new().set("abstract", true))
            .field("id", scalars::id())
            .build()?;
        let mut container = TypesContainer::new(false);
        assert_eq!(
            container.translate(&base).err(),
            Some(Error::AbstractType {
                name: "Base".to_string()
            })
        );

        let color = TypeDeclaration::new("Color").kind(TypeKind::Enum).build()?;
        assert_eq!(
            container.translate(&color).err(),
            Some(Error::UnsupportedTypeKind {
                name: "Color".to_string(),
                kind: TypeKind::Enum
            })
        );
        Ok(())
    }

    #[test]
    fn test_auto_camelcase_renames_fields_and_arguments() -> anyhow::Result<()> {
        let query = TypeDeclaration::object("Query")
            .field(
                "first_name",
                ImplicitField::new(scalars::string())
                    .with_arg("include_middle", scalars::boolean()),
            )
            .build()?;
        let mut container = TypesContainer::new(true);
        let query = container.translate(&query)?;
        let field = query
            .fields()
            .and_then(|fields| fields.get(&lang_graphql::mk_name!("firstName")));
        let arguments: Vec<_> = field
            .map(|field| {
                field
                    .arguments
                    .values()
                    .map(|argument| (argument.name.as_str(), argument.key.as_str()))
                    .collect()
            })
            .unwrap_or_default();
        assert_eq!(arguments, vec![("includeMiddle", "include_middle")]);
        Ok(())
    }
}
