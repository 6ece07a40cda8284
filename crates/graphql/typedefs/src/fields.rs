use std::cmp::Ordering;

use indexmap::IndexMap;
use lang_graphql::resolver::{dict_or_attr_resolver, Resolver, Subscriber};

use crate::arguments::{translate_arguments, Argument, ArgumentMember};
use crate::declaration::DeclaredType;
use crate::dynamic::Dynamic;
use crate::error::Error;
use crate::order::CreationOrder;
use crate::structures::Structure;
use crate::type_ref::TypeRef;

/// Configuration shared by implicit and explicit fields. Mounting an implicit
/// field forwards it to the explicit one unchanged.
#[derive(Clone, Debug, Default)]
pub struct FieldConfig {
    pub name: Option<String>,
    pub description: Option<String>,
    pub required: bool,
    pub default_value: Option<serde_json::Value>,
    pub deprecation_reason: Option<String>,
    pub resolver: Option<Resolver>,
    pub source: Option<String>,
    pub args: IndexMap<String, ArgumentMember>,
    /// Shorthand arguments, ordered by their creation order on translation.
    pub extra_args: IndexMap<String, ArgumentMember>,
}

impl PartialEq for FieldConfig {
    fn eq(&self, other: &Self) -> bool {
        let same_resolver = match (&self.resolver, &other.resolver) {
            (None, None) => true,
            (Some(a), Some(b)) => a.ptr_eq(b),
            _ => false,
        };
        same_resolver
            && self.name == other.name
            && self.description == other.description
            && self.required == other.required
            && self.default_value == other.default_value
            && self.deprecation_reason == other.deprecation_reason
            && self.source == other.source
            && self.args == other.args
            && self.extra_args == other.extra_args
    }
}

/// Builder methods common to everything carrying a [`FieldConfig`].
pub trait FieldOptions: Sized {
    fn config_mut(&mut self) -> &mut FieldConfig;

    /// Overrides the external name, which defaults to the member key.
    fn with_name(mut self, name: impl Into<String>) -> Self {
        self.config_mut().name = Some(name.into());
        self
    }

    fn with_description(mut self, description: impl Into<String>) -> Self {
        self.config_mut().description = Some(description.into());
        self
    }

    /// Marks the field as non-null.
    fn required(mut self) -> Self {
        self.config_mut().required = true;
        self
    }

    fn with_default(mut self, value: serde_json::Value) -> Self {
        self.config_mut().default_value = Some(value);
        self
    }

    fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.config_mut().deprecation_reason = Some(reason.into());
        self
    }

    fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.config_mut().resolver = Some(resolver);
        self
    }

    /// Resolves the field from another attribute (or key) of the parent value.
    fn with_source(mut self, source: impl Into<String>) -> Self {
        self.config_mut().source = Some(source.into());
        self
    }

    fn with_arg(mut self, name: impl Into<String>, argument: impl Into<ArgumentMember>) -> Self {
        self.config_mut().args.insert(name.into(), argument.into());
        self
    }

    fn with_extra_arg(
        mut self,
        name: impl Into<String>,
        argument: impl Into<ArgumentMember>,
    ) -> Self {
        self.config_mut()
            .extra_args
            .insert(name.into(), argument.into());
        self
    }
}

/// A bare type used directly as a type member, optionally carrying field
/// configuration. It becomes a [`Field`] or an [`Argument`] when mounted.
#[derive(Clone, Debug)]
pub struct ImplicitField {
    order: CreationOrder,
    of_type: TypeRef,
    config: FieldConfig,
}

impl ImplicitField {
    pub fn new(of_type: impl Into<TypeRef>) -> Self {
        Self {
            order: CreationOrder::next(),
            of_type: of_type.into(),
            config: FieldConfig::default(),
        }
    }

    pub fn creation_order(&self) -> CreationOrder {
        self.order
    }

    pub fn of_type(&self) -> &TypeRef {
        &self.of_type
    }

    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The explicit field for this member, keeping its creation order.
    pub fn mount_as_field(&self) -> Field {
        Field {
            order: self.order,
            field_type: self.of_type.clone(),
            config: self.config.clone(),
        }
    }

    /// The argument for this member, keeping its creation order.
    pub fn mount_as_argument(&self) -> Argument {
        Argument::mounted(
            self.order,
            self.of_type.clone(),
            &self.config,
        )
    }
}

impl FieldOptions for ImplicitField {
    fn config_mut(&mut self) -> &mut FieldConfig {
        &mut self.config
    }
}

impl PartialEq for ImplicitField {
    fn eq(&self, other: &Self) -> bool {
        self.of_type == other.of_type && self.config == other.config
    }
}

/// A fully configured field: type, arguments, resolver and metadata.
///
/// Fields compare and sort by creation order only.
#[derive(Clone, Debug)]
pub struct Field {
    order: CreationOrder,
    pub field_type: TypeRef,
    pub config: FieldConfig,
}

impl Field {
    pub fn new(field_type: impl Into<TypeRef>) -> Self {
        Self {
            order: CreationOrder::next(),
            field_type: field_type.into(),
            config: FieldConfig::default(),
        }
    }

    /// Converts an implicit field into an explicit one. Anything else is
    /// rejected.
    pub fn mount(item: impl Into<Mountable>) -> Result<Field, Error> {
        match item.into() {
            Mountable::Implicit(implicit) => Ok(implicit.mount_as_field()),
            other => Err(Error::NotMountable {
                found: other.kind_name(),
            }),
        }
    }

    pub fn creation_order(&self) -> CreationOrder {
        self.order
    }

    pub fn validate(&self, key: &str) -> Result<(), Error> {
        if self.config.source.is_some() && self.config.resolver.is_some() {
            return Err(Error::ConflictingResolver {
                field_name: key.to_string(),
            });
        }
        Ok(())
    }

    /// The type of the field's value, made non-null when the field is
    /// required.
    pub fn output_type(&self) -> TypeRef {
        if self.config.required {
            self.field_type.clone().non_null()
        } else {
            self.field_type.clone()
        }
    }

    pub fn arguments(&self) -> Result<IndexMap<String, Argument>, Error> {
        translate_arguments(&self.config.args, &self.config.extra_args)
    }

    /// The resolver for this field given the one the type would otherwise
    /// use: the field's own resolver, then its source, then `parent`.
    pub fn wrap_resolve(&self, parent: Resolver) -> Resolver {
        if let Some(resolver) = &self.config.resolver {
            return resolver.clone();
        }
        match &self.config.source {
            Some(source) => {
                let source = source.clone();
                let default = self.config.default_value.clone();
                Resolver::new(move |root, _, _| {
                    Ok(dict_or_attr_resolver(&source, default.as_ref(), root))
                })
            }
            None => parent,
        }
    }

    pub fn wrap_subscribe(&self, parent: Option<Subscriber>) -> Option<Subscriber> {
        parent
    }
}

impl FieldOptions for Field {
    fn config_mut(&mut self) -> &mut FieldConfig {
        &mut self.config
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order
    }
}

impl Eq for Field {}

impl PartialOrd for Field {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Field {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order.cmp(&other.order)
    }
}

/// Anything handed to [`Field::mount`].
#[derive(Clone, Debug)]
pub enum Mountable {
    Implicit(ImplicitField),
    Field(Field),
    Argument(Argument),
}

impl Mountable {
    fn kind_name(&self) -> &'static str {
        match self {
            Mountable::Implicit(_) => "ImplicitField",
            Mountable::Field(_) => "Field",
            Mountable::Argument(_) => "Argument",
        }
    }
}

impl From<ImplicitField> for Mountable {
    fn from(implicit: ImplicitField) -> Self {
        Mountable::Implicit(implicit)
    }
}

impl From<Field> for Mountable {
    fn from(field: Field) -> Self {
        Mountable::Field(field)
    }
}

impl From<Argument> for Mountable {
    fn from(argument: Argument) -> Self {
        Mountable::Argument(argument)
    }
}

/// A member of a type declaration.
#[derive(Clone, Debug)]
pub enum FieldMember {
    Implicit(ImplicitField),
    Field(Field),
}

impl FieldMember {
    pub fn creation_order(&self) -> CreationOrder {
        match self {
            FieldMember::Implicit(implicit) => implicit.creation_order(),
            FieldMember::Field(field) => field.creation_order(),
        }
    }

    /// The explicit field for this member: explicit fields are returned as
    /// they are, implicit ones are mounted.
    pub fn into_field(self) -> Field {
        match self {
            FieldMember::Implicit(implicit) => implicit.mount_as_field(),
            FieldMember::Field(field) => field,
        }
    }
}

impl From<ImplicitField> for FieldMember {
    fn from(implicit: ImplicitField) -> Self {
        FieldMember::Implicit(implicit)
    }
}

impl From<Field> for FieldMember {
    fn from(field: Field) -> Self {
        FieldMember::Field(field)
    }
}

impl From<Structure> for FieldMember {
    fn from(structure: Structure) -> Self {
        FieldMember::Implicit(ImplicitField::new(structure))
    }
}

impl From<TypeRef> for FieldMember {
    fn from(type_ref: TypeRef) -> Self {
        FieldMember::Implicit(ImplicitField::new(type_ref))
    }
}

impl From<Dynamic> for FieldMember {
    fn from(dynamic: Dynamic) -> Self {
        FieldMember::Implicit(ImplicitField::new(dynamic))
    }
}

impl From<DeclaredType> for FieldMember {
    fn from(declared: DeclaredType) -> Self {
        FieldMember::Implicit(ImplicitField::new(declared))
    }
}

impl From<&DeclaredType> for FieldMember {
    fn from(declared: &DeclaredType) -> Self {
        FieldMember::Implicit(ImplicitField::new(declared))
    }
}
