use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use lang_graphql::ast::common::Name;
use lang_graphql::resolver::{
    Arguments, EventStream, FieldError, ResolveInfo, Resolver, RuntimeValue, Subscriber,
};
use lang_graphql::scalar::ScalarBehavior;
use tracing_util::{global_tracer, SpanVisibility};

use crate::error::Error;
use crate::fields::{Field, FieldMember, ImplicitField};
use crate::meta::{self, Meta, TypeOptions};
use crate::record::{Record, RecordShape};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, derive_more::Display)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

impl TypeKind {
    /// Configuration keys a declaration of this kind may set.
    pub fn accepted_meta_keys(self) -> &'static [&'static str] {
        match self {
            TypeKind::Scalar | TypeKind::Union | TypeKind::Enum => {
                &[meta::NAME, meta::DESCRIPTION]
            }
            TypeKind::Interface => &[meta::NAME, meta::DESCRIPTION, meta::INTERFACES, meta::ABSTRACT],
            TypeKind::InputObject => &[meta::NAME, meta::DESCRIPTION, meta::ABSTRACT],
            TypeKind::Object => &[
                meta::NAME,
                meta::DESCRIPTION,
                meta::INTERFACES,
                meta::ABSTRACT,
                meta::DEFAULT_RESOLVER,
            ],
        }
    }
}

/// A named function attached to a declared type.
#[derive(Clone, Debug)]
pub enum Method {
    Resolve(Resolver),
    Subscribe(Subscriber),
}

struct TypeDefinition {
    kind: TypeKind,
    declared_name: String,
    options: TypeOptions,
    methods: IndexMap<String, Method>,
    scalar: Option<Arc<dyn ScalarBehavior>>,
    record: Option<RecordShape>,
}

/// A built type declaration. Cloning is cheap and clones share identity.
#[derive(Clone)]
pub struct DeclaredType(Arc<TypeDefinition>);

impl DeclaredType {
    /// A scalar predefined by the executor.
    pub(crate) fn builtin_scalar(
        name: &str,
        description: &str,
        behavior: Arc<dyn ScalarBehavior>,
    ) -> Self {
        let mut options = TypeOptions::new(TypeKind::Scalar, name);
        options.description = Some(description.to_string());
        DeclaredType(Arc::new(TypeDefinition {
            kind: TypeKind::Scalar,
            declared_name: name.to_string(),
            options,
            methods: IndexMap::new(),
            scalar: Some(behavior),
            record: None,
        }))
    }

    pub fn kind(&self) -> TypeKind {
        self.0.kind
    }

    pub fn declared_name(&self) -> &str {
        &self.0.declared_name
    }

    /// The GraphQL name, which may be overridden by the configuration block.
    pub fn name(&self) -> &str {
        &self.0.options.name
    }

    pub fn description(&self) -> Option<&str> {
        self.0.options.description.as_deref()
    }

    pub fn options(&self) -> &TypeOptions {
        &self.0.options
    }

    pub fn fields(&self) -> &IndexMap<String, Field> {
        &self.0.options.fields
    }

    pub fn interfaces(&self) -> &[DeclaredType] {
        &self.0.options.interfaces
    }

    pub fn is_abstract(&self) -> bool {
        self.0.options.is_abstract
    }

    pub fn scalar_behavior(&self) -> Option<&Arc<dyn ScalarBehavior>> {
        self.0.scalar.as_ref()
    }

    /// The plain-data shape of a non-empty object type.
    pub fn record_shape(&self) -> Option<&RecordShape> {
        self.0.record.as_ref()
    }

    /// Builds a plain-data value of this type from positional and named values.
    pub fn instantiate(
        &self,
        positional: Vec<serde_json::Value>,
        named: IndexMap<String, serde_json::Value>,
    ) -> Result<Record, Error> {
        match &self.0.record {
            Some(shape) => shape.instantiate(positional, named),
            None => RecordShape::empty(self.name()).instantiate(positional, named),
        }
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.0.methods.get(name)
    }

    /// Looks `method_name` up on this type, then on the first declared
    /// interface that has both the field and the method.
    pub fn find_method(&self, method_name: &str, field_name: &str) -> Option<&Method> {
        self.method(method_name).or_else(|| {
            self.interfaces()
                .iter()
                .filter(|interface| interface.fields().contains_key(field_name))
                .find_map(|interface| interface.method(method_name))
        })
    }

    pub fn find_resolver(&self, field_name: &str) -> Option<Resolver> {
        match self.find_method(&format!("resolve_{field_name}"), field_name) {
            Some(Method::Resolve(resolver)) => Some(resolver.clone()),
            _ => None,
        }
    }

    pub fn find_subscriber(&self, field_name: &str) -> Option<Subscriber> {
        match self.find_method(&format!("subscribe_{field_name}"), field_name) {
            Some(Method::Subscribe(subscriber)) => Some(subscriber.clone()),
            _ => None,
        }
    }

    /// This type as a bare member of another declaration.
    pub fn implicit(&self) -> ImplicitField {
        ImplicitField::new(self)
    }

    pub fn ptr_eq(&self, other: &DeclaredType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for DeclaredType {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DeclaredType")
            .field(&self.kind())
            .field(&self.name())
            .finish()
    }
}

impl fmt::Display for DeclaredType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builder for a declared type.
///
/// ```ignore
/// let user = TypeDeclaration::object("User")
///     .doc("A registered user")
///     .field("name", scalars::string())
///     .field("friends", Field::new(Dynamic::new(|| TypeRef::path("User")).list()))
///     .resolve("name", |parent, _, _| Ok(parent.clone()))
///     .build()?;
/// ```
pub struct TypeDeclaration {
    declared_name: String,
    kind: Option<TypeKind>,
    doc: Option<String>,
    meta: Meta,
    members: Vec<(String, FieldMember)>,
    parents: Vec<DeclaredType>,
    methods: IndexMap<String, Method>,
    scalar: Option<Arc<dyn ScalarBehavior>>,
}

impl TypeDeclaration {
    /// A declaration without a kind; [`TypeDeclaration::kind`] must be set
    /// before building.
    pub fn new(declared_name: impl Into<String>) -> Self {
        Self {
            declared_name: declared_name.into(),
            kind: None,
            doc: None,
            meta: Meta::new(),
            members: Vec::new(),
            parents: Vec::new(),
            methods: IndexMap::new(),
            scalar: None,
        }
    }

    pub fn object(declared_name: impl Into<String>) -> Self {
        Self::new(declared_name).kind(TypeKind::Object)
    }

    pub fn interface(declared_name: impl Into<String>) -> Self {
        Self::new(declared_name).kind(TypeKind::Interface)
    }

    pub fn input_object(declared_name: impl Into<String>) -> Self {
        Self::new(declared_name).kind(TypeKind::InputObject)
    }

    pub fn scalar(declared_name: impl Into<String>, behavior: impl ScalarBehavior + 'static) -> Self {
        let mut declaration = Self::new(declared_name).kind(TypeKind::Scalar);
        declaration.scalar = Some(Arc::new(behavior));
        declaration
    }

    #[must_use]
    pub fn kind(mut self, kind: TypeKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Documentation text; its cleaned form is the default description.
    #[must_use]
    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    #[must_use]
    pub fn meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    #[must_use]
    pub fn field(mut self, key: impl Into<String>, member: impl Into<FieldMember>) -> Self {
        self.members.push((key.into(), member.into()));
        self
    }

    /// Copies the fields and methods of `parent` into this type. A field
    /// redeclared here is an error unless `parent` is abstract.
    #[must_use]
    pub fn extends(mut self, parent: &DeclaredType) -> Self {
        self.parents.push(parent.clone());
        self
    }

    #[must_use]
    pub fn resolve<F>(self, field_name: &str, resolver: F) -> Self
    where
        F: Fn(&RuntimeValue, &Arguments, &ResolveInfo) -> Result<RuntimeValue, FieldError>
            + Send
            + Sync
            + 'static,
    {
        self.method(
            format!("resolve_{field_name}"),
            Method::Resolve(Resolver::new(resolver)),
        )
    }

    #[must_use]
    pub fn subscribe<F>(self, field_name: &str, subscriber: F) -> Self
    where
        F: Fn(&RuntimeValue, &Arguments, &ResolveInfo) -> Result<EventStream, FieldError>
            + Send
            + Sync
            + 'static,
    {
        self.method(
            format!("subscribe_{field_name}"),
            Method::Subscribe(Subscriber::new(subscriber)),
        )
    }

    #[must_use]
    pub fn method(mut self, name: impl Into<String>, method: Method) -> Self {
        self.methods.insert(name.into(), method);
        self
    }

    /// Runs the registration pipeline and produces the declared type.
    pub fn build(self) -> Result<DeclaredType, Error> {
        let kind = self.kind.ok_or_else(|| Error::MissingTypeKind {
            type_name: self.declared_name.clone(),
        })?;
        global_tracer().in_span(
            "declare_type",
            format!("Declare {kind} type {}", self.declared_name).into(),
            SpanVisibility::Internal,
            || self.build_kind(kind),
        )
    }

    fn build_kind(self, kind: TypeKind) -> Result<DeclaredType, Error> {
        Name::new(&self.declared_name)?;
        let mut options = TypeOptions::new(kind, &self.declared_name);
        options.apply(&self.meta)?;
        Name::new(&options.name)?;
        if options.description.is_none() {
            options.description = self
                .doc
                .as_deref()
                .map(clean_doc)
                .filter(|doc| !doc.is_empty());
        }

        let mut methods = IndexMap::new();
        for parent in &self.parents {
            methods.extend(
                parent
                    .0
                    .methods
                    .iter()
                    .map(|(name, method)| (name.clone(), method.clone())),
            );
        }
        methods.extend(self.methods);

        let own_fields = collect_fields(self.members);
        let mut record = None;
        match kind {
            TypeKind::Scalar => {
                if self.scalar.is_none() {
                    return Err(Error::MissingScalarBehavior {
                        type_name: self.declared_name,
                    });
                }
            }
            TypeKind::Object => {
                let is_bare =
                    self.parents.is_empty() && own_fields.is_empty() && options.interfaces.is_empty();
                if !is_bare {
                    options.fields = merge_fields(
                        &options.name,
                        &options.interfaces,
                        &self.parents,
                        own_fields,
                    )?;
                    if !options.fields.is_empty() {
                        record = Some(RecordShape::new(&options.name, &options.fields));
                    }
                }
            }
            TypeKind::Interface | TypeKind::InputObject | TypeKind::Union | TypeKind::Enum => {
                options.fields = merge_fields(
                    &options.name,
                    &options.interfaces,
                    &self.parents,
                    own_fields,
                )?;
            }
        }

        for (key, field) in &options.fields {
            field.validate(key)?;
            Name::new(field.config.name.as_deref().unwrap_or(key))?;
        }

        Ok(DeclaredType(Arc::new(TypeDefinition {
            kind,
            declared_name: self.declared_name,
            options,
            methods,
            scalar: self.scalar,
            record,
        })))
    }
}

/// Own members as explicit fields, in creation order. A key declared twice
/// keeps its last member.
fn collect_fields(members: Vec<(String, FieldMember)>) -> IndexMap<String, Field> {
    let mut by_key: IndexMap<String, FieldMember> = IndexMap::new();
    for (key, member) in members {
        by_key.insert(key, member);
    }
    by_key.sort_by(|_, a, _, b| a.creation_order().cmp(&b.creation_order()));
    by_key
        .into_iter()
        .map(|(key, member)| (key, member.into_field()))
        .collect()
}

/// Interface fields, then parent fields, then own fields. Later entries
/// replace earlier ones in place.
fn merge_fields(
    type_name: &str,
    interfaces: &[DeclaredType],
    parents: &[DeclaredType],
    own_fields: IndexMap<String, Field>,
) -> Result<IndexMap<String, Field>, Error> {
    let mut fields = IndexMap::new();
    for inherited in interfaces.iter().chain(parents) {
        fields.extend(
            inherited
                .fields()
                .iter()
                .map(|(key, field)| (key.clone(), field.clone())),
        );
    }
    for (key, field) in own_fields {
        if let Some(parent) = parents
            .iter()
            .find(|parent| !parent.is_abstract() && parent.fields().contains_key(&key))
        {
            return Err(Error::DuplicateInheritedField {
                type_name: type_name.to_string(),
                field_name: key,
                parent: parent.name().to_string(),
            });
        }
        fields.insert(key, field);
    }
    Ok(fields)
}

/// Strips the common indentation of documentation text, along with leading
/// and trailing blank lines. The first line's indentation is ignored.
pub fn clean_doc(doc: &str) -> String {
    let mut lines = doc.lines();
    let first = lines.next().unwrap_or_default().trim();
    let rest: Vec<&str> = lines.collect();
    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<String> = std::iter::once(first.to_string())
        .chain(
            rest.iter()
                .map(|line| line.chars().skip(indent).collect::<String>().trim_end().to_string()),
        )
        .collect();
    while cleaned.first().is_some_and(String::is_empty) {
        cleaned.remove(0);
    }
    while cleaned.last().is_some_and(String::is_empty) {
        cleaned.pop();
    }
    cleaned.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::FieldOptions;
    use crate::meta::MetaValue;
    use crate::scalars;
    use crate::type_ref::TypeRef;
    use lang_graphql::resolver::DefaultResolver;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn keys(declared: &DeclaredType) -> Vec<&str> {
        declared.fields().keys().map(String::as_str).collect()
    }

    #[test]
    fn test_kind_is_required() {
        let error = TypeDeclaration::new("Loose").build().err();
        assert_eq!(
            error,
            Some(Error::MissingTypeKind {
                type_name: "Loose".to_string()
            })
        );
    }

    #[test]
    fn test_fields_follow_declaration_order() -> anyhow::Result<()> {
        let first = ImplicitField::new(scalars::string());
        let second = Field::new(scalars::integer());
        let third = ImplicitField::new(scalars::boolean());
        // members are handed over out of order
        let user = TypeDeclaration::object("User")
            .field("c", third)
            .field("a", first)
            .field("b", second)
            .build()?;

        assert_eq!(keys(&user), vec!["a", "b", "c"]);
        let orders: Vec<_> = user.fields().values().map(Field::creation_order).collect();
        assert!(orders.windows(2).all(|pair| pair[0] < pair[1]));
        Ok(())
    }

    #[test]
    fn test_description_defaults_to_cleaned_doc() -> anyhow::Result<()> {
        let documented = TypeDeclaration::object("Documented")
            .doc("Documentation\n\n    Documentation line 2\n    ")
            .field("name", scalars::string())
            .build()?;
        assert_eq!(
            documented.description(),
            Some("Documentation\n\nDocumentation line 2")
        );

        let overridden = TypeDeclaration::object("Overridden")
            .doc("Ignored")
            .meta(Meta::new().set(meta::DESCRIPTION, "From meta"))
            .build()?;
        assert_eq!(overridden.description(), Some("From meta"));
        Ok(())
    }

    #[test]
    fn test_meta_name_overrides_declared_name() -> anyhow::Result<()> {
        let person = TypeDeclaration::object("User")
            .meta(Meta::new().set(meta::NAME, "Person"))
            .field("name", scalars::string())
            .build()?;
        assert_eq!(person.declared_name(), "User");
        assert_eq!(person.name(), "Person");
        assert_eq!(person.to_string(), "Person");
        Ok(())
    }

    #[test]
    fn test_invalid_meta_keys() {
        let error = TypeDeclaration::object("User")
            .meta(Meta::new().set("ordering", "name"))
            .build()
            .err();
        assert_eq!(
            error,
            Some(Error::InvalidMetaOptions {
                invalid: vec!["ordering".to_string()],
                valid: TypeKind::Object
                    .accepted_meta_keys()
                    .iter()
                    .map(|key| (*key).to_string())
                    .collect(),
            })
        );

        let error = TypeDeclaration::scalar("Money", scalars::GenericScalar)
            .meta(Meta::new().set(meta::INTERFACES, Vec::<DeclaredType>::new()))
            .build();
        assert!(matches!(error, Err(Error::InvalidMetaOptions { .. })));

        let error = TypeDeclaration::input_object("Filter")
            .meta(Meta::new().set(meta::INTERFACES, Vec::<DeclaredType>::new()))
            .build();
        assert!(matches!(
            error,
            Err(Error::InvalidMetaOptions { ref invalid, .. }) if invalid == &["interfaces".to_string()]
        ));
    }

    #[test]
    fn test_interface_fields_propagate_and_own_fields_win() -> anyhow::Result<()> {
        let person = TypeDeclaration::interface("Person")
            .field("age", scalars::integer())
            .field("name", scalars::string())
            .build()?;

        let student = TypeDeclaration::object("Student")
            .meta(Meta::new().set(meta::INTERFACES, vec![person.clone()]))
            .field("school", scalars::string())
            .build()?;
        assert_eq!(keys(&student), vec!["age", "name", "school"]);
        assert_eq!(student.fields()["age"], person.fields()["age"]);

        let own_age = Field::new(scalars::float()).with_description("Age in years");
        let tutor = TypeDeclaration::object("Tutor")
            .meta(Meta::new().set(meta::INTERFACES, vec![person.clone()]))
            .field("age", own_age.clone())
            .build()?;
        assert_eq!(keys(&tutor), vec!["age", "name"]);
        assert_eq!(tutor.fields()["age"], own_age);
        assert_ne!(tutor.fields()["age"], person.fields()["age"]);
        Ok(())
    }

    #[test]
    fn test_interfaces_must_be_interfaces() -> anyhow::Result<()> {
        let user = TypeDeclaration::object("User")
            .field("name", scalars::string())
            .build()?;
        let error = TypeDeclaration::object("Admin")
            .meta(Meta::new().set(meta::INTERFACES, vec![user]))
            .build()
            .err();
        assert_eq!(
            error,
            Some(Error::NotAnInterface {
                type_name: "Admin".to_string(),
                interface: "User".to_string(),
                kind: TypeKind::Object,
            })
        );
        Ok(())
    }

    #[test]
    fn test_inheritance_carries_fields_and_methods() -> anyhow::Result<()> {
        let base = TypeDeclaration::object("Base")
            .meta(Meta::new().set(meta::ABSTRACT, true))
            .field("name", scalars::string())
            .resolve("name", |_, _, _| Ok(json!("base").into()))
            .build()?;
        let child = TypeDeclaration::object("Child")
            .extends(&base)
            .field("name", Field::new(scalars::string()).with_description("own"))
            .field("age", scalars::integer())
            .build()?;

        assert_eq!(keys(&child), vec!["name", "age"]);
        assert_eq!(child.fields()["name"].config.description.as_deref(), Some("own"));
        assert!(child.find_resolver("name").is_some());
        Ok(())
    }

    #[test]
    fn test_redeclaring_a_non_abstract_parent_field_fails() -> anyhow::Result<()> {
        let base = TypeDeclaration::object("Base")
            .field("name", scalars::string())
            .build()?;
        let error = TypeDeclaration::object("Child")
            .extends(&base)
            .field("name", scalars::string())
            .build()
            .err();
        assert_eq!(
            error,
            Some(Error::DuplicateInheritedField {
                type_name: "Child".to_string(),
                field_name: "name".to_string(),
                parent: "Base".to_string(),
            })
        );

        let extended = TypeDeclaration::object("Extended")
            .extends(&base)
            .field("email", scalars::string())
            .build()?;
        assert_eq!(keys(&extended), vec!["name", "email"]);
        Ok(())
    }

    #[test]
    fn test_empty_object_types_are_bare() -> anyhow::Result<()> {
        let empty = TypeDeclaration::object("Empty").build()?;
        assert!(empty.fields().is_empty());
        assert!(empty.record_shape().is_none());

        let user = TypeDeclaration::object("User")
            .field("name", scalars::string())
            .field("lastname", ImplicitField::new(scalars::string()).with_default(json!("Doe")))
            .build()?;
        let shape = user.record_shape().map(RecordShape::field_names);
        assert_eq!(shape, Some(vec!["name", "lastname"]));
        Ok(())
    }

    #[test]
    fn test_methods_are_found_on_interfaces() -> anyhow::Result<()> {
        let named = TypeDeclaration::interface("Named")
            .field("name", scalars::string())
            .resolve("name", |_, _, _| Ok(json!("from interface").into()))
            .resolve("unrelated", |_, _, _| Ok(json!("never").into()))
            .build()?;
        let user = TypeDeclaration::object("User")
            .meta(Meta::new().set(meta::INTERFACES, vec![named]))
            .field("unrelated", scalars::string())
            .build()?;

        assert!(user.find_resolver("name").is_some());
        // the interface does not declare `unrelated`, so its method is ignored
        assert!(user.find_resolver("unrelated").is_none());
        assert!(user.find_subscriber("name").is_none());
        Ok(())
    }

    #[test]
    fn test_subscribers_are_registered_as_methods() -> anyhow::Result<()> {
        use futures::StreamExt;
        use lang_graphql::ast::common as ast;
        use lang_graphql::mk_name;

        let ticks = TypeDeclaration::object("Subscription")
            .field("tick", scalars::integer())
            .subscribe("tick", |_, _, _| {
                Ok(futures::stream::iter([1, 2].map(|n| RuntimeValue::from(json!(n)))).boxed())
            })
            .build()?;
        assert!(ticks.find_resolver("tick").is_none());

        let info = ResolveInfo {
            field_name: "tick".to_string(),
            parent_type: ast::TypeName(mk_name!("Subscription")),
            return_type: ast::Type::named_null(ast::TypeName(mk_name!("Int"))),
            context: None,
        };
        let events = ticks
            .find_subscriber("tick")
            .map(|subscriber| subscriber.call(&RuntimeValue::NULL, &Arguments::new(), &info));
        let Some(Ok(events)) = events else {
            panic!("tick has no working subscriber");
        };
        let events: Vec<_> = futures::executor::block_on(events.collect::<Vec<_>>())
            .into_iter()
            .filter_map(RuntimeValue::into_json)
            .collect();
        assert_eq!(events, vec![json!(1), json!(2)]);
        Ok(())
    }

    #[test]
    fn test_source_and_resolver_conflict_is_reported_on_build() {
        let error = TypeDeclaration::object("User")
            .field(
                "name",
                Field::new(scalars::string())
                    .with_source("full_name")
                    .with_resolver(Resolver::identity()),
            )
            .build()
            .err();
        assert_eq!(
            error,
            Some(Error::ConflictingResolver {
                field_name: "name".to_string()
            })
        );
    }

    #[test]
    fn test_default_resolver_meta() -> anyhow::Result<()> {
        let user = TypeDeclaration::object("User")
            .meta(Meta::new().set(meta::DEFAULT_RESOLVER, MetaValue::Resolver(DefaultResolver::default())))
            .field("name", Field::new(TypeRef::path("String")))
            .build()?;
        assert!(user.options().default_resolver.is_some());
        Ok(())
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        let error = TypeDeclaration::object("Bad Name").build();
        assert!(matches!(error, Err(Error::InvalidName(_))));

        let error = TypeDeclaration::object("User")
            .field("first-name", scalars::string())
            .build();
        assert!(matches!(error, Err(Error::InvalidName(_))));
    }

    #[test]
    fn test_clean_doc() {
        assert_eq!(clean_doc("  One line  "), "One line");
        assert_eq!(
            clean_doc("\n    First\n      indented\n    Last\n\n"),
            "First\n  indented\nLast"
        );
    }
}
