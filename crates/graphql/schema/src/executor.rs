//! Lowering of translated types onto the executor's dynamic schema.
//!
//! Resolvers see [`RuntimeValue`]s: parent values travel through the
//! executor as opaque values and are turned back into output values by
//! [`to_field_value`], which also runs scalar serialization.

use std::convert::Infallible;
use std::sync::Arc;

use async_graphql::dynamic::{
    Field as DynamicField, FieldFuture, FieldValue, InputObject as DynamicInputObject,
    InputValue, Interface as DynamicInterface, InterfaceField, Object as DynamicObject,
    ResolverContext, Scalar as DynamicScalar, Schema as DynamicSchema, Subscription,
    SubscriptionField, SubscriptionFieldFuture, TypeRef as DynamicTypeRef,
};
use async_graphql::{Name as DynamicName, Value};
use futures::StreamExt;
use indexmap::IndexMap;
use lang_graphql::ast::common::{self as ast, BaseTypeContainer, Name, TypeName};
use lang_graphql::ast::value::ConstValue;
use lang_graphql::resolver::{Arguments, ContextValue, ResolveInfo, Resolver, RuntimeValue};
use lang_graphql::schema::{
    DeprecationStatus, Field, InputField, InputObject, Interface, Object, Scalar, TypeInfo,
};

use crate::error::Error;

/// Request data: the value root fields receive as their parent.
pub(crate) struct RootValue(pub RuntimeValue);

/// Request data: the context exposed through [`ResolveInfo::context`].
pub(crate) struct ContextData(pub ContextValue);

/// Translated types by their executor name.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    types: IndexMap<String, Arc<TypeInfo>>,
}

impl Catalog {
    pub fn new(types: impl IntoIterator<Item = Arc<TypeInfo>>) -> Self {
        Self {
            types: types
                .into_iter()
                .map(|type_info| (type_info.name().as_str().to_string(), type_info))
                .collect(),
        }
    }

    pub fn get(&self, name: &TypeName) -> Option<&TypeInfo> {
        self.types.get(name.as_str()).map(AsRef::as_ref)
    }
}

pub(crate) struct Roots<'a> {
    pub query: &'a TypeName,
    pub mutation: Option<&'a TypeName>,
    pub subscription: Option<&'a TypeName>,
}

pub(crate) fn lower(catalog: &Arc<Catalog>, roots: &Roots<'_>) -> Result<DynamicSchema, Error> {
    let mut builder = DynamicSchema::build(
        roots.query.as_str(),
        roots.mutation.map(TypeName::as_str),
        roots.subscription.map(TypeName::as_str),
    );
    for type_info in catalog.types.values() {
        builder = match type_info.as_ref() {
            TypeInfo::Scalar(scalar) if scalar.builtin => continue,
            TypeInfo::Scalar(scalar) => builder.register(lower_scalar(scalar)),
            TypeInfo::Object(object) if Some(&object.name) == roots.subscription => {
                builder.register(lower_subscription(object, catalog))
            }
            TypeInfo::Object(object) => builder.register(lower_object(object, catalog)),
            TypeInfo::Interface(interface) => builder.register(lower_interface(interface)),
            TypeInfo::InputObject(input_object) => {
                builder.register(lower_input_object(input_object))
            }
        };
    }
    builder
        .finish()
        .map_err(|error| Error::Executor(error.to_string()))
}

fn type_ref(field_type: &ast::Type) -> DynamicTypeRef {
    let base = match &field_type.base {
        BaseTypeContainer::Named(name) => DynamicTypeRef::named(name.as_str().to_string()),
        BaseTypeContainer::List(item_type) => DynamicTypeRef::List(Box::new(type_ref(item_type))),
    };
    if field_type.nullable {
        base
    } else {
        DynamicTypeRef::NonNull(Box::new(base))
    }
}

fn lower_scalar(scalar: &Scalar) -> DynamicScalar {
    let behavior = scalar.behavior.clone();
    // the executor validates literals and variables alike; the exact parse
    // runs once the value's origin is known
    let mut lowered = DynamicScalar::new(scalar.name.as_str()).validator(move |value| {
        value.clone().into_json().is_ok_and(|json| {
            behavior
                .parse_literal(&ConstValue::from_json(&json), None)
                .is_some()
                || behavior.parse_value(&json).is_some()
        })
    });
    if let Some(description) = &scalar.description {
        lowered = lowered.description(description);
    }
    lowered
}

fn lower_input_value(input: &InputField) -> InputValue {
    let mut lowered = InputValue::new(input.name.as_str(), type_ref(&input.field_type));
    if let Some(description) = &input.description {
        lowered = lowered.description(description);
    }
    if let Some(default) = input
        .default_value
        .clone()
        .and_then(|default| Value::from_json(default).ok())
    {
        lowered = lowered.default_value(default);
    }
    if let DeprecationStatus::Deprecated { reason } = &input.deprecation_status {
        lowered = lowered.deprecation(reason.as_deref());
    }
    lowered
}

fn lower_input_object(input_object: &InputObject) -> DynamicInputObject {
    let mut lowered = DynamicInputObject::new(input_object.name.as_str());
    if let Some(description) = &input_object.description {
        lowered = lowered.description(description);
    }
    for field in input_object.fields.values() {
        lowered = lowered.field(lower_input_value(field));
    }
    lowered
}

fn lower_interface(interface: &Interface) -> DynamicInterface {
    let mut lowered = DynamicInterface::new(interface.name.as_str());
    if let Some(description) = &interface.description {
        lowered = lowered.description(description);
    }
    for parent in &interface.interfaces {
        lowered = lowered.implement(parent.as_str());
    }
    for field in interface.fields.values() {
        let mut lowered_field = InterfaceField::new(field.name.as_str(), type_ref(&field.field_type));
        if let Some(description) = &field.description {
            lowered_field = lowered_field.description(description);
        }
        if let DeprecationStatus::Deprecated { reason } = &field.deprecation_status {
            lowered_field = lowered_field.deprecation(reason.as_deref());
        }
        for argument in field.arguments.values() {
            lowered_field = lowered_field.argument(lower_input_value(argument));
        }
        lowered = lowered.field(lowered_field);
    }
    lowered
}

fn lower_object(object: &Object, catalog: &Arc<Catalog>) -> DynamicObject {
    let mut lowered = DynamicObject::new(object.name.as_str());
    if let Some(description) = &object.description {
        lowered = lowered.description(description);
    }
    for interface in &object.interfaces {
        lowered = lowered.implement(interface.as_str());
    }
    for field in object.fields.values() {
        lowered = lowered.field(lower_field(&object.name, field, catalog));
    }
    lowered
}

fn lower_field(parent_type: &TypeName, field: &Field, catalog: &Arc<Catalog>) -> DynamicField {
    let site = Arc::new(FieldSite::new(parent_type, field));
    let resolver = field.resolver.clone();
    let catalog = catalog.clone();
    let mut lowered = DynamicField::new(
        field.name.as_str(),
        type_ref(&field.field_type),
        move |ctx| {
            let site = site.clone();
            let resolver = resolver.clone();
            let catalog = catalog.clone();
            FieldFuture::new(async move {
                let parent = parent_value(&ctx);
                let arguments = site.arguments(&ctx, &catalog)?;
                let info = site.resolve_info(&ctx);
                let value = resolver.call(&parent, &arguments, &info)?;
                to_field_value(&catalog, &site.return_type, value)
            })
        },
    );
    if let Some(description) = &field.description {
        lowered = lowered.description(description);
    }
    if let DeprecationStatus::Deprecated { reason } = &field.deprecation_status {
        lowered = lowered.deprecation(reason.as_deref());
    }
    for argument in field.arguments.values() {
        lowered = lowered.argument(lower_input_value(argument));
    }
    lowered
}

fn lower_subscription(object: &Object, catalog: &Arc<Catalog>) -> Subscription {
    let mut lowered = Subscription::new(object.name.as_str());
    if let Some(description) = &object.description {
        lowered = lowered.description(description);
    }
    for field in object.fields.values() {
        let Some(subscriber) = field.subscriber.clone() else {
            tracing::warn!(
                type_name = %object.name,
                field = %field.name,
                "subscription field has no subscriber and is left out"
            );
            continue;
        };
        let site = Arc::new(FieldSite::new(&object.name, field));
        let resolver = field.resolver.clone();
        let catalog = catalog.clone();
        let mut lowered_field = SubscriptionField::new(
            field.name.as_str(),
            type_ref(&field.field_type),
            move |ctx| {
                let site = site.clone();
                let subscriber = subscriber.clone();
                let resolver = resolver.clone();
                let catalog = catalog.clone();
                SubscriptionFieldFuture::new(async move {
                    let parent = parent_value(&ctx);
                    let arguments = site.arguments(&ctx, &catalog)?;
                    let info = site.resolve_info(&ctx);
                    let events = subscriber.call(&parent, &arguments, &info)?;
                    Ok(events.map(move |event| {
                        resolve_event(&catalog, &site, &resolver, &event, &arguments, &info)
                    }))
                })
            },
        );
        if let Some(description) = &field.description {
            lowered_field = lowered_field.description(description);
        }
        if let DeprecationStatus::Deprecated { reason } = &field.deprecation_status {
            lowered_field = lowered_field.deprecation(reason.as_deref());
        }
        for argument in field.arguments.values() {
            lowered_field = lowered_field.argument(lower_input_value(argument));
        }
        lowered = lowered.field(lowered_field);
    }
    lowered
}

/// Passes one subscription event through the field's resolver.
fn resolve_event<'v>(
    catalog: &Catalog,
    site: &FieldSite,
    resolver: &Resolver,
    event: &RuntimeValue,
    arguments: &Arguments,
    info: &ResolveInfo,
) -> async_graphql::Result<FieldValue<'v>> {
    let value = resolver.call(event, arguments, info)?;
    Ok(to_field_value(catalog, &site.return_type, value)?.unwrap_or(FieldValue::NULL))
}

/// What a lowered field knows about itself at resolution time.
struct FieldSite {
    field_name: String,
    parent_type: TypeName,
    return_type: ast::Type,
    arguments: IndexMap<Name, InputField>,
}

impl FieldSite {
    fn new(parent_type: &TypeName, field: &Field) -> Self {
        Self {
            field_name: field.name.as_str().to_string(),
            parent_type: parent_type.clone(),
            return_type: field.field_type.clone(),
            arguments: field.arguments.clone(),
        }
    }

    /// Collects the declared arguments of the request, running scalar parsing
    /// on them. Omitted arguments fall back to their default.
    fn arguments(
        &self,
        ctx: &ResolverContext<'_>,
        catalog: &Catalog,
    ) -> async_graphql::Result<Arguments> {
        let provided = ctx.args.as_index_map();
        let mut arguments = Arguments::new();
        for (name, argument) in &self.arguments {
            let document = document_argument(ctx, name.as_str());
            let (value, origin) = match provided.get(name.as_str()) {
                Some(value) => (value.clone().into_json()?, Origin::of(document.as_ref())),
                None => match &argument.default_value {
                    Some(default) => (default.clone(), Origin::Variables),
                    None => continue,
                },
            };
            arguments.insert(
                argument.key.clone(),
                coerce_input(catalog, &argument.field_type, value, origin)?,
            );
        }
        Ok(arguments)
    }

    fn resolve_info(&self, ctx: &ResolverContext<'_>) -> ResolveInfo {
        ResolveInfo {
            field_name: self.field_name.clone(),
            parent_type: self.parent_type.clone(),
            return_type: self.return_type.clone(),
            context: ctx
                .ctx
                .data_opt::<ContextData>()
                .map(|context| context.0.clone()),
        }
    }
}

/// The parent value of the field being resolved. Root fields get the request's
/// root value.
fn parent_value(ctx: &ResolverContext<'_>) -> RuntimeValue {
    ctx.parent_value
        .downcast_ref::<RuntimeValue>()
        .cloned()
        .or_else(|| ctx.ctx.data_opt::<RootValue>().map(|root| root.0.clone()))
        .unwrap_or_default()
}

/// Key of the object standing in for a variable reference in a document
/// value. `$` cannot start a GraphQL name, so no literal object carries it.
const VARIABLE_MARKER: &str = "$variable";

/// The argument `name` as written in the query document, with every variable
/// reference replaced by a marker object.
fn document_argument(ctx: &ResolverContext<'_>, name: &str) -> Option<Value> {
    let written = ctx.ctx.item.node.get_argument(name)?;
    written
        .node
        .clone()
        .into_const_with(|variable| {
            Ok::<_, Infallible>(Value::Object(
                [(
                    DynamicName::new(VARIABLE_MARKER),
                    Value::String(variable.to_string()),
                )]
                .into_iter()
                .collect(),
            ))
        })
        .ok()
}

/// Where an input value came from, which decides how its scalars parse it.
#[derive(Debug, Clone, Copy)]
enum Origin<'a> {
    /// Written in the query document; scalars use `parse_literal`.
    Document(&'a Value),
    /// Request variables or declared defaults, already in their JSON form;
    /// scalars use `parse_value`.
    Variables,
}

impl<'a> Origin<'a> {
    fn of(document: Option<&'a Value>) -> Self {
        match document {
            Some(Value::Object(fields))
                if fields.len() == 1
                    && fields.keys().all(|key| key.as_str() == VARIABLE_MARKER) =>
            {
                Origin::Variables
            }
            Some(document) => Origin::Document(document),
            None => Origin::Variables,
        }
    }

    fn item(self, index: usize) -> Self {
        match self {
            Origin::Document(Value::List(items)) => Origin::of(items.get(index)),
            other => other,
        }
    }

    fn field(self, name: &str) -> Self {
        match self {
            Origin::Document(Value::Object(fields)) => Origin::of(
                fields
                    .iter()
                    .find(|(key, _)| key.as_str() == name)
                    .map(|(_, value)| value),
            ),
            _ => Origin::Variables,
        }
    }
}

/// Runs scalar parsing over an input value, following list and input object
/// structure, and rekeys input object fields by their declared key. Omitted
/// input object fields take their default. A scalar that cannot represent its
/// value fails the argument.
fn coerce_input(
    catalog: &Catalog,
    input_type: &ast::Type,
    value: serde_json::Value,
    origin: Origin<'_>,
) -> async_graphql::Result<serde_json::Value> {
    if value.is_null() {
        return Ok(value);
    }
    match (&input_type.base, value) {
        (BaseTypeContainer::List(item_type), serde_json::Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| coerce_input(catalog, item_type, item, origin.item(index)))
            .collect::<async_graphql::Result<Vec<_>>>()
            .map(serde_json::Value::Array),
        // a single value given for a list is a list of one
        (BaseTypeContainer::List(item_type), value) => coerce_input(catalog, item_type, value, origin)
            .map(|item| serde_json::Value::Array(vec![item])),
        (BaseTypeContainer::Named(type_name), value) => match catalog.get(type_name) {
            Some(TypeInfo::Scalar(scalar)) => {
                let parsed = match origin {
                    Origin::Document(_) => scalar.parse_literal(&ConstValue::from_json(&value), None),
                    Origin::Variables => scalar.parse_value(&value),
                };
                parsed.ok_or_else(|| {
                    async_graphql::Error::new(format!("invalid value for {type_name}: {value}"))
                })
            }
            Some(TypeInfo::InputObject(input_object)) => match value {
                serde_json::Value::Object(fields) => {
                    let mut coerced = fields
                        .into_iter()
                        .map(|(name, field_value)| -> async_graphql::Result<_> {
                            match input_object
                                .fields
                                .values()
                                .find(|field| field.name.as_str() == name)
                            {
                                Some(field) => Ok((
                                    field.key.clone(),
                                    coerce_input(
                                        catalog,
                                        &field.field_type,
                                        field_value,
                                        origin.field(&name),
                                    )?,
                                )),
                                None => Ok((name, field_value)),
                            }
                        })
                        .collect::<async_graphql::Result<serde_json::Map<_, _>>>()?;
                    for field in input_object.fields.values() {
                        if coerced.contains_key(&field.key) {
                            continue;
                        }
                        if let Some(default) = &field.default_value {
                            let default = coerce_input(
                                catalog,
                                &field.field_type,
                                default.clone(),
                                Origin::Variables,
                            )?;
                            coerced.insert(field.key.clone(), default);
                        }
                    }
                    Ok(serde_json::Value::Object(coerced))
                }
                other => Ok(other),
            },
            _ => Ok(value),
        },
    }
}

/// Converts a resolved value into the executor's representation of a value of
/// `field_type`. `None` is null.
pub(crate) fn to_field_value<'a>(
    catalog: &Catalog,
    field_type: &ast::Type,
    value: RuntimeValue,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    if value.is_null() {
        return Ok(None);
    }
    match &field_type.base {
        BaseTypeContainer::List(item_type) => {
            let items = match value {
                RuntimeValue::List(items) => items,
                RuntimeValue::Json(serde_json::Value::Array(items)) => {
                    items.into_iter().map(RuntimeValue::Json).collect()
                }
                other => {
                    return Err(async_graphql::Error::new(format!(
                        "expected a list for {field_type}, got a {} value",
                        other.kind()
                    )))
                }
            };
            let items = items
                .into_iter()
                .map(|item| {
                    Ok(to_field_value(catalog, item_type, item)?.unwrap_or(FieldValue::NULL))
                })
                .collect::<async_graphql::Result<Vec<_>>>()?;
            Ok(Some(FieldValue::list(items)))
        }
        BaseTypeContainer::Named(type_name) => match catalog.get(type_name) {
            Some(TypeInfo::Scalar(scalar)) => {
                let json = value.into_json().ok_or_else(|| {
                    async_graphql::Error::new(format!(
                        "an object cannot be serialized as scalar {type_name}"
                    ))
                })?;
                match scalar.serialize(&json) {
                    Some(serialized) => Ok(Some(FieldValue::value(Value::from_json(serialized)?))),
                    None => Ok(None),
                }
            }
            Some(TypeInfo::Interface(_)) => {
                let concrete = value.type_name().ok_or_else(|| {
                    async_graphql::Error::new(format!(
                        "could not determine the concrete type of a {type_name} value"
                    ))
                })?;
                Ok(Some(FieldValue::owned_any(value).with_type(concrete)))
            }
            Some(TypeInfo::Object(_) | TypeInfo::InputObject(_)) => {
                Ok(Some(FieldValue::owned_any(value)))
            }
            None => Err(async_graphql::Error::new(format!(
                "type {type_name} is not part of the schema"
            ))),
        },
    }
}
