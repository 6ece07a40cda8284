//! The runtime side of a native field: the values resolvers receive and
//! return, and the function types the executor calls.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::stream::BoxStream;
use indexmap::IndexMap;

use crate::ast::common as ast;

/// Field arguments after input coercion, keyed by their declared key.
pub type Arguments = IndexMap<String, serde_json::Value>;

/// The per-request context value, available to every resolver.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// The event stream produced by a subscriber.
pub type EventStream = BoxStream<'static, RuntimeValue>;

/// A value whose fields are read by name, like an instance with attributes.
pub trait Attributes: fmt::Debug + Send + Sync {
    fn attribute(&self, name: &str) -> Option<RuntimeValue>;

    /// The GraphQL type this value belongs to, used to pick the concrete type
    /// of an interface-typed field.
    fn type_name(&self) -> Option<&str> {
        None
    }
}

/// A value flowing through resolvers.
#[derive(Clone, Debug)]
pub enum RuntimeValue {
    /// Plain data. JSON objects are mappings, read by key.
    Json(serde_json::Value),
    /// An attribute source, read by attribute name.
    Object(Arc<dyn Attributes>),
    List(Vec<RuntimeValue>),
}

impl Default for RuntimeValue {
    fn default() -> Self {
        RuntimeValue::NULL
    }
}

impl From<serde_json::Value> for RuntimeValue {
    fn from(value: serde_json::Value) -> Self {
        RuntimeValue::Json(value)
    }
}

impl From<Vec<RuntimeValue>> for RuntimeValue {
    fn from(values: Vec<RuntimeValue>) -> Self {
        RuntimeValue::List(values)
    }
}

impl RuntimeValue {
    pub const NULL: RuntimeValue = RuntimeValue::Json(serde_json::Value::Null);

    pub fn object(value: impl Attributes + 'static) -> Self {
        RuntimeValue::Object(Arc::new(value))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, RuntimeValue::Json(serde_json::Value::Null))
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self, RuntimeValue::Json(serde_json::Value::Object(_)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeValue::Json(serde_json::Value::Null) => "null",
            RuntimeValue::Json(serde_json::Value::Bool(_)) => "boolean",
            RuntimeValue::Json(serde_json::Value::Number(_)) => "number",
            RuntimeValue::Json(serde_json::Value::String(_)) => "string",
            RuntimeValue::Json(serde_json::Value::Array(_)) | RuntimeValue::List(_) => "list",
            RuntimeValue::Json(serde_json::Value::Object(_)) => "mapping",
            RuntimeValue::Object(_) => "object",
        }
    }

    /// Key lookup on a mapping. `None` when the value is not a mapping or the
    /// key is absent.
    pub fn get_key(&self, key: &str) -> Option<RuntimeValue> {
        match self {
            RuntimeValue::Json(serde_json::Value::Object(fields)) => {
                fields.get(key).cloned().map(RuntimeValue::Json)
            }
            _ => None,
        }
    }

    /// Attribute lookup on an attribute source.
    pub fn get_attribute(&self, name: &str) -> Option<RuntimeValue> {
        match self {
            RuntimeValue::Object(object) => object.attribute(name),
            _ => None,
        }
    }

    /// The concrete GraphQL type name carried by the value, either from the
    /// attribute source or from a `__typename` key.
    pub fn type_name(&self) -> Option<String> {
        match self {
            RuntimeValue::Object(object) => object.type_name().map(str::to_string),
            RuntimeValue::Json(serde_json::Value::Object(fields)) => fields
                .get("__typename")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string),
            _ => None,
        }
    }

    /// The value as plain JSON. Attribute sources have no JSON form.
    pub fn into_json(self) -> Option<serde_json::Value> {
        match self {
            RuntimeValue::Json(value) => Some(value),
            RuntimeValue::List(values) => values
                .into_iter()
                .map(RuntimeValue::into_json)
                .collect::<Option<Vec<_>>>()
                .map(serde_json::Value::Array),
            RuntimeValue::Object(_) => None,
        }
    }
}

/// An error raised by a resolver; reported in the execution result at the
/// field's path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FieldError {
    pub message: String,
}

impl FieldError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// What a resolver knows about the field being resolved.
#[derive(Clone)]
pub struct ResolveInfo {
    pub field_name: String,
    pub parent_type: ast::TypeName,
    pub return_type: ast::Type,
    pub context: Option<ContextValue>,
}

impl ResolveInfo {
    /// The request context, if one was supplied and it has type `T`.
    pub fn context<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.context.as_deref()?.downcast_ref::<T>()
    }
}

impl fmt::Debug for ResolveInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveInfo")
            .field("field_name", &self.field_name)
            .field("parent_type", &self.parent_type)
            .field("return_type", &self.return_type)
            .field("has_context", &self.context.is_some())
            .finish()
    }
}

type ResolverFn =
    dyn Fn(&RuntimeValue, &Arguments, &ResolveInfo) -> Result<RuntimeValue, FieldError> + Send + Sync;

/// Computes the value of a field from its parent value and arguments.
#[derive(Clone)]
pub struct Resolver(Arc<ResolverFn>);

impl Resolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RuntimeValue, &Arguments, &ResolveInfo) -> Result<RuntimeValue, FieldError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Returns the parent value unchanged; used for fields whose value comes
    /// from a subscription event.
    pub fn identity() -> Self {
        Self::new(|parent, _, _| Ok(parent.clone()))
    }

    pub fn call(
        &self,
        parent: &RuntimeValue,
        arguments: &Arguments,
        info: &ResolveInfo,
    ) -> Result<RuntimeValue, FieldError> {
        (self.0)(parent, arguments, info)
    }

    pub fn ptr_eq(&self, other: &Resolver) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Resolver(..)")
    }
}

type SubscriberFn =
    dyn Fn(&RuntimeValue, &Arguments, &ResolveInfo) -> Result<EventStream, FieldError> + Send + Sync;

/// Produces the event stream of a subscription field. Each event is then
/// passed to the field's resolver as its parent value.
#[derive(Clone)]
pub struct Subscriber(Arc<SubscriberFn>);

impl Subscriber {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&RuntimeValue, &Arguments, &ResolveInfo) -> Result<EventStream, FieldError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(
        &self,
        parent: &RuntimeValue,
        arguments: &Arguments,
        info: &ResolveInfo,
    ) -> Result<EventStream, FieldError> {
        (self.0)(parent, arguments, info)
    }

    pub fn ptr_eq(&self, other: &Subscriber) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Subscriber(..)")
    }
}

/// Reads `name` as an attribute of `parent`, falling back to `default`.
pub fn attr_resolver(
    name: &str,
    default: Option<&serde_json::Value>,
    parent: &RuntimeValue,
) -> RuntimeValue {
    parent
        .get_attribute(name)
        .or_else(|| default.cloned().map(RuntimeValue::Json))
        .unwrap_or_default()
}

/// Reads `name` as a key of the `parent` mapping, falling back to `default`.
pub fn dict_resolver(
    name: &str,
    default: Option<&serde_json::Value>,
    parent: &RuntimeValue,
) -> RuntimeValue {
    parent
        .get_key(name)
        .or_else(|| default.cloned().map(RuntimeValue::Json))
        .unwrap_or_default()
}

/// Key lookup for mappings, attribute lookup for everything else.
pub fn dict_or_attr_resolver(
    name: &str,
    default: Option<&serde_json::Value>,
    parent: &RuntimeValue,
) -> RuntimeValue {
    if parent.is_mapping() {
        dict_resolver(name, default, parent)
    } else {
        attr_resolver(name, default, parent)
    }
}

type DefaultResolverFn = dyn Fn(
        &str,
        Option<&serde_json::Value>,
        &RuntimeValue,
        &Arguments,
        &ResolveInfo,
    ) -> Result<RuntimeValue, FieldError>
    + Send
    + Sync;

/// The resolver used for fields that have no resolver of their own. It
/// receives the field's attribute name and default value.
#[derive(Clone)]
pub struct DefaultResolver(Arc<DefaultResolverFn>);

impl DefaultResolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(
                &str,
                Option<&serde_json::Value>,
                &RuntimeValue,
                &Arguments,
                &ResolveInfo,
            ) -> Result<RuntimeValue, FieldError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(f))
    }

    /// Fixes the attribute name and default value, producing a field resolver.
    pub fn bind(&self, name: &str, default: Option<serde_json::Value>) -> Resolver {
        let inner = self.0.clone();
        let name = name.to_string();
        Resolver::new(move |parent, arguments, info| {
            inner(&name, default.as_ref(), parent, arguments, info)
        })
    }
}

impl Default for DefaultResolver {
    fn default() -> Self {
        Self::new(|name, default, parent, _, _| Ok(dict_or_attr_resolver(name, default, parent)))
    }
}

impl fmt::Debug for DefaultResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultResolver(..)")
    }
}
