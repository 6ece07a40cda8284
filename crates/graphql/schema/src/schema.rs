use std::any::Any;
use std::fmt;
use std::sync::Arc;

use futures::stream::BoxStream;
use futures::StreamExt;
use lang_graphql::ast::common::{OperationType, TypeName};
use lang_graphql::resolver::{ContextValue, RuntimeValue};
use lang_graphql::schema::TypeInfo;
use serde::Serialize;
use tracing_util::{global_tracer, SpanVisibility, Successful};

use graphql_typedefs::{DeclaredType, TypeKind, TypeRef};

use crate::container::TypesContainer;
use crate::error::Error;
use crate::executor::{self, Catalog, ContextData, RootValue, Roots};

/// Configures and builds a [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    query: DeclaredType,
    mutation: Option<DeclaredType>,
    subscription: Option<DeclaredType>,
    types: Vec<DeclaredType>,
    auto_camelcase: bool,
}

impl SchemaBuilder {
    #[must_use]
    pub fn mutation(mut self, mutation: &DeclaredType) -> Self {
        self.mutation = Some(mutation.clone());
        self
    }

    #[must_use]
    pub fn subscription(mut self, subscription: &DeclaredType) -> Self {
        self.subscription = Some(subscription.clone());
        self
    }

    /// Types that are part of the schema even if no root reaches them, such as
    /// implementations of an interface.
    #[must_use]
    pub fn types<'a>(mut self, types: impl IntoIterator<Item = &'a DeclaredType>) -> Self {
        self.types.extend(types.into_iter().cloned());
        self
    }

    /// Camel-cases field and argument names. Off by default.
    #[must_use]
    pub fn auto_camelcase(mut self, auto_camelcase: bool) -> Self {
        self.auto_camelcase = auto_camelcase;
        self
    }

    pub fn build(self) -> Result<Schema, Error> {
        global_tracer().in_span(
            "build_schema",
            format!("Build schema with query root {}", self.query).into(),
            SpanVisibility::User,
            || self.build_schema(),
        )
    }

    fn build_schema(self) -> Result<Schema, Error> {
        check_root(OperationType::Query, &self.query)?;
        if let Some(mutation) = &self.mutation {
            check_root(OperationType::Mutation, mutation)?;
        }
        if let Some(subscription) = &self.subscription {
            check_root(OperationType::Subscription, subscription)?;
        }

        let mut container = TypesContainer::new(self.auto_camelcase);
        for declared in &self.types {
            container.add_to_self(Some(&TypeRef::from(declared)))?;
        }
        let query_type = register_root(&mut container, &self.query)?;
        let mutation_type = self
            .mutation
            .as_ref()
            .map(|mutation| register_root(&mut container, mutation))
            .transpose()?;
        let subscription_type = self
            .subscription
            .as_ref()
            .map(|subscription| register_root(&mut container, subscription))
            .transpose()?;
        container.translate_pending()?;

        let catalog = Arc::new(Catalog::new(container.types().cloned()));
        let executable = executor::lower(
            &catalog,
            &Roots {
                query: &query_type,
                mutation: mutation_type.as_ref(),
                subscription: subscription_type.as_ref(),
            },
        )?;
        Ok(Schema {
            container,
            executable,
            query_type,
            mutation_type,
            subscription_type,
        })
    }
}

fn check_root(operation: OperationType, root: &DeclaredType) -> Result<(), Error> {
    if root.kind() == TypeKind::Object {
        Ok(())
    } else {
        Err(Error::NotAnObjectType {
            operation,
            name: root.name().to_string(),
        })
    }
}

fn register_root(container: &mut TypesContainer, root: &DeclaredType) -> Result<TypeName, Error> {
    let native = container
        .add_to_self(Some(&TypeRef::from(root)))?
        .ok_or_else(|| Error::Internal(format!("root {root} has no native type")))?;
    Ok(native.underlying_type().clone())
}

/// A built schema, ready to execute operations.
pub struct Schema {
    container: TypesContainer,
    executable: async_graphql::dynamic::Schema,
    query_type: TypeName,
    mutation_type: Option<TypeName>,
    subscription_type: Option<TypeName>,
}

impl Schema {
    pub fn builder(query: &DeclaredType) -> SchemaBuilder {
        SchemaBuilder {
            query: query.clone(),
            mutation: None,
            subscription: None,
            types: Vec::new(),
            auto_camelcase: false,
        }
    }

    pub fn query_type(&self) -> &TypeName {
        &self.query_type
    }

    pub fn mutation_type(&self) -> Option<&TypeName> {
        self.mutation_type.as_ref()
    }

    pub fn subscription_type(&self) -> Option<&TypeName> {
        self.subscription_type.as_ref()
    }

    pub fn container(&self) -> &TypesContainer {
        &self.container
    }

    /// The translated type the executor knows as `name`.
    pub fn native_type(&self, name: &str) -> Option<Arc<TypeInfo>> {
        self.container
            .types()
            .find(|type_info| type_info.name().as_str() == name)
            .cloned()
    }

    /// Executes `query`, blocking the current thread until it completes.
    pub fn execute(&self, query: &str, options: ExecuteOptions) -> ExecutionResult {
        futures::executor::block_on(self.execute_async(query, options))
    }

    pub async fn execute_async(&self, query: &str, options: ExecuteOptions) -> ExecutionResult {
        let request = options.into_request(query);
        let tracer = global_tracer();
        tracer
            .in_span_async(
                "execute",
                "Execute GraphQL operation".to_string(),
                SpanVisibility::User,
                || {
                    Box::pin(async move {
                        let response = self.executable.execute(request).await;
                        Successful::new(ExecutionResult::from(response))
                    })
                },
            )
            .await
            .into_inner()
    }

    /// Executes a subscription operation, yielding one result per event.
    pub fn subscribe(&self, query: &str, options: ExecuteOptions) -> BoxStream<'_, ExecutionResult> {
        let request = options.into_request(query);
        global_tracer()
            .in_span(
                "subscribe",
                "Subscribe to GraphQL operation".into(),
                SpanVisibility::User,
                || {
                    Successful::new(
                        self.executable
                            .execute_stream(request)
                            .map(ExecutionResult::from)
                            .boxed(),
                    )
                },
            )
            .into_inner()
    }

    /// The schema in GraphQL schema definition language.
    pub fn sdl(&self) -> String {
        self.executable.sdl()
    }

    /// Runs the standard introspection query.
    pub fn introspect(&self) -> Result<serde_json::Value, Error> {
        let result = self.execute(INTROSPECTION_QUERY, ExecuteOptions::default());
        if !result.errors.is_empty() {
            return Err(Error::IntrospectionFailed {
                errors: result.errors.into_iter().map(|error| error.message).collect(),
            });
        }
        result
            .data
            .ok_or_else(|| Error::Internal("introspection returned no data".to_string()))
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sdl())
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("query_type", &self.query_type)
            .field("mutation_type", &self.mutation_type)
            .field("subscription_type", &self.subscription_type)
            .field("container", &self.container)
            .finish_non_exhaustive()
    }
}

/// Per-request inputs of an execution.
#[derive(Clone, Default)]
pub struct ExecuteOptions {
    variables: Option<serde_json::Value>,
    context: Option<ContextValue>,
    root: Option<RuntimeValue>,
    operation_name: Option<String>,
}

impl ExecuteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operation variables, as a JSON object.
    #[must_use]
    pub fn variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = Some(variables);
        self
    }

    /// A value every resolver can read through `ResolveInfo::context`.
    #[must_use]
    pub fn context<T: Any + Send + Sync>(mut self, context: T) -> Self {
        self.context = Some(Arc::new(context));
        self
    }

    /// The parent value of root fields.
    #[must_use]
    pub fn root(mut self, root: impl Into<RuntimeValue>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Selects the operation to run when the document has several.
    #[must_use]
    pub fn operation_name(mut self, operation_name: impl Into<String>) -> Self {
        self.operation_name = Some(operation_name.into());
        self
    }

    fn into_request(self, query: &str) -> async_graphql::Request {
        let mut request = async_graphql::Request::new(query);
        if let Some(variables) = self.variables {
            request = request.variables(async_graphql::Variables::from_json(variables));
        }
        if let Some(operation_name) = self.operation_name {
            request = request.operation_name(operation_name);
        }
        if let Some(context) = self.context {
            request = request.data(ContextData(context));
        }
        if let Some(root) = self.root {
            request = request.data(RootValue(root));
        }
        request
    }
}

impl fmt::Debug for ExecuteOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecuteOptions")
            .field("variables", &self.variables)
            .field("has_context", &self.context.is_some())
            .field("root", &self.root)
            .field("operation_name", &self.operation_name)
            .finish()
    }
}

/// The outcome of an execution: the data, if any was produced, and the errors
/// raised along the way.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ExecutionError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionError {
    pub message: String,
    /// Where in the response the error happened.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

impl From<async_graphql::PathSegment> for PathSegment {
    fn from(segment: async_graphql::PathSegment) -> Self {
        match segment {
            async_graphql::PathSegment::Field(name) => PathSegment::Field(name),
            async_graphql::PathSegment::Index(index) => PathSegment::Index(index),
        }
    }
}

impl From<async_graphql::Response> for ExecutionResult {
    fn from(response: async_graphql::Response) -> Self {
        let errors: Vec<ExecutionError> = response
            .errors
            .into_iter()
            .map(|error| ExecutionError {
                message: error.message,
                path: error.path.into_iter().map(PathSegment::from).collect(),
            })
            .collect();
        let mut data = response.data.into_json().ok().filter(|data| !data.is_null());
        if let Some(data) = &mut data {
            for error in &errors {
                null_errored_field(data, &error.path);
            }
        }
        ExecutionResult { data, errors }
    }
}

/// Sets the field at `path` to null when its parent object is in `data` but
/// the field itself is missing, as happens for nullable fields whose resolver
/// failed.
fn null_errored_field(data: &mut serde_json::Value, path: &[PathSegment]) {
    let Some((PathSegment::Field(field), parents)) = path.split_last() else {
        return;
    };
    let mut parent = data;
    for segment in parents {
        let next = match segment {
            PathSegment::Field(name) => parent.get_mut(name.as_str()),
            PathSegment::Index(index) => parent.get_mut(*index),
        };
        match next {
            Some(next) => parent = next,
            None => return,
        }
    }
    if let serde_json::Value::Object(fields) = parent {
        fields
            .entry(field.clone())
            .or_insert(serde_json::Value::Null);
    }
}

const INTROSPECTION_QUERY: &str = r"
query IntrospectionQuery {
  __schema {
    queryType { name }
    mutationType { name }
    subscriptionType { name }
    types { ...FullType }
    directives {
      name
      description
      locations
      args { ...InputValue }
    }
  }
}

fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args { ...InputValue }
    type { ...TypeRef }
    isDeprecated
    deprecationReason
  }
  inputFields { ...InputValue }
  interfaces { ...TypeRef }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes { ...TypeRef }
}

fragment InputValue on __InputValue {
  name
  description
  type { ...TypeRef }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
          }
        }
      }
    }
  }
}
";
