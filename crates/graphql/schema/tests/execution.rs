use graphql_schema::{ExecuteOptions, PathSegment, Schema};
use graphql_typedefs::{
    scalars, Argument, DefaultResolver, FieldError, FieldOptions, ImplicitField, Meta, Record,
    Structure, TypeDeclaration,
};
use indexmap::IndexMap;
use lang_graphql::resolver::{Attributes, RuntimeValue};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_query_resolves_nested_objects() -> anyhow::Result<()> {
    let user = TypeDeclaration::object("User")
        .field("name", scalars::string())
        .build()?;
    let query = TypeDeclaration::object("Query")
        .field("user", &user)
        .resolve("user", |_, _, _| Ok(json!({"name": "Alice"}).into()))
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let result = schema.execute("{ user { name } }", ExecuteOptions::default());
    assert_eq!(result.data, Some(json!({"user": {"name": "Alice"}})));
    assert!(result.errors.is_empty());
    Ok(())
}

#[test]
fn test_type_resolver_wins_over_the_default_even_with_arguments() -> anyhow::Result<()> {
    let query = TypeDeclaration::object("Query")
        .field(
            "name",
            ImplicitField::new(scalars::string()).with_arg("greeting", scalars::string()),
        )
        .resolve("name", |_, args, _| {
            let greeting = args
                .get("greeting")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Hello");
            Ok(json!(format!("{greeting} World")).into())
        })
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let options = ExecuteOptions::new().root(json!({"name": "from the root"}));
    let result = schema.execute(r#"{ name(greeting: "Hi") }"#, options.clone());
    assert_eq!(result.data, Some(json!({"name": "Hi World"})));

    let result = schema.execute("{ name }", options);
    assert_eq!(result.data, Some(json!({"name": "Hello World"})));
    Ok(())
}

#[test]
fn test_required_fields_are_non_null() -> anyhow::Result<()> {
    let query = TypeDeclaration::object("Query")
        .field("name", ImplicitField::new(scalars::string()).required())
        .field("tags", ImplicitField::new(Structure::list(scalars::string())?).required())
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let query_type = schema.native_type("Query");
    let field_types: Vec<_> = query_type
        .iter()
        .filter_map(|query_type| query_type.fields())
        .flat_map(|fields| fields.values().map(|field| field.field_type.to_string()))
        .collect();
    assert_eq!(field_types, vec!["String!", "[String]!"]);

    let result = schema.execute("{ name }", ExecuteOptions::new().root(json!({})));
    assert_eq!(result.data, None);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].path,
        vec![PathSegment::Field("name".to_string())]
    );
    Ok(())
}

#[test]
fn test_resolver_errors_are_reported_at_their_path() -> anyhow::Result<()> {
    let query = TypeDeclaration::object("Query")
        .field("ok", scalars::string())
        .field("broken", scalars::string())
        .resolve("ok", |_, _, _| Ok(json!("fine").into()))
        .resolve("broken", |_, _, _| Err(FieldError::new("boom")))
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let result = schema.execute("{ ok broken }", ExecuteOptions::default());
    assert_eq!(result.data, Some(json!({"ok": "fine", "broken": null})));
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].message, "boom");
    assert_eq!(
        result.errors[0].path,
        vec![PathSegment::Field("broken".to_string())]
    );
    Ok(())
}

#[derive(Debug)]
struct Viewer {
    id: &'static str,
}

#[test]
fn test_root_value_and_context_reach_resolvers() -> anyhow::Result<()> {
    let query = TypeDeclaration::object("Query")
        .field("greeting", scalars::string())
        .field("viewer", scalars::id())
        .resolve("viewer", |_, _, info| {
            info.context::<Viewer>()
                .map(|viewer| json!(viewer.id).into())
                .ok_or_else(|| FieldError::new("no viewer"))
        })
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let options = ExecuteOptions::new()
        .root(json!({"greeting": "hello"}))
        .context(Viewer { id: "u1" });
    let result = schema.execute("{ greeting viewer }", options);
    assert_eq!(result.data, Some(json!({"greeting": "hello", "viewer": "u1"})));

    let result = schema.execute("{ viewer }", ExecuteOptions::default());
    assert_eq!(result.errors.first().map(|error| error.message.as_str()), Some("no viewer"));
    Ok(())
}

#[test]
fn test_operation_name_selects_the_operation() -> anyhow::Result<()> {
    let query = TypeDeclaration::object("Query")
        .field("first", scalars::string())
        .field("second", scalars::string())
        .build()?;
    let schema = Schema::builder(&query).build()?;
    let document = "query First { first } query Second { second }";
    let root = json!({"first": "one", "second": "two"});

    let result = schema.execute(
        document,
        ExecuteOptions::new().root(root.clone()).operation_name("Second"),
    );
    assert_eq!(result.data, Some(json!({"second": "two"})));

    let result = schema.execute(document, ExecuteOptions::new().root(root));
    assert!(!result.errors.is_empty());
    Ok(())
}

#[test]
fn test_variables_are_passed_as_arguments() -> anyhow::Result<()> {
    let query = TypeDeclaration::object("Query")
        .field(
            "double",
            ImplicitField::new(scalars::integer())
                .with_arg("n", Argument::new(scalars::integer()).required()),
        )
        .resolve("double", |_, args, _| {
            let n = args.get("n").and_then(serde_json::Value::as_i64).unwrap_or_default();
            Ok(json!(n * 2).into())
        })
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let result = schema.execute(
        "query Double($n: Int!) { double(n: $n) }",
        ExecuteOptions::new().variables(json!({"n": 21})),
    );
    assert_eq!(result.data, Some(json!({"double": 42})));
    Ok(())
}

#[tokio::test]
async fn test_execute_async() -> anyhow::Result<()> {
    let query = TypeDeclaration::object("Query")
        .field("hello", scalars::string())
        .resolve("hello", |_, _, _| Ok(json!("world").into()))
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let result = schema
        .execute_async("{ hello }", ExecuteOptions::default())
        .await;
    assert_eq!(result.data, Some(json!({"hello": "world"})));
    Ok(())
}

#[test]
fn test_meta_default_resolver_and_field_sources() -> anyhow::Result<()> {
    let shout = DefaultResolver::new(|name, _, _, _, _| Ok(json!(name.to_uppercase()).into()));
    let loud = TypeDeclaration::object("Loud")
        .meta(Meta::new().set("default_resolver", shout))
        .field("hello", scalars::string())
        .build()?;
    let query = TypeDeclaration::object("Query")
        .field("loud", &loud)
        .field("full_name", ImplicitField::new(scalars::string()).with_source("name"))
        .field("nickname", ImplicitField::new(scalars::string()).with_default(json!("none")))
        .resolve("loud", |_, _, _| Ok(json!({}).into()))
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let result = schema.execute(
        "{ loud { hello } full_name nickname }",
        ExecuteOptions::new().root(json!({"name": "Alice"})),
    );
    assert_eq!(
        result.data,
        Some(json!({"loud": {"hello": "HELLO"}, "full_name": "Alice", "nickname": "none"}))
    );
    Ok(())
}

#[test]
fn test_input_object_arguments() -> anyhow::Result<()> {
    let filter = TypeDeclaration::input_object("UserFilter")
        .field("prefix", ImplicitField::new(scalars::string()).required())
        .field("limit", scalars::integer())
        .build()?;
    let query = TypeDeclaration::object("Query")
        .field(
            "echo",
            ImplicitField::new(scalars::generic()).with_arg("filter", Argument::new(&filter)),
        )
        .resolve("echo", |_, args, _| {
            Ok(args.get("filter").cloned().unwrap_or_default().into())
        })
        .build()?;
    let schema = Schema::builder(&query).build()?;

    let result = schema.execute(
        r#"{ echo(filter: {prefix: "a", limit: 3}) }"#,
        ExecuteOptions::default(),
    );
    assert_eq!(result.data, Some(json!({"echo": {"prefix": "a", "limit": 3}})));

    let result = schema.execute("{ echo(filter: {limit: 3}) }", ExecuteOptions::default());
    assert!(!result.errors.is_empty());
    Ok(())
}

#[test]
fn test_omitted_input_object_fields_take_their_default() -> anyhow::Result<()> {
    let filter = TypeDeclaration::input_object("PageFilter")
        .field("prefix", ImplicitField::new(scalars::string()).required())
        .field("limit", ImplicitField::new(scalars::integer()).with_default(json!(10)))
        .build()?;
    let query = TypeDeclaration::object("Query")
        .field(
            "echo",
            ImplicitField::new(scalars::generic()).with_arg("filter", Argument::new(&filter)),
        )
        .resolve("echo", |_, args, _| {
            Ok(args.get("filter").cloned().unwrap_or_default().into())
        })
        .build()?;
    let schema = Schema::builder(&query).build()?;
    assert!(schema.sdl().contains("limit: Int = 10"), "{}", schema.sdl());

    let result = schema.execute(r#"{ echo(filter: {prefix: "a"}) }"#, ExecuteOptions::default());
    assert_eq!(result.data, Some(json!({"echo": {"prefix": "a", "limit": 10}})));

    let result = schema.execute(
        "query Echo($filter: PageFilter) { echo(filter: $filter) }",
        ExecuteOptions::new().variables(json!({"filter": {"prefix": "b", "limit": 2}})),
    );
    assert_eq!(result.data, Some(json!({"echo": {"prefix": "b", "limit": 2}})));
    Ok(())
}

#[derive(Debug)]
struct Cat {
    name: String,
}

impl Attributes for Cat {
    fn attribute(&self, name: &str) -> Option<RuntimeValue> {
        (name == "name").then(|| json!(self.name).into())
    }

    fn type_name(&self) -> Option<&str> {
        Some("Cat")
    }
}

#[test]
fn test_interface_values_pick_their_concrete_type() -> anyhow::Result<()> {
    let named = TypeDeclaration::interface("Named")
        .field("name", scalars::string())
        .build()?;
    let dog = TypeDeclaration::object("Dog")
        .meta(Meta::new().set("interfaces", vec![named.clone()]))
        .field("barks", scalars::boolean())
        .build()?;
    let cat = TypeDeclaration::object("Cat")
        .meta(Meta::new().set("interfaces", vec![named.clone()]))
        .build()?;

    let dog_type = dog.clone();
    let query = TypeDeclaration::object("Query")
        .field("pets", Structure::list(&named)?)
        .resolve("pets", move |_, _, _| {
            let rex = dog_type
                .instantiate(vec![json!("Rex")], IndexMap::from([("barks".to_string(), json!(true))]))
                .map_err(|error| FieldError::new(error.to_string()))?;
            Ok(RuntimeValue::List(vec![
                rex.into_runtime(),
                RuntimeValue::object(Cat {
                    name: "Tom".to_string(),
                }),
                json!({"__typename": "Dog", "name": "Fido", "barks": false}).into(),
            ]))
        })
        .build()?;
    let schema = Schema::builder(&query).types([&dog, &cat]).build()?;

    let result = schema.execute(
        "{ pets { __typename name ... on Dog { barks } } }",
        ExecuteOptions::default(),
    );
    assert!(result.errors.is_empty(), "{:?}", result.errors);
    assert_eq!(
        result.data,
        Some(json!({"pets": [
            {"__typename": "Dog", "name": "Rex", "barks": true},
            {"__typename": "Cat", "name": "Tom"},
            {"__typename": "Dog", "name": "Fido", "barks": false},
        ]}))
    );
    Ok(())
}

#[test]
fn test_records_resolve_by_attribute() -> anyhow::Result<()> {
    let user = TypeDeclaration::object("User")
        .field("firstname", scalars::string())
        .field("lastname", ImplicitField::new(scalars::string()).with_default(json!("Doe")))
        .build()?;
    let john: Record = user.instantiate(vec![json!("John")], IndexMap::new())?;
    assert_eq!(john.to_json(), json!({"firstname": "John", "lastname": "Doe"}));

    let query = TypeDeclaration::object("Query").field("me", &user).build()?;
    let schema = Schema::builder(&query).build()?;
    let me = RuntimeValue::object(john);
    let result = schema.execute(
        "{ me { firstname lastname } }",
        ExecuteOptions::new().root(RuntimeValue::object(Me(me))),
    );
    assert_eq!(
        result.data,
        Some(json!({"me": {"firstname": "John", "lastname": "Doe"}}))
    );
    Ok(())
}

#[derive(Debug)]
struct Me(RuntimeValue);

impl Attributes for Me {
    fn attribute(&self, name: &str) -> Option<RuntimeValue> {
        (name == "me").then(|| self.0.clone())
    }
}
