//! Declarative GraphQL type definitions.
//!
//! Types are declared with [`TypeDeclaration`] builders whose members are
//! field descriptors. Building a declaration runs the registration pipeline:
//! configuration validation, field collection in declaration order, interface
//! and parent field merging, and synthesis of the plain-data [`RecordShape`].
//! The result is a [`DeclaredType`], ready to be translated into native types
//! by the schema crate.

mod arguments;
mod declaration;
mod dynamic;
mod error;
mod fields;
mod meta;
mod order;
mod record;
pub mod scalars;
mod structures;
mod type_ref;

pub use arguments::{translate_arguments, Argument, ArgumentMember};
pub use declaration::{clean_doc, DeclaredType, Method, TypeDeclaration, TypeKind};
pub use dynamic::{Dynamic, TypeLookup};
pub use error::Error;
pub use fields::{Field, FieldConfig, FieldMember, FieldOptions, ImplicitField, Mountable};
pub use meta::{Meta, MetaValue, TypeOptions};
pub use order::CreationOrder;
pub use record::{Record, RecordShape};
pub use structures::{Structure, StructureKind, Wrappable};
pub use type_ref::TypeRef;

pub use lang_graphql::resolver::{
    Arguments, DefaultResolver, FieldError, ResolveInfo, Resolver, RuntimeValue, Subscriber,
};
pub use lang_graphql::scalar::ScalarBehavior;
