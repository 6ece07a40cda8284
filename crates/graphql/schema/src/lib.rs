//! Composition of declared types into an executable schema.
//!
//! The [`TypesContainer`] translates declared types into native types;
//! [`Schema`] lowers those onto the executor and runs operations against
//! them.

mod container;
mod error;
mod executor;
mod schema;

pub use container::TypesContainer;
pub use error::Error;
pub use schema::{
    ExecuteOptions, ExecutionError, ExecutionResult, PathSegment, Schema, SchemaBuilder,
};
