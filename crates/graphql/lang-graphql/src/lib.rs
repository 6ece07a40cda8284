//! The native GraphQL model that declared types are translated into: names,
//! type references, literal values, schema types and the resolver contract.

pub mod ast;
pub mod resolver;
pub mod scalar;
pub mod schema;
