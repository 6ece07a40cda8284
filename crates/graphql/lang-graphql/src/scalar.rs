use crate::ast::value::ConstValue;

/// Variables of the operation a literal appears in.
pub type Variables = serde_json::Map<String, serde_json::Value>;

/// Value conversions of a scalar type.
///
/// Every method returns `None` for values the scalar cannot represent; the
/// executor treats that as an undefined value.
pub trait ScalarBehavior: Send + Sync {
    /// Converts a literal from a query document into an internal value.
    fn parse_literal(&self, node: &ConstValue, variables: Option<&Variables>) -> Option<serde_json::Value>;

    /// Converts a variable value into an internal value.
    fn parse_value(&self, value: &serde_json::Value) -> Option<serde_json::Value> {
        Some(value.clone())
    }

    /// Converts an internal value into its serialized output form.
    fn resolve_value(&self, value: &serde_json::Value) -> Option<serde_json::Value> {
        Some(value.clone())
    }
}
