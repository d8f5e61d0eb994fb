//! Element property values and validation
//!
//! Properties are stored under the `properties` sub-document of each vertex or
//! edge document and use the same closed value kind as the store itself.

use super::error::{GraphError, GraphResult};
use super::types::{fields, ElementKind};

pub use crate::document::Document as PropertyMap;
pub use crate::document::Value as PropertyValue;

/// Outcome of a property write that reached the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The stored document changed
    Applied,
    /// The document matched but already held this state
    Unchanged,
}

/// Reject keys and values that cannot be stored as properties.
///
/// Keys must be non-empty and must not shadow element fields (`id` on any
/// element, `label` on edges). `Null` values are rejected, as are NaN and
/// infinite floats anywhere in the value.
pub(crate) fn validate_property(kind: ElementKind, key: &str, value: &PropertyValue) -> GraphResult<()> {
    validate_key(kind, key)?;
    if value.is_null() {
        return Err(GraphError::invalid(format!("property value for '{}' can not be null", key)));
    }
    if !is_finite(value) {
        return Err(GraphError::invalid(format!(
            "property value for '{}' contains a non-finite number",
            key
        )));
    }
    Ok(())
}

fn is_finite(value: &PropertyValue) -> bool {
    match value {
        PropertyValue::Float(f) => f.is_finite(),
        PropertyValue::Array(items) => items.iter().all(is_finite),
        PropertyValue::Document(doc) => doc.iter().all(|(_, v)| is_finite(v)),
        _ => true,
    }
}

pub(crate) fn validate_key(kind: ElementKind, key: &str) -> GraphResult<()> {
    if key.is_empty() {
        return Err(GraphError::invalid("property key can not be empty"));
    }
    if key == fields::ID {
        return Err(GraphError::invalid("property key 'id' is reserved"));
    }
    if kind == ElementKind::Edge && key == fields::LABEL {
        return Err(GraphError::invalid("property key 'label' is reserved for edges"));
    }
    Ok(())
}
