//! Recursive request body schema tree.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A node in a request body schema.
///
/// Only the shape matters to body assembly: objects name their children,
/// arrays carry one item schema, and everything else is a scalar leaf.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SchemaNode {
    Object {
        /// Named child schemas in declaration order.
        #[serde(default)]
        properties: IndexMap<String, SchemaNode>,
        /// Names of children the API marks as required.
        #[serde(default)]
        required: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Array {
        items: Box<SchemaNode>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
    Scalar {
        /// Primitive type name from the source document (`string`, `integer`, ...).
        #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
        type_name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
    },
}

impl SchemaNode {
    /// Convenience constructor for an untyped scalar leaf.
    pub fn scalar(type_name: impl Into<String>) -> Self {
        SchemaNode::Scalar {
            type_name: Some(type_name.into()),
            description: None,
        }
    }

    /// Convenience constructor for an array of the given items.
    pub fn array_of(items: SchemaNode) -> Self {
        SchemaNode::Array {
            items: Box::new(items),
            description: None,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(self, SchemaNode::Array { .. })
    }

    /// Returns the named children when this node is an object.
    pub fn properties(&self) -> Option<&IndexMap<String, SchemaNode>> {
        match self {
            SchemaNode::Object { properties, .. } => Some(properties),
            _ => None,
        }
    }
}
