//! "A node or nothing". This is the only place where `null` stands for an
//! absent child.

use super::node::{decode_document, encode_node};
use super::unexpected;
use crate::ast::Node;
use crate::error::SchemaError;
use serde_json::Value;

pub fn wrap(node: Option<&Node>) -> Value {
    match node {
        Some(node) => encode_node(node),
        None => Value::Null,
    }
}

/// `null` and `{}` read as an absent node.
pub fn unwrap(value: &Value) -> Result<Option<Node>, SchemaError> {
    match value {
        Value::Null => Ok(None),
        Value::Object(map) if map.is_empty() => Ok(None),
        Value::Object(map) => decode_document(map).map(Some),
        other => Err(unexpected("a node object or null", other)),
    }
}

/// Decodes a child that must be present.
pub fn require(value: &Value) -> Result<Node, SchemaError> {
    unwrap(value)?.ok_or_else(|| SchemaError::new("expected a node, found nothing"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeKind;
    use serde_json::json;

    #[test]
    fn absent_node_is_null() {
        assert_eq!(wrap(None), Value::Null);
        assert_eq!(unwrap(&Value::Null).unwrap(), None);
        assert_eq!(unwrap(&json!({})).unwrap(), None);
    }

    #[test]
    fn present_node_goes_through_the_dispatcher() {
        let node = Node::bare(NodeKind::LiteralBoolean(true));
        let value = wrap(Some(&node));
        assert_eq!(value["__kind__"], json!("LiteralBoolean"));
        assert_eq!(unwrap(&value).unwrap(), Some(node));
    }

    #[test]
    fn required_child_rejects_null() {
        assert!(require(&Value::Null).is_err());
        assert!(unwrap(&json!("Var")).is_err());
    }
}
