// Error paths of the parse/manifest entry points.

use jsonnet_codec::api::{manifest, parse};
use jsonnet_codec::error::JsonnetError;
use serde_json::json;
use std::collections::HashMap;

#[test]
fn test_parse_syntax_error() {
    let result = parse("{ a: }");
    let Err(JsonnetError::Syntax(err)) = result else {
        panic!("Expected syntax error, got {result:?}");
    };
    assert_eq!(err.position(), (1, 6));
}

#[test]
fn test_syntax_error_message_has_position() {
    let err = parse("local a = 1,\n  a = 2; a").unwrap_err();
    assert!(err.to_string().starts_with("2:"), "got {err}");
}

#[test]
fn test_manifest_unknown_kind() {
    let err = manifest(&json!({ "__kind__": "NotAKind" })).unwrap_err();
    let JsonnetError::Schema(schema) = err else {
        panic!("Expected schema error");
    };
    assert_eq!(schema.path, "/__kind__");
    assert!(schema.message.contains("NotAKind"));
}

#[test]
fn test_manifest_missing_kind() {
    let err = manifest(&json!({ "value": true })).unwrap_err();
    assert!(matches!(err, JsonnetError::Schema(_)));
}

#[test]
fn test_manifest_unknown_kind_deep_in_the_tree() {
    let mut document = parse("[1, 2]").unwrap();
    document["elements"][1]["expr"] = json!({ "__kind__": "Nope" });
    let JsonnetError::Schema(schema) = manifest(&document).unwrap_err() else {
        panic!("Expected schema error");
    };
    assert_eq!(schema.path, "/elements/1/expr/__kind__");
}

#[test]
fn test_manifest_wrong_field_shape() {
    let err = manifest(&json!({ "__kind__": "Var", "id": 7 })).unwrap_err();
    assert!(matches!(err, JsonnetError::Schema(_)));
}

#[test]
fn test_manifest_comprehension_chain_needs_terminal_marker() {
    let mut document = parse("[x for x in y]").unwrap();
    document["spec"]
        .as_object_mut()
        .unwrap()
        .remove("outer");
    let JsonnetError::Schema(schema) = manifest(&document).unwrap_err() else {
        panic!("Expected schema error");
    };
    assert_eq!(schema.path, "/spec/outer");
}

#[test]
fn test_manifest_null_root() {
    assert!(matches!(manifest(&json!(null)).unwrap_err(), JsonnetError::Schema(_)));
    assert!(matches!(manifest(&json!({})).unwrap_err(), JsonnetError::Schema(_)));
}

#[test]
fn test_manifest_unrenderable_field() {
    let mut document = parse("{ a: 1 }").unwrap();
    document["fields"][0]["id"] = json!(null);
    let err = manifest(&document).unwrap_err();
    let JsonnetError::Format(format) = err else {
        panic!("Expected format error");
    };
    assert_eq!(format.construct, "object field");
}

#[test]
fn test_manifest_local_without_binds() {
    let document = json!({
        "__kind__": "Local",
        "binds": [],
        "body": { "__kind__": "LiteralNull" },
    });
    assert!(matches!(manifest(&document).unwrap_err(), JsonnetError::Format(_)));
}

#[test]
fn test_manifest_non_string_keys() {
    let mut map = HashMap::new();
    map.insert((1, 2), "x");
    assert!(matches!(manifest(&map).unwrap_err(), JsonnetError::Serde(_)));
}
