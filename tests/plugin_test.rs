use jsonnet_codec::error::{ArgumentError, JsonnetError};
use jsonnet_codec::plugin::{plugin, NativeFunction, PLUGIN_NAME};
use serde_json::{json, Value};
use std::collections::BTreeMap;

fn call(name: &str, args: &[Value]) -> Result<Value, JsonnetError> {
    let plugin = plugin();
    let function = plugin
        .function(name)
        .unwrap_or_else(|| panic!("no function named {name}"));
    function.call(args)
}

#[test]
fn test_plugin_surface() {
    let plugin = plugin();
    assert_eq!(plugin.name(), PLUGIN_NAME);
    let signatures: Vec<(&str, &[&str])> = plugin
        .functions()
        .iter()
        .map(|f| (f.name, f.params))
        .collect();
    assert_eq!(
        signatures,
        [
            ("parseJsonnet", &["jsonnet"][..]),
            ("manifestJsonnet", &["jsonnet"][..]),
            ("formatJsonnet", &["code"][..]),
        ]
    );
    assert!(plugin.function("evaluate").is_none());
}

#[test]
fn test_register_into_ordered_table() {
    let mut table: BTreeMap<String, NativeFunction> = BTreeMap::new();
    plugin().register_into(&mut table);
    let result = table["formatJsonnet"].call(&[json!("{a:1}")]).unwrap();
    assert_eq!(result, json!("{ a: 1 }\n"));
}

#[test]
fn test_parse_then_manifest() {
    let tree = call("parseJsonnet", &[json!("local x = 1; x")]).unwrap();
    assert_eq!(tree["__kind__"], json!("Local"));
    let text = call("manifestJsonnet", &[tree]).unwrap();
    assert_eq!(text, json!("local x = 1; x\n"));
}

#[test]
fn test_format_jsonnet() {
    let text = call("formatJsonnet", &[json!("{\"a\":[1,2]}")]).unwrap();
    assert_eq!(text, json!("{ a: [1, 2] }\n"));
}

#[test]
fn test_manifest_rejects_a_bare_string() {
    let err = call("manifestJsonnet", &[json!("not a tree")]).unwrap_err();
    assert!(matches!(err, JsonnetError::Schema(_)));
}

#[test]
fn test_argument_errors() {
    let err = call("manifestJsonnet", &[]).unwrap_err();
    assert!(matches!(
        err,
        JsonnetError::Argument(ArgumentError::Count { name: "jsonnet", given: 0 })
    ));
    let err = call("parseJsonnet", &[json!(["x"])]).unwrap_err();
    assert!(matches!(err, JsonnetError::Argument(ArgumentError::Type { name: "jsonnet" })));
}

#[test]
fn test_errors_cross_the_plugin_boundary() {
    let err = call("parseJsonnet", &[json!("{ a: }")]).unwrap_err();
    assert!(matches!(err, JsonnetError::Syntax(_)));
    let err = call("formatJsonnet", &[json!("[1,")]).unwrap_err();
    assert!(matches!(err, JsonnetError::Syntax(_)));
}
