use jsonnet_codec::api::{format, manifest, parse, parse_as, parse_with, ParseOptions};
use serde::Deserialize;
use serde_json::{json, Value};

/// Sources already in canonical form. Manifesting their parse gives them back.
const CANONICAL: &[&str] = &[
    "null",
    "true",
    "false",
    "'foobar'",
    "'foobar %s' % ['baz']",
    "3",
    "3.123",
    "{ a: 'foo', b: self.a }",
    "{ a: 'foo', b: { c: $.a } }",
    "{ a: 'foo' } + { b: super.a }",
    "{}",
    "{ a: 1 }",
    "local a = 1; a",
    "local a = { b: 1 }; a.b",
    "local a = { b: { c: 1 } }; a.b.c",
    "local a = { 'foo-bar': 1 }; a['foo-bar']",
    "local a = { 'foo-bar': { 'bar-foo': 1 } }; a['foo-bar']['bar-foo']",
    "std.map(function(a) a, [1, 2, 3])",
    "std.map(function(a=2) a, [1, 2, 3])",
    "local foo() = 1; foo()",
    "local a = 1; local foo(a) = a; foo(a)",
    "local a = 1; local foo(a) = a; foo(a=2)",
    "local a = 1; local foo(a, b) = a + b; foo(a, 1)",
    "local a = 1; local foo(a, b) = a + b; foo(a, b=1)",
    "{ local a = 1, b: a }",
    "{ local a = 1, assert a == 1 : 'a must be 1', b: a }",
    "{ [number]: number + 1 for number in ['1', '2', '3'] }",
    "{ [a + b]: a + b for a in ['1', '2', '3'] for b in ['4', '5', '6'] }",
    "{ [a]: a + 1 for a in ['1', '2', '3'] if a == '2' }",
    "[]",
    "['a']",
    "[local a = 1; a]",
    "[number for number in [1, 2, 3]]",
    "[a + b for a in [1, 2, 3] for b in [4, 5, 6]]",
    "[a + 1 for a in [1, 2, 3] if a > 2]",
    "if 1 > 0 then 1",
    "if 1 > 0 then 1 else 0",
    "// Output the number one\n1",
    "x[1:2]",
    "assert true; 1",
    "error 'boom'",
    "import 'a.libsonnet'",
    "-1 + !false",
    "{ a:: 1, b::: 2, c+: 3 }",
    "{ f(x):: x }",
    "'x' in super",
    "@'it''s'",
    "(1 + 2) * 3",
];

fn round_trip(source: &str) -> String {
    let document = parse(source).unwrap_or_else(|e| panic!("parse of {source:?} failed: {e}"));
    manifest(&document).unwrap_or_else(|e| panic!("manifest of {source:?} failed: {e}"))
}

#[test]
fn test_canonical_sources_round_trip() {
    for source in CANONICAL {
        assert_eq!(round_trip(source).trim_end_matches('\n'), *source);
    }
}

#[test]
fn test_comment_layout_round_trip() {
    assert_eq!(
        round_trip("{a: 1,  // b is equal to two\n  b: 2}"),
        "{\n  a: 1,  // b is equal to two\n  b: 2,\n}\n"
    );
    assert_eq!(
        round_trip("[1, // add two to array\n2]"),
        "[\n  1,  // add two to array\n  2,\n]\n"
    );
}

#[test]
fn test_manifest_is_idempotent() {
    let sources = [
        "{a:1,b:{c:[1,2,\n3]}}",
        "local x = import \"b\";\nlocal y = import \"a\";\nx+y",
        "function(a,\nb) a+b",
        "{\n\n\n\n  a: 1 }",
        "[x for x in [1,\n2] if x > 1]",
    ];
    for source in sources {
        let once = round_trip(source);
        assert_eq!(round_trip(&once), once, "source {source:?}");
    }
}

#[test]
fn test_format_matches_manifest_of_parse() {
    let source = "{ \"a\": [1,2] }";
    assert_eq!(format(source).unwrap(), round_trip(source));
}

#[test]
fn test_absent_else_is_null() {
    let document = parse("if true then 1").unwrap();
    assert_eq!(document["__kind__"], json!("Conditional"));
    assert_eq!(document["branchFalse"], Value::Null);
}

#[test]
fn test_array_order_preserved() {
    let document = parse("[1,2,3]").unwrap();
    let numbers: Vec<&Value> = document["elements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| &e["expr"]["originalString"])
        .collect();
    assert_eq!(numbers, [&json!("1"), &json!("2"), &json!("3")]);
}

#[test]
fn test_object_field_order_preserved() {
    let document = parse("{ z: 1, a: 2, m: 3 }").unwrap();
    let ids: Vec<&str> = document["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["z", "a", "m"]);
}

#[test]
fn test_edited_document_is_manifested() {
    let mut document = parse("{ a: 1 }").unwrap();
    document["fields"][0]["id"] = json!("renamed");
    document["fields"][0]["expr2"] = json!({ "__kind__": "LiteralBoolean", "value": true });
    assert_eq!(manifest(&document).unwrap(), "{ renamed: true }\n");
}

#[test]
fn test_nested_comprehension_chain() {
    let document = parse("[a for a in x for b in y if b]").unwrap();
    let spec = &document["spec"];
    assert_eq!(spec["varName"], json!("b"));
    assert_eq!(spec["conditions"].as_array().unwrap().len(), 1);
    assert_eq!(spec["outer"]["varName"], json!("a"));
    assert_eq!(spec["outer"]["outer"], Value::Null);
}

#[test]
fn test_trivia_is_preserved_in_the_document() {
    let document = parse("/* lead */ 1").unwrap();
    assert_eq!(
        document["fodder"],
        json!([{ "comment": ["/* lead */"], "kind": 1, "blanks": 0, "indent": 0 }])
    );
}

#[test]
fn test_parse_as_typed_view() {
    #[derive(Deserialize)]
    struct VarNode {
        #[serde(rename = "__kind__")]
        kind: String,
        id: String,
    }

    let node: VarNode = parse_as("foo").unwrap();
    assert_eq!(node.kind, "Var");
    assert_eq!(node.id, "foo");
}

#[test]
fn test_locations_are_recorded() {
    let result = parse_with("local a = 1;\na", &ParseOptions::default()).unwrap();
    let document = result.to_value();
    assert_eq!(document["locRange"]["fileName"], json!("main.jsonnet"));
    assert_eq!(document["locRange"]["begin"], json!({ "line": 1, "column": 1 }));
    assert_eq!(document["body"]["locRange"]["begin"]["line"], json!(2));
}
