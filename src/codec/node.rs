//! The tagged-union codec over [`NodeKind`].

use super::{document, unwrap, wrap, Encode, Fields, KIND_KEY};
use crate::ast::*;
use crate::error::SchemaError;
use crate::utils::with_stack;
use log::trace;
use serde_json::{Map, Value};

/// Encodes a node as a document tagged with its kind.
pub fn encode_node(node: &Node) -> Value {
    with_stack(|| {
        let mut map = document! { KIND_KEY => node.kind.name() };
        encode_kind(&node.kind, &mut map);
        encode_base(&node.base, &mut map);
        Value::Object(map)
    })
}

/// Decodes a document produced by [`encode_node`], or edited after it. `null`
/// and `{}` give `None`.
pub fn decode_node(value: &Value) -> Result<Option<Node>, SchemaError> {
    unwrap(value)
}

/// Decodes a non-empty node document. The discriminant is read before any
/// other field.
pub(crate) fn decode_document(map: &Map<String, Value>) -> Result<Node, SchemaError> {
    let name = match map.get(KIND_KEY) {
        Some(Value::String(name)) => name.as_str(),
        Some(_) => {
            return Err(SchemaError::new("node discriminant must be a string").within(KIND_KEY))
        }
        None => return Err(SchemaError::new("node without a discriminant").within(KIND_KEY)),
    };
    trace!("decoding {name} node");
    with_stack(|| {
        let fields = Fields::from_map(map);
        let kind = decode_kind(name, &fields)?;
        let base = decode_base(&fields)?;
        Ok(Node { kind, base })
    })
}

fn encode_base(base: &NodeBase, map: &mut Map<String, Value>) {
    map.insert("fodder".into(), base.fodder.encode());
    map.insert("context".into(), Value::from(base.context.clone()));
    map.insert("freeVars".into(), Value::from(base.free_vars.clone()));
    map.insert("locRange".into(), base.loc_range.encode());
}

fn decode_base(fields: &Fields<'_>) -> Result<NodeBase, SchemaError> {
    Ok(NodeBase {
        fodder: fields.decode("fodder")?,
        context: fields.opt_string("context")?,
        free_vars: fields.decode("freeVars")?,
        loc_range: fields.decode("locRange")?,
    })
}

fn insert_all(map: &mut Map<String, Value>, fields: Map<String, Value>) {
    map.extend(fields);
}

fn encode_kind(kind: &NodeKind, map: &mut Map<String, Value>) {
    let fields = match kind {
        NodeKind::Apply(apply) => document! {
            "target" => encode_node(&apply.target),
            "fodderLeft" => apply.fodder_left.encode(),
            "arguments" => apply.arguments.encode(),
            "fodderRight" => apply.fodder_right.encode(),
            "tailStrictFodder" => apply.tail_strict_fodder.encode(),
            "trailingComma" => apply.trailing_comma,
            "tailStrict" => apply.tail_strict,
        },
        NodeKind::ApplyBrace(apply) => document! {
            "left" => encode_node(&apply.left),
            "right" => encode_node(&apply.right),
        },
        NodeKind::Array(array) => document! {
            "elements" => array.elements.encode(),
            "closeFodder" => array.close_fodder.encode(),
            "trailingComma" => array.trailing_comma,
        },
        NodeKind::ArrayComp(comp) => document! {
            "body" => encode_node(&comp.body),
            "trailingCommaFodder" => comp.trailing_comma_fodder.encode(),
            "spec" => comp.spec.encode(),
            "closeFodder" => comp.close_fodder.encode(),
            "trailingComma" => comp.trailing_comma,
        },
        NodeKind::Assert(assert) => document! {
            "cond" => encode_node(&assert.cond),
            "message" => wrap(assert.message.as_deref()),
            "rest" => encode_node(&assert.rest),
            "colonFodder" => assert.colon_fodder.encode(),
            "semicolonFodder" => assert.semicolon_fodder.encode(),
        },
        NodeKind::Binary(binary) => document! {
            "right" => encode_node(&binary.right),
            "left" => encode_node(&binary.left),
            "opFodder" => binary.op_fodder.encode(),
            "op" => binary.op.encode(),
        },
        NodeKind::Conditional(cond) => document! {
            "cond" => encode_node(&cond.cond),
            "branchTrue" => encode_node(&cond.branch_true),
            "branchFalse" => wrap(cond.branch_false.as_deref()),
            "thenFodder" => cond.then_fodder.encode(),
            "elseFodder" => cond.else_fodder.encode(),
        },
        NodeKind::Dollar | NodeKind::LiteralNull | NodeKind::SelfObject => Map::new(),
        NodeKind::Error(expr) => document! { "expr" => encode_node(expr) },
        NodeKind::Function(function) => {
            let mut fields = Map::new();
            function.params.encode_fields(&mut fields);
            fields.insert("body".into(), encode_node(&function.body));
            fields
        }
        NodeKind::Import(file) | NodeKind::ImportBin(file) | NodeKind::ImportStr(file) => {
            document! { "file" => encode_node(file) }
        }
        NodeKind::InSuper(in_super) => document! {
            "index" => encode_node(&in_super.index),
            "inFodder" => in_super.in_fodder.encode(),
            "superFodder" => in_super.super_fodder.encode(),
        },
        NodeKind::Index(index) => document! {
            "target" => encode_node(&index.target),
            "index" => wrap(index.index.as_deref()),
            "rightBracketFodder" => index.right_bracket_fodder.encode(),
            "leftBracketFodder" => index.left_bracket_fodder.encode(),
            "id" => index.id.clone(),
        },
        NodeKind::LiteralBoolean(value) => document! { "value" => *value },
        NodeKind::LiteralNumber(original) => document! { "originalString" => original.clone() },
        NodeKind::LiteralString(string) => document! {
            "value" => string.value.clone(),
            "blockIndent" => string.block_indent.clone(),
            "blockTermIndent" => string.block_term_indent.clone(),
            "kind" => string.kind.encode(),
        },
        NodeKind::Local(local) => document! {
            "binds" => local.binds.encode(),
            "body" => encode_node(&local.body),
        },
        NodeKind::Object(object) => document! {
            "fields" => object.fields.encode(),
            "closeFodder" => object.close_fodder.encode(),
            "trailingComma" => object.trailing_comma,
        },
        NodeKind::ObjectComp(comp) => document! {
            "fields" => comp.fields.encode(),
            "trailingCommaFodder" => comp.trailing_comma_fodder.encode(),
            "closeFodder" => comp.close_fodder.encode(),
            "spec" => comp.spec.encode(),
            "trailingComma" => comp.trailing_comma,
        },
        NodeKind::Parens(parens) => document! {
            "inner" => encode_node(&parens.inner),
            "closeFodder" => parens.close_fodder.encode(),
        },
        NodeKind::Slice(slice) => document! {
            "target" => encode_node(&slice.target),
            "leftBracketFodder" => slice.left_bracket_fodder.encode(),
            "beginIndex" => wrap(slice.begin_index.as_deref()),
            "endColonFodder" => slice.end_colon_fodder.encode(),
            "endIndex" => wrap(slice.end_index.as_deref()),
            "stepColonFodder" => slice.step_colon_fodder.encode(),
            "step" => wrap(slice.step.as_deref()),
            "rightBracketFodder" => slice.right_bracket_fodder.encode(),
        },
        NodeKind::SuperIndex(index) => document! {
            "idFodder" => index.id_fodder.encode(),
            "index" => wrap(index.index.as_deref()),
            "dotFodder" => index.dot_fodder.encode(),
            "id" => index.id.clone(),
        },
        NodeKind::Unary(unary) => document! {
            "expr" => encode_node(&unary.expr),
            "op" => unary.op.encode(),
        },
        NodeKind::Var(id) => document! { "id" => id.clone() },
    };
    insert_all(map, fields);
}

fn decode_kind(name: &str, fields: &Fields<'_>) -> Result<NodeKind, SchemaError> {
    let kind = match name {
        "Apply" => NodeKind::Apply(Apply {
            target: fields.node("target")?,
            fodder_left: fields.decode("fodderLeft")?,
            arguments: fields.decode("arguments")?,
            trailing_comma: fields.flag("trailingComma")?,
            fodder_right: fields.decode("fodderRight")?,
            tail_strict: fields.flag("tailStrict")?,
            tail_strict_fodder: fields.decode("tailStrictFodder")?,
        }),
        "ApplyBrace" => NodeKind::ApplyBrace(ApplyBrace {
            left: fields.node("left")?,
            right: fields.node("right")?,
        }),
        "Array" => NodeKind::Array(Array {
            elements: fields.decode("elements")?,
            trailing_comma: fields.flag("trailingComma")?,
            close_fodder: fields.decode("closeFodder")?,
        }),
        "ArrayComp" => NodeKind::ArrayComp(ArrayComp {
            body: fields.node("body")?,
            trailing_comma_fodder: fields.decode("trailingCommaFodder")?,
            trailing_comma: fields.flag("trailingComma")?,
            spec: fields.decode("spec")?,
            close_fodder: fields.decode("closeFodder")?,
        }),
        "Assert" => NodeKind::Assert(Assert {
            cond: fields.node("cond")?,
            colon_fodder: fields.decode("colonFodder")?,
            message: fields.opt_node("message")?,
            semicolon_fodder: fields.decode("semicolonFodder")?,
            rest: fields.node("rest")?,
        }),
        "Binary" => NodeKind::Binary(Binary {
            left: fields.node("left")?,
            op_fodder: fields.decode("opFodder")?,
            op: fields.decode("op")?,
            right: fields.node("right")?,
        }),
        "Conditional" => NodeKind::Conditional(Conditional {
            cond: fields.node("cond")?,
            then_fodder: fields.decode("thenFodder")?,
            branch_true: fields.node("branchTrue")?,
            else_fodder: fields.decode("elseFodder")?,
            branch_false: fields.opt_node("branchFalse")?,
        }),
        "Dollar" => NodeKind::Dollar,
        "Error" => NodeKind::Error(fields.node("expr")?),
        "Function" => NodeKind::Function(Function {
            params: Params::decode_fields(fields)?,
            body: fields.node("body")?,
        }),
        "Import" => NodeKind::Import(import_file(fields)?),
        "ImportBin" => NodeKind::ImportBin(import_file(fields)?),
        "ImportStr" => NodeKind::ImportStr(import_file(fields)?),
        "InSuper" => NodeKind::InSuper(InSuper {
            index: fields.node("index")?,
            in_fodder: fields.decode("inFodder")?,
            super_fodder: fields.decode("superFodder")?,
        }),
        "Index" => NodeKind::Index(Index {
            target: fields.node("target")?,
            left_bracket_fodder: fields.decode("leftBracketFodder")?,
            index: fields.opt_node("index")?,
            right_bracket_fodder: fields.decode("rightBracketFodder")?,
            id: fields.opt_string("id")?,
        }),
        "LiteralBoolean" => NodeKind::LiteralBoolean(fields.boolean("value")?),
        "LiteralNull" => NodeKind::LiteralNull,
        "LiteralNumber" => NodeKind::LiteralNumber(fields.string("originalString")?),
        "LiteralString" => NodeKind::LiteralString(LiteralString {
            value: fields.string("value")?,
            kind: match fields.get("kind") {
                Value::Null => LiteralStringKind::Single,
                _ => fields.decode("kind")?,
            },
            block_indent: fields.opt_string("blockIndent")?.unwrap_or_default(),
            block_term_indent: fields.opt_string("blockTermIndent")?.unwrap_or_default(),
        }),
        "Local" => NodeKind::Local(Local {
            binds: fields.decode("binds")?,
            body: fields.node("body")?,
        }),
        "Object" => NodeKind::Object(Object {
            fields: fields.decode("fields")?,
            trailing_comma: fields.flag("trailingComma")?,
            close_fodder: fields.decode("closeFodder")?,
        }),
        "ObjectComp" => NodeKind::ObjectComp(ObjectComp {
            fields: fields.decode("fields")?,
            trailing_comma_fodder: fields.decode("trailingCommaFodder")?,
            trailing_comma: fields.flag("trailingComma")?,
            spec: fields.decode("spec")?,
            close_fodder: fields.decode("closeFodder")?,
        }),
        "Parens" => NodeKind::Parens(Parens {
            inner: fields.node("inner")?,
            close_fodder: fields.decode("closeFodder")?,
        }),
        "Self" => NodeKind::SelfObject,
        "Slice" => NodeKind::Slice(Slice {
            target: fields.node("target")?,
            left_bracket_fodder: fields.decode("leftBracketFodder")?,
            begin_index: fields.opt_node("beginIndex")?,
            end_colon_fodder: fields.decode("endColonFodder")?,
            end_index: fields.opt_node("endIndex")?,
            step_colon_fodder: fields.decode("stepColonFodder")?,
            step: fields.opt_node("step")?,
            right_bracket_fodder: fields.decode("rightBracketFodder")?,
        }),
        "SuperIndex" => NodeKind::SuperIndex(SuperIndex {
            dot_fodder: fields.decode("dotFodder")?,
            index: fields.opt_node("index")?,
            id_fodder: fields.decode("idFodder")?,
            id: fields.opt_string("id")?,
        }),
        "Unary" => NodeKind::Unary(Unary {
            op: fields.decode("op")?,
            expr: fields.node("expr")?,
        }),
        "Var" => NodeKind::Var(fields.string("id")?),
        other => {
            return Err(SchemaError::new(format!("unknown node kind `{other}`")).within(KIND_KEY))
        }
    };
    Ok(kind)
}

/// Import paths are string literal nodes.
fn import_file(fields: &Fields<'_>) -> Result<Box<Node>, SchemaError> {
    let file = fields.node("file")?;
    match file.kind {
        NodeKind::LiteralString(_) => Ok(file),
        _ => Err(SchemaError::new(format!(
            "import path must be a LiteralString, found {}",
            file.kind.name()
        ))
        .within("file")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;

    fn bare(kind: NodeKind) -> Box<Node> {
        Box::new(Node::bare(kind))
    }

    fn num(n: &str) -> Box<Node> {
        bare(NodeKind::LiteralNumber(n.into()))
    }

    fn string(s: &str) -> Box<Node> {
        bare(NodeKind::LiteralString(LiteralString::new(s, LiteralStringKind::Single)))
    }

    fn spec() -> ForSpec {
        ForSpec {
            for_fodder: vec![],
            var_fodder: vec![],
            var_name: "x".into(),
            in_fodder: vec![],
            expr: bare(NodeKind::Var("xs".into())),
            conditions: vec![IfSpec {
                if_fodder: vec![],
                expr: Node::bare(NodeKind::LiteralBoolean(true)),
            }],
            outer: None,
        }
    }

    fn field(id: &str) -> ObjectField {
        ObjectField {
            kind: ObjectFieldKind::FieldId,
            hide: ObjectFieldHide::Inherit,
            super_sugar: false,
            method: None,
            fodder1: vec![],
            id: Some(id.into()),
            expr1: None,
            fodder2: vec![],
            op_fodder: vec![],
            expr2: num("1"),
            expr3: None,
            comma_fodder: vec![],
            loc_range: LocationRange::default(),
        }
    }

    /// One node of every kind.
    fn samples() -> Vec<Node> {
        let kinds = vec![
            NodeKind::Apply(Apply {
                target: bare(NodeKind::Var("f".into())),
                fodder_left: vec![],
                arguments: Arguments {
                    positional: vec![CommaSeparatedExpr { expr: *num("1"), comma_fodder: vec![] }],
                    named: vec![NamedArgument {
                        name_fodder: vec![],
                        name: "b".into(),
                        eq_fodder: vec![],
                        arg: *num("2"),
                        comma_fodder: vec![],
                    }],
                },
                trailing_comma: false,
                fodder_right: vec![],
                tail_strict: true,
                tail_strict_fodder: vec![],
            }),
            NodeKind::ApplyBrace(ApplyBrace {
                left: bare(NodeKind::Var("a".into())),
                right: bare(NodeKind::Object(Object::default())),
            }),
            NodeKind::Array(Array {
                elements: vec![CommaSeparatedExpr { expr: *num("1"), comma_fodder: vec![] }],
                trailing_comma: false,
                close_fodder: vec![],
            }),
            NodeKind::ArrayComp(ArrayComp {
                body: bare(NodeKind::Var("x".into())),
                trailing_comma_fodder: vec![],
                trailing_comma: false,
                spec: spec(),
                close_fodder: vec![],
            }),
            NodeKind::Assert(Assert {
                cond: bare(NodeKind::LiteralBoolean(true)),
                colon_fodder: vec![],
                message: Some(string("msg")),
                semicolon_fodder: vec![],
                rest: bare(NodeKind::LiteralNull),
            }),
            NodeKind::Binary(Binary {
                left: num("1"),
                op_fodder: vec![],
                op: BinaryOp::Plus,
                right: num("2"),
            }),
            NodeKind::Conditional(Conditional {
                cond: bare(NodeKind::LiteralBoolean(true)),
                then_fodder: vec![],
                branch_true: num("1"),
                else_fodder: vec![],
                branch_false: None,
            }),
            NodeKind::Dollar,
            NodeKind::Error(string("boom")),
            NodeKind::Function(Function {
                params: Params {
                    parameters: vec![Parameter {
                        name_fodder: vec![],
                        name: "a".into(),
                        eq_fodder: vec![],
                        default_arg: Some(num("2")),
                        comma_fodder: vec![],
                        loc_range: LocationRange::default(),
                    }],
                    ..Params::default()
                },
                body: bare(NodeKind::Var("a".into())),
            }),
            NodeKind::Import(string("a.libsonnet")),
            NodeKind::ImportBin(string("a.bin")),
            NodeKind::ImportStr(string("a.txt")),
            NodeKind::InSuper(InSuper {
                index: string("a"),
                in_fodder: vec![],
                super_fodder: vec![],
            }),
            NodeKind::Index(Index {
                target: bare(NodeKind::SelfObject),
                left_bracket_fodder: vec![],
                index: None,
                right_bracket_fodder: vec![],
                id: Some("a".into()),
            }),
            NodeKind::LiteralBoolean(false),
            NodeKind::LiteralNull,
            NodeKind::LiteralNumber("3.25e2".into()),
            NodeKind::LiteralString(LiteralString {
                value: "line\n".into(),
                kind: LiteralStringKind::Block,
                block_indent: "  ".into(),
                block_term_indent: "".into(),
            }),
            NodeKind::Local(Local {
                binds: vec![LocalBind {
                    var_fodder: vec![],
                    variable: "a".into(),
                    fun: None,
                    eq_fodder: vec![],
                    body: *num("1"),
                    close_fodder: vec![],
                }],
                body: bare(NodeKind::Var("a".into())),
            }),
            NodeKind::Object(Object {
                fields: vec![field("a")],
                trailing_comma: false,
                close_fodder: vec![],
            }),
            NodeKind::ObjectComp(ObjectComp {
                fields: vec![ObjectField {
                    kind: ObjectFieldKind::FieldExpr,
                    id: None,
                    expr1: Some(bare(NodeKind::Var("x".into()))),
                    ..field("x")
                }],
                trailing_comma_fodder: vec![],
                trailing_comma: false,
                spec: spec(),
                close_fodder: vec![],
            }),
            NodeKind::Parens(Parens {
                inner: num("1"),
                close_fodder: vec![],
            }),
            NodeKind::SelfObject,
            NodeKind::Slice(Slice {
                target: bare(NodeKind::Var("a".into())),
                left_bracket_fodder: vec![],
                begin_index: Some(num("1")),
                end_colon_fodder: vec![],
                end_index: None,
                step_colon_fodder: vec![],
                step: Some(num("2")),
                right_bracket_fodder: vec![],
            }),
            NodeKind::SuperIndex(SuperIndex {
                dot_fodder: vec![],
                index: None,
                id_fodder: vec![],
                id: Some("a".into()),
            }),
            NodeKind::Unary(Unary {
                op: UnaryOp::Minus,
                expr: num("1"),
            }),
            NodeKind::Var("a".into()),
        ];
        kinds.into_iter().map(Node::bare).collect()
    }

    #[test]
    fn dispatcher_covers_every_kind() {
        let names: BTreeSet<&str> = samples().iter().map(|n| n.kind.name()).collect();
        let all: BTreeSet<&str> = NodeKind::ALL_NAMES.iter().copied().collect();
        assert_eq!(names, all);
        assert_eq!(all.len(), NodeKind::ALL_NAMES.len());
    }

    #[test]
    fn every_kind_round_trips() {
        for node in samples() {
            let doc = encode_node(&node);
            assert_eq!(doc[KIND_KEY], json!(node.kind.name()));
            let decoded = decode_node(&doc).unwrap();
            assert_eq!(decoded.as_ref(), Some(&node), "kind {}", node.kind.name());
        }
    }

    #[test]
    fn discriminant_comes_first_and_base_is_flattened() {
        let doc = encode_node(&Node::bare(NodeKind::Var("a".into())));
        let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
        assert_eq!(keys, [KIND_KEY, "id", "fodder", "context", "freeVars", "locRange"]);
    }

    #[test]
    fn missing_else_branch_is_null() {
        let node = samples()
            .into_iter()
            .find(|n| matches!(n.kind, NodeKind::Conditional(_)))
            .unwrap();
        assert_eq!(encode_node(&node)["branchFalse"], Value::Null);
    }

    #[test]
    fn unknown_kind_is_a_schema_error() {
        let err = decode_node(&json!({ "__kind__": "NotAKind" })).unwrap_err();
        assert_eq!(err.message, "unknown node kind `NotAKind`");
        assert_eq!(err.path, "/__kind__");
    }

    #[test]
    fn missing_kind_is_a_schema_error() {
        let err = decode_node(&json!({ "id": "a" })).unwrap_err();
        assert_eq!(err.path, "/__kind__");
        assert!(decode_node(&json!({ "__kind__": 3 })).is_err());
    }

    #[test]
    fn errors_point_into_nested_children() {
        let doc = json!({
            "__kind__": "Binary",
            "op": 3,
            "left": { "__kind__": "LiteralNumber", "originalString": "1" },
            "right": { "__kind__": "Var" },
        });
        let err = decode_node(&doc).unwrap_err();
        assert_eq!(err.path, "/right/id");
    }

    #[test]
    fn boolean_literal_needs_its_value() {
        let err = decode_node(&json!({ "__kind__": "LiteralBoolean" })).unwrap_err();
        assert_eq!(err.path, "/value");
        assert_eq!(err.message, "expected a boolean, found null");
        let err = decode_node(&json!({ "__kind__": "LiteralBoolean", "value": "true" })).unwrap_err();
        assert_eq!(err.path, "/value");
        let node = decode_node(&json!({ "__kind__": "LiteralBoolean", "value": false }))
            .unwrap()
            .unwrap();
        assert_eq!(node.kind, NodeKind::LiteralBoolean(false));
    }

    #[test]
    fn hand_written_documents_may_omit_trivia() {
        let doc = json!({
            "__kind__": "Local",
            "binds": [{ "variable": "a", "body": { "__kind__": "LiteralNumber", "originalString": "1" } }],
            "body": { "__kind__": "Var", "id": "a" },
        });
        let node = decode_node(&doc).unwrap().unwrap();
        assert!(node.base.fodder.is_empty());
        assert!(matches!(node.kind, NodeKind::Local(_)));
    }

    #[test]
    fn import_path_must_be_a_string_literal() {
        let doc = json!({
            "__kind__": "Import",
            "file": { "__kind__": "Var", "id": "a" },
        });
        let err = decode_node(&doc).unwrap_err();
        assert_eq!(err.path, "/file");
    }

    #[test]
    fn string_kind_survives_the_round_trip() {
        let doc = json!({
            "__kind__": "LiteralString",
            "value": "a",
            "kind": 4,
        });
        let node = decode_node(&doc).unwrap().unwrap();
        match node.kind {
            NodeKind::LiteralString(s) => assert_eq!(s.kind, LiteralStringKind::VerbatimSingle),
            other => panic!("unexpected {other:?}"),
        }
    }
}
