//! Codecs for the fixed-shape structures nested inside nodes. They carry a
//! `__kind__` label on the wire for readability, but decoding never dispatches
//! on it: the container already determines the shape.

use super::{document, encode_node, wrap, Decode, Encode, Fields, KIND_KEY};
use crate::ast::{
    Arguments, CommaSeparatedExpr, ForSpec, IfSpec, LocalBind, NamedArgument, ObjectField,
    Parameter, Params,
};
use crate::error::SchemaError;
use serde_json::{Map, Value};

impl Encode for CommaSeparatedExpr {
    fn encode(&self) -> Value {
        Value::Object(document! {
            KIND_KEY => "CommaSeparatedExpr",
            "expr" => encode_node(&self.expr),
            "commaFodder" => self.comma_fodder.encode(),
        })
    }
}

impl Decode for CommaSeparatedExpr {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        Ok(CommaSeparatedExpr {
            expr: *fields.node("expr")?,
            comma_fodder: fields.decode("commaFodder")?,
        })
    }
}

impl Encode for NamedArgument {
    fn encode(&self) -> Value {
        Value::Object(document! {
            KIND_KEY => "NamedArgument",
            "nameFodder" => self.name_fodder.encode(),
            "name" => self.name.clone(),
            "eqFodder" => self.eq_fodder.encode(),
            "arg" => encode_node(&self.arg),
            "commaFodder" => self.comma_fodder.encode(),
        })
    }
}

impl Decode for NamedArgument {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        Ok(NamedArgument {
            name_fodder: fields.decode("nameFodder")?,
            name: fields.string("name")?,
            eq_fodder: fields.decode("eqFodder")?,
            arg: *fields.node("arg")?,
            comma_fodder: fields.decode("commaFodder")?,
        })
    }
}

impl Encode for Arguments {
    fn encode(&self) -> Value {
        Value::Object(document! {
            "positional" => self.positional.encode(),
            "named" => self.named.encode(),
        })
    }
}

impl Decode for Arguments {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        if value.is_null() {
            return Ok(Arguments::default());
        }
        let fields = Fields::of(value)?;
        Ok(Arguments {
            positional: fields.decode("positional")?,
            named: fields.decode("named")?,
        })
    }
}

impl Encode for Parameter {
    fn encode(&self) -> Value {
        Value::Object(document! {
            KIND_KEY => "Parameter",
            "nameFodder" => self.name_fodder.encode(),
            "name" => self.name.clone(),
            "commaFodder" => self.comma_fodder.encode(),
            "eqFodder" => self.eq_fodder.encode(),
            "defaultArg" => wrap(self.default_arg.as_deref()),
            "locRange" => self.loc_range.encode(),
        })
    }
}

impl Decode for Parameter {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        Ok(Parameter {
            name_fodder: fields.decode("nameFodder")?,
            name: fields.string("name")?,
            eq_fodder: fields.decode("eqFodder")?,
            default_arg: fields.opt_node("defaultArg")?,
            comma_fodder: fields.decode("commaFodder")?,
            loc_range: fields.decode("locRange")?,
        })
    }
}

impl Params {
    /// The parameter-list fields, shared with the `Function` node document.
    pub(crate) fn encode_fields(&self, map: &mut Map<String, Value>) {
        map.insert("parenLeftFodder".into(), self.paren_left_fodder.encode());
        map.insert("parenRightFodder".into(), self.paren_right_fodder.encode());
        map.insert("parameters".into(), self.parameters.encode());
        map.insert("trailingComma".into(), Value::Bool(self.trailing_comma));
    }

    pub(crate) fn decode_fields(fields: &Fields<'_>) -> Result<Self, SchemaError> {
        Ok(Params {
            paren_left_fodder: fields.decode("parenLeftFodder")?,
            parameters: fields.decode("parameters")?,
            trailing_comma: fields.flag("trailingComma")?,
            paren_right_fodder: fields.decode("parenRightFodder")?,
        })
    }
}

/// The sugared parameter lists of `local f(x) = ...` and `f(x): ...` travel as
/// a `Function` document without a body.
impl Encode for Params {
    fn encode(&self) -> Value {
        let mut map = document! { KIND_KEY => "Function" };
        self.encode_fields(&mut map);
        Value::Object(map)
    }
}

impl Decode for Params {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        Params::decode_fields(&Fields::of(value)?)
    }
}

fn encode_sugar(params: &Option<Params>) -> Value {
    match params {
        Some(params) => params.encode(),
        None => Value::Null,
    }
}

fn decode_sugar(fields: &Fields<'_>, key: &str) -> Result<Option<Params>, SchemaError> {
    match fields.get(key) {
        Value::Null => Ok(None),
        value => Params::decode(value).map(Some).map_err(|e| e.within(key)),
    }
}

impl Encode for LocalBind {
    fn encode(&self) -> Value {
        Value::Object(document! {
            KIND_KEY => "LocalBind",
            "varFodder" => self.var_fodder.encode(),
            "body" => encode_node(&self.body),
            "eqFodder" => self.eq_fodder.encode(),
            "variable" => self.variable.clone(),
            "closeFodder" => self.close_fodder.encode(),
            "fun" => encode_sugar(&self.fun),
        })
    }
}

impl Decode for LocalBind {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        Ok(LocalBind {
            var_fodder: fields.decode("varFodder")?,
            variable: fields.string("variable")?,
            fun: decode_sugar(&fields, "fun")?,
            eq_fodder: fields.decode("eqFodder")?,
            body: *fields.node("body")?,
            close_fodder: fields.decode("closeFodder")?,
        })
    }
}

impl Encode for ObjectField {
    fn encode(&self) -> Value {
        Value::Object(document! {
            KIND_KEY => "ObjectField",
            "method" => encode_sugar(&self.method),
            "id" => self.id.clone(),
            "fodder2" => self.fodder2.encode(),
            "fodder1" => self.fodder1.encode(),
            "opFodder" => self.op_fodder.encode(),
            "commaFodder" => self.comma_fodder.encode(),
            "expr1" => wrap(self.expr1.as_deref()),
            "expr2" => encode_node(&self.expr2),
            "expr3" => wrap(self.expr3.as_deref()),
            "locRange" => self.loc_range.encode(),
            "kind" => self.kind.encode(),
            "Hide" => self.hide.encode(),
            "SuperSugar" => self.super_sugar,
        })
    }
}

/// The kind, visibility and sugar flags are taken as they are. Combinations
/// the syntax cannot express are left for the formatter to reject.
impl Decode for ObjectField {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        Ok(ObjectField {
            kind: fields.decode("kind")?,
            hide: fields.decode("Hide")?,
            super_sugar: fields.flag("SuperSugar")?,
            method: decode_sugar(&fields, "method")?,
            fodder1: fields.decode("fodder1")?,
            id: fields.opt_string("id")?,
            expr1: fields.opt_node("expr1")?,
            fodder2: fields.decode("fodder2")?,
            op_fodder: fields.decode("opFodder")?,
            expr2: fields.node("expr2")?,
            expr3: fields.opt_node("expr3")?,
            comma_fodder: fields.decode("commaFodder")?,
            loc_range: fields.decode("locRange")?,
        })
    }
}

impl Encode for IfSpec {
    fn encode(&self) -> Value {
        Value::Object(document! {
            KIND_KEY => "IfSpec",
            "expr" => encode_node(&self.expr),
            "ifFodder" => self.if_fodder.encode(),
        })
    }
}

impl Decode for IfSpec {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        Ok(IfSpec {
            if_fodder: fields.decode("ifFodder")?,
            expr: *fields.node("expr")?,
        })
    }
}

impl Encode for ForSpec {
    fn encode(&self) -> Value {
        let outer = match &self.outer {
            Some(outer) => outer.encode(),
            None => Value::Null,
        };
        Value::Object(document! {
            KIND_KEY => "ForSpec",
            "forFodder" => self.for_fodder.encode(),
            "varFodder" => self.var_fodder.encode(),
            "conditions" => self.conditions.encode(),
            "outer" => outer,
            "expr" => encode_node(&self.expr),
            "varName" => self.var_name.clone(),
            "inFodder" => self.in_fodder.encode(),
        })
    }
}

/// Walks the `outer` links iteratively. Every link must spell out its `outer`
/// field; `null` ends the chain.
impl Decode for ForSpec {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let mut links = Vec::new();
        let mut current = value;
        let mut path = Vec::new();
        loop {
            let fields = Fields::of(current).map_err(|e| nest(e, &path))?;
            links.push(decode_link(&fields).map_err(|e| nest(e, &path))?);
            if !fields.has("outer") {
                return Err(nest(
                    SchemaError::new("comprehension clause without an `outer` field").within("outer"),
                    &path,
                ));
            }
            match fields.get("outer") {
                Value::Null => break,
                outer => {
                    current = outer;
                    path.push("outer");
                }
            }
        }

        let mut spec: Option<ForSpec> = None;
        for mut link in links.into_iter().rev() {
            link.outer = spec.map(Box::new);
            spec = Some(link);
        }
        spec.ok_or_else(|| SchemaError::new("empty comprehension chain"))
    }
}

fn nest(mut err: SchemaError, path: &[&str]) -> SchemaError {
    for segment in path.iter().rev() {
        err = err.within(segment);
    }
    err
}

fn decode_link(fields: &Fields<'_>) -> Result<ForSpec, SchemaError> {
    Ok(ForSpec {
        for_fodder: fields.decode("forFodder")?,
        var_fodder: fields.decode("varFodder")?,
        var_name: fields.string("varName")?,
        in_fodder: fields.decode("inFodder")?,
        expr: fields.node("expr")?,
        conditions: fields.decode("conditions")?,
        outer: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, NodeKind};
    use serde_json::json;

    fn var(name: &str) -> Node {
        Node::bare(NodeKind::Var(name.into()))
    }

    fn link(var_name: &str, outer: Option<ForSpec>) -> ForSpec {
        ForSpec {
            for_fodder: vec![],
            var_fodder: vec![],
            var_name: var_name.into(),
            in_fodder: vec![],
            expr: Box::new(var("xs")),
            conditions: vec![],
            outer: outer.map(Box::new),
        }
    }

    #[test]
    fn outer_chain_round_trips_in_order() {
        let spec = link("c", Some(link("b", Some(link("a", None)))));
        let encoded = spec.encode();
        assert_eq!(encoded["varName"], json!("c"));
        assert_eq!(encoded["outer"]["outer"]["varName"], json!("a"));
        assert_eq!(encoded["outer"]["outer"]["outer"], Value::Null);

        let decoded = ForSpec::decode(&encoded).unwrap();
        assert_eq!(decoded, spec);
        let names: Vec<&str> = decoded.chain().iter().map(|s| s.var_name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c"]);
    }

    #[test]
    fn chain_without_terminal_marker_is_rejected() {
        let mut encoded = link("b", Some(link("a", None))).encode();
        encoded["outer"]
            .as_object_mut()
            .unwrap()
            .remove("outer");
        let err = ForSpec::decode(&encoded).unwrap_err();
        assert_eq!(err.path, "/outer/outer");
    }

    #[test]
    fn sugar_params_travel_as_bodyless_function() {
        let bind = LocalBind {
            var_fodder: vec![],
            variable: "f".into(),
            fun: Some(Params::default()),
            eq_fodder: vec![],
            body: var("x"),
            close_fodder: vec![],
        };
        let encoded = bind.encode();
        assert_eq!(encoded["fun"][KIND_KEY], json!("Function"));
        assert!(encoded["fun"].get("body").is_none());
        assert_eq!(LocalBind::decode(&encoded).unwrap(), bind);
    }

    #[test]
    fn plain_bind_has_null_fun() {
        let encoded = json!({
            "variable": "a",
            "body": { "__kind__": "LiteralNull" },
            "fun": null,
        });
        let bind = LocalBind::decode(&encoded).unwrap();
        assert_eq!(bind.fun, None);
        assert_eq!(bind.body.kind, NodeKind::LiteralNull);
    }

    #[test]
    fn field_flags_are_not_cross_checked() {
        let encoded = json!({
            "__kind__": "ObjectField",
            "kind": 1,
            "Hide": 2,
            "SuperSugar": true,
            "id": null,
            "expr2": { "__kind__": "LiteralNull" },
        });
        let field = ObjectField::decode(&encoded).unwrap();
        assert_eq!(field.id, None);
        assert!(field.super_sugar);
    }

    #[test]
    fn field_value_is_required() {
        let encoded = json!({ "kind": 1, "Hide": 1, "id": "a", "expr2": null });
        let err = ObjectField::decode(&encoded).unwrap_err();
        assert_eq!(err.path, "/expr2");
    }
}
