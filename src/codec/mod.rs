//! Conversion between the syntax tree and generic JSON documents.
//!
//! Every node becomes an object tagged with [`KIND_KEY`]; the fields shared by
//! all nodes (`fodder`, `context`, `freeVars`, `locRange`) sit at the same level
//! as the kind-specific ones. Absent children are `null`.

mod composite;
mod envelope;
mod location;
mod node;
mod tags;
mod trivia;

use crate::ast::Node;
use crate::error::SchemaError;
use serde_json::{Map, Value};

pub use envelope::{require, unwrap, wrap};
pub use node::{decode_node, encode_node};

/// The discriminant field of every node document.
pub const KIND_KEY: &str = "__kind__";

pub trait Encode {
    fn encode(&self) -> Value;
}

pub trait Decode: Sized {
    fn decode(value: &Value) -> Result<Self, SchemaError>;
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self) -> Value {
        Value::Array(self.iter().map(Encode::encode).collect())
    }
}

/// `null` reads as an empty list.
impl<T: Decode> Decode for Vec<T> {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, item)| T::decode(item).map_err(|e| e.within(i)))
                .collect(),
            other => Err(unexpected("an array", other)),
        }
    }
}

impl Decode for String {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            other => Err(unexpected("a string", other)),
        }
    }
}

/// Largest blank line count, indent or wire code accepted. Fits `usize` on
/// every supported target.
const MAX_COUNT: u64 = u32::MAX as u64;

/// Non-negative integers up to [`MAX_COUNT`]. Hosts that only have floating
/// point numbers send `2.0` for `2`, so integral floats are accepted as well.
pub(crate) fn decode_count(value: &Value) -> Result<u64, SchemaError> {
    let count = match value.as_u64() {
        Some(n) => n,
        None => match value.as_f64() {
            Some(f) if f >= 0.0 && f.fract() == 0.0 => f as u64,
            _ => return Err(unexpected("a non-negative integer", value)),
        },
    };
    if count > MAX_COUNT {
        return Err(SchemaError::new(format!(
            "{count} is out of range, counts go up to {MAX_COUNT}"
        )));
    }
    Ok(count)
}

pub(crate) fn unexpected(expected: &str, found: &Value) -> SchemaError {
    let found = match found {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    SchemaError::new(format!("expected {expected}, found {found}"))
}

/// Builds a document from `key => value` pairs, keeping their order.
macro_rules! document {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = serde_json::Map::new();
        $( map.insert(String::from($key), serde_json::Value::from($value)); )*
        map
    }};
}
pub(crate) use document;

/// Read access to the fields of one document. Every accessor tags its errors
/// with the field name so the final error points at the offending value.
pub(crate) struct Fields<'a> {
    map: &'a Map<String, Value>,
}

static NULL: Value = Value::Null;

impl<'a> Fields<'a> {
    pub fn of(value: &'a Value) -> Result<Self, SchemaError> {
        match value {
            Value::Object(map) => Ok(Self { map }),
            other => Err(unexpected("an object", other)),
        }
    }

    pub fn from_map(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    /// A missing field reads as `null`.
    pub fn get(&self, key: &str) -> &'a Value {
        self.map.get(key).unwrap_or(&NULL)
    }

    pub fn has(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn decode<T: Decode>(&self, key: &str) -> Result<T, SchemaError> {
        T::decode(self.get(key)).map_err(|e| e.within(key))
    }

    pub fn string(&self, key: &str) -> Result<String, SchemaError> {
        self.decode(key)
    }

    pub fn opt_string(&self, key: &str) -> Result<Option<String>, SchemaError> {
        match self.get(key) {
            Value::Null => Ok(None),
            value => String::decode(value).map(Some).map_err(|e| e.within(key)),
        }
    }

    /// A boolean that must be spelled out.
    pub fn boolean(&self, key: &str) -> Result<bool, SchemaError> {
        match self.get(key) {
            Value::Bool(b) => Ok(*b),
            other => Err(unexpected("a boolean", other).within(key)),
        }
    }

    /// Missing or `null` reads as `false`.
    pub fn flag(&self, key: &str) -> Result<bool, SchemaError> {
        match self.get(key) {
            Value::Null => Ok(false),
            Value::Bool(b) => Ok(*b),
            other => Err(unexpected("a boolean", other).within(key)),
        }
    }

    /// Missing or `null` reads as zero.
    pub fn count(&self, key: &str) -> Result<usize, SchemaError> {
        match self.get(key) {
            Value::Null => Ok(0),
            value => decode_count(value)
                .map(|n| n as usize)
                .map_err(|e| e.within(key)),
        }
    }

    pub fn node(&self, key: &str) -> Result<Box<Node>, SchemaError> {
        require(self.get(key))
            .map(Box::new)
            .map_err(|e| e.within(key))
    }

    pub fn opt_node(&self, key: &str) -> Result<Option<Box<Node>>, SchemaError> {
        unwrap(self.get(key))
            .map(|node| node.map(Box::new))
            .map_err(|e| e.within(key))
    }
}
