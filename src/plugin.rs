//! The callable surface a host registers: `parseJsonnet`, `manifestJsonnet`
//! and `formatJsonnet`, each taking exactly one positional argument.

use crate::api;
use crate::error::{ArgumentError, JsonnetError};
use log::debug;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// Name the plugin is registered under.
pub const PLUGIN_NAME: &str = "jsonnet";

/// Signature shared by all plugin functions.
pub type NativeFn = fn(&[Value]) -> Result<Value, JsonnetError>;

/// A function the host can call with generic values.
#[derive(Debug, Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub params: &'static [&'static str],
    pub func: NativeFn,
}

impl NativeFunction {
    /// # Errors
    /// Whatever the wrapped function reports.
    pub fn call(&self, args: &[Value]) -> Result<Value, JsonnetError> {
        debug!("plugin call: {} with {} argument(s)", self.name, args.len());
        (self.func)(args)
    }
}

/// Anything a host uses to look functions up by name.
pub trait FunctionTable {
    fn register(&mut self, function: NativeFunction);
}

impl FunctionTable for HashMap<String, NativeFunction> {
    fn register(&mut self, function: NativeFunction) {
        self.insert(function.name.to_string(), function);
    }
}

impl FunctionTable for BTreeMap<String, NativeFunction> {
    fn register(&mut self, function: NativeFunction) {
        self.insert(function.name.to_string(), function);
    }
}

/// A named bundle of functions.
#[derive(Debug, Clone)]
pub struct Plugin {
    name: &'static str,
    functions: Vec<NativeFunction>,
}

impl Plugin {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn functions(&self) -> &[NativeFunction] {
        &self.functions
    }

    #[must_use]
    pub fn function(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn register_into(&self, table: &mut impl FunctionTable) {
        for function in &self.functions {
            table.register(*function);
        }
    }
}

/// The Jsonnet plugin with all three functions.
#[must_use]
pub fn plugin() -> Plugin {
    Plugin {
        name: PLUGIN_NAME,
        functions: vec![
            NativeFunction {
                name: "parseJsonnet",
                params: &["jsonnet"],
                func: parse_jsonnet,
            },
            NativeFunction {
                name: "manifestJsonnet",
                params: &["jsonnet"],
                func: manifest_jsonnet,
            },
            NativeFunction {
                name: "formatJsonnet",
                params: &["code"],
                func: format_jsonnet,
            },
        ],
    }
}

fn single_argument<'a>(args: &'a [Value], name: &'static str) -> Result<&'a Value, ArgumentError> {
    match args {
        [arg] => Ok(arg),
        _ => Err(ArgumentError::Count {
            name,
            given: args.len(),
        }),
    }
}

fn string_argument<'a>(args: &'a [Value], name: &'static str) -> Result<&'a str, ArgumentError> {
    single_argument(args, name)?
        .as_str()
        .ok_or(ArgumentError::Type { name })
}

/// `parseJsonnet(jsonnet)`: source text to generic tree.
///
/// # Errors
/// Argument errors, or a syntax error for invalid source.
pub fn parse_jsonnet(args: &[Value]) -> Result<Value, JsonnetError> {
    let source = string_argument(args, "jsonnet")?;
    api::parse(source)
}

/// `manifestJsonnet(jsonnet)`: generic tree to formatted text.
///
/// # Errors
/// Argument errors, or a schema or format error for a bad tree.
pub fn manifest_jsonnet(args: &[Value]) -> Result<Value, JsonnetError> {
    let tree = single_argument(args, "jsonnet")?;
    api::manifest_value(tree).map(Value::String)
}

/// `formatJsonnet(code)`: source text to formatted text.
///
/// # Errors
/// Argument errors, or a syntax or format error.
pub fn format_jsonnet(args: &[Value]) -> Result<Value, JsonnetError> {
    let code = string_argument(args, "code")?;
    api::format(code).map(Value::String)
}
