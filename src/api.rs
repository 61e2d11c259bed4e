use crate::ast::{dismantle, Fodder, Node, NodeKind};
use crate::codec::{decode_node, encode_node};
use crate::error::{JsonnetError, SchemaError};
use crate::formatter::{format_node, Options};
use crate::parser::Parser;
use crate::serialization::{from_value, to_value};
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Diagnostic file name given to every parsed snippet.
pub const SNIPPET_NAME: &str = "main.jsonnet";

/// Settings for [`parse_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Embed the file name and source lines in every `locRange`. Off by
    /// default, since it repeats the whole source text in each node.
    pub attach_source: bool,
}

/// A parsed snippet. Serializes as the generic `__kind__`-tagged document.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    pub node: Node,
    /// Trivia after the last token of the file.
    pub final_fodder: Fodder,
}

impl Serialize for ParseResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.to_value().serialize(serializer)
    }
}

impl Drop for ParseResult {
    fn drop(&mut self) {
        dismantle(std::mem::replace(&mut self.node, Node::bare(NodeKind::Dollar)));
    }
}

impl ParseResult {
    /// The generic document for the root node.
    #[must_use]
    pub fn to_value(&self) -> Value {
        encode_node(&self.node)
    }

    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self)
    }

    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self)
    }

    /// Formats the snippet, keeping the trivia at the end of the file.
    ///
    /// # Errors
    /// Returns `JsonnetError::Format` if the tree cannot be rendered.
    pub fn format(&self, options: &Options) -> Result<String, JsonnetError> {
        Ok(format_node(&self.node, &self.final_fodder, options)?)
    }
}

/// Parses Jsonnet source into a typed tree.
///
/// # Errors
/// Returns `JsonnetError::Syntax` if the source is not valid Jsonnet.
pub fn parse_with(source: &str, options: &ParseOptions) -> Result<ParseResult, JsonnetError> {
    debug!("parsing {} bytes of jsonnet", source.len());
    let mut parser = Parser::new_with_name(source, SNIPPET_NAME.to_string())?;
    if options.attach_source {
        parser = parser.with_source_attached();
    }
    let (node, final_fodder) = parser.parse_snippet()?;
    Ok(ParseResult { node, final_fodder })
}

/// Parses Jsonnet source into the generic tagged document.
///
/// The trivia after the last token is not part of any node and is dropped.
///
/// # Errors
/// Returns `JsonnetError::Syntax` if the source is not valid Jsonnet.
pub fn parse(source: &str) -> Result<Value, JsonnetError> {
    Ok(parse_with(source, &ParseOptions::default())?.to_value())
}

/// Parses Jsonnet source and decodes the generic document into any type.
///
/// # Errors
/// Returns `JsonnetError::Syntax` for invalid source and
/// `JsonnetError::Serde` if the document does not fit `T`.
pub fn parse_as<T: DeserializeOwned>(source: &str) -> Result<T, JsonnetError> {
    from_value(parse(source)?)
}

/// Turns a generic document back into canonically formatted Jsonnet.
///
/// # Errors
/// Returns `JsonnetError::Serde` if `tree` cannot be represented as generic
/// data, `JsonnetError::Schema` if the document is not a valid syntax tree
/// and `JsonnetError::Format` if the tree cannot be rendered.
pub fn manifest<T: Serialize + ?Sized>(tree: &T) -> Result<String, JsonnetError> {
    manifest_value(&to_value(tree)?)
}

/// [`manifest`] for a tree that is already a generic document.
///
/// # Errors
/// Returns `JsonnetError::Schema` if the document is not a valid syntax tree
/// and `JsonnetError::Format` if the tree cannot be rendered.
pub fn manifest_value(document: &Value) -> Result<String, JsonnetError> {
    debug!("manifesting a generic document");
    let node = decode_node(document)?
        .ok_or_else(|| SchemaError::new("expected a node, found nothing"))?;
    let formatted = format_node(&node, &Fodder::new(), &Options::default());
    dismantle(node);
    Ok(formatted?)
}

/// Reformats Jsonnet source with the default options.
///
/// # Errors
/// Returns `JsonnetError::Syntax` for invalid source and
/// `JsonnetError::Format` if the tree cannot be rendered.
pub fn format(source: &str) -> Result<String, JsonnetError> {
    format_with(source, &Options::default())
}

/// Reformats Jsonnet source.
///
/// # Errors
/// Same as [`format`].
pub fn format_with(source: &str, options: &Options) -> Result<String, JsonnetError> {
    debug!("formatting {} bytes of jsonnet", source.len());
    parse_with(source, &ParseOptions::default())?.format(options)
}
