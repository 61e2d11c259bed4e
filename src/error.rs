use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt::Display;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum JsonnetError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Argument(#[from] ArgumentError),

    #[error("generic data conversion failed: {0}")]
    #[diagnostic(code(codec::generic_data))]
    Serde(String),
}

impl From<serde_json::Error> for JsonnetError {
    fn from(err: serde_json::Error) -> Self {
        JsonnetError::Serde(err.to_string())
    }
}

/// Raised when source text is not valid Jsonnet.
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SyntaxError {
    #[error("{line}:{column} expected {expected}, found {found}")]
    #[diagnostic(
        code(parser::unexpected_token),
        help("The parser found a token it did not expect in this position.")
    )]
    UnexpectedToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("expected {expected}")]
        span: SourceSpan,
        expected: String,
        found: String,
        line: usize,
        column: usize,
    },

    #[error("{line}:{column} unexpected end of file, expected {expected}")]
    #[diagnostic(
        code(parser::unexpected_eof),
        help("The file ended unexpectedly. The parser expected more tokens.")
    )]
    UnexpectedEof {
        #[source_code]
        src: NamedSource<String>,
        #[label("file ended here")]
        span: SourceSpan,
        expected: String,
        line: usize,
        column: usize,
    },

    #[error("{line}:{column} {message}")]
    #[diagnostic(code(lexer::invalid_token))]
    InvalidToken {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{line}:{column} {message}")]
    #[diagnostic(code(parser::invalid_construct))]
    InvalidConstruct {
        #[source_code]
        src: NamedSource<String>,
        #[label("here")]
        span: SourceSpan,
        message: String,
        line: usize,
        column: usize,
    },
}

impl SyntaxError {
    /// 1-based line and column of the offending token.
    pub fn position(&self) -> (usize, usize) {
        match self {
            SyntaxError::UnexpectedToken { line, column, .. }
            | SyntaxError::UnexpectedEof { line, column, .. }
            | SyntaxError::InvalidToken { line, column, .. }
            | SyntaxError::InvalidConstruct { line, column, .. } => (*line, *column),
        }
    }
}

/// Raised when a generic document does not decode into a syntax tree.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("{message} at {}", display_pointer(.path))]
#[diagnostic(
    code(codec::schema),
    help("Every node document needs a known `__kind__` and fields of the expected shape.")
)]
pub struct SchemaError {
    /// JSON pointer to the offending value.
    pub path: String,
    pub message: String,
}

impl SchemaError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            path: String::new(),
            message: message.into(),
        }
    }

    /// Prefixes the pointer with one more path segment while the error bubbles up.
    #[must_use]
    pub fn within(mut self, segment: impl Display) -> Self {
        let segment = segment.to_string().replace('~', "~0").replace('/', "~1");
        self.path = format!("/{segment}{}", self.path);
        self
    }
}

fn display_pointer(path: &str) -> &str {
    if path.is_empty() {
        "document root"
    } else {
        path
    }
}

/// Raised when a decoded tree cannot be rendered as Jsonnet text.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
#[error("cannot format {construct}: {message}")]
#[diagnostic(code(formatter::unrenderable))]
pub struct FormatError {
    pub construct: &'static str,
    pub message: String,
}

impl FormatError {
    pub fn new(construct: &'static str, message: impl Into<String>) -> Self {
        Self {
            construct,
            message: message.into(),
        }
    }
}

/// Raised by the plugin surface when a call does not match a function's signature.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("{name} must be provided")]
    #[diagnostic(code(plugin::argument_count))]
    Count { name: &'static str, given: usize },

    #[error("{name} must be a string")]
    #[diagnostic(code(plugin::argument_type))]
    Type { name: &'static str },
}
