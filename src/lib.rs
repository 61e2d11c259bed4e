pub mod ast;
pub mod codec;
pub mod error;
pub mod formatter;
pub mod lexer;
pub mod parser;
pub mod plugin;
pub mod utils;
pub mod api;
mod serialization;

pub use api::{format, manifest, manifest_value, parse, parse_as, ParseOptions, ParseResult};
pub use error::JsonnetError;
