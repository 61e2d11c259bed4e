use super::{document, Decode, Encode, Fields};
use crate::ast::{Location, LocationRange, Source};
use crate::error::SchemaError;
use serde_json::Value;
use std::sync::Arc;

impl Encode for Location {
    fn encode(&self) -> Value {
        Value::Object(document! {
            "line" => self.line,
            "column" => self.column,
        })
    }
}

impl Decode for Location {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        if value.is_null() {
            return Ok(Location::default());
        }
        let fields = Fields::of(value)?;
        Ok(Location {
            line: fields.count("line")?,
            column: fields.count("column")?,
        })
    }
}

impl Encode for Source {
    fn encode(&self) -> Value {
        Value::Object(document! {
            "diagnosticFileName" => self.diagnostic_file_name.clone(),
            "lines" => self.lines.clone(),
        })
    }
}

impl Decode for Source {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        let fields = Fields::of(value)?;
        Ok(Source {
            diagnostic_file_name: fields.opt_string("diagnosticFileName")?.unwrap_or_default(),
            lines: fields.decode("lines")?,
        })
    }
}

impl Encode for LocationRange {
    fn encode(&self) -> Value {
        let file = match &self.file {
            Some(source) => source.encode(),
            None => Value::Null,
        };
        Value::Object(document! {
            "file" => file,
            "fileName" => self.file_name.clone(),
            "begin" => self.begin.encode(),
            "end" => self.end.encode(),
        })
    }
}

/// Locations only feed diagnostics, so a missing or `null` range reads as the
/// empty range.
impl Decode for LocationRange {
    fn decode(value: &Value) -> Result<Self, SchemaError> {
        if value.is_null() {
            return Ok(LocationRange::default());
        }
        let fields = Fields::of(value)?;
        let file = match fields.get("file") {
            Value::Null => None,
            file => Some(Arc::new(Source::decode(file).map_err(|e| e.within("file"))?)),
        };
        Ok(LocationRange {
            file_name: fields.opt_string("fileName")?.unwrap_or_default(),
            file,
            begin: fields.decode("begin")?,
            end: fields.decode("end")?,
        })
    }
}
