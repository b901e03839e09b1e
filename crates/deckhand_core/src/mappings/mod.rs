use std::io;

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::{Map, Value};

pub mod slots;

/// A parsed controller layout file.
///
/// The whole tree is kept as ordered JSON. Key insertion order is
/// semantically significant (it defines runtime ID assignment, see
/// [`slots`]), so every accessor works on the order-preserving map and
/// [`Document::emit`] writes keys back exactly as they were read.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Value,
}

impl Document {
    pub fn parse(text: &str) -> io::Result<Self> {
        let root: Value = serde_json::from_str(text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, format!("invalid JSON: {e}")))?;

        let Some(top) = root.as_object() else {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "top level is not an object",
            ));
        };
        match top.get("controller_mappings") {
            Some(Value::Object(_)) => {}
            Some(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "'controller_mappings' is not an object",
                ));
            }
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "expected 'controller_mappings' at root level",
                ));
            }
        }

        Ok(Self { root })
    }

    /// Serialize with the layout file convention: tab indentation, one level
    /// per nesting depth, `": "` separators, raw (unescaped) non-ASCII, no
    /// trailing newline.
    pub fn emit(&self) -> io::Result<String> {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"\t");
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        self.root.serialize(&mut ser).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("failed to serialize layout: {e}"),
            )
        })?;
        String::from_utf8(buf).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("serialized layout is not UTF-8: {e}"),
            )
        })
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        &mut self.root
    }

    fn mappings(&self) -> Option<&Map<String, Value>> {
        self.root.get("controller_mappings").and_then(Value::as_object)
    }

    fn mappings_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.root
            .get_mut("controller_mappings")
            .and_then(Value::as_object_mut)
    }

    /// The ordered `actions` block. Absent or mis-typed blocks read as
    /// `None`.
    pub fn actions(&self) -> Option<&Map<String, Value>> {
        self.mappings()
            .and_then(|m| m.get("actions"))
            .and_then(Value::as_object)
    }

    pub fn actions_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.mappings_mut()
            .and_then(|m| m.get_mut("actions"))
            .and_then(Value::as_object_mut)
    }

    /// The ordered `action_layers` block; entries carry `parent_set_name`.
    pub fn action_layers(&self) -> Option<&Map<String, Value>> {
        self.mappings()
            .and_then(|m| m.get("action_layers"))
            .and_then(Value::as_object)
    }

    pub fn action_layers_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.mappings_mut()
            .and_then(|m| m.get_mut("action_layers"))
            .and_then(Value::as_object_mut)
    }

    pub fn presets(&self) -> Option<&Vec<Value>> {
        self.mappings()
            .and_then(|m| m.get("preset"))
            .and_then(Value::as_array)
    }

    pub fn presets_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.mappings_mut()
            .and_then(|m| m.get_mut("preset"))
            .and_then(Value::as_array_mut)
    }

    /// The `preset` array, created empty when the block is missing.
    pub fn presets_mut_or_default(&mut self) -> io::Result<&mut Vec<Value>> {
        let mappings = self.mappings_mut().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                "'controller_mappings' is not an object",
            )
        })?;
        mappings
            .entry("preset")
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "'preset' is not an array"))
    }

    pub fn groups(&self) -> Option<&Vec<Value>> {
        self.mappings()
            .and_then(|m| m.get("group"))
            .and_then(Value::as_array)
    }

    pub fn groups_mut(&mut self) -> Option<&mut Vec<Value>> {
        self.mappings_mut()
            .and_then(|m| m.get_mut("group"))
            .and_then(Value::as_array_mut)
    }
}

/// Stringified form of an `id` attribute. Group and preset ids are stored as
/// strings in the observed files; bare numbers are tolerated.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
