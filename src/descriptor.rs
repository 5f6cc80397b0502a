//! Descriptor reader.
//!
//! A descriptor is a JSON object naming one target field and the source
//! fields it is derived from. Only key presence and value type are checked;
//! unknown keys are ignored so format drift does not break the audit.
use crate::config::FieldNames;
use crate::error::ReadError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// A descriptor that passed key and type checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDescriptor {
    pub path: PathBuf,
    /// Empty when the file omits the key; such descriptors contribute nothing.
    pub target_field: String,
    pub source_fields: Vec<String>,
    pub title: String,
    pub channels: Vec<String>,
}

impl ParsedDescriptor {
    pub fn has_target(&self) -> bool {
        !self.target_field.is_empty()
    }

    /// Whether the embedded channel list names `channel` (case-insensitive).
    pub fn is_member_of(&self, channel: &str) -> bool {
        self.channels
            .iter()
            .any(|member| member.trim().eq_ignore_ascii_case(channel))
    }
}

pub struct DescriptorReader<'a> {
    fields: &'a FieldNames,
}

impl<'a> DescriptorReader<'a> {
    pub fn new(fields: &'a FieldNames) -> Self {
        Self { fields }
    }

    pub fn read(&self, path: &Path) -> Result<ParsedDescriptor, ReadError> {
        let bytes = fs::read(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_slice(&bytes).map_err(|source| ReadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_value(path, value)
    }

    /// Extract descriptor fields from an already-parsed JSON value.
    pub fn parse_value(&self, path: &Path, value: Value) -> Result<ParsedDescriptor, ReadError> {
        let Value::Object(object) = value else {
            return Err(malformed(path, "top-level value must be a JSON object"));
        };
        let target_field =
            optional_string(&object, &self.fields.target_field, path)?.unwrap_or_default();
        let title = match optional_string(&object, &self.fields.title, path)? {
            Some(title) => title,
            None => file_stem(path),
        };
        let source_fields = self
            .fields
            .source_field_keys()
            .find(|key| object.contains_key(*key))
            .map(|key| string_list(&object, key, path, true))
            .transpose()?
            .unwrap_or_default();
        let channels = if object.contains_key(&self.fields.channels) {
            string_list(&object, &self.fields.channels, path, false)?
        } else {
            Vec::new()
        };

        Ok(ParsedDescriptor {
            path: path.to_path_buf(),
            target_field,
            source_fields,
            title,
            channels,
        })
    }
}

fn malformed(path: &Path, detail: impl Into<String>) -> ReadError {
    ReadError::Malformed {
        path: path.to_path_buf(),
        detail: detail.into(),
    }
}

/// `null` counts as absent.
fn optional_string(
    object: &Map<String, Value>,
    key: &str,
    path: &Path,
) -> Result<Option<String>, ReadError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(other) => Err(malformed(
            path,
            format!("{key:?} must be a string (got {})", kind_of(other)),
        )),
    }
}

/// Read a list of strings; a bare string is accepted when `allow_scalar`
/// (the singular `source_field` variant).
fn string_list(
    object: &Map<String, Value>,
    key: &str,
    path: &Path,
    allow_scalar: bool,
) -> Result<Vec<String>, ReadError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(text)) if allow_scalar => Ok(vec![text.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| match item {
                Value::String(text) => Ok(text.clone()),
                other => Err(malformed(
                    path,
                    format!("{key:?}[{idx}] must be a string (got {})", kind_of(other)),
                )),
            })
            .collect(),
        Some(other) => Err(malformed(
            path,
            format!("{key:?} must be a list of strings (got {})", kind_of(other)),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
