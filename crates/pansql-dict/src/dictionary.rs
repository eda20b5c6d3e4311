//! Dictionary catalog: stream and field definitions, JSON persistence,
//! and the compressed wire form embedded in emitted programs.
//!
//! Stream and field names are case-sensitive; lookups that need to be
//! forgiving (destination-field matching) go through the `_insensitive`
//! variants.

use crate::types::FieldType;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::Path;

/// Error raised while loading or decoding a dictionary.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed dictionary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed dictionary wire form: {0}")]
    Encoding(#[from] base64::DecodeError),
}

/// A single named, typed field of a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: FieldType,
}

/// An ordered record schema for one stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub fields: Vec<FieldDefinition>,
    /// Names of the fields forming the primary key, in key order.
    #[serde(default)]
    pub primary_key: Vec<String>,
}

impl StreamDefinition {
    /// Look up a field by exact name. Returns its ordinal and definition.
    pub fn field(&self, name: &str) -> Option<(usize, &FieldDefinition)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }

    /// Look up a field ignoring ASCII case.
    pub fn field_insensitive(&self, name: &str) -> Option<(usize, &FieldDefinition)> {
        self.fields
            .iter()
            .enumerate()
            .find(|(_, f)| f.name.eq_ignore_ascii_case(name))
    }

    /// The schema-qualified stream name (`schema.name`, or just `name`).
    pub fn qualified_name(&self) -> String {
        match &self.schema {
            Some(s) => format!("{}.{}", s, self.name),
            None => self.name.clone(),
        }
    }

    /// The ordinal of the single primary-key field, if the key is exactly
    /// one field wide.
    pub fn single_key_ordinal(&self) -> Option<usize> {
        match self.primary_key.as_slice() {
            [key] => self.field(key).map(|(i, _)| i),
            _ => None,
        }
    }
}

/// A named catalog of stream definitions.
///
/// Stream order is part of the dictionary contract: the emitted program
/// processes streams in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataDictionary {
    pub name: String,
    pub streams: Vec<StreamDefinition>,
}

impl DataDictionary {
    /// Look up a stream by exact name.
    pub fn stream(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams.iter().find(|s| s.name == name)
    }

    /// Look up a stream ignoring ASCII case.
    pub fn stream_insensitive(&self, name: &str) -> Option<&StreamDefinition> {
        self.streams
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Load a dictionary from a JSON file on disk.
    pub fn load(path: &Path) -> Result<Self, DictError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Serialize to the JSON file format.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("dictionary serialization cannot fail")
    }

    /// Encode as the compressed wire form: gzip-compressed JSON, base64.
    ///
    /// This is the form emitted programs embed and the network pass writes
    /// to handoff files.
    pub fn to_compressed_string(&self) -> String {
        let json = serde_json::to_vec(self).expect("dictionary serialization cannot fail");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder
            .write_all(&json)
            .expect("in-memory gzip write cannot fail");
        let compressed = encoder.finish().expect("in-memory gzip finish cannot fail");
        BASE64.encode(compressed)
    }

    /// Decode the compressed wire form produced by `to_compressed_string`.
    pub fn from_compressed_string(text: &str) -> Result<Self, DictError> {
        let compressed = BASE64.decode(text.trim())?;
        let mut decoder = GzDecoder::new(&compressed[..]);
        let mut json = Vec::new();
        decoder.read_to_end(&mut json)?;
        Ok(serde_json::from_slice(&json)?)
    }
}
