//! Data dictionary model for the PanSQL compiler.
//!
//! A dictionary is a named catalog of stream definitions. The compiler
//! loads dictionaries referenced by `load` statements, resolves stream and
//! field names against them, and embeds their compressed wire form in the
//! emitted program.
//!
//! # Design
//!
//! - `TypeTag` / `FieldType` — the field type system and its fixed
//!   assignability matrix
//! - `StreamDefinition` / `FieldDefinition` — ordered schema entries
//! - `DataDictionary` — the catalog, with JSON persistence and the
//!   gzip+base64 wire codec used by emitted programs

mod dictionary;
mod types;

pub use dictionary::{DataDictionary, DictError, FieldDefinition, StreamDefinition};
pub use types::{FieldType, TypeTag};
