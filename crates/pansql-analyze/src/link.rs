//! Whole-program linking and auto-mapping.
//!
//! Collects explicit and select-implied name maps, auto-maps every
//! unhandled source stream onto a same-named output stream, and warns
//! about streams that cannot be synchronized. The resulting pairs are
//! ordered: select-implied maps first, explicit maps second, auto-maps in
//! source-catalog order.

use crate::resolve::Analysis;
use crate::symbols::Symbol;
use pansql_ast::CompilerError;
use pansql_dict::StreamDefinition;
use std::collections::HashSet;

/// Linked name-map sets for the emitter.
#[derive(Debug, Clone, Default)]
pub struct Linkage {
    /// `source stream -> destination stream` pairs where the names differ
    pub name_maps: Vec<(String, String)>,
    /// Identity pass-through pairs added by the auto-mapper
    pub auto_maps: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

/// Run the linker over a completed analysis.
pub fn link(analysis: &Analysis) -> Result<Linkage, CompilerError> {
    let reader_dict = endpoint_dict(analysis, &analysis.sync.reader)?;
    let writer_dict = endpoint_dict(analysis, &analysis.sync.writer)?;

    let mut handled: HashSet<&str> = HashSet::new();
    for select in &analysis.selects {
        handled.insert(&select.input.stream_name);
    }
    // Streamed inputs materialized as tables never pass through.
    for table in &analysis.tables {
        handled.insert(&table.stream_name);
    }
    for map in &analysis.maps {
        handled.insert(&map.source_stream);
    }

    let mut linkage = Linkage::default();

    for select in &analysis.selects {
        if select.input.stream_name != select.output.stream_name {
            linkage.name_maps.push((
                select.input.stream_name.clone(),
                select.output.stream_name.clone(),
            ));
        }
    }
    for map in &analysis.maps {
        if map.source_stream != map.dest_stream {
            linkage
                .name_maps
                .push((map.source_stream.clone(), map.dest_stream.clone()));
        }
    }

    let source = &analysis.dictionaries[reader_dict];
    let dest = &analysis.dictionaries[writer_dict];
    for stream in &source.streams {
        if handled.contains(stream.name.as_str()) {
            continue;
        }
        match dest.stream(&stream.name) {
            Some(dest_stream) => {
                if let Err(reason) = identity_compatible(stream, dest_stream) {
                    return Err(CompilerError::new(format!(
                        "stream '{}' cannot be auto-mapped to the output stream '{}': {}",
                        stream.name, dest_stream.name, reason
                    )));
                }
                linkage
                    .auto_maps
                    .push((stream.name.clone(), dest_stream.name.clone()));
            }
            None => {
                linkage.warnings.push(format!(
                    "stream '{}' has no matching stream in the output dictionary and will not be synchronized",
                    stream.name
                ));
            }
        }
    }

    for table in &analysis.tables {
        if !table.used {
            linkage.warnings.push(format!(
                "table '{}' is declared but never used",
                table.var_name
            ));
        }
    }

    Ok(linkage)
}

fn endpoint_dict(analysis: &Analysis, key: &str) -> Result<usize, CompilerError> {
    match analysis.symbols.get(key) {
        Some(entry) => match &entry.symbol {
            Symbol::Endpoint { dict, .. } => Ok(*dict),
            _ => Err(CompilerError::new(format!(
                "'{}' is not an open endpoint",
                entry.name
            ))),
        },
        None => Err(CompilerError::new(format!("unknown name '{}'", key))),
    }
}

/// Whether a source stream can pass through unchanged into a destination
/// stream: every destination field is fed by a same-named, assignable
/// source field, or is nullable.
fn identity_compatible(source: &StreamDefinition, dest: &StreamDefinition) -> Result<(), String> {
    let mut missing = Vec::new();
    for dest_field in &dest.fields {
        match source.field_insensitive(&dest_field.name) {
            Some((_, source_field)) => {
                if !source_field.ty.assignable_to(&dest_field.ty) {
                    return Err(format!(
                        "field '{}' of type {} is not assignable to type {}",
                        source_field.name, source_field.ty, dest_field.ty
                    ));
                }
            }
            None => {
                if !dest_field.ty.nullable {
                    missing.push(dest_field.name.clone());
                }
            }
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "non-nullable field(s) {} are not assigned a value",
            missing.join(", ")
        ))
    }
}
