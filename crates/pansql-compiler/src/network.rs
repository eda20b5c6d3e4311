//! Multi-script network pass.
//!
//! Pairs each `Network` writer in script *i* with the first unpaired
//! `Network` reader in a later script whose connection string matches.
//! Each pair shares one temp file: the pass writes the writer-side
//! destination dictionary to it, and both connection strings are
//! rewritten to `"<original>;<temp path>"` so the emitted programs can
//! hand the dictionary across.

use crate::Unit;
use pansql_ast::{CompilerError, Direction};
use pansql_codegen::ir::OpenIr;
use tracing::debug;

fn is_network(open: &OpenIr) -> bool {
    open.connector.eq_ignore_ascii_case("Network")
}

pub(crate) fn run_network_pass(units: &mut [Unit]) -> Result<(), CompilerError> {
    for i in 0..units.len() {
        let writers: Vec<usize> = units[i]
            .ir
            .opens
            .iter()
            .enumerate()
            .filter(|(_, open)| {
                is_network(open) && open.direction == Direction::Write && open.dict_file.is_none()
            })
            .map(|(index, _)| index)
            .collect();

        for writer in writers {
            let conn = units[i].ir.opens[writer].conn_str.trim().to_string();
            let mut target = None;
            'search: for (j, unit) in units.iter().enumerate().skip(i + 1) {
                for (k, open) in unit.ir.opens.iter().enumerate() {
                    if is_network(open)
                        && open.direction == Direction::Read
                        && open.dict_file.is_none()
                        && open.conn_str.trim() == conn
                    {
                        target = Some((j, k));
                        break 'search;
                    }
                }
            }
            let (j, k) = target.ok_or_else(|| {
                CompilerError::new(format!(
                    "no matching Network reader found for writer '{}'",
                    units[i].ir.opens[writer].var_name
                ))
            })?;

            let blob = units[i].ir.dest_dict.clone();
            let path = allocate_handoff_file(&blob)?;
            debug!(writer = %units[i].ir.opens[writer].var_name, file = %path, "paired network endpoints");
            rewrite(&mut units[i].ir.opens[writer], &path);
            rewrite(&mut units[j].ir.opens[k], &path);
        }
    }

    for unit in units.iter() {
        for open in &unit.ir.opens {
            if is_network(open) && open.direction == Direction::Read && open.dict_file.is_none() {
                return Err(CompilerError::new(format!(
                    "no matching Network writer found for reader '{}'",
                    open.var_name
                )));
            }
        }
    }
    Ok(())
}

fn rewrite(open: &mut OpenIr, path: &str) {
    open.conn_str = format!("{};{}", open.conn_str, path);
    open.dict_file = Some(path.to_string());
}

/// Allocate the handoff temp file and write the destination dictionary's
/// wire form to it. The file is owned by the caller of the compiler and
/// released when the generated programs are no longer needed.
fn allocate_handoff_file(blob: &str) -> Result<String, CompilerError> {
    let file = tempfile::Builder::new()
        .prefix("pansql-")
        .suffix(".dict")
        .tempfile()
        .map_err(|e| CompilerError::new(format!("failed to allocate network handoff file: {}", e)))?;
    let (_, path) = file
        .keep()
        .map_err(|e| CompilerError::new(format!("failed to persist network handoff file: {}", e)))?;
    std::fs::write(&path, blob)
        .map_err(|e| CompilerError::new(format!("failed to write network handoff file: {}", e)))?;
    Ok(path.to_string_lossy().into_owned())
}
